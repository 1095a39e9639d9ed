//! Structural validation of GraphQL operation documents.
//!
//! The CLI checks that each document is a well-formed executable
//! document before anything is sent anywhere: non-empty, starts with an
//! operation or fragment, balanced braces and parens, terminated
//! strings. Field-level validation against the published SDL is the
//! registry's concern.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A loaded operation document.
#[derive(Debug, Clone)]
pub struct OperationDocument {
    /// Where the document came from, usually a file path.
    pub name: String,
    pub content: String,
}

/// One structural error in a document.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

fn starts_executable(content: &str) -> bool {
    let trimmed = content.trim_start();
    trimmed.starts_with('{')
        || trimmed.starts_with("query")
        || trimmed.starts_with("mutation")
        || trimmed.starts_with("subscription")
        || trimmed.starts_with("fragment")
        || trimmed.starts_with('#')
}

/// Validate one document, returning every structural error found.
pub fn validate_document(document: &OperationDocument) -> Vec<DocumentError> {
    let content = &document.content;
    let mut errors = Vec::new();

    if content.trim().is_empty() {
        errors.push(DocumentError {
            message: "document is empty".into(),
            line: 1,
            column: 1,
        });
        return errors;
    }

    if !starts_executable(content) {
        errors.push(DocumentError {
            message: "expected an operation (query, mutation, subscription) or fragment".into(),
            line: 1,
            column: 1,
        });
    }

    // Bracket balance with line/column tracking. Strings and comments
    // are skipped so their contents cannot unbalance anything.
    let mut stack: Vec<(char, u32, u32)> = Vec::new();
    let mut line = 1u32;
    let mut column = 0u32;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
            column = 0;
            continue;
        }
        column += 1;

        match c {
            '#' => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' => {
                let (start_line, start_column) = (line, column);
                let mut terminated = false;
                while let Some(next) = chars.next() {
                    column += 1;
                    match next {
                        '"' => {
                            terminated = true;
                            break;
                        }
                        '\\' => {
                            if chars.next().is_some() {
                                column += 1;
                            }
                        }
                        '\n' => {
                            line += 1;
                            column = 0;
                            break;
                        }
                        _ => {}
                    }
                }
                if !terminated {
                    errors.push(DocumentError {
                        message: "unterminated string".into(),
                        line: start_line,
                        column: start_column,
                    });
                }
            }
            '{' | '(' | '[' => stack.push((c, line, column)),
            '}' | ')' | ']' => {
                let expected = match c {
                    '}' => '{',
                    ')' => '(',
                    _ => '[',
                };
                match stack.pop() {
                    Some((open, ..)) if open == expected => {}
                    Some((open, open_line, open_column)) => {
                        errors.push(DocumentError {
                            message: format!("'{c}' does not close '{open}'"),
                            line: open_line,
                            column: open_column,
                        });
                    }
                    None => {
                        errors.push(DocumentError {
                            message: format!("unmatched '{c}'"),
                            line,
                            column,
                        });
                    }
                }
            }
            _ => {}
        }
    }

    for (open, open_line, open_column) in stack {
        errors.push(DocumentError {
            message: format!("unclosed '{open}'"),
            line: open_line,
            column: open_column,
        });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> OperationDocument {
        OperationDocument {
            name: "test.graphql".into(),
            content: content.into(),
        }
    }

    #[test]
    fn valid_query_has_no_errors() {
        let errors = validate_document(&doc("query Me {\n  me {\n    id\n  }\n}\n"));
        assert!(errors.is_empty());
    }

    #[test]
    fn anonymous_operation_is_accepted() {
        assert!(validate_document(&doc("{ me { id } }")).is_empty());
    }

    #[test]
    fn empty_document_is_one_error() {
        let errors = validate_document(&doc("  \n "));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "document is empty");
    }

    #[test]
    fn unclosed_brace_reports_opening_location() {
        let errors = validate_document(&doc("query Me {\n  me { id }\n"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "unclosed '{'");
        assert_eq!(errors[0].line, 1);
        assert_eq!(errors[0].column, 10);
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        assert!(
            validate_document(&doc(r#"query Q { field(arg: "{unbalanced") }"#)).is_empty()
        );
    }

    #[test]
    fn braces_inside_comments_are_ignored() {
        assert!(validate_document(&doc("query Q { # {{{\n  f\n}")).is_empty());
    }

    #[test]
    fn type_definitions_are_rejected() {
        let errors = validate_document(&doc("type Query { me: User }"));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("expected an operation"));
    }
}
