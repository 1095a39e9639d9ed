//! Result envelope protocol for CLI commands.
//!
//! Every command declares the exhaustive set of outcome shapes it can
//! produce ahead of time. Each case pairs a unique type name with a
//! JSON Schema for its data payload and an optional text renderer.
//! At runtime the command returns a [`CommandResult`] whose `data.type`
//! must match exactly one registered case; a mismatch is a wiring
//! defect, not a user error.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::texture::Texture;

/// Whether a case represents a successful or failed command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseKind {
    Success,
    Failure,
}

impl CaseKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    fn default_exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

/// What a case's text function produced.
///
/// Resolved in priority order: a literal string wins over an explicitly
/// returned builder, which wins over in-place mutation of the provided
/// builder.
pub enum CaseText {
    /// The function mutated the provided builder; use its text.
    UseBuilder,
    /// The function returned a literal string; the builder is ignored.
    Literal(String),
    /// The function built its own replacement builder.
    Replace(Texture),
}

/// Renders a case's data (already validated against the case schema)
/// into human text.
pub type TextFn = fn(&mut Texture, &Value) -> CaseText;

/// One registered outcome case of a command.
pub struct CaseDefinition {
    pub kind: CaseKind,
    pub name: &'static str,
    schema: Value,
    text: Option<TextFn>,
}

fn case_schema<T: JsonSchema>(name: &'static str) -> Value {
    let schema = schemars::SchemaGenerator::default().into_root_schema_for::<T>();
    let mut schema = serde_json::to_value(schema).unwrap_or_else(|_| json!({}));

    // Tag the data shape with its case name so the union schema is
    // discriminated on `data.type`.
    if let Some(object) = schema.as_object_mut() {
        let properties = object
            .entry("properties")
            .or_insert_with(|| json!({}));
        if let Some(properties) = properties.as_object_mut() {
            properties.insert("type".into(), json!({ "const": name }));
        }
        let required = object.entry("required").or_insert_with(|| json!([]));
        if let Some(required) = required.as_array_mut() {
            required.push(json!("type"));
        }
    }
    schema
}

/// Register a success case with data shape `T`.
pub fn success<T: JsonSchema>(name: &'static str) -> CaseDefinition {
    CaseDefinition {
        kind: CaseKind::Success,
        name,
        schema: case_schema::<T>(name),
        text: None,
    }
}

/// Register a success case with a text renderer.
pub fn success_with_text<T: JsonSchema>(name: &'static str, text: TextFn) -> CaseDefinition {
    CaseDefinition {
        text: Some(text),
        ..success::<T>(name)
    }
}

/// Register a failure case with data shape `T`.
pub fn failure<T: JsonSchema>(name: &'static str) -> CaseDefinition {
    CaseDefinition {
        kind: CaseKind::Failure,
        name,
        schema: case_schema::<T>(name),
        text: None,
    }
}

/// Register a failure case with a text renderer.
pub fn failure_with_text<T: JsonSchema>(name: &'static str, text: TextFn) -> CaseDefinition {
    CaseDefinition {
        text: Some(text),
        ..failure::<T>(name)
    }
}

/// The declared output of one command: its registered cases and the
/// union schema over them.
pub struct CommandOutput {
    cases: Vec<CaseDefinition>,
}

impl CommandOutput {
    /// Aggregate cases into one definition.
    ///
    /// Panics on duplicate case names: two cases with the same name in
    /// one command is a defect in command wiring.
    pub fn new(cases: Vec<CaseDefinition>) -> Self {
        for (index, case) in cases.iter().enumerate() {
            if cases[..index].iter().any(|other| other.name == case.name) {
                panic!("duplicate output case registered: {}", case.name);
            }
        }
        Self { cases }
    }

    /// Look up the case matching a concrete result.
    pub fn case(&self, name: &str) -> Result<&CaseDefinition, OutputError> {
        self.cases
            .iter()
            .find(|case| case.name == name)
            .ok_or_else(|| OutputError::UnknownCase {
                name: name.to_string(),
            })
    }

    /// JSON Schema of the full envelope: common fields plus the union
    /// of all registered case data shapes.
    pub fn schema_json(&self) -> Value {
        let data_union: Vec<&Value> = self.cases.iter().map(|case| &case.schema).collect();
        json!({
            "type": "object",
            "properties": {
                "type": { "enum": ["success", "failure"] },
                "data": { "oneOf": data_union },
                "warnings": { "type": "array", "items": { "type": "string" } },
                "suggestions": { "type": "array", "items": { "type": "string" } },
                "reference": { "type": ["string", "null"] },
                "exitCode": { "type": "integer" }
            },
            "required": ["type", "data", "warnings"]
        })
    }
}

/// A concrete command outcome, pointing at one registered case.
#[derive(Debug, Clone)]
pub struct CommandResult {
    case: String,
    data: Value,
    warnings: Vec<String>,
    suggestions: Vec<String>,
    reference: Option<String>,
    exit_code: Option<i32>,
}

impl CommandResult {
    /// Build a result for the named case. The payload is serialized and
    /// tagged with `type` = the case name.
    pub fn new<T: Serialize>(case: &str, data: T) -> Self {
        let mut data = serde_json::to_value(data).unwrap_or_else(|_| json!({}));
        if let Some(object) = data.as_object_mut() {
            object.insert("type".into(), json!(case));
        }
        Self {
            case: case.to_string(),
            data,
            warnings: Vec::new(),
            suggestions: Vec::new(),
            reference: None,
            exit_code: None,
        }
    }

    pub fn case_name(&self) -> &str {
        &self.case
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }
}

/// Defects in command/output wiring. Never converted into failure
/// envelopes; callers let these crash loudly.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("result data.type '{name}' does not match any registered output case")]
    UnknownCase { name: String },
    #[error("result data carries type '{found}' but was constructed for case '{expected}'")]
    CaseTagMismatch { expected: String, found: String },
}

/// How the final result should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// A fully rendered command outcome.
pub struct Rendered {
    pub text: String,
    pub exit_code: i32,
}

fn run_text(case: &CaseDefinition, data: &Value) -> String {
    let Some(text) = case.text else {
        return String::new();
    };
    let mut builder = Texture::new();
    match text(&mut builder, data) {
        CaseText::Literal(value) => value,
        CaseText::Replace(replacement) => replacement.into_value(),
        CaseText::UseBuilder => builder.into_value(),
    }
}

/// Convert a result into its final presentation.
///
/// JSON mode serializes the validated envelope with field defaults
/// applied. Text mode resolves the case's text function, strips one
/// trailing newline, and appends warnings one per line.
pub fn render(
    output: &CommandOutput,
    result: &CommandResult,
    mode: OutputMode,
) -> Result<Rendered, OutputError> {
    let case = output.case(result.case_name())?;

    let tag = result.data.get("type").and_then(Value::as_str).unwrap_or("");
    if tag != case.name {
        return Err(OutputError::CaseTagMismatch {
            expected: case.name.to_string(),
            found: tag.to_string(),
        });
    }

    let exit_code = result.exit_code.unwrap_or(case.kind.default_exit_code());

    match mode {
        OutputMode::Json => {
            let mut envelope = json!({
                "type": case.kind.tag(),
                "data": result.data,
                "warnings": result.warnings,
                "suggestions": result.suggestions,
                "reference": result.reference,
            });
            if let Some(code) = result.exit_code {
                envelope["exitCode"] = json!(code);
            }
            let text = serde_json::to_string_pretty(&envelope)
                .unwrap_or_else(|_| String::from("{}"));
            Ok(Rendered { text, exit_code })
        }
        OutputMode::Text => {
            let mut text = run_text(case, &result.data);
            if text.ends_with('\n') {
                text.pop();
            }
            for suggestion in &result.suggestions {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(suggestion);
            }
            for warning in &result.warnings {
                if !text.is_empty() {
                    text.push('\n');
                }
                let mut line = Texture::new();
                line.warning(warning);
                let mut line = line.into_value();
                line.pop();
                text.push_str(&line);
            }
            Ok(Rendered { text, exit_code })
        }
    }
}
