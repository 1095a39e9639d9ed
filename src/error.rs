//! Error taxonomy for user-facing commands.
//!
//! Every anticipated failure funnels through [`CliError::into_result`],
//! which maps it to a failure envelope so JSON mode stays well-formed.
//! Anything outside this taxonomy (panics, wiring defects) propagates
//! unchanged and crashes the process with a stack trace.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::output::{CaseDefinition, CommandResult, failure_with_text};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("a registry endpoint is required")]
    MissingEndpoint,

    #[error("a registry access token is required")]
    MissingAccessToken,

    #[error(
        "invalid target reference '{value}': expected an \"org/project/target\" slug or a UUID"
    )]
    InvalidTarget { value: String },

    #[error("schema file not found: {path}")]
    SchemaFileNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("schema file is empty: {path}")]
    SchemaFileEmpty { path: String },

    #[error("persisted operations manifest is malformed: {path}")]
    MalformedManifest { path: String },

    #[error("a commit sha is required when using --github, pass --commit")]
    CommitRequired,

    #[error("could not read operation documents matching '{pattern}'")]
    InvalidGlob { pattern: String },

    /// Upstream registry API failure: non-2xx response, transport
    /// error, or an error payload. The message aggregates all upstream
    /// error messages; `reference` carries the upstream request id.
    #[error("{message}")]
    Api {
        message: String,
        reference: Option<String>,
    },
}

/// Payload of the `FailureUserInput` case.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UserInputFailure {
    pub problem: String,
    pub message: String,
}

/// Payload of the generic `Failure` case.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GenericFailure {
    pub message: String,
}

impl CliError {
    /// User-input problem discriminant, when this error is the user's
    /// to fix rather than an upstream failure.
    pub fn problem(&self) -> Option<&'static str> {
        match self {
            Self::MissingEndpoint | Self::MissingAccessToken => Some("namedArgumentMissing"),
            Self::InvalidTarget { .. } => Some("namedArgumentInvalid"),
            Self::SchemaFileNotFound { .. } | Self::InvalidGlob { .. } => {
                Some("positionalArgumentInvalid")
            }
            Self::SchemaFileEmpty { .. } | Self::MalformedManifest { .. } => {
                Some("fileContentsInvalid")
            }
            Self::CommitRequired => Some("namedArgumentMissing"),
            Self::Api { .. } => None,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingEndpoint => vec![
                "Pass --registry-endpoint, set SCHEMACTL_REGISTRY__ENDPOINT, or add registry.endpoint to your settings file.".into(),
            ],
            Self::MissingAccessToken => vec![
                "Pass --registry-access-token, set SCHEMACTL_REGISTRY__ACCESS_TOKEN, or add registry.access_token to your settings file.".into(),
            ],
            Self::InvalidTarget { .. } => vec![
                "Use a slug like \"the-org/shop/production\" or the target's UUID.".into(),
            ],
            _ => Vec::new(),
        }
    }

    /// One conversion point from a thrown error to a failure envelope.
    pub fn into_result(self) -> CommandResult {
        let suggestions = self.suggestions();
        match &self {
            Self::Api { message, reference } => CommandResult::new(
                "Failure",
                GenericFailure {
                    message: message.clone(),
                },
            )
            .with_reference(reference.clone())
            .with_suggestions(suggestions),
            _ => CommandResult::new(
                "FailureUserInput",
                UserInputFailure {
                    problem: self.problem().unwrap_or("unknown").to_string(),
                    message: self.to_string(),
                },
            )
            .with_suggestions(suggestions),
        }
    }
}

fn failure_text(
    t: &mut crate::output::Texture,
    data: &serde_json::Value,
) -> crate::output::CaseText {
    let message = data.get("message").and_then(|v| v.as_str()).unwrap_or("");
    t.failure(crate::output::bold_quoted_words(message));
    crate::output::CaseText::UseBuilder
}

/// Failure cases shared by every command: the taxonomy above can
/// surface from any of them.
pub fn base_failure_cases() -> Vec<CaseDefinition> {
    vec![
        failure_with_text::<UserInputFailure>("FailureUserInput", failure_text),
        failure_with_text::<GenericFailure>("Failure", failure_text),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CommandOutput, OutputMode, render};

    #[test]
    fn user_input_errors_become_failure_user_input() {
        let result = CliError::MissingAccessToken.into_result();
        assert_eq!(result.case_name(), "FailureUserInput");
        assert_eq!(result.data()["problem"], "namedArgumentMissing");
    }

    #[test]
    fn api_errors_become_generic_failures_with_reference() {
        let result = CliError::Api {
            message: "boom".into(),
            reference: Some("req-1".into()),
        }
        .into_result();
        assert_eq!(result.case_name(), "Failure");

        let output = CommandOutput::new(base_failure_cases());
        let rendered = render(&output, &result, OutputMode::Json).unwrap();
        let envelope: serde_json::Value = serde_json::from_str(&rendered.text).unwrap();
        assert_eq!(envelope["reference"], "req-1");
        assert_eq!(rendered.exit_code, 1);
    }

    #[test]
    fn text_mode_prints_styled_failure_line_and_suggestions() {
        let output = CommandOutput::new(base_failure_cases());
        let result = CliError::MissingEndpoint.into_result();
        let rendered = render(&output, &result, OutputMode::Text).unwrap();
        assert!(rendered.text.starts_with("✖ a registry endpoint is required"));
        assert!(rendered.text.contains("--registry-endpoint"));
    }
}
