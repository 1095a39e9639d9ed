//! `schemactl operations check` — validate GraphQL operation documents
//! against the latest valid schema version.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cli::args::OperationsAction;
use crate::config::Settings;
use crate::error::{CliError, base_failure_cases};
use crate::output::{
    CaseText, CommandOutput, CommandResult, Texture, failure_with_text, success_with_text,
};
use crate::registry::RegistryClient;
use crate::schema::documents::{DocumentError, OperationDocument, validate_document};

use super::{resolve_endpoint, resolve_token};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvalidOperation {
    /// File the document was loaded from.
    pub source: String,
    pub errors: Vec<DocumentError>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationsCheckSuccess {
    pub count_total: usize,
    pub count_invalid: usize,
    pub count_valid: usize,
    pub invalid_operations: Vec<InvalidOperation>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NoOperationsFound {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NoSchemaFound {}

fn check_text(t: &mut Texture, data: &Value) -> CaseText {
    let Ok(payload) = serde_json::from_value::<OperationsCheckSuccess>(data.clone()) else {
        return CaseText::UseBuilder;
    };

    if payload.count_invalid == 0 {
        t.success(format!(
            "All of {} operations are valid",
            payload.count_total
        ));
        return CaseText::UseBuilder;
    }

    t.failure(format!(
        "{} of {} operations are invalid",
        payload.count_invalid, payload.count_total
    ));
    for operation in &payload.invalid_operations {
        t.line_empty();
        t.indent(&operation.source);
        for error in &operation.errors {
            t.indent(format!(
                "{} (line {}, column {})",
                error.message, error.line, error.column
            ));
        }
    }
    CaseText::UseBuilder
}

fn no_operations_text(t: &mut Texture, _data: &Value) -> CaseText {
    t.info("No operation documents matched the given pattern; nothing to check.");
    CaseText::UseBuilder
}

fn no_schema_text(t: &mut Texture, _data: &Value) -> CaseText {
    t.failure("No valid schema version has been published to this target yet.");
    CaseText::UseBuilder
}

pub fn output() -> CommandOutput {
    let mut cases = vec![
        success_with_text::<OperationsCheckSuccess>("SuccessOperationsCheck", check_text),
        success_with_text::<NoOperationsFound>(
            "SuccessOperationsCheckNoOperationsFound",
            no_operations_text,
        ),
        failure_with_text::<NoSchemaFound>(
            "FailureOperationsCheckNoSchemaFound",
            no_schema_text,
        ),
    ];
    cases.extend(base_failure_cases());
    CommandOutput::new(cases)
}

fn load_documents(pattern: &str) -> Result<Vec<OperationDocument>, CliError> {
    let invalid = || CliError::InvalidGlob {
        pattern: pattern.to_string(),
    };
    let mut documents = Vec::new();
    for entry in glob::glob(pattern).map_err(|_| invalid())? {
        let path = entry.map_err(|_| invalid())?;
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path).map_err(|_| invalid())?;
        documents.push(OperationDocument {
            name: path.display().to_string(),
            content,
        });
    }
    Ok(documents)
}

/// Validate every document, building the summary payload. The result
/// preserves document order so error output is stable.
pub fn summarize(documents: &[OperationDocument]) -> OperationsCheckSuccess {
    let mut invalid_operations = Vec::new();
    for document in documents {
        let errors = validate_document(document);
        if !errors.is_empty() {
            invalid_operations.push(InvalidOperation {
                source: document.name.clone(),
                errors,
            });
        }
    }
    OperationsCheckSuccess {
        count_total: documents.len(),
        count_invalid: invalid_operations.len(),
        count_valid: documents.len() - invalid_operations.len(),
        invalid_operations,
    }
}

pub async fn run(
    action: OperationsAction,
    settings: &Settings,
) -> Result<CommandResult, CliError> {
    let OperationsAction::Check {
        pattern,
        registry_endpoint,
        registry_access_token,
    } = action;

    let documents = load_documents(&pattern)?;
    debug!(pattern = %pattern, count = documents.len(), "loaded operation documents");

    if documents.is_empty() {
        return Ok(CommandResult::new(
            "SuccessOperationsCheckNoOperationsFound",
            NoOperationsFound {},
        ));
    }

    let endpoint = resolve_endpoint(registry_endpoint, settings)?;
    let token = resolve_token(registry_access_token, settings)?;
    let client = RegistryClient::new(endpoint, token)?;

    if client.latest_valid_schema().await?.is_none() {
        return Ok(
            CommandResult::new("FailureOperationsCheckNoSchemaFound", NoSchemaFound {})
                .with_suggestions(vec!["Publish a valid schema first.".into()]),
        );
    }

    let summary = summarize(&documents);
    let mut result = CommandResult::new("SuccessOperationsCheck", summary);
    let invalid = result.data()["countInvalid"].as_u64().unwrap_or(0);
    if invalid > 0 {
        result = result.with_exit_code(1);
    }
    Ok(result)
}
