//! `schemactl schema check` — compare a proposed schema against the
//! latest registered version.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::cli::args::SchemaAction;
use crate::config::Settings;
use crate::error::{CliError, base_failure_cases};
use crate::output::{
    CaseText, CommandOutput, CommandResult, Texture, failure_with_text, success_with_text,
};
use crate::registry::{
    RegistryClient,
    types::{CommitMeta, GithubInput, SchemaCheckInput, SchemaCheckResponse},
};
use crate::schema::{
    SchemaChange, SchemaError, SchemaWarning, render_changes, render_errors, render_warnings,
};

use super::{parse_target, resolve_endpoint, resolve_token};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCheckSuccess {
    /// No prior version existed; this check registered the baseline.
    pub initial: bool,
    pub changes: Vec<SchemaChange>,
    pub warnings: Vec<SchemaWarning>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCheckFailure {
    pub changes: Vec<SchemaChange>,
    pub errors: Vec<SchemaError>,
    pub warnings: Vec<SchemaWarning>,
    #[serde(default)]
    pub url: Option<String>,
}

fn success_text(t: &mut Texture, data: &Value) -> CaseText {
    let Ok(payload) = serde_json::from_value::<SchemaCheckSuccess>(data.clone()) else {
        return CaseText::UseBuilder;
    };

    if payload.initial {
        t.success("Schema check passed for the initial schema version.");
    } else if payload.changes.is_empty() {
        t.success("No changes detected.");
    } else {
        t.success("Schema check passed.");
        t.line_empty();
        render_changes(t, &payload.changes);
    }

    if !payload.warnings.is_empty() {
        t.line_empty();
        render_warnings(t, &payload.warnings);
    }

    if let Some(url) = &payload.url {
        t.line_empty();
        t.info(format!("View full report: {url}"));
    }

    CaseText::UseBuilder
}

fn failure_text(t: &mut Texture, data: &Value) -> CaseText {
    let Ok(payload) = serde_json::from_value::<SchemaCheckFailure>(data.clone()) else {
        return CaseText::UseBuilder;
    };

    t.failure("Schema check failed.");

    if !payload.errors.is_empty() {
        t.line_empty();
        render_errors(t, &payload.errors);
    }

    if !payload.changes.is_empty() {
        t.line_empty();
        render_changes(t, &payload.changes);
    }

    if !payload.warnings.is_empty() {
        t.line_empty();
        render_warnings(t, &payload.warnings);
    }

    if let Some(url) = &payload.url {
        t.line_empty();
        t.info(format!("View full report: {url}"));
    }

    CaseText::UseBuilder
}

pub fn output() -> CommandOutput {
    let mut cases = vec![
        success_with_text::<SchemaCheckSuccess>("SuccessSchemaCheck", success_text),
        failure_with_text::<SchemaCheckFailure>("FailureSchemaCheck", failure_text),
    ];
    cases.extend(base_failure_cases());
    CommandOutput::new(cases)
}

fn load_schema_file(path: &std::path::Path) -> Result<String, CliError> {
    let sdl = std::fs::read_to_string(path).map_err(|source| CliError::SchemaFileNotFound {
        path: path.display().to_string(),
        source,
    })?;
    if sdl.trim().is_empty() {
        return Err(CliError::SchemaFileEmpty {
            path: path.display().to_string(),
        });
    }
    Ok(sdl)
}

/// Map the registry's verdict to an output case.
///
/// `force_safe` turns an invalid check into a success with a warning;
/// the detected changes are still reported.
pub fn result_from_response(response: SchemaCheckResponse, force_safe: bool) -> CommandResult {
    let SchemaCheckResponse {
        valid,
        initial,
        changes,
        warnings,
        errors,
        web_url,
    } = response;

    if valid || (force_safe && errors.is_empty()) {
        let mut result = CommandResult::new(
            "SuccessSchemaCheck",
            SchemaCheckSuccess {
                initial,
                changes,
                warnings,
                url: web_url,
            },
        );
        if !valid {
            result = result.with_warning("Breaking changes were marked as safe by --force-safe.");
        }
        result
    } else {
        CommandResult::new(
            "FailureSchemaCheck",
            SchemaCheckFailure {
                changes,
                errors,
                warnings,
                url: web_url,
            },
        )
    }
}

pub async fn run(action: SchemaAction, settings: &Settings) -> Result<CommandResult, CliError> {
    let SchemaAction::Check {
        file,
        service,
        registry_endpoint,
        registry_access_token,
        force_safe,
        github,
        author,
        commit,
        target,
        context_id,
        url,
        github_repository,
        github_pull_request,
    } = action;

    let sdl = load_schema_file(&file)?;
    let endpoint = resolve_endpoint(registry_endpoint, settings)?;
    let token = resolve_token(registry_access_token, settings)?;
    let target = parse_target(target.as_deref())?;

    let github = if github {
        let commit = commit.clone().ok_or(CliError::CommitRequired)?;
        Some(GithubInput {
            commit,
            repository: github_repository,
            pull_request_number: github_pull_request,
        })
    } else {
        None
    };

    let meta = match (author, commit) {
        (Some(author), Some(commit)) => Some(CommitMeta { commit, author }),
        _ => None,
    };

    let client = RegistryClient::new(endpoint, token)?;
    let response = client
        .schema_check(&SchemaCheckInput {
            sdl,
            service,
            github,
            meta,
            context_id,
            target,
            url,
        })
        .await?;

    info!(
        valid = response.valid,
        initial = response.initial,
        changes = response.changes.len(),
        "schema check completed"
    );

    Ok(result_from_response(response, force_safe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputMode, render};
    use crate::schema::Criticality;

    fn response(valid: bool, initial: bool, changes: Vec<SchemaChange>) -> SchemaCheckResponse {
        SchemaCheckResponse {
            valid,
            initial,
            changes,
            warnings: Vec::new(),
            errors: Vec::new(),
            web_url: None,
        }
    }

    #[test]
    fn initial_version_is_a_success_with_no_changes() {
        let result = result_from_response(response(true, true, Vec::new()), false);
        assert_eq!(result.case_name(), "SuccessSchemaCheck");

        let rendered = render(&output(), &result, OutputMode::Json).unwrap();
        let envelope: Value = serde_json::from_str(&rendered.text).unwrap();
        assert_eq!(envelope["data"]["initial"], true);
        assert_eq!(envelope["data"]["changes"], serde_json::json!([]));
        assert_eq!(rendered.exit_code, 0);
    }

    #[test]
    fn unapproved_breaking_changes_fail_the_check() {
        let change = SchemaChange::new(Criticality::Breaking, "field 'User.name' removed");
        let result = result_from_response(response(false, false, vec![change]), false);
        assert_eq!(result.case_name(), "FailureSchemaCheck");

        let rendered = render(&output(), &result, OutputMode::Text).unwrap();
        assert!(rendered.text.contains("Schema check failed."));
        assert!(rendered.text.contains("✖ field User.name removed"));
        assert_eq!(rendered.exit_code, 1);
    }

    #[test]
    fn force_safe_downgrades_an_invalid_check_to_success() {
        let change = SchemaChange::new(Criticality::Breaking, "removed");
        let result = result_from_response(response(false, false, vec![change]), true);
        assert_eq!(result.case_name(), "SuccessSchemaCheck");

        let rendered = render(&output(), &result, OutputMode::Json).unwrap();
        let envelope: Value = serde_json::from_str(&rendered.text).unwrap();
        assert_eq!(
            envelope["warnings"][0],
            "Breaking changes were marked as safe by --force-safe."
        );
        assert_eq!(rendered.exit_code, 0);
    }

    #[test]
    fn force_safe_does_not_mask_composition_errors() {
        let mut invalid = response(false, false, Vec::new());
        invalid.errors = vec![SchemaError {
            message: "unknown type 'User'".into(),
        }];
        let result = result_from_response(invalid, true);
        assert_eq!(result.case_name(), "FailureSchemaCheck");
    }

    #[test]
    fn missing_schema_file_is_a_user_error() {
        let error = load_schema_file(std::path::Path::new("does/not/exist.graphql")).unwrap_err();
        assert!(matches!(error, CliError::SchemaFileNotFound { .. }));
    }

    #[test]
    fn empty_schema_file_is_a_distinct_user_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.graphql");
        std::fs::write(&path, "\n  \n").unwrap();
        assert!(matches!(
            load_schema_file(&path),
            Err(CliError::SchemaFileEmpty { .. })
        ));
    }
}
