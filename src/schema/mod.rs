//! Schema change records and their rendering.
//!
//! Change records are produced by the registry's diff engine and
//! consumed here: the CLI renders them, the usage core reclassifies
//! them. They are never mutated after creation except for the later
//! addition of an approval through the separate approve action.

pub mod documents;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::output::{Texture, bold_quoted_words};

/// Structural severity assigned by the diff engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Criticality {
    Breaking,
    Dangerous,
    Safe,
}

/// Manual override recorded through the approve-failed-check action.
/// Terminal: an approved change keeps its classification regardless of
/// later usage data.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeApproval {
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
}

/// One operation still exercising a changed schema coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AffectedOperation {
    pub name: String,
    pub hash: String,
    pub count: u64,
}

/// One client still exercising a changed schema coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AffectedClient {
    pub name: String,
    pub count: u64,
}

/// Evidence attached to a breaking change that live traffic still hits.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatistics {
    pub top_affected_operations: Vec<AffectedOperation>,
    pub top_affected_clients: Vec<AffectedClient>,
}

/// One detected schema change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChange {
    pub criticality: Criticality,
    pub message: String,
    /// Schema coordinate the change affects, e.g. `User.name`.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub is_safe_based_on_usage: bool,
    #[serde(default)]
    pub approval: Option<ChangeApproval>,
    #[serde(default)]
    pub usage_statistics: Option<UsageStatistics>,
}

impl SchemaChange {
    pub fn new(criticality: Criticality, message: impl Into<String>) -> Self {
        Self {
            criticality,
            message: message.into(),
            path: None,
            is_safe_based_on_usage: false,
            approval: None,
            usage_statistics: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Composition or validation error reported by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaError {
    pub message: String,
}

/// Deprecation or lint warning reported by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaWarning {
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
}

fn change_line(t: &mut Texture, change: &SchemaChange) {
    let mut message = bold_quoted_words(&change.message);
    if change.approval.is_some() {
        message.push_str(" (approved)");
    } else if change.is_safe_based_on_usage {
        message.push_str(" (non-breaking based on usage)");
    }
    match change.criticality {
        Criticality::Breaking if change.is_safe_based_on_usage || change.approval.is_some() => {
            t.warning(message);
        }
        Criticality::Breaking => {
            t.failure(message);
        }
        Criticality::Dangerous => {
            t.warning(message);
        }
        Criticality::Safe => {
            t.success(message);
        }
    }
}

/// Render detected changes grouped by severity, breaking first.
pub fn render_changes(t: &mut Texture, changes: &[SchemaChange]) {
    let count = changes.len();
    let plural = if count == 1 { "" } else { "s" };
    t.header(format!("Detected {count} change{plural}"));

    for criticality in [Criticality::Breaking, Criticality::Dangerous, Criticality::Safe] {
        for change in changes.iter().filter(|c| c.criticality == criticality) {
            change_line(t, change);
        }
    }
}

pub fn render_errors(t: &mut Texture, errors: &[SchemaError]) {
    let count = errors.len();
    let plural = if count == 1 { "" } else { "s" };
    t.header(format!("Detected {count} error{plural}"));
    for error in errors {
        t.failure(bold_quoted_words(&error.message));
    }
}

pub fn render_warnings(t: &mut Texture, warnings: &[SchemaWarning]) {
    let count = warnings.len();
    let plural = if count == 1 { "" } else { "s" };
    t.header(format!("Detected {count} warning{plural}"));
    for warning in warnings {
        let location = match (&warning.source, warning.line, warning.column) {
            (Some(source), Some(line), Some(column)) => format!(" ({source}:{line}:{column})"),
            (Some(source), _, _) => format!(" ({source})"),
            _ => String::new(),
        };
        t.warning(format!("{}{location}", warning.message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaking_changes_render_as_failures() {
        let mut t = Texture::new();
        render_changes(
            &mut t,
            &[SchemaChange::new(Criticality::Breaking, "field 'User.name' removed")],
        );
        assert!(t.value().contains("=== Detected 1 change\n"));
        assert!(t.value().contains("✖ field User.name removed"));
    }

    #[test]
    fn usage_safe_breaking_changes_are_downgraded_in_rendering() {
        let mut change = SchemaChange::new(Criticality::Breaking, "removed");
        change.is_safe_based_on_usage = true;
        let mut t = Texture::new();
        render_changes(&mut t, &[change]);
        assert!(t.value().contains("⚠ removed (non-breaking based on usage)"));
    }

    #[test]
    fn breaking_changes_are_listed_before_safe_ones() {
        let mut t = Texture::new();
        render_changes(
            &mut t,
            &[
                SchemaChange::new(Criticality::Safe, "added"),
                SchemaChange::new(Criticality::Breaking, "removed"),
            ],
        );
        let removed = t.value().find("removed").unwrap();
        let added = t.value().find("added").unwrap();
        assert!(removed < added);
    }

    #[test]
    fn warnings_carry_source_locations() {
        let mut t = Texture::new();
        render_warnings(
            &mut t,
            &[SchemaWarning {
                message: "deprecated field".into(),
                source: Some("schema.graphql".into()),
                line: Some(10),
                column: Some(3),
            }],
        );
        assert!(t.value().contains("deprecated field (schema.graphql:10:3)"));
    }
}
