//! Wire types for the registry API.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::CliError;
use crate::schema::{SchemaChange, SchemaError, SchemaWarning};

/// Reference to a target: a `$org/$project/$target` slug or a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetRef {
    #[serde(rename_all = "camelCase")]
    Slug {
        organization_slug: String,
        project_slug: String,
        target_slug: String,
    },
    Id {
        #[serde(rename = "byId")]
        id: String,
    },
}

fn is_uuid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8usize, 4, 4, 4, 12])
            .all(|(group, len)| {
                group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit())
            })
}

impl FromStr for TargetRef {
    type Err = CliError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if is_uuid(value) {
            return Ok(Self::Id {
                id: value.to_ascii_lowercase(),
            });
        }

        let parts: Vec<&str> = value.split('/').collect();
        if parts.len() == 3 && parts.iter().all(|part| !part.is_empty()) {
            return Ok(Self::Slug {
                organization_slug: parts[0].to_string(),
                project_slug: parts[1].to_string(),
                target_slug: parts[2].to_string(),
            });
        }

        Err(CliError::InvalidTarget {
            value: value.to_string(),
        })
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slug {
                organization_slug,
                project_slug,
                target_slug,
            } => write!(f, "{organization_slug}/{project_slug}/{target_slug}"),
            Self::Id { id } => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitMeta {
    pub commit: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubInput {
    pub commit: String,
    pub repository: Option<String>,
    pub pull_request_number: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCheckInput {
    pub sdl: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<CommitMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCheckResponse {
    pub valid: bool,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub changes: Vec<SchemaChange>,
    #[serde(default)]
    pub warnings: Vec<SchemaWarning>,
    #[serde(default)]
    pub errors: Vec<SchemaError>,
    #[serde(default)]
    pub web_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersionResponse {
    pub sdl: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppDeploymentStatus {
    Pending,
    Active,
    Retired,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppDeploymentInput {
    pub app_name: String,
    pub app_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAppDeployment {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: AppDeploymentStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentHashesResponse {
    pub hashes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInput {
    pub hash: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    V1,
    V2,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDocumentsInput {
    pub app_name: String,
    pub app_version: String,
    pub documents: Vec<DocumentInput>,
    pub format: DocumentFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetRef>,
}

/// Index of the offending document within the submitted batch, plus a
/// reason.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentErrorDetails {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddDocumentsError {
    pub message: String,
    #[serde(default)]
    pub details: Option<DocumentErrorDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddDocumentsResponse {
    #[serde(default)]
    pub error: Option<AddDocumentsError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_targets_parse() {
        let target: TargetRef = "the-guild/shop/production".parse().unwrap();
        assert_eq!(
            target,
            TargetRef::Slug {
                organization_slug: "the-guild".into(),
                project_slug: "shop".into(),
                target_slug: "production".into(),
            }
        );
    }

    #[test]
    fn uuid_targets_parse() {
        let target: TargetRef = "A0F4C605-6541-4350-8CFE-B31F21A4BF80".parse().unwrap();
        assert_eq!(
            target,
            TargetRef::Id {
                id: "a0f4c605-6541-4350-8cfe-b31f21a4bf80".into()
            }
        );
    }

    #[test]
    fn malformed_targets_are_user_errors() {
        for bad in ["just-a-name", "a/b", "a//c", "a/b/c/d", ""] {
            assert!(bad.parse::<TargetRef>().is_err(), "{bad:?} should not parse");
        }
    }
}
