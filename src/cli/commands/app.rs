//! `schemactl app create` — create an app deployment and upload its
//! persisted operation documents.
//!
//! Documents flush in manifest order in batches of 100. With
//! `--format v2` every hash is verified against the recomputed sha256
//! of its body before anything touches the network, and hashes already
//! known to the registry are skipped (delta upload).

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cli::args::{AppAction, ManifestFormat};
use crate::config::Settings;
use crate::error::{CliError, base_failure_cases};
use crate::manifest::{
    Manifest, UPLOAD_BATCH_SIZE, load_manifest, normalize_hash, verify_sha256_hashes,
};
use crate::output::{CaseText, CommandOutput, CommandResult, Texture, success_with_text};
use crate::registry::{
    RegistryClient,
    types::{
        AddDocumentsError, AddDocumentsInput, AppDeploymentStatus, CreateAppDeploymentInput,
        DocumentFormat, DocumentInput,
    },
};

use super::{parse_target, resolve_endpoint, resolve_token};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppCreateSuccess {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: AppDeploymentStatus,
    pub documents_total: usize,
    pub documents_uploaded: usize,
    pub documents_skipped: usize,
}

fn create_text(t: &mut Texture, data: &Value) -> CaseText {
    let Ok(payload) = serde_json::from_value::<AppCreateSuccess>(data.clone()) else {
        return CaseText::UseBuilder;
    };
    t.success(format!(
        "App deployment '{}@{}' created",
        payload.name, payload.version
    ));
    if payload.documents_skipped > 0 {
        t.indent(format!(
            "{} uploaded, {} already known",
            payload.documents_uploaded, payload.documents_skipped
        ));
    } else {
        t.indent(format!("{} documents uploaded", payload.documents_uploaded));
    }
    CaseText::UseBuilder
}

pub fn output() -> CommandOutput {
    let mut cases = vec![success_with_text::<AppCreateSuccess>(
        "SuccessAppCreate",
        create_text,
    )];
    cases.extend(base_failure_cases());
    CommandOutput::new(cases)
}

const BODY_PREVIEW_CHARS: usize = 40;

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= BODY_PREVIEW_CHARS {
        return body.to_string();
    }
    let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    format!("{preview}…")
}

/// Build the error for a partially failed upload batch, citing the
/// offending buffered document when the registry names its index.
pub fn upload_error(error: AddDocumentsError, batch: &[DocumentInput]) -> CliError {
    let message = match error.details.and_then(|details| {
        batch
            .get(details.index)
            .map(|document| (details.message, document))
    }) {
        Some((detail, document)) => format!(
            "{}\n{detail}\nDocument: {}\nBody (truncated): {}",
            error.message,
            document.hash,
            truncate_body(&document.body)
        ),
        None => error.message,
    };
    CliError::Api {
        message,
        reference: None,
    }
}

/// Split the manifest into upload batches in encounter order, skipping
/// hashes the registry already knows.
pub fn plan_batches(
    manifest: &Manifest,
    known_hashes: &HashSet<String>,
    format: ManifestFormat,
) -> (Vec<Vec<DocumentInput>>, usize) {
    let mut batches: Vec<Vec<DocumentInput>> = Vec::new();
    let mut buffer: Vec<DocumentInput> = Vec::new();
    let mut skipped = 0usize;

    for (hash, body) in manifest {
        let hash = match format {
            ManifestFormat::V1 => hash.clone(),
            ManifestFormat::V2 => normalize_hash(hash),
        };
        if known_hashes.contains(&hash) {
            skipped += 1;
            continue;
        }
        buffer.push(DocumentInput {
            hash,
            body: body.clone(),
        });
        if buffer.len() == UPLOAD_BATCH_SIZE {
            batches.push(std::mem::take(&mut buffer));
        }
    }
    if !buffer.is_empty() {
        batches.push(buffer);
    }
    (batches, skipped)
}

pub async fn run(action: AppAction, settings: &Settings) -> Result<CommandResult, CliError> {
    let AppAction::Create {
        manifest,
        name,
        version,
        target,
        format,
        registry_endpoint,
        registry_access_token,
    } = action;

    let documents = load_manifest(&manifest)?;

    // v2 hash verification happens before any network traffic; a bad
    // manifest must not create a half-uploaded deployment.
    if format == ManifestFormat::V2 {
        verify_sha256_hashes(&documents).into_error()?;
    }

    let endpoint = resolve_endpoint(registry_endpoint, settings)?;
    let token = resolve_token(registry_access_token, settings)?;
    let target = parse_target(target.as_deref())?;
    let client = RegistryClient::new(endpoint, token)?;

    let deployment = client
        .create_app_deployment(&CreateAppDeploymentInput {
            app_name: name.clone(),
            app_version: version.clone(),
            target: target.clone(),
        })
        .await?;

    match deployment.status {
        AppDeploymentStatus::Retired => {
            return Err(CliError::Api {
                message: format!("app deployment '{name}@{version}' is retired"),
                reference: None,
            });
        }
        AppDeploymentStatus::Active => {
            return Ok(CommandResult::new(
                "SuccessAppCreate",
                AppCreateSuccess {
                    id: deployment.id,
                    name: deployment.name,
                    version: deployment.version,
                    status: deployment.status,
                    documents_total: documents.len(),
                    documents_uploaded: 0,
                    documents_skipped: documents.len(),
                },
            )
            .with_warning("App deployment is already active; documents were not modified."));
        }
        AppDeploymentStatus::Pending => {}
    }

    let mut warnings = Vec::new();
    let known_hashes = if format == ManifestFormat::V2 {
        match client
            .app_deployment_document_hashes(target.as_ref(), &name)
            .await
        {
            Ok(hashes) => hashes.into_iter().map(|hash| normalize_hash(&hash)).collect(),
            Err(error) => {
                warn!(%error, "failed to fetch existing document hashes");
                warnings.push(
                    "Could not fetch existing document hashes; delta upload disabled.".into(),
                );
                HashSet::new()
            }
        }
    } else {
        HashSet::new()
    };

    let (batches, skipped) = plan_batches(&documents, &known_hashes, format);
    let mut uploaded = 0usize;

    let wire_format = match format {
        ManifestFormat::V1 => DocumentFormat::V1,
        ManifestFormat::V2 => DocumentFormat::V2,
    };

    for batch in batches {
        debug!(size = batch.len(), "uploading document batch");
        let response = client
            .add_documents(&AddDocumentsInput {
                app_name: name.clone(),
                app_version: version.clone(),
                documents: batch.clone(),
                format: wire_format,
                target: target.clone(),
            })
            .await?;
        if let Some(error) = response.error {
            return Err(upload_error(error, &batch));
        }
        uploaded += batch.len();
    }

    Ok(CommandResult::new(
        "SuccessAppCreate",
        AppCreateSuccess {
            id: deployment.id,
            name: deployment.name,
            version: deployment.version,
            status: deployment.status,
            documents_total: documents.len(),
            documents_uploaded: uploaded,
            documents_skipped: skipped,
        },
    )
    .with_warnings(warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::DocumentErrorDetails;

    fn manifest_of(entries: &[(&str, &str)]) -> Manifest {
        entries
            .iter()
            .map(|(hash, body)| (hash.to_string(), body.to_string()))
            .collect()
    }

    #[test]
    fn batches_preserve_manifest_order() {
        let mut entries = Vec::new();
        let bodies: Vec<String> = (0..250).map(|i| format!("query Q{i} {{ f }}")).collect();
        for (i, body) in bodies.iter().enumerate() {
            entries.push((format!("hash-{i:03}"), body.clone()));
        }
        let manifest: Manifest = entries.into_iter().collect();

        let (batches, skipped) = plan_batches(&manifest, &HashSet::new(), ManifestFormat::V1);
        assert_eq!(skipped, 0);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 100);
        assert_eq!(batches[1].len(), 100);
        assert_eq!(batches[2].len(), 50);
        assert_eq!(batches[0][0].hash, "hash-000");
        assert_eq!(batches[2][49].hash, "hash-249");
    }

    #[test]
    fn known_hashes_are_skipped_in_v2() {
        let manifest = manifest_of(&[
            ("sha256:AAAA", "query A { a }"),
            ("bbbb", "query B { b }"),
        ]);
        let known: HashSet<String> = ["aaaa".to_string()].into();
        let (batches, skipped) = plan_batches(&manifest, &known, ManifestFormat::V2);
        assert_eq!(skipped, 1);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].hash, "bbbb");
    }

    #[test]
    fn v1_hashes_are_uploaded_verbatim() {
        let manifest = manifest_of(&[("My-Operation", "query A { a }")]);
        let (batches, _) = plan_batches(&manifest, &HashSet::new(), ManifestFormat::V1);
        assert_eq!(batches[0][0].hash, "My-Operation");
    }

    #[test]
    fn upload_error_cites_the_buffered_document() {
        let batch = vec![
            DocumentInput {
                hash: "aaa".into(),
                body: "query A { a }".into(),
            },
            DocumentInput {
                hash: "bbb".into(),
                body: "q".repeat(100),
            },
        ];
        let error = upload_error(
            AddDocumentsError {
                message: "failed to persist documents".into(),
                details: Some(DocumentErrorDetails {
                    index: 1,
                    message: "document is not parsable".into(),
                }),
            },
            &batch,
        );
        let message = error.to_string();
        assert!(message.contains("Document: bbb"));
        assert!(message.contains(&format!("{}…", "q".repeat(40))));
    }

    #[test]
    fn upload_error_without_details_keeps_the_plain_message() {
        let error = upload_error(
            AddDocumentsError {
                message: "rate limited".into(),
                details: None,
            },
            &[],
        );
        assert_eq!(error.to_string(), "rate limited");
    }

    #[test]
    fn short_bodies_are_not_truncated() {
        assert_eq!(truncate_body("query A { a }"), "query A { a }");
    }
}
