//! HTTP client for the registry API.
//!
//! Requests are JSON-RPC style documents POSTed to the registry
//! endpoint with a bearer token. Any non-2xx status, transport error,
//! or error payload becomes [`CliError::Api`] carrying the aggregated
//! upstream messages and the cleaned `x-request-id` as a correlation
//! reference. Fail-fast: one attempt, explicit timeout, no retries.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::CliError;

use super::types::{
    AddDocumentsInput, AddDocumentsResponse, CreateAppDeploymentInput, CreatedAppDeployment,
    DocumentHashesResponse, LatestVersionResponse, SchemaCheckInput, SchemaCheckResponse,
    TargetRef,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("schemactl/", env!("CARGO_PKG_VERSION"));

/// Request ids may arrive as a comma-joined chain of proxy hops; only
/// the first entry identifies the upstream request.
pub fn clean_request_id(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorEntry {
    message: String,
}

#[derive(Debug, serde::Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

pub struct RegistryClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RegistryClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Result<Self, CliError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| CliError::Api {
                message: format!("failed to construct HTTP client: {error}"),
                reference: None,
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    async fn post<I: Serialize, O: DeserializeOwned>(
        &self,
        operation: &'static str,
        input: &I,
    ) -> Result<O, CliError> {
        debug!(operation, endpoint = %self.endpoint, "registry request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "operation": operation, "input": input }))
            .send()
            .await
            .map_err(|error| CliError::Api {
                message: format!("registry request failed: {error}"),
                reference: None,
            })?;

        let reference = clean_request_id(
            response
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok()),
        );

        let status = response.status();
        let body: ApiResponse<O> = response.json().await.map_err(|error| CliError::Api {
            message: format!("registry returned an unreadable response: {error}"),
            reference: reference.clone(),
        })?;

        if !body.errors.is_empty() {
            let message = body
                .errors
                .iter()
                .map(|entry| entry.message.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(CliError::Api { message, reference });
        }

        if !status.is_success() {
            return Err(CliError::Api {
                message: format!("registry responded with {status}"),
                reference,
            });
        }

        body.data.ok_or(CliError::Api {
            message: "registry response carried no data".into(),
            reference,
        })
    }

    pub async fn schema_check(
        &self,
        input: &SchemaCheckInput,
    ) -> Result<SchemaCheckResponse, CliError> {
        self.post("schemaCheck", input).await
    }

    pub async fn latest_valid_schema(&self) -> Result<Option<String>, CliError> {
        let response: LatestVersionResponse = self.post("latestValidVersion", &json!({})).await?;
        Ok(response.sdl)
    }

    pub async fn create_app_deployment(
        &self,
        input: &CreateAppDeploymentInput,
    ) -> Result<CreatedAppDeployment, CliError> {
        self.post("createAppDeployment", input).await
    }

    pub async fn app_deployment_document_hashes(
        &self,
        target: Option<&TargetRef>,
        app_name: &str,
    ) -> Result<Vec<String>, CliError> {
        let response: DocumentHashesResponse = self
            .post(
                "appDeploymentDocumentHashes",
                &json!({ "target": target, "appName": app_name }),
            )
            .await?;
        Ok(response.hashes)
    }

    pub async fn add_documents(
        &self,
        input: &AddDocumentsInput,
    ) -> Result<AddDocumentsResponse, CliError> {
        self.post("addDocumentsToAppDeployment", input).await
    }
}
