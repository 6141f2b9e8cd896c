//! GKE REST API client
//!
//! Direct implementation of the two `projects.zones` calls the driver needs:
//! `clusters.create` and `operations.get`.

use crate::error::{GcpError, Result};
use crate::token::TokenProvider;
use async_trait::async_trait;
use clusterflow_cloud::{ClusterClient, ClusterSpec, OperationStatus, RemoteOperation};
use serde::{Deserialize, Serialize};

pub const GKE_API_BASE: &str = "https://container.googleapis.com";

/// Authenticated GKE client
pub struct GkeClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    endpoint: String,
}

impl GkeClient {
    pub fn new(http: reqwest::Client, tokens: TokenProvider) -> Self {
        Self {
            http,
            tokens,
            endpoint: GKE_API_BASE.to_string(),
        }
    }

    /// Point the client at another API root (emulators, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn zone_url(&self, project: &str, zone: &str) -> String {
        format!("{}/v1/projects/{}/zones/{}", self.endpoint, project, zone)
    }

    /// Issue a create and return the operation the service started
    pub async fn create(&self, project: &str, zone: &str, spec: &ClusterSpec) -> Result<ApiOperation> {
        let url = format!("{}/clusters", self.zone_url(project, zone));
        let token = self.tokens.token().await?;

        tracing::debug!(url = %url, cluster = %spec.name, "POST clusters.create");
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&CreateClusterRequest { cluster: spec })
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Read an operation by name
    pub async fn operation(&self, project: &str, zone: &str, name: &str) -> Result<ApiOperation> {
        let url = format!("{}/operations/{}", self.zone_url(project, zone), name);
        let token = self.tokens.token().await?;

        tracing::debug!(url = %url, "GET operations.get");
        let response = self.http.get(&url).bearer_auth(token).send().await?;

        Self::parse(response).await
    }

    async fn parse(response: reqwest::Response) -> Result<ApiOperation> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GcpError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ClusterClient for GkeClient {
    async fn create_cluster(
        &self,
        project: &str,
        zone: &str,
        spec: &ClusterSpec,
    ) -> clusterflow_cloud::Result<String> {
        let operation = self.create(project, zone, spec).await?;
        Ok(operation.name)
    }

    async fn get_operation(
        &self,
        project: &str,
        zone: &str,
        operation_id: &str,
    ) -> clusterflow_cloud::Result<RemoteOperation> {
        let operation = self.operation(project, zone, operation_id).await?;
        Ok(operation.into())
    }
}

#[derive(Debug, Serialize)]
struct CreateClusterRequest<'a> {
    cluster: &'a ClusterSpec,
}

/// Operation resource as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOperation {
    pub name: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub operation_type: Option<String>,

    #[serde(default)]
    pub status_message: Option<String>,

    #[serde(default)]
    pub error: Option<ApiStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

impl From<ApiOperation> for RemoteOperation {
    fn from(op: ApiOperation) -> Self {
        let detail = op
            .error
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .or(op.status_message.filter(|m| !m.is_empty()));
        let remote = RemoteOperation::new(op.name, OperationStatus::from_wire(&op.status));
        match detail {
            Some(detail) => remote.with_detail(detail),
            None => remote,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GkeClient {
        GkeClient::new(reqwest::Client::new(), TokenProvider::fixed("tok"))
            .with_endpoint(server.uri())
    }

    #[tokio::test]
    async fn test_create_cluster_returns_operation_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/projects/p/zones/z/clusters"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({
                "cluster": {"name": "c1", "initialNodeCount": 3}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "op1",
                "zone": "z",
                "operationType": "CREATE_CLUSTER",
                "status": "RUNNING"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let spec = ClusterSpec {
            name: "c1".to_string(),
            initial_node_count: 3,
        };
        let id = client(&mock_server)
            .create_cluster("p", "z", &spec)
            .await
            .unwrap();
        assert_eq!(id, "op1");
    }

    #[tokio::test]
    async fn test_get_operation_maps_status() {
        let mock_server = MockServer::start().await;

        for (name, status) in [("op-done", "DONE"), ("op-abort", "ABORTING"), ("op-new", "PAUSED")] {
            Mock::given(method("GET"))
                .and(path(format!("/v1/projects/p/zones/z/operations/{}", name)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "name": name,
                    "status": status,
                    "statusMessage": "quota exhausted"
                })))
                .mount(&mock_server)
                .await;
        }

        let client = client(&mock_server);

        let done = client.get_operation("p", "z", "op-done").await.unwrap();
        assert_eq!(done.status, OperationStatus::Done);

        let abort = client.get_operation("p", "z", "op-abort").await.unwrap();
        assert_eq!(abort.status, OperationStatus::Aborting);
        assert_eq!(abort.detail.as_deref(), Some("quota exhausted"));

        let new = client.get_operation("p", "z", "op-new").await.unwrap();
        assert_eq!(new.status, OperationStatus::Unrecognized("PAUSED".to_string()));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/projects/p/zones/z/clusters"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "error": {"code": 409, "message": "Already exists: c1", "status": "ALREADY_EXISTS"}
            })))
            .mount(&mock_server)
            .await;

        let spec = ClusterSpec {
            name: "c1".to_string(),
            initial_node_count: 1,
        };
        let err = client(&mock_server)
            .create_cluster("p", "z", &spec)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("409"));
        assert!(message.contains("Already exists: c1"));
    }
}
