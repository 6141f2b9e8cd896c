//! GKE provider for ClusterFlow
//!
//! Implements the `ClusterClient` and `ClientFactory` seams of
//! `clusterflow-cloud` against the Google Kubernetes Engine REST API.
//!
//! # Requirements
//!
//! - A Google credentials JSON document (`service_account` or
//!   `authorized_user`), usually read from a secret store
//!
//! # Example
//!
//! ```ignore
//! use clusterflow_cloud::ClientFactory;
//! use clusterflow_cloud_gcp::GkeClientFactory;
//!
//! let factory = GkeClientFactory::new();
//! let credentials = factory.build_credentials(&service_account_json)?;
//! let client = factory.build_client(credentials)?;
//!
//! let operation_id = client.create_cluster("my-project", "us-central1-a", &spec).await?;
//! ```

pub mod credentials;
pub mod error;
pub mod gke;
pub mod token;

pub use credentials::{AuthorizedUser, GoogleCredentials, ServiceAccountKey};
pub use error::{GcpError, Result};
pub use gke::{ApiOperation, GKE_API_BASE, GkeClient};
pub use token::TokenProvider;

use clusterflow_cloud::ClientFactory;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds `GkeClient`s from credential documents
#[derive(Debug, Clone)]
pub struct GkeClientFactory {
    endpoint: String,
    timeout: Duration,
}

impl Default for GkeClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl GkeClientFactory {
    pub fn new() -> Self {
        Self {
            endpoint: GKE_API_BASE.to_string(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the API root for every client built
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ClientFactory for GkeClientFactory {
    type Credentials = GoogleCredentials;
    type Client = GkeClient;

    fn build_credentials(&self, secret: &[u8]) -> clusterflow_cloud::Result<GoogleCredentials> {
        let credentials = GoogleCredentials::from_slice(secret)?;
        tracing::debug!(principal = %credentials.principal(), "Parsed Google credentials");
        Ok(credentials)
    }

    fn build_client(&self, credentials: GoogleCredentials) -> clusterflow_cloud::Result<GkeClient> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| clusterflow_cloud::CloudError::ClientConstruction(e.to_string()))?;

        let tokens = TokenProvider::new(credentials, http.clone());
        Ok(GkeClient::new(http, tokens).with_endpoint(self.endpoint.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterflow_cloud::{ClusterClient, ClusterSpec};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_factory_builds_authenticated_client() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.user",
                "expires_in": 3600
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v1/projects/p/zones/z/clusters"))
            .and(header("authorization", "Bearer ya29.user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "operation-1",
                "status": "PENDING"
            })))
            .mount(&mock_server)
            .await;

        let document = serde_json::json!({
            "type": "authorized_user",
            "client_id": "cid",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "token_uri": format!("{}/token", mock_server.uri()),
        });

        let factory = GkeClientFactory::new().with_endpoint(mock_server.uri());
        let credentials = factory
            .build_credentials(document.to_string().as_bytes())
            .unwrap();
        let client = factory.build_client(credentials).unwrap();

        let spec = ClusterSpec {
            name: "c1".to_string(),
            initial_node_count: 3,
        };
        assert_eq!(
            client.create_cluster("p", "z", &spec).await.unwrap(),
            "operation-1"
        );
    }

    #[test]
    fn test_malformed_secret_maps_to_invalid_credentials() {
        let err = GkeClientFactory::new()
            .build_credentials(b"plain text")
            .unwrap_err();
        assert!(matches!(
            err,
            clusterflow_cloud::CloudError::InvalidCredentials(_)
        ));
    }
}
