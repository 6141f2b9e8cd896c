//! GCP provider error types

use clusterflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("Invalid credentials document: {0}")]
    InvalidCredentials(String),

    #[error("Unsupported credential type: {0}")]
    UnsupportedCredentialType(String),

    #[error("Token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("GKE API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<GcpError> for CloudError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::InvalidCredentials(_)
            | GcpError::UnsupportedCredentialType(_)
            | GcpError::Jwt(_) => CloudError::InvalidCredentials(err.to_string()),
            GcpError::TokenExchange(_) => CloudError::AuthenticationFailed(err.to_string()),
            GcpError::Api { .. } | GcpError::Http(_) | GcpError::JsonError(_) => {
                CloudError::ApiError(err.to_string())
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GcpError>;
