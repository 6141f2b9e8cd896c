//! Cloud provisioning error types

use thiserror::Error;

/// Provisioning errors
///
/// Every variant is fatal for the current invocation. The driver and the
/// entry point turn them into a `ProgressSignal::Failed` carrying the
/// rendered message rather than propagating them to the host.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid resource descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Secret retrieval failed: {0}")]
    Secret(#[from] SecretError),

    #[error("Malformed secret payload: {0}")]
    MalformedSecret(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Client construction failed: {0}")]
    ClientConstruction(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Secret store failures, one variant per condition the store reports
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("cannot decrypt secret {0} with the configured key")]
    DecryptionFailure(String),

    #[error("secret store internal error while reading {0}")]
    InternalServiceError(String),

    #[error("invalid parameter for secret {0}")]
    InvalidParameter(String),

    #[error("invalid request for secret {0} in its current state")]
    InvalidRequest(String),

    #[error("secret {0} not found")]
    ResourceNotFound(String),

    #[error("secret {0} has neither a string nor a binary value")]
    Empty(String),

    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CloudError>;
