//! Secret store abstraction

use crate::error::{CloudError, Result, SecretError};
use async_trait::async_trait;
use base64::Engine;

/// Value returned by a secret store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretValue {
    /// UTF-8 text, used as-is
    Text(String),

    /// Base64 text of a binary payload
    Binary(Vec<u8>),
}

impl SecretValue {
    /// Payload bytes with binary values base64-decoded
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            SecretValue::Text(text) => Ok(text.into_bytes()),
            SecretValue::Binary(encoded) => {
                // Stores may wrap long base64 lines
                let compact: Vec<u8> = encoded
                    .into_iter()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact)
                    .map_err(|e| {
                        CloudError::MalformedSecret(format!("binary secret is not base64: {}", e))
                    })
            }
        }
    }
}

/// Long-lived secret material, looked up by name within a region
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(
        &self,
        name: &str,
        region: &str,
    ) -> std::result::Result<SecretValue, SecretError>;
}

/// Fetch a secret and return its decoded payload
pub async fn fetch_secret<S>(store: &S, name: &str, region: &str) -> Result<Vec<u8>>
where
    S: SecretStore + ?Sized,
{
    tracing::debug!(secret = %name, region = %region, "Fetching secret");
    let value = store.get_secret(name, region).await?;
    value.into_bytes()
}
