//! Credential resolver
//!
//! Turns a secret reference into an authenticated cluster client in three
//! steps: fetch the secret, parse it into credentials, build the client.
//! Nothing is cached; each invocation resolves from scratch.

use crate::client::ClusterClient;
use crate::error::Result;
use crate::secret::{SecretStore, fetch_secret};

/// Builds authenticated clients from raw credential material
pub trait ClientFactory: Send + Sync {
    type Credentials: Send;
    type Client: ClusterClient;

    /// Parse a secret payload into credentials
    fn build_credentials(&self, secret: &[u8]) -> Result<Self::Credentials>;

    /// Bind a client to the given credentials
    fn build_client(&self, credentials: Self::Credentials) -> Result<Self::Client>;
}

/// Secret store plus client factory
pub struct CredentialResolver<S, F> {
    store: S,
    factory: F,
}

impl<S, F> CredentialResolver<S, F>
where
    S: SecretStore,
    F: ClientFactory,
{
    pub fn new(store: S, factory: F) -> Self {
        Self { store, factory }
    }

    /// Resolve `secret_ref` in `region` into an authenticated client
    pub async fn resolve(&self, secret_ref: &str, region: &str) -> Result<F::Client> {
        let secret = fetch_secret(&self.store, secret_ref, region).await?;
        let credentials = self.factory.build_credentials(&secret)?;
        let client = self.factory.build_client(credentials)?;
        tracing::debug!(secret = %secret_ref, "Resolved cluster client");
        Ok(client)
    }
}
