//! Entry point invoked by the host on every re-entry

use crate::driver::ProvisioningDriver;
use crate::model::{ContinuationState, ProgressSignal, ResourceDescriptor};
use crate::resolver::{ClientFactory, CredentialResolver};
use crate::secret::SecretStore;
use tracing::warn;

/// Resolves a client and advances the driver by one step
pub struct ProvisionHandler<S, F> {
    resolver: CredentialResolver<S, F>,
    driver: ProvisioningDriver,
}

impl<S, F> ProvisionHandler<S, F>
where
    S: SecretStore,
    F: ClientFactory,
{
    pub fn new(resolver: CredentialResolver<S, F>, driver: ProvisioningDriver) -> Self {
        Self { resolver, driver }
    }

    pub fn driver(&self) -> &ProvisioningDriver {
        &self.driver
    }

    /// Handle one invocation
    ///
    /// `continuation` is whatever the host persisted from the previous
    /// `InProgress` signal, or `None` on the first call.
    pub async fn handle(
        &self,
        descriptor: &ResourceDescriptor,
        continuation: Option<ContinuationState>,
    ) -> ProgressSignal {
        // An exhausted budget times out whatever else is wrong
        if let Some(exhausted) = continuation.as_ref().filter(|c| c.is_exhausted()) {
            warn!(
                cluster = %descriptor.name,
                operation_id = ?exhausted.operation_id,
                "Retry budget exhausted"
            );
            return ProgressSignal::TimedOut;
        }

        if let Err(e) = descriptor.validate() {
            warn!(error = %e, "Rejecting descriptor");
            return ProgressSignal::failed(e.to_string());
        }

        let client = match self
            .resolver
            .resolve(&descriptor.secret, &descriptor.secret_region)
            .await
        {
            Ok(client) => client,
            Err(e) => {
                warn!(cluster = %descriptor.name, error = %e, "Credential resolution failed");
                return ProgressSignal::failed(e.to_string());
            }
        };

        self.driver.advance(descriptor, &client, continuation).await
    }
}
