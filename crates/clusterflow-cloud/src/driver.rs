//! Provisioning driver
//!
//! Runs one step of the create/poll state machine per invocation:
//!
//! ```text
//! NOT_STARTED --create--> POLLING --DONE--> SUCCEEDED
//!                            |  \--ABORTING / UNSPECIFIED / unrecognized--> FAILED
//!                            \--still running--> POLLING (budget - 1)
//! budget == 0 on entry -----------------------------------------------> TIMED_OUT
//! ```
//!
//! The driver holds no state of its own. Everything needed to resume lives in
//! the `ContinuationState` returned inside `ProgressSignal::InProgress`.

use crate::client::{ClusterClient, ClusterSpec};
use crate::model::{
    ContinuationState, MAX_STABILIZATION_RETRIES, OperationStatus, POLL_DELAY, ProgressSignal,
    ResourceDescriptor,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tunables for the driver
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Polls allowed after the create was issued
    pub max_retries: u32,

    /// Sleep before reporting a still-running operation
    pub poll_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_STABILIZATION_RETRIES,
            poll_delay: POLL_DELAY,
        }
    }
}

impl DriverConfig {
    /// Upper bound on the time spent polling one operation
    pub fn max_wait(&self) -> Duration {
        self.poll_delay.saturating_mul(self.max_retries)
    }
}

/// Drives the create-and-stabilize lifecycle of one cluster
#[derive(Debug, Clone, Default)]
pub struct ProvisioningDriver {
    config: DriverConfig,
}

impl ProvisioningDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Continuation used when the host has none yet
    pub fn initial_continuation(&self) -> ContinuationState {
        ContinuationState::initial(self.config.max_retries)
    }

    /// Advance the state machine by one step
    ///
    /// Performs at most one remote call. Never returns an error: every fatal
    /// condition is reported as `Failed` or `TimedOut`.
    pub async fn advance<C>(
        &self,
        descriptor: &ResourceDescriptor,
        client: &C,
        continuation: Option<ContinuationState>,
    ) -> ProgressSignal
    where
        C: ClusterClient + ?Sized,
    {
        let continuation = continuation.unwrap_or_else(|| self.initial_continuation());

        if continuation.is_exhausted() {
            warn!(
                cluster = %descriptor.name,
                operation_id = ?continuation.operation_id,
                "Retry budget exhausted"
            );
            return ProgressSignal::TimedOut;
        }

        match continuation.operation_id.as_deref() {
            None => self.start(descriptor, client).await,
            Some(operation_id) => {
                let operation_id = operation_id.to_string();
                self.poll(descriptor, client, &operation_id, continuation)
                    .await
            }
        }
    }

    async fn start<C>(&self, descriptor: &ResourceDescriptor, client: &C) -> ProgressSignal
    where
        C: ClusterClient + ?Sized,
    {
        let spec = ClusterSpec::from(descriptor);
        info!(
            cluster = %spec.name,
            project = %descriptor.project,
            zone = %descriptor.zone,
            nodes = spec.initial_node_count,
            "Creating cluster"
        );

        match client
            .create_cluster(&descriptor.project, &descriptor.zone, &spec)
            .await
        {
            Ok(operation_id) => {
                info!(cluster = %spec.name, operation_id = %operation_id, "Create accepted");
                ProgressSignal::in_progress(ContinuationState::started(
                    operation_id,
                    self.config.max_retries,
                ))
            }
            Err(e) => {
                warn!(cluster = %spec.name, error = %e, "Create request failed");
                ProgressSignal::failed(e.to_string())
            }
        }
    }

    async fn poll<C>(
        &self,
        descriptor: &ResourceDescriptor,
        client: &C,
        operation_id: &str,
        continuation: ContinuationState,
    ) -> ProgressSignal
    where
        C: ClusterClient + ?Sized,
    {
        let operation = match client
            .get_operation(&descriptor.project, &descriptor.zone, operation_id)
            .await
        {
            Ok(operation) => operation,
            Err(e) => {
                warn!(operation_id = %operation_id, error = %e, "Operation lookup failed");
                return ProgressSignal::failed(e.to_string());
            }
        };

        debug!(
            operation_id = %operation_id,
            status = %operation.status,
            retries_remaining = continuation.retries_remaining,
            "Polled operation"
        );

        if operation.status == OperationStatus::Done {
            info!(cluster = %descriptor.name, operation_id = %operation_id, "Cluster created");
            return ProgressSignal::Success;
        }

        if operation.status.is_rejected() {
            let message = match operation.detail {
                Some(detail) => format!(
                    "Operation {} ended with status {}: {}",
                    operation_id, operation.status, detail
                ),
                None => format!(
                    "Operation {} ended with status {}",
                    operation_id, operation.status
                ),
            };
            warn!(operation_id = %operation_id, status = %operation.status, "Create rejected");
            return ProgressSignal::failed(message);
        }

        tokio::time::sleep(self.config.poll_delay).await;
        ProgressSignal::in_progress(continuation.after_poll())
    }
}

/// Advance with the fixed retry budget and poll delay
pub async fn advance<C>(
    descriptor: &ResourceDescriptor,
    client: &C,
    continuation: Option<ContinuationState>,
) -> ProgressSignal
where
    C: ClusterClient + ?Sized,
{
    ProvisioningDriver::default()
        .advance(descriptor, client, continuation)
        .await
}
