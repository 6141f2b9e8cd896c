//! ClusterFlow cloud core
//!
//! Create-and-stabilize state machine for a single managed cluster.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │        host (clusterflow CLI, job runner)        │
//! │   persists ContinuationState between calls       │
//! └─────────────────┬───────────────────────────────┘
//!                   │ handle(descriptor, continuation)
//! ┌─────────────────▼───────────────────────────────┐
//! │                clusterflow-cloud                 │
//! │  ┌──────────────────┐  ┌─────────────────────┐  │
//! │  │ CredentialResolver│  │ ProvisioningDriver  │  │
//! │  │ secret -> client  │─▶│ create / poll step  │  │
//! │  └──────────────────┘  └─────────────────────┘  │
//! └───────┬─────────────────────────┬───────────────┘
//!         │                         │
//! ┌───────▼───────┐         ┌───────▼───────┐
//! │  SecretStore  │         │ ClusterClient │
//! │ (aws crate)   │         │ (gcp crate)   │
//! └───────────────┘         └───────────────┘
//! ```
//!
//! Each invocation performs at most one remote create-or-poll call and
//! returns a [`ProgressSignal`]. The host re-invokes with the continuation
//! carried by `InProgress` until a terminal signal comes back.

pub mod client;
pub mod driver;
pub mod error;
pub mod handler;
pub mod model;
pub mod resolver;
pub mod secret;
pub mod state;

// Re-exports
pub use client::{ClusterClient, ClusterSpec};
pub use driver::{DriverConfig, ProvisioningDriver, advance};
pub use error::{CloudError, Result, SecretError};
pub use handler::ProvisionHandler;
pub use model::{
    ContinuationState, MAX_STABILIZATION_RETRIES, OperationStatus, POLL_DELAY, ProgressSignal,
    ProvisioningState, RemoteOperation, ResourceDescriptor, TIMED_OUT_MESSAGE,
};
pub use resolver::{ClientFactory, CredentialResolver};
pub use secret::{SecretStore, SecretValue, fetch_secret};
pub use state::{ContinuationLock, ContinuationRecord, ContinuationStore};
