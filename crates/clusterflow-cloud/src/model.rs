//! Data model for the create-and-stabilize lifecycle

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of status polls allowed before the create is declared timed out
pub const MAX_STABILIZATION_RETRIES: u32 = 60;

/// Minimum spacing between two consecutive status polls
pub const POLL_DELAY: Duration = Duration::from_millis(5000);

/// Message surfaced when the retry budget is exhausted
pub const TIMED_OUT_MESSAGE: &str = "Timed out waiting for cluster to become available.";

/// Desired cluster, supplied by the host and never modified by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Project the cluster is created in
    pub project: String,

    /// Zone the cluster is created in
    pub zone: String,

    /// Cluster name
    pub name: String,

    /// Initial number of nodes
    pub initial_node_count: u32,

    /// Name of the secret holding the credential document
    pub secret: String,

    /// Region of the secret store holding `secret`
    pub secret_region: String,
}

impl ResourceDescriptor {
    /// Check that every field carries a usable value
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("project", &self.project),
            ("zone", &self.zone),
            ("name", &self.name),
            ("secret", &self.secret),
            ("secretRegion", &self.secret_region),
        ];

        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(CloudError::InvalidDescriptor(format!("{} must not be empty", field)));
        }

        if self.initial_node_count == 0 {
            return Err(CloudError::InvalidDescriptor(
                "initialNodeCount must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Identity used by hosts to key persisted continuation state
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.project, self.zone, self.name)
    }
}

/// The only state carried from one invocation to the next
///
/// Values are replaced on every re-entry, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationState {
    /// In-flight remote operation, `None` until the create has been issued
    #[serde(rename = "operationID", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Polls left before the create is declared timed out
    #[serde(rename = "stabilizationRetriesRemaining")]
    pub retries_remaining: u32,
}

impl ContinuationState {
    /// State for a first invocation: nothing started, full budget
    pub fn initial(budget: u32) -> Self {
        Self {
            operation_id: None,
            retries_remaining: budget,
        }
    }

    /// State right after a create was issued
    pub fn started(operation_id: impl Into<String>, budget: u32) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            retries_remaining: budget,
        }
    }

    /// Successor after one more unsuccessful poll
    pub fn after_poll(self) -> Self {
        Self {
            operation_id: self.operation_id,
            retries_remaining: self.retries_remaining.saturating_sub(1),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.retries_remaining == 0
    }
}

impl Default for ContinuationState {
    fn default() -> Self {
        Self::initial(MAX_STABILIZATION_RETRIES)
    }
}

/// Status of a remote long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Unspecified,
    Pending,
    Running,
    Done,
    Aborting,
    /// Any status string the service may add later
    Unrecognized(String),
}

impl OperationStatus {
    /// Parse the wire name used by the cluster service
    pub fn from_wire(status: &str) -> Self {
        match status {
            "STATUS_UNSPECIFIED" | "" => OperationStatus::Unspecified,
            "PENDING" => OperationStatus::Pending,
            "RUNNING" => OperationStatus::Running,
            "DONE" => OperationStatus::Done,
            "ABORTING" => OperationStatus::Aborting,
            other => OperationStatus::Unrecognized(other.to_string()),
        }
    }

    /// True for statuses after which the remote side will not complete the create
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            OperationStatus::Aborting
                | OperationStatus::Unspecified
                | OperationStatus::Unrecognized(_)
        )
    }
}

impl std::fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationStatus::Unspecified => write!(f, "STATUS_UNSPECIFIED"),
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::Running => write!(f, "RUNNING"),
            OperationStatus::Done => write!(f, "DONE"),
            OperationStatus::Aborting => write!(f, "ABORTING"),
            OperationStatus::Unrecognized(s) => write!(f, "{}", s),
        }
    }
}

/// Remote operation as observed by a poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOperation {
    pub id: String,
    pub status: OperationStatus,

    /// Human readable detail the service attached, if any
    pub detail: Option<String>,
}

impl RemoteOperation {
    pub fn new(id: impl Into<String>, status: OperationStatus) -> Self {
        Self {
            id: id.into(),
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Outcome of one invocation, handed back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressSignal {
    /// Not finished; the host must persist the continuation and re-invoke
    InProgress { continuation: ContinuationState },
    Success,
    Failed { message: String },
    /// Retry budget exhausted while the operation was still running
    TimedOut,
}

impl ProgressSignal {
    pub fn in_progress(continuation: ContinuationState) -> Self {
        ProgressSignal::InProgress { continuation }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ProgressSignal::Failed {
            message: message.into(),
        }
    }

    /// SUCCESS, FAILED and TIMED_OUT end the lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressSignal::InProgress { .. })
    }

    /// TIMED_OUT is a labeled kind of failure
    pub fn is_failure(&self) -> bool {
        matches!(self, ProgressSignal::Failed { .. } | ProgressSignal::TimedOut)
    }

    pub fn continuation(&self) -> Option<&ContinuationState> {
        match self {
            ProgressSignal::InProgress { continuation } => Some(continuation),
            _ => None,
        }
    }

    /// Message shown to the user for failures
    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressSignal::Failed { message } => Some(message),
            ProgressSignal::TimedOut => Some(TIMED_OUT_MESSAGE),
            _ => None,
        }
    }
}

/// Position in the create/poll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningState {
    NotStarted,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl ProvisioningState {
    /// State implied by a continuation handed to the driver
    pub fn of(continuation: Option<&ContinuationState>) -> Self {
        match continuation {
            Some(c) if c.is_exhausted() => ProvisioningState::TimedOut,
            Some(ContinuationState {
                operation_id: Some(_),
                ..
            }) => ProvisioningState::Polling,
            _ => ProvisioningState::NotStarted,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProvisioningState::Succeeded | ProvisioningState::Failed | ProvisioningState::TimedOut
        )
    }
}

impl From<&ProgressSignal> for ProvisioningState {
    fn from(signal: &ProgressSignal) -> Self {
        match signal {
            ProgressSignal::InProgress { .. } => ProvisioningState::Polling,
            ProgressSignal::Success => ProvisioningState::Succeeded,
            ProgressSignal::Failed { .. } => ProvisioningState::Failed,
            ProgressSignal::TimedOut => ProvisioningState::TimedOut,
        }
    }
}

impl std::fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningState::NotStarted => write!(f, "not started"),
            ProvisioningState::Polling => write!(f, "polling"),
            ProvisioningState::Succeeded => write!(f, "succeeded"),
            ProvisioningState::Failed => write!(f, "failed"),
            ProvisioningState::TimedOut => write!(f, "timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            project: "p".to_string(),
            zone: "z".to_string(),
            name: "c1".to_string(),
            initial_node_count: 3,
            secret: "gke/sa".to_string(),
            secret_region: "us-east-1".to_string(),
        }
    }

    #[test]
    fn test_descriptor_validation() {
        assert!(descriptor().validate().is_ok());

        let mut empty_zone = descriptor();
        empty_zone.zone = "  ".to_string();
        let err = empty_zone.validate().unwrap_err();
        assert!(err.to_string().contains("zone"));

        let mut no_nodes = descriptor();
        no_nodes.initial_node_count = 0;
        assert!(no_nodes.validate().is_err());
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "project": "p", "zone": "z", "name": "c1",
            "initialNodeCount": 3, "secret": "gke/sa", "secretRegion": "us-east-1"
        }"#;
        let parsed: ResourceDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, descriptor());
        assert_eq!(parsed.key(), "p/z/c1");
    }

    #[test]
    fn test_continuation_wire_keys() {
        let state = ContinuationState::started("op1", 60);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["operationID"], "op1");
        assert_eq!(json["stabilizationRetriesRemaining"], 60);

        let fresh: ContinuationState =
            serde_json::from_str(r#"{"stabilizationRetriesRemaining": 60}"#).unwrap();
        assert_eq!(fresh, ContinuationState::initial(60));
    }

    #[test]
    fn test_after_poll_keeps_operation() {
        let next = ContinuationState::started("op1", 1).after_poll();
        assert_eq!(next.operation_id.as_deref(), Some("op1"));
        assert_eq!(next.retries_remaining, 0);
        assert!(next.is_exhausted());
        assert_eq!(next.after_poll().retries_remaining, 0);
    }

    #[test]
    fn test_operation_status_from_wire() {
        assert_eq!(OperationStatus::from_wire("DONE"), OperationStatus::Done);
        assert_eq!(OperationStatus::from_wire("PENDING"), OperationStatus::Pending);
        assert_eq!(OperationStatus::from_wire(""), OperationStatus::Unspecified);
        assert_eq!(
            OperationStatus::from_wire("PAUSED"),
            OperationStatus::Unrecognized("PAUSED".to_string())
        );

        assert!(OperationStatus::Aborting.is_rejected());
        assert!(OperationStatus::Unspecified.is_rejected());
        assert!(OperationStatus::from_wire("PAUSED").is_rejected());
        assert!(!OperationStatus::Running.is_rejected());
        assert!(!OperationStatus::Done.is_rejected());
    }

    #[test]
    fn test_progress_signal_messages() {
        assert_eq!(ProgressSignal::TimedOut.message(), Some(TIMED_OUT_MESSAGE));
        assert!(ProgressSignal::TimedOut.is_failure());
        assert!(ProgressSignal::Success.is_terminal());
        assert!(!ProgressSignal::Success.is_failure());

        let running = ProgressSignal::in_progress(ContinuationState::started("op1", 60));
        assert!(!running.is_terminal());
        assert_eq!(running.continuation().unwrap().retries_remaining, 60);

        let json = serde_json::to_value(&running).unwrap();
        assert_eq!(json["status"], "IN_PROGRESS");
        assert_eq!(json["continuation"]["operationID"], "op1");
    }

    #[test]
    fn test_provisioning_state_of_continuation() {
        assert_eq!(ProvisioningState::of(None), ProvisioningState::NotStarted);
        assert_eq!(
            ProvisioningState::of(Some(&ContinuationState::default())),
            ProvisioningState::NotStarted
        );
        assert_eq!(
            ProvisioningState::of(Some(&ContinuationState::started("op1", 5))),
            ProvisioningState::Polling
        );
        assert_eq!(
            ProvisioningState::of(Some(&ContinuationState::started("op1", 0))),
            ProvisioningState::TimedOut
        );
        assert!(ProvisioningState::from(&ProgressSignal::Success).is_terminal());
    }
}
