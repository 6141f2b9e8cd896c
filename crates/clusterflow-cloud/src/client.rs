//! Remote cluster service abstraction

use crate::error::Result;
use crate::model::{RemoteOperation, ResourceDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Cluster settings sent with a create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub initial_node_count: u32,
}

impl From<&ResourceDescriptor> for ClusterSpec {
    fn from(descriptor: &ResourceDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            initial_node_count: descriptor.initial_node_count,
        }
    }
}

/// Authenticated client for the remote cluster service
///
/// Implementations issue exactly one remote request per call and do not
/// retry; transient transport errors are the host's concern.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Start creating a cluster and return the id of the long-running operation
    async fn create_cluster(&self, project: &str, zone: &str, spec: &ClusterSpec)
    -> Result<String>;

    /// Read the current state of a long-running operation
    async fn get_operation(
        &self,
        project: &str,
        zone: &str,
        operation_id: &str,
    ) -> Result<RemoteOperation>;
}

#[async_trait]
impl<T: ClusterClient + ?Sized> ClusterClient for Box<T> {
    async fn create_cluster(
        &self,
        project: &str,
        zone: &str,
        spec: &ClusterSpec,
    ) -> Result<String> {
        (**self).create_cluster(project, zone, spec).await
    }

    async fn get_operation(
        &self,
        project: &str,
        zone: &str,
        operation_id: &str,
    ) -> Result<RemoteOperation> {
        (**self).get_operation(project, zone, operation_id).await
    }
}
