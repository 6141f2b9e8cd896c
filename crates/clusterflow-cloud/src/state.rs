//! Continuation persistence for hosts
//!
//! The core never remembers anything between invocations. A host that wants
//! to survive restarts stores the last `ContinuationState` here, one JSON
//! file per cluster identity, and hands it back on the next invocation.

use crate::error::{CloudError, Result};
use crate::model::{ContinuationState, ResourceDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const RECORD_VERSION: u32 = 1;
const LOCK_STALE_AFTER_HOURS: i64 = 1;

/// Persisted continuation plus bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationRecord {
    /// Record format version
    pub version: u32,

    /// `project/zone/name` of the cluster
    pub resource: String,

    pub continuation: ContinuationState,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContinuationRecord {
    pub fn new(resource: impl Into<String>, continuation: ContinuationState) -> Self {
        Self {
            version: RECORD_VERSION,
            resource: resource.into(),
            continuation,
            updated_at: Utc::now(),
        }
    }
}

/// File-backed store of continuation records
pub struct ContinuationStore {
    state_dir: PathBuf,
}

impl ContinuationStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().to_path_buf(),
        }
    }

    /// File stem for a cluster identity
    fn file_stem(descriptor: &ResourceDescriptor) -> String {
        descriptor
            .key()
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
                _ => '_',
            })
            .collect()
    }

    fn record_path(&self, descriptor: &ResourceDescriptor) -> PathBuf {
        self.state_dir
            .join(format!("{}.json", Self::file_stem(descriptor)))
    }

    fn backup_path(&self, descriptor: &ResourceDescriptor) -> PathBuf {
        self.state_dir
            .join(format!("{}.json.backup", Self::file_stem(descriptor)))
    }

    fn lock_path(&self, descriptor: &ResourceDescriptor) -> PathBuf {
        self.state_dir
            .join(format!("{}.lock", Self::file_stem(descriptor)))
    }

    async fn ensure_state_dir(&self) -> Result<()> {
        if !self.state_dir.exists() {
            fs::create_dir_all(&self.state_dir).await?;
            tracing::debug!("Created state directory: {}", self.state_dir.display());
        }
        Ok(())
    }

    /// Load the stored continuation, `None` when nothing was started yet
    pub async fn load(&self, descriptor: &ResourceDescriptor) -> Result<Option<ContinuationState>> {
        let path = self.record_path(descriptor);
        if !path.exists() {
            tracing::debug!(resource = %descriptor.key(), "No stored continuation");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let record: ContinuationRecord = serde_json::from_str(&content)?;

        if record.version > RECORD_VERSION {
            return Err(CloudError::StateError(format!(
                "Record version {} is newer than supported version {}",
                record.version, RECORD_VERSION
            )));
        }

        if record.resource != descriptor.key() {
            return Err(CloudError::StateError(format!(
                "{} belongs to {}, not {}",
                path.display(),
                record.resource,
                descriptor.key()
            )));
        }

        tracing::debug!(
            resource = %record.resource,
            operation_id = ?record.continuation.operation_id,
            retries_remaining = record.continuation.retries_remaining,
            "Loaded continuation"
        );
        Ok(Some(record.continuation))
    }

    /// Replace the stored continuation, keeping the previous one as backup
    pub async fn save(
        &self,
        descriptor: &ResourceDescriptor,
        continuation: &ContinuationState,
    ) -> Result<()> {
        self.ensure_state_dir().await?;

        let path = self.record_path(descriptor);
        let backup = self.backup_path(descriptor);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let record = ContinuationRecord::new(descriptor.key(), continuation.clone());
        let content = serde_json::to_string_pretty(&record)?;
        fs::write(&path, content).await?;

        tracing::debug!(resource = %record.resource, "Saved continuation");
        Ok(())
    }

    /// Forget the stored continuation once the lifecycle has ended
    pub async fn clear(&self, descriptor: &ResourceDescriptor) -> Result<()> {
        for path in [self.record_path(descriptor), self.backup_path(descriptor)] {
            if path.exists() {
                fs::remove_file(&path).await?;
            }
        }
        tracing::debug!(resource = %descriptor.key(), "Cleared continuation");
        Ok(())
    }

    /// Take the advisory lock guarding one cluster identity
    pub async fn acquire_lock(&self, descriptor: &ResourceDescriptor) -> Result<ContinuationLock> {
        self.ensure_state_dir().await?;

        let lock_path = self.lock_path(descriptor);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < LOCK_STALE_AFTER_HOURS {
                return Err(CloudError::LockError(format!(
                    "{} is locked by {} since {}",
                    descriptor.key(),
                    lock_info.holder,
                    lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!(resource = %descriptor.key(), "Acquired lock");
        Ok(ContinuationLock {
            lock_path,
            released: false,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for a cluster lock
pub struct ContinuationLock {
    lock_path: PathBuf,
    released: bool,
}

impl ContinuationLock {
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for ContinuationLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}
