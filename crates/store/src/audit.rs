//! The immutable audit log of versioning events.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tapestry_core::{LockVersion, SnapshotId, UserId, WorkflowId};

use crate::error::StoreError;

/// An audit record of a versioning event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEntry {
    /// A snapshot was created for a newly saved version.
    SnapshotCreated {
        /// Who performed the save.
        actor: UserId,
        /// The workflow that was saved.
        workflow_id: WorkflowId,
        /// The snapshot that captured the new version.
        snapshot_id: SnapshotId,
        /// The version the snapshot captured.
        lock_version: LockVersion,
        /// When the event was recorded.
        logged_at: DateTime<Utc>,
    },
    /// A workflow was soft-deleted.
    WorkflowDeleted {
        /// Who deleted it.
        actor: UserId,
        /// The workflow that was deleted.
        workflow_id: WorkflowId,
        /// When the event was recorded.
        logged_at: DateTime<Utc>,
    },
}

impl AuditEntry {
    /// The workflow this entry concerns.
    #[must_use]
    pub fn workflow_id(&self) -> WorkflowId {
        match self {
            Self::SnapshotCreated { workflow_id, .. } | Self::WorkflowDeleted { workflow_id, .. } => {
                *workflow_id
            }
        }
    }

    /// When this entry was recorded.
    #[must_use]
    pub fn logged_at(&self) -> DateTime<Utc> {
        match self {
            Self::SnapshotCreated { logged_at, .. } | Self::WorkflowDeleted { logged_at, .. } => {
                *logged_at
            }
        }
    }
}

/// Destination for audit records.
///
/// Recording happens inside the save transaction: a failed record fails the
/// save, so an audit entry and its snapshot either both exist or neither
/// does.
pub trait AuditSink: Send + Sync {
    /// Append a record to the log.
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError>;

    /// All records for a workflow, in insertion order.
    fn entries_for(&self, workflow_id: WorkflowId) -> Vec<AuditEntry>;
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.entries.write().push(entry);
        Ok(())
    }

    fn entries_for(&self, workflow_id: WorkflowId) -> Vec<AuditEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.workflow_id() == workflow_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_created(workflow_id: WorkflowId) -> AuditEntry {
        AuditEntry::SnapshotCreated {
            actor: UserId::v4(),
            workflow_id,
            snapshot_id: SnapshotId::v4(),
            lock_version: LockVersion::new(2),
            logged_at: Utc::now(),
        }
    }

    #[test]
    fn records_are_returned_in_insertion_order() {
        let sink = MemoryAuditSink::new();
        let workflow_id = WorkflowId::v4();

        sink.record(snapshot_created(workflow_id)).unwrap();
        sink.record(AuditEntry::WorkflowDeleted {
            actor: UserId::v4(),
            workflow_id,
            logged_at: Utc::now(),
        })
        .unwrap();

        let entries = sink.entries_for(workflow_id);
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0], AuditEntry::SnapshotCreated { .. }));
        assert!(matches!(entries[1], AuditEntry::WorkflowDeleted { .. }));
    }

    #[test]
    fn entries_are_scoped_per_workflow() {
        let sink = MemoryAuditSink::new();
        let doc_a = WorkflowId::v4();
        let doc_b = WorkflowId::v4();

        sink.record(snapshot_created(doc_a)).unwrap();
        sink.record(snapshot_created(doc_b)).unwrap();

        assert_eq!(sink.entries_for(doc_a).len(), 1);
        assert_eq!(sink.entries_for(doc_b).len(), 1);
        assert!(sink.entries_for(WorkflowId::v4()).is_empty());
    }

    #[test]
    fn audit_entry_serde_tagged_format() {
        let entry = snapshot_created(WorkflowId::v4());
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"], "snapshot_created");
        assert_eq!(json["lock_version"], 2);
    }

    #[test]
    fn audit_entry_serde_roundtrip() {
        let entry = snapshot_created(WorkflowId::v4());
        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
