//! Record types for reconciliation.

use crate::{ExternalKey, RemoteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key carried by remote records that were never tagged with an external key.
pub const UNTAGGED_KEY: ExternalKey = -1;

/// Classification of a record after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordStatus {
    /// Freshly read from either side, not yet classified
    #[default]
    Unknown,
    /// Exists on both sides with the same name
    Unchanged,
    /// Exists on both sides but the name differs
    Different,
    /// Queued for creation, or created remotely once `remote_id` is set
    Added,
    /// The remote system rejected the creation
    FailedToAdd,
    /// Exists remotely but not in the reference set
    Missing,
}

impl RecordStatus {
    /// All statuses, in declaration order.
    pub const ALL: [RecordStatus; 6] = [
        RecordStatus::Unknown,
        RecordStatus::Unchanged,
        RecordStatus::Different,
        RecordStatus::Added,
        RecordStatus::FailedToAdd,
        RecordStatus::Missing,
    ];
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Unknown => "Unknown",
            RecordStatus::Unchanged => "Unchanged",
            RecordStatus::Different => "Different",
            RecordStatus::Added => "Added",
            RecordStatus::FailedToAdd => "FailedToAdd",
            RecordStatus::Missing => "Missing",
        };
        f.write_str(s)
    }
}

/// A named record keyed by an external company identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Identifier assigned by the remote system (empty until created there)
    #[serde(default)]
    pub remote_id: RemoteId,
    /// Human-readable label, the only attribute compared across sides
    pub name: String,
    /// Join key against the remote snapshot
    pub external_key: ExternalKey,
    /// Reconciliation status
    #[serde(default)]
    pub status: RecordStatus,
}

impl Record {
    /// Create a record read from the reference dataset.
    pub fn reference(name: impl Into<String>, external_key: ExternalKey) -> Self {
        Self {
            remote_id: RemoteId::new(),
            name: name.into(),
            external_key,
            status: RecordStatus::Unknown,
        }
    }

    /// Create a record read from the remote system.
    pub fn remote(
        remote_id: impl Into<RemoteId>,
        name: impl Into<String>,
        external_key: ExternalKey,
    ) -> Self {
        Self {
            remote_id: remote_id.into(),
            name: name.into(),
            external_key,
            status: RecordStatus::Unknown,
        }
    }

    /// Whether this record carries a real external key.
    pub fn is_tagged(&self) -> bool {
        self.external_key != UNTAGGED_KEY
    }

    /// Whether the remote system has assigned an identifier.
    pub fn is_resolved(&self) -> bool {
        !self.remote_id.is_empty()
    }

    /// `Added` without a remote identifier: the creation outcome is unknown.
    pub fn is_unresolved_add(&self) -> bool {
        self.status == RecordStatus::Added && !self.is_resolved()
    }

    /// Record a confirmed creation.
    pub fn mark_added(&mut self, remote_id: impl Into<RemoteId>) {
        self.remote_id = remote_id.into();
        self.status = RecordStatus::Added;
    }

    /// Record a rejected creation.
    pub fn mark_failed(&mut self) {
        self.status = RecordStatus::FailedToAdd;
    }
}
