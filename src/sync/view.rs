//! Sync View
//!
//! The merge of a tracked list with one enrichment result. A view is built
//! whole for every synchronization and never patched afterwards.

use crate::enrichment::{EnrichmentBatch, EnrichmentError, EnrichmentRecord};
use crate::storage::{Identifier, TrackedList};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Resolution state of one entry
///
/// Within one synchronization an entry moves `Pending → Enriched` or
/// `Pending → Unavailable`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    /// The batch call has not completed yet
    Pending,
    /// The remote returned a record for this identifier
    Enriched { record: EnrichmentRecord },
    /// No record is available for this identifier
    Unavailable { reason: UnavailableReason },
}

/// Why an entry has no record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The batch succeeded but did not include this identifier
    NotReturned,
    /// The whole batch failed
    RemoteUnavailable(String),
}

/// One row of a view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEntry {
    pub id: Identifier,
    #[serde(flatten)]
    pub status: EntryStatus,
}

impl ViewEntry {
    pub fn record(&self) -> Option<&EnrichmentRecord> {
        match &self.status {
            EntryStatus::Enriched { record } => Some(record),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, EntryStatus::Pending)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.status, EntryStatus::Unavailable { .. })
    }
}

/// Snapshot of a namespace for the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncView {
    /// Namespace key the view belongs to
    pub namespace: String,
    /// Sequence number of the synchronization that produced the view
    pub sequence: u64,
    /// When the view was built
    pub generated_at: DateTime<Utc>,
    /// One entry per tracked identifier, in list order
    pub entries: Vec<ViewEntry>,
    /// Set when the batch call failed as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
    /// Set when local persistence failed and the list is served from memory or defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_warning: Option<String>,
}

impl SyncView {
    fn build(namespace: &str, sequence: u64, entries: Vec<ViewEntry>) -> Self {
        Self {
            namespace: namespace.to_string(),
            sequence,
            generated_at: Utc::now(),
            entries,
            remote_error: None,
            storage_warning: None,
        }
    }

    /// Every identifier marked `Pending`
    pub fn pending(namespace: &str, sequence: u64, list: &TrackedList) -> Self {
        let entries = list
            .iter()
            .map(|id| ViewEntry {
                id: id.clone(),
                status: EntryStatus::Pending,
            })
            .collect();
        Self::build(namespace, sequence, entries)
    }

    /// Merge `list` with the outcome of a batch call
    ///
    /// A failed batch marks every identifier unavailable; a successful one
    /// marks only the identifiers it omitted.
    pub fn resolved(
        namespace: &str,
        sequence: u64,
        list: &TrackedList,
        outcome: Result<EnrichmentBatch, EnrichmentError>,
    ) -> Self {
        match outcome {
            Ok(mut batch) => {
                let entries = list
                    .iter()
                    .map(|id| {
                        let status = match batch.remove(id) {
                            Some(record) => EntryStatus::Enriched { record },
                            None => EntryStatus::Unavailable {
                                reason: UnavailableReason::NotReturned,
                            },
                        };
                        ViewEntry {
                            id: id.clone(),
                            status,
                        }
                    })
                    .collect();
                Self::build(namespace, sequence, entries)
            }
            Err(e) => {
                let message = e.to_string();
                let entries = list
                    .iter()
                    .map(|id| ViewEntry {
                        id: id.clone(),
                        status: EntryStatus::Unavailable {
                            reason: UnavailableReason::RemoteUnavailable(message.clone()),
                        },
                    })
                    .collect();
                let mut view = Self::build(namespace, sequence, entries);
                view.remote_error = Some(message);
                view
            }
        }
    }

    /// Builder method: attach a storage warning
    pub fn with_storage_warning(mut self, warning: Option<String>) -> Self {
        self.storage_warning = warning;
        self
    }

    /// Entry for a raw identifier string
    pub fn get(&self, id: &str) -> Option<&ViewEntry> {
        self.entries.iter().find(|e| e.id.as_str() == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once no entry is pending
    pub fn is_complete(&self) -> bool {
        !self.entries.iter().any(ViewEntry::is_pending)
    }

    /// Number of entries with a record
    pub fn enriched_count(&self) -> usize {
        self.entries.iter().filter(|e| e.record().is_some()).count()
    }
}
