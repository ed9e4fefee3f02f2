//! Reconciliation of the reference dataset against the remote snapshot.
//!
//! # Algorithm
//!
//! 1. Fetch the remote records (failure handled by [`FetchFailurePolicy`])
//! 2. Index remote and reference records by external key, last write wins
//! 3. Classify each reference record: `Unchanged`, `Different` or `Added`
//! 4. Mark remote records whose key is absent from the reference set `Missing`
//! 5. Propagate the `Added` records in one batch, if there are any
//! 6. Merge both sides by key, reference records overwriting remote ones

use crate::error::{Error, Result};
use crate::propagate::Propagator;
use crate::record::RecordStatus;
use crate::remote::{Fetcher, Session};
use crate::{ExternalKey, Record};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// What to do when the remote snapshot cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchFailurePolicy {
    /// Treat the snapshot as empty: every reference record is resubmitted (default).
    /// Favors duplicate creation over silently losing records.
    #[default]
    ProceedEmpty,
    /// Stop and return [`Error::Fetch`].
    Abort,
}

/// Options for a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOptions {
    pub on_fetch_failure: FetchFailurePolicy,
    /// Reclassify `Added` records left without a remote id as `FailedToAdd`.
    pub demote_unresolved: bool,
}

/// Count of records per status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub unknown: usize,
    pub unchanged: usize,
    pub different: usize,
    pub added: usize,
    pub failed_to_add: usize,
    pub missing: usize,
    /// `Added` records without a remote id (subset of `added`)
    pub unresolved: usize,
}

impl StatusSummary {
    pub fn count(&self, status: RecordStatus) -> usize {
        match status {
            RecordStatus::Unknown => self.unknown,
            RecordStatus::Unchanged => self.unchanged,
            RecordStatus::Different => self.different,
            RecordStatus::Added => self.added,
            RecordStatus::FailedToAdd => self.failed_to_add,
            RecordStatus::Missing => self.missing,
        }
    }
}

impl fmt::Display for StatusSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unchanged, {} different, {} added ({} unresolved), {} failed, {} missing",
            self.unchanged,
            self.different,
            self.added,
            self.unresolved,
            self.failed_to_add,
            self.missing
        )
    }
}

/// Result of reconciliation: at most one record per external key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileResult {
    /// Merged records, ascending by external key
    pub records: Vec<Record>,
}

impl ReconcileResult {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record stored under `key`.
    pub fn get(&self, key: ExternalKey) -> Option<&Record> {
        self.records.iter().find(|r| r.external_key == key)
    }

    /// Records whose creation outcome is unknown.
    pub fn unresolved(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(|r| r.is_unresolved_add())
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for record in &self.records {
            match record.status {
                RecordStatus::Unknown => summary.unknown += 1,
                RecordStatus::Unchanged => summary.unchanged += 1,
                RecordStatus::Different => summary.different += 1,
                RecordStatus::Added => summary.added += 1,
                RecordStatus::FailedToAdd => summary.failed_to_add += 1,
                RecordStatus::Missing => summary.missing += 1,
            }
            if record.is_unresolved_add() {
                summary.unresolved += 1;
            }
        }
        summary
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Three-way diff of a reference set against a remote snapshot, before propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Reference records in input order, classified
    reference: Vec<Record>,
    /// Remote records in snapshot order; unmatched ones are `Missing`
    remote: Vec<Record>,
    /// Indices into `reference` of records queued for creation
    additions: Vec<usize>,
}

impl Classification {
    pub fn reference(&self) -> &[Record] {
        &self.reference
    }

    pub fn remote(&self) -> &[Record] {
        &self.remote
    }

    /// Records queued for creation, in reference order.
    pub fn additions(&self) -> impl Iterator<Item = &Record> {
        self.additions.iter().map(|&i| &self.reference[i])
    }

    pub fn has_additions(&self) -> bool {
        !self.additions.is_empty()
    }

    /// Run `propagator` on the queued records and keep its outcome.
    pub async fn propagate<S: Session>(&mut self, propagator: &Propagator<S>) {
        if self.additions.is_empty() {
            return;
        }

        let mut candidates: Vec<Record> = self.additions().cloned().collect();
        propagator.propagate(&mut candidates).await;

        for (&index, candidate) in self.additions.iter().zip(candidates) {
            self.reference[index] = candidate;
        }
    }

    /// Reclassify queued records still lacking a remote id as `FailedToAdd`.
    pub fn demote_unresolved(&mut self) {
        for &index in &self.additions {
            let record = &mut self.reference[index];
            if record.is_unresolved_add() {
                record.mark_failed();
            }
        }
    }

    /// Merge both sides by key: remote first, then reference overwriting.
    /// Within a side the last occurrence of a key wins.
    pub fn merge(self) -> ReconcileResult {
        let mut merged: BTreeMap<ExternalKey, Record> = BTreeMap::new();
        for record in self.remote {
            merged.insert(record.external_key, record);
        }
        for record in self.reference {
            merged.insert(record.external_key, record);
        }
        ReconcileResult {
            records: merged.into_values().collect(),
        }
    }
}

/// Classify `reference` against `remote` without touching the remote system.
pub fn classify(mut reference: Vec<Record>, mut remote: Vec<Record>) -> Classification {
    // Last occurrence of a key wins
    let mut remote_index: HashMap<ExternalKey, usize> = HashMap::with_capacity(remote.len());
    for (index, record) in remote.iter().enumerate() {
        remote_index.insert(record.external_key, index);
    }

    let reference_keys: HashSet<ExternalKey> =
        reference.iter().map(|record| record.external_key).collect();

    let mut additions = Vec::new();
    for (index, record) in reference.iter_mut().enumerate() {
        match remote_index.get(&record.external_key) {
            Some(&matched) => {
                let existing = &remote[matched];
                record.status = if existing.name == record.name {
                    RecordStatus::Unchanged
                } else {
                    RecordStatus::Different
                };
                record.remote_id = existing.remote_id.clone();
            }
            None => {
                record.status = RecordStatus::Added;
                record.remote_id.clear();
                additions.push(index);
            }
        }
    }

    for record in remote.iter_mut() {
        if !reference_keys.contains(&record.external_key) {
            record.status = RecordStatus::Missing;
        }
    }

    Classification {
        reference,
        remote,
        additions,
    }
}

/// Reconciles reference records against the remote system and creates the missing ones.
pub struct Reconciler<F, S> {
    fetcher: F,
    propagator: Propagator<S>,
    options: ReconcileOptions,
}

impl<F: Fetcher, S: Session> Reconciler<F, S> {
    /// Create a new reconciler.
    pub fn new(fetcher: F, propagator: Propagator<S>) -> Self {
        Self {
            fetcher,
            propagator,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// Reconcile `reference` with the remote snapshot.
    ///
    /// Only fails when the snapshot cannot be read and the policy is
    /// [`FetchFailurePolicy::Abort`]. Propagation failures show up in the
    /// statuses of the returned records.
    pub async fn reconcile(&self, reference: Vec<Record>) -> Result<ReconcileResult> {
        let remote = match self.fetcher.fetch_all().await {
            Ok(remote) => remote,
            Err(e) => match self.options.on_fetch_failure {
                FetchFailurePolicy::ProceedEmpty => {
                    tracing::warn!(
                        error = %e,
                        "could not read remote terms, treating every reference term as new"
                    );
                    Vec::new()
                }
                FetchFailurePolicy::Abort => return Err(Error::Fetch(e.to_string())),
            },
        };

        tracing::debug!(
            reference = reference.len(),
            remote = remote.len(),
            "classifying terms"
        );

        let mut classification = classify(reference, remote);
        classification.propagate(&self.propagator).await;

        if self.options.demote_unresolved {
            classification.demote_unresolved();
        }

        let result = classification.merge();
        tracing::info!(summary = %result.summary(), "reconciliation completed");
        Ok(result)
    }
}
