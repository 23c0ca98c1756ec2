//! Checkpoint state for resumable runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Outcome;
use crate::stats::OutcomeCounts;

/// Format version written into every checkpoint file.
pub const CHECKPOINT_VERSION: u32 = 1;

/// One processed record, in iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedEntry {
    pub id: String,
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}

/// Persisted progress of an incomplete run.
///
/// `processed` is always a prefix of the store's iteration order and
/// `offset == processed.len()` for a checkpoint written by a single run
/// chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub run_started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub offset: usize,
    pub last_processed_id: Option<String>,
    pub counts: OutcomeCounts,
    #[serde(default)]
    pub processed: Vec<ProcessedEntry>,
}

impl Checkpoint {
    /// An empty checkpoint for a run starting at `run_started_at`.
    #[must_use]
    pub const fn new(run_started_at: DateTime<Utc>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            run_started_at,
            updated_at: run_started_at,
            offset: 0,
            last_processed_id: None,
            counts: OutcomeCounts {
                found: 0,
                not_found: 0,
                skipped: 0,
                deferred: 0,
            },
            processed: Vec::new(),
        }
    }

    /// Append a processed record and advance the cursor past it.
    pub fn advance(&mut self, id: &str, outcome: Outcome, at: DateTime<Utc>) {
        self.processed.push(ProcessedEntry {
            id: id.to_string(),
            outcome,
            at,
        });
        self.counts.record(outcome);
        self.offset += 1;
        self.last_processed_id = Some(id.to_string());
        self.updated_at = at;
    }

    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.version == CHECKPOINT_VERSION
    }

    /// Where to resume in `ids`, the store's current iteration order.
    ///
    /// The processed records must still be a prefix of `ids`. Returns `None`
    /// otherwise, in which case the run has to start over.
    #[must_use]
    pub fn resume_offset(&self, ids: &[&str]) -> Option<usize> {
        let Some(last) = self.last_processed_id.as_deref() else {
            return (self.offset == 0).then_some(0);
        };

        if self.offset == 0 || self.offset > ids.len() || ids[self.offset - 1] != last {
            return None;
        }
        if self.processed.len() == self.offset
            && !self
                .processed
                .iter()
                .zip(ids)
                .all(|(entry, id)| entry.id == *id)
        {
            return None;
        }
        Some(self.offset)
    }
}
