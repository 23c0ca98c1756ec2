//! Run statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::record::Outcome;

/// Outcome tallies over the store.
///
/// `deferred` records are already included in `not_found`; the separate count
/// tells how many of those will be retried by the next run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub found: usize,
    pub not_found: usize,
    pub skipped: usize,
    #[serde(default)]
    pub deferred: usize,
}

impl OutcomeCounts {
    pub const fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Found => self.found += 1,
            Outcome::NotFound => self.not_found += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Deferred => {
                self.not_found += 1;
                self.deferred += 1;
            }
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.found + self.not_found + self.skipped
    }

    /// Percentage of records that received an enrichment result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.found as f64 / total as f64 * 100.0
    }
}

/// Statistics for one finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub counts: OutcomeCounts,
    /// Records visited by this invocation, excluding a resumed prefix.
    pub processed: usize,
    /// Lookup attempts issued, including retries.
    pub lookups: usize,
    pub retries: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunStats {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Records processed per minute of wall-clock time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn throughput_per_minute(&self) -> f64 {
        let minutes = self.elapsed().as_secs_f64() / 60.0;
        if minutes <= f64::EPSILON {
            return 0.0;
        }
        self.processed as f64 / minutes
    }
}
