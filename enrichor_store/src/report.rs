//! Human-readable run reports and store summaries.

use enrichor_core::{OutcomeCounts, Record, Result, RunStats};
use std::fmt::{self, Write as _};
use std::path::Path;
use std::time::Duration;

use crate::atomic::write_atomic;

/// Markdown summary of one run. Write-only; nothing reads it back.
#[derive(Debug, Clone, Copy)]
pub struct RunReport<'a> {
    pub stats: &'a RunStats,
    pub complete: bool,
    pub source: &'a str,
    pub records_path: &'a Path,
}

impl fmt::Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats;
        let counts = &stats.counts;
        let status = if self.complete {
            "complete"
        } else {
            "interrupted (resumable)"
        };

        writeln!(f, "# Enrichment run report")?;
        writeln!(f)?;
        writeln!(f, "- Status: {status}")?;
        writeln!(f, "- Source: {}", self.source)?;
        writeln!(f, "- Record store: {}", self.records_path.display())?;
        writeln!(f, "- Started: {}", stats.started_at.to_rfc3339())?;
        writeln!(f, "- Finished: {}", stats.finished_at.to_rfc3339())?;
        writeln!(f)?;
        writeln!(f, "| Metric | Value |")?;
        writeln!(f, "|---|---|")?;
        writeln!(f, "| Total records | {} |", counts.total())?;
        writeln!(f, "| Found | {} |", counts.found)?;
        writeln!(f, "| Not found | {} |", counts.not_found)?;
        writeln!(f, "| Skipped | {} |", counts.skipped)?;
        writeln!(f, "| Deferred (retry next run) | {} |", counts.deferred)?;
        writeln!(f, "| Coverage | {:.1}% |", counts.coverage_percent())?;
        writeln!(f, "| Processed this run | {} |", stats.processed)?;
        writeln!(f, "| Lookups (incl. retries) | {} |", stats.lookups)?;
        writeln!(f, "| Retries | {} |", stats.retries)?;
        writeln!(f, "| Elapsed | {} |", format_elapsed(stats.elapsed()))?;
        writeln!(
            f,
            "| Throughput | {:.1} records/min |",
            stats.throughput_per_minute()
        )
    }
}

/// Write `report` to `path` atomically.
pub async fn write_report(path: &Path, report: &RunReport<'_>) -> Result<()> {
    write_atomic(path, report.to_string().as_bytes()).await
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h ");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes:02}m ");
    }
    let _ = write!(out, "{seconds:02}s");
    out
}

/// Outcome counts of a record store as it is on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub counts: OutcomeCounts,
    pub unchecked: usize,
}

impl StoreSummary {
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.recorded_outcome() {
                Some(outcome) => summary.counts.record(outcome),
                None => summary.unchecked += 1,
            }
        }
        summary
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.counts.total() + self.unchecked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(7)), "07s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "02m 05s");
        assert_eq!(format_elapsed(Duration::from_secs(3723)), "1h 02m 03s");
    }

    #[test]
    fn test_report_contains_counts_and_rates() {
        let started_at = Utc::now();
        let stats = RunStats {
            counts: OutcomeCounts {
                found: 3,
                not_found: 1,
                skipped: 1,
                deferred: 0,
            },
            processed: 5,
            lookups: 6,
            retries: 2,
            started_at,
            finished_at: started_at + chrono::Duration::seconds(60),
        };
        let report = RunReport {
            stats: &stats,
            complete: true,
            source: "wikipedia",
            records_path: Path::new("people.json"),
        }
        .to_string();

        assert!(report.contains("- Status: complete"));
        assert!(report.contains("| Total records | 5 |"));
        assert!(report.contains("| Found | 3 |"));
        assert!(report.contains("| Coverage | 60.0% |"));
        assert!(report.contains("| Elapsed | 01m 00s |"));
        assert!(report.contains("| Throughput | 5.0 records/min |"));
    }

    #[test]
    fn test_store_summary() {
        let now = Utc::now();
        let mut found = Record::new("a", "Ann Lee");
        found.mark_found("bio".into(), "label".into(), now);
        let mut skipped = Record::new("b", "Unknown");
        skipped.mark_skipped(now);
        let pending = Record::new("c", "Cy Young");

        let summary = StoreSummary::from_records(&[found, skipped, pending]);
        assert_eq!(summary.counts.found, 1);
        assert_eq!(summary.counts.skipped, 1);
        assert_eq!(summary.unchecked, 1);
        assert_eq!(summary.total(), 3);
    }
}
