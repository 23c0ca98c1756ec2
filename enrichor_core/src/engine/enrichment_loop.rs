//! The enrichment run loop.
//!
//! A run walks the record store in its fixed iteration order and moves
//! through `Init -> Running -> (Checkpointing)* -> Complete | Interrupted`.
//! Records are processed strictly one at a time; interruption is observed
//! only between records, so an in-flight lookup always finishes (or times
//! out) before the run flushes and stops.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::config::{EngineConfig, RecheckPolicy};
use crate::checkpoint::Checkpoint;
use crate::classifier::Classifier;
use crate::error::Result;
use crate::lookup::{LookupError, LookupOutcome};
use crate::record::{Outcome, Record};
use crate::retry::retry_with_backoff;
use crate::stats::RunStats;
use crate::{CheckpointStore, LookupClient, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Init,
    Running,
    Checkpointing,
    Complete,
    Interrupted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Checkpointing => "checkpointing",
            Self::Complete => "complete",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every record was visited; the checkpoint has been cleared.
    Complete(RunStats),
    /// Stopped early on request; progress is flushed and resumable.
    Interrupted(RunStats),
}

impl RunOutcome {
    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        match self {
            Self::Complete(stats) | Self::Interrupted(stats) => stats,
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

/// Per-invocation counters that are not part of the checkpoint.
#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    lookups: usize,
    retries: usize,
}

/// Orchestrates classification, lookup and checkpointing over a record store.
pub struct EnrichmentEngine<L, S, C>
where
    L: LookupClient,
    S: RecordStore,
    C: CheckpointStore,
{
    lookup: L,
    store: S,
    checkpoints: C,
    classifier: Classifier,
    config: EngineConfig,
    recheck: RecheckPolicy,
    shutdown: Arc<AtomicBool>,
    state: EngineState,
}

impl<L, S, C> EnrichmentEngine<L, S, C>
where
    L: LookupClient,
    S: RecordStore,
    C: CheckpointStore,
{
    /// Build an engine. Fails with a configuration error if `config` is invalid.
    pub fn new(
        lookup: L,
        store: S,
        checkpoints: C,
        classifier: Classifier,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            lookup,
            store,
            checkpoints,
            classifier,
            config,
            recheck: RecheckPolicy::Off,
            shutdown: Arc::new(AtomicBool::new(false)),
            state: EngineState::Init,
        })
    }

    #[must_use]
    pub const fn with_recheck(mut self, recheck: RecheckPolicy) -> Self {
        self.recheck = recheck;
        self
    }

    /// Use an externally owned flag to request a graceful stop.
    #[must_use]
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    #[must_use]
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    #[must_use]
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Run until the end of the store or until a stop is requested.
    ///
    /// Only persistence failures and a malformed store are returned as
    /// errors; every per-record failure becomes a recorded outcome.
    pub async fn run(&mut self) -> Result<RunOutcome> {
        let started_at = Utc::now();
        self.transition(EngineState::Init);

        let mut records = self.store.read_all().await?;
        let mut checkpoint = self.resume_or_start(&records, started_at).await?;
        info!(
            "Enriching {} records from {} (starting at offset {})",
            records.len(),
            self.lookup.source_name(),
            checkpoint.offset
        );

        let mut tally = Tally::default();
        let mut dirty = false;
        let mut since_checkpoint = 0;
        let interval = self.config.checkpoint_interval;

        self.transition(EngineState::Running);
        while checkpoint.offset < records.len() {
            if self.shutdown.load(Ordering::SeqCst) {
                info!("Stop requested, flushing progress");
                self.persist(&records, &checkpoint, &mut dirty).await?;
                self.transition(EngineState::Interrupted);
                let stats = Self::finish(&checkpoint, &tally, started_at);
                return Ok(RunOutcome::Interrupted(stats));
            }

            let record = &mut records[checkpoint.offset];
            let (outcome, changed) = self
                .process(record, checkpoint.run_started_at, &mut tally)
                .await;
            dirty |= changed;
            let id = record.id.clone();
            checkpoint.advance(&id, outcome, Utc::now());
            tally.processed += 1;
            since_checkpoint += 1;

            if since_checkpoint >= interval && checkpoint.offset < records.len() {
                self.persist(&records, &checkpoint, &mut dirty).await?;
                self.transition(EngineState::Running);
                since_checkpoint = 0;
                info!(
                    "Checkpoint {}/{}: found={} not_found={} skipped={}",
                    checkpoint.offset,
                    records.len(),
                    checkpoint.counts.found,
                    checkpoint.counts.not_found,
                    checkpoint.counts.skipped
                );
            }
        }

        if dirty {
            self.store.write_all(&records).await?;
        }
        self.checkpoints.clear().await?;
        self.transition(EngineState::Complete);

        let stats = Self::finish(&checkpoint, &tally, started_at);
        info!(
            "Run complete: {} records, found={} not_found={} skipped={} ({:.1}% coverage)",
            stats.counts.total(),
            stats.counts.found,
            stats.counts.not_found,
            stats.counts.skipped,
            stats.counts.coverage_percent()
        );
        Ok(RunOutcome::Complete(stats))
    }

    /// Load a usable checkpoint, or write a fresh one at offset 0.
    async fn resume_or_start(
        &self,
        records: &[Record],
        started_at: DateTime<Utc>,
    ) -> Result<Checkpoint> {
        if let Some(checkpoint) = self.checkpoints.load().await {
            let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
            match checkpoint.resume_offset(&ids) {
                Some(offset) => {
                    info!(
                        "Resuming run started at {} from offset {offset}",
                        checkpoint.run_started_at
                    );
                    return Ok(checkpoint);
                }
                None => {
                    warn!(
                        "Checkpoint does not match the record store (last id {:?}), starting over",
                        checkpoint.last_processed_id
                    );
                }
            }
        }

        let checkpoint = Checkpoint::new(started_at);
        self.checkpoints.save(&checkpoint).await?;
        Ok(checkpoint)
    }

    /// Process one record. Returns its outcome and whether it was modified.
    async fn process(
        &self,
        record: &mut Record,
        run_started_at: DateTime<Utc>,
        tally: &mut Tally,
    ) -> (Outcome, bool) {
        if record.checked && !self.recheck.selects(record, run_started_at) {
            let outcome = record.recorded_outcome().unwrap_or(Outcome::NotFound);
            debug!("{}: already checked ({outcome:?})", record.id);
            return (outcome, false);
        }

        if let Some(reason) = self.classifier.rejection(&record.name) {
            debug!("{}: skipped {:?}: {reason}", record.id, record.name);
            record.mark_skipped(Utc::now());
            return (Outcome::Skipped, true);
        }

        let name = record.name.clone();
        let report =
            retry_with_backoff(|| self.lookup_once(&name), &self.config.retry_policy()).await;
        tally.lookups += report.attempts as usize;
        tally.retries += report.retries() as usize;

        match report.result {
            Ok(outcome) => match outcome.with_quality_gate(self.config.min_content_length) {
                LookupOutcome::Found(hit) => {
                    debug!("{}: found via {}", record.id, hit.source_label);
                    record.mark_found(hit.text, hit.source_label, Utc::now());
                    (Outcome::Found, true)
                }
                LookupOutcome::NotFound(reason) => {
                    debug!("{}: not found ({reason})", record.id);
                    record.mark_not_found(Utc::now());
                    (Outcome::NotFound, true)
                }
            },
            Err(e) => {
                warn!(
                    "{}: giving up after {} attempts, will retry next run: {e}",
                    record.id, report.attempts
                );
                (Outcome::Deferred, false)
            }
        }
    }

    async fn lookup_once(&self, name: &str) -> std::result::Result<LookupOutcome, LookupError> {
        let timeout = self.config.lookup_timeout();
        tokio::time::timeout(timeout, self.lookup.lookup(name))
            .await
            .unwrap_or(Err(LookupError::Timeout(timeout)))
    }

    /// Write the store snapshot (if changed) and then the checkpoint.
    ///
    /// The store goes first: if the process dies between the two writes, the
    /// older checkpoint only makes the next run revisit records that are
    /// already checked.
    async fn persist(
        &mut self,
        records: &[Record],
        checkpoint: &Checkpoint,
        dirty: &mut bool,
    ) -> Result<()> {
        self.transition(EngineState::Checkpointing);
        if *dirty {
            self.store.write_all(records).await?;
            *dirty = false;
        }
        self.checkpoints.save(checkpoint).await
    }

    fn finish(checkpoint: &Checkpoint, tally: &Tally, started_at: DateTime<Utc>) -> RunStats {
        RunStats {
            counts: checkpoint.counts,
            processed: tally.processed,
            lookups: tally.lookups,
            retries: tally.retries,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: EngineState) {
        debug!("Engine state {} -> {}", self.state, next);
        self.state = next;
    }
}
