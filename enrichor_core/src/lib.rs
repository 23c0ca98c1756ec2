#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;

pub mod checkpoint;
pub mod classifier;
pub mod engine;
mod error;
pub mod lookup;
pub mod name;
pub mod record;
pub mod retry;
pub mod stats;

pub use checkpoint::{CHECKPOINT_VERSION, Checkpoint, ProcessedEntry};
pub use classifier::{Classifier, ClassifierConfig};
pub use engine::{EngineConfig, EngineState, EnrichmentEngine, RecheckPolicy, RunOutcome};
pub use error::{Error, Result};
pub use lookup::{LookupError, LookupHit, LookupOutcome, NotFoundReason};
pub use name::normalize_name;
pub use record::{Outcome, Record, SourceKind};
pub use retry::{RetryPolicy, RetryReport, retry_with_backoff};
pub use stats::{OutcomeCounts, RunStats};

/// Persisted collection of records, iterated in ascending identifier order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every record. The returned order is the engine's iteration order
    /// and must be the same on every call for an unchanged store.
    async fn read_all(&self) -> Result<Vec<Record>>;

    /// Replace the persisted collection with `records`.
    ///
    /// Implementations must leave the previous version readable if the write
    /// fails part-way.
    async fn write_all(&self, records: &[Record]) -> Result<()>;
}

/// Progress persistence for resumable runs.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Prior progress, or `None` when absent or unreadable.
    async fn load(&self) -> Option<Checkpoint>;

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Remove the checkpoint. Removing an absent checkpoint succeeds.
    async fn clear(&self) -> Result<()>;
}

/// A single enrichment attempt against an external source.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Look up `name`. `Err` is reserved for failures worth retrying.
    async fn lookup(&self, name: &str) -> std::result::Result<LookupOutcome, LookupError>;

    fn source_name(&self) -> &str;
}
