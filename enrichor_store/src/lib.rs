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

//! File-backed persistence for enrichment runs.
//!
//! Every file this crate writes goes through [`write_atomic`], so readers
//! only ever observe the previous complete version or the new one.

mod atomic;
mod checkpoint_file;
mod json_store;
pub mod report;

pub use atomic::write_atomic;
pub use checkpoint_file::FileCheckpointManager;
pub use json_store::JsonRecordStore;
pub use report::{RunReport, StoreSummary, write_report};
