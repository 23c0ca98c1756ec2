mod config;
mod enrichment_loop;

pub use config::{EngineConfig, RecheckPolicy};
pub use enrichment_loop::{EngineState, EnrichmentEngine, RunOutcome};
