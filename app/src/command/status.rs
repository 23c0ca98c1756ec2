use enrichor_config::Config;
use enrichor_core::{CheckpointStore, RecordStore};
use enrichor_store::{FileCheckpointManager, JsonRecordStore, StoreSummary};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone)]
pub struct StatusInput {
    pub config: Option<PathBuf>,
}

/// Strategy for showing where the record store stands.
///
/// Read-only: performs no lookups and writes nothing.
#[derive(Debug, Clone, Copy)]
pub struct StatusStrategy;

impl super::CommandStrategy for StatusStrategy {
    type Input = StatusInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<ExitCode> {
        let config = Config::load(input.config.as_deref())?;

        let records = JsonRecordStore::new(config.store.records_path.clone())
            .read_all()
            .await?;
        let summary = StoreSummary::from_records(&records);
        let counts = &summary.counts;

        println!("=== enrichor status ===\n");
        println!("Record store: {}", config.store.records_path.display());
        println!("  Total: {}", summary.total());
        println!("  Found: {}", counts.found);
        println!("  Not found: {}", counts.not_found);
        println!("  Skipped: {}", counts.skipped);
        println!("  Unchecked: {}", summary.unchecked);
        println!("  Coverage of checked: {:.1}%", counts.coverage_percent());
        println!();

        println!("Checkpoint: {}", config.store.checkpoint_path.display());
        match FileCheckpointManager::new(config.store.checkpoint_path.clone())
            .load()
            .await
        {
            Some(checkpoint) => {
                println!("  Status: incomplete run, resumable");
                println!("  Started: {}", checkpoint.run_started_at.to_rfc3339());
                println!("  Updated: {}", checkpoint.updated_at.to_rfc3339());
                println!("  Offset: {} / {}", checkpoint.offset, records.len());
                if let Some(id) = &checkpoint.last_processed_id {
                    println!("  Last processed: {id}");
                }
            }
            None => println!("  Status: none"),
        }

        Ok(ExitCode::SUCCESS)
    }
}
