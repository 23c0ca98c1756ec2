use anyhow::Context;
use enrichor_config::Config;
use enrichor_core::{Classifier, EnrichmentEngine, LookupClient, RecheckPolicy, RunOutcome};
use enrichor_providers::WikipediaClient;
use enrichor_store::{FileCheckpointManager, JsonRecordStore, RunReport, write_report};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunInput {
    pub config: Option<PathBuf>,
    pub recheck: RecheckPolicy,
}

/// Strategy for a single enrichment run.
///
/// Builds the engine from config, wires Ctrl-C to its shutdown flag, prints
/// the report and maps the outcome to an exit code.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<ExitCode> {
        let config = Config::load(input.config.as_deref())?;
        let classifier = Classifier::new(&config.classifier)?;
        let lookup = WikipediaClient::new(
            config.lookup.clone(),
            config.engine.rate_limit(),
            config.engine.min_content_length,
        )?;
        let source = lookup.source_name().to_string();

        let store = JsonRecordStore::new(config.store.records_path.clone());
        let checkpoints = FileCheckpointManager::new(config.store.checkpoint_path.clone());
        if checkpoints.exists() {
            info!(
                "Found checkpoint at {}, resuming",
                config.store.checkpoint_path.display()
            );
        }

        let mut engine =
            EnrichmentEngine::new(lookup, store, checkpoints, classifier, config.engine.clone())?
                .with_recheck(input.recheck);

        let shutdown = engine.shutdown_flag();
        let signal_task = tokio::spawn(async move {
            match shutdown_signal().await {
                Ok(signal) => {
                    warn!("{signal} received, stopping after the current record");
                    shutdown.store(true, Ordering::SeqCst);
                }
                Err(e) => warn!("Cannot listen for shutdown signals: {e}"),
            }
        });

        let result = engine.run().await;
        signal_task.abort();
        let outcome = result.context("Enrichment run failed")?;

        let report = RunReport {
            stats: outcome.stats(),
            complete: outcome.is_complete(),
            source: &source,
            records_path: &config.store.records_path,
        };
        println!("{report}");

        if outcome.is_complete() {
            write_report(&config.store.report_path, &report)
                .await
                .context("Failed to write run report")?;
            info!("Report written to {}", config.store.report_path.display());
        } else {
            println!("Run interrupted. Run 'enrichor run' again to resume from the checkpoint.");
        }
        Ok(ExitCode::from(exit_status(&outcome)))
    }
}

/// Process exit status for a run that returned without a fatal error.
const fn exit_status(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Complete(_) => super::EXIT_COMPLETE,
        RunOutcome::Interrupted(_) => super::EXIT_INTERRUPTED,
    }
}

/// Resolve on Ctrl-C, or on SIGTERM where the platform has it.
async fn shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|()| "Ctrl-C"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|()| "Ctrl-C")
    }
}
