use enrichor_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone)]
pub struct InitInput {
    /// Config location; the default path when `None`
    pub path: Option<PathBuf>,
}

/// Strategy for initializing the configuration.
///
/// Writes a template holding every default so each knob is visible.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = InitInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<ExitCode> {
        let config_path = Config::create_config(input.path.as_deref())?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point store.records_path at your record store JSON file");
        println!("   2. Put a contact address in lookup.user_agent");
        println!("   3. Run 'enrichor run' (add --config if you used a custom path)");
        println!();
        println!("🔧 Configuration options:");
        println!("   - engine.rate_limit_seconds: delay between upstream requests");
        println!("   - engine.checkpoint_interval: records between checkpoints");
        println!("   - engine.min_content_length: shortest biography accepted");
        println!("   - classifier.eligibility_patterns: regexes that mark a name ineligible");
        println!();
        Ok(ExitCode::SUCCESS)
    }
}
