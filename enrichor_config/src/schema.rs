use anyhow::Context;
use enrichor_core::{Classifier, ClassifierConfig, EngineConfig};
use enrichor_providers::LookupConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Where the record store, checkpoint and report live. Relative paths are
/// resolved against the directory holding the config file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    #[serde(default = "StoreConfig::default_records_path")]
    pub records_path: PathBuf,
    #[serde(default = "StoreConfig::default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
    #[serde(default = "StoreConfig::default_report_path")]
    pub report_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            records_path: Self::default_records_path(),
            checkpoint_path: Self::default_checkpoint_path(),
            report_path: Self::default_report_path(),
        }
    }
}

impl StoreConfig {
    fn default_records_path() -> PathBuf {
        PathBuf::from("records.json")
    }

    fn default_checkpoint_path() -> PathBuf {
        PathBuf::from("checkpoint.json")
    }

    fn default_report_path() -> PathBuf {
        PathBuf::from("enrichment_report.md")
    }

    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.records_path,
            &mut self.checkpoint_path,
            &mut self.report_path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

impl Config {
    /// `~/enrichor/config.json`
    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("enrichor")
            .join("config.json"))
    }

    /// Load and validate the config at `path`, or at [`Self::default_path`].
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'enrichor init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::parse(&content, base)
            .with_context(|| format!("Invalid config {}", config_path.display()))?;

        debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Parse and validate `content`, resolving store paths against `base`.
    pub fn parse(content: &str, base: &Path) -> anyhow::Result<Self> {
        let mut config: Self = serde_json::from_str(content)?;
        config.store.resolve_against(base);
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run could succeed with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine.validate()?;
        Classifier::new(&self.classifier)?;

        if self.lookup.base_url.trim().is_empty() {
            anyhow::bail!("lookup.base_url must not be empty");
        }
        if self.lookup.search_limit == 0 {
            anyhow::bail!("lookup.search_limit must be at least 1");
        }
        if self.lookup.timeout == 0 {
            anyhow::bail!("lookup.timeout must be at least 1 second");
        }
        Ok(())
    }

    /// Write a template with every default spelled out. Refuses to overwrite.
    pub fn create_config(path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let mut template = serde_json::to_string_pretty(&Self::default())?;
        template.push('\n');
        std::fs::write(&config_path, template)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(config_path)
    }
}
