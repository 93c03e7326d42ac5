//! CLI execution context.

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use hotelads_engine::{AdsConfig, ContextTokenCodec, ENCRYPTION_KEY_ENV};

use crate::config::find_config_file;
use crate::output::Output;

/// Execution context for CLI commands.
pub struct Context {
    /// Loaded configuration with environment overrides applied.
    pub config: AdsConfig,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from an explicit config file or the nearest one found.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let path = match config_path {
            Some(path) => Some(PathBuf::from(path)),
            None => find_config_file(&cwd),
        };
        let mut config = match &path {
            Some(path) => AdsConfig::load(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => AdsConfig::default(),
        };
        config.apply_env();

        if let Some(path) = &path {
            output.trace(&format!("Using config {}", path.display()));
        }

        Ok(Self {
            config,
            config_path: path,
            output,
            cwd,
        })
    }

    /// Token codec built from the configured key.
    pub fn codec(&self) -> Result<ContextTokenCodec> {
        let key = self.config.crypto.id_encryption_key.as_deref().with_context(|| {
            format!(
                "No encryption key configured. Set crypto.id_encryption_key or {} (see `hotelads token keygen`)",
                ENCRYPTION_KEY_ENV
            )
        })?;
        ContextTokenCodec::new(key).context("Invalid encryption key")
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }
}
