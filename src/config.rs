//! Engine configuration, sourced from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::error::{EngineError, EngineResult};

/// Where the engine lives and how patient the bridge is with it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// KataGo executable
    pub katago_path: PathBuf,
    /// GTP configuration file passed with `-config`
    pub config_path: PathBuf,
    /// Model weights file passed with `-model`
    pub model_path: PathBuf,
    /// How long to wait after spawning before checking the process survived
    pub startup_settle: Duration,
    /// Deadline for a single command/response exchange
    pub command_timeout: Duration,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let katago_path = std::env::var("KATAGO_PATH")
            .context("KATAGO_PATH must be set")?
            .into();
        let config_path = std::env::var("KATAGO_CONFIG")
            .context("KATAGO_CONFIG must be set")?
            .into();
        let model_path = std::env::var("KATAGO_MODEL")
            .context("KATAGO_MODEL must be set")?
            .into();

        Ok(Self {
            katago_path,
            config_path,
            model_path,
            startup_settle: Duration::from_millis(env_or("KATAGO_STARTUP_SETTLE_MS", 2000)?),
            command_timeout: Duration::from_secs(env_or("KATAGO_COMMAND_TIMEOUT_SECS", 60)?),
        })
    }

    /// Check every file the engine needs before spawning it.
    pub fn validate(&self) -> EngineResult<()> {
        for path in [&self.katago_path, &self.config_path, &self.model_path] {
            if !path.exists() {
                return Err(EngineError::MissingResource { path: path.clone() });
            }
        }
        Ok(())
    }
}

fn env_or(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} must be an integer")),
        Err(_) => Ok(default),
    }
}
