pub mod chart;
pub mod pipeline;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cicd_core::{
    config::{self, API_ROOT_ENV},
    state::{self, StateFile},
    ProviderConfig,
};

/// Resolved home directory and configuration shared by every command.
#[derive(Debug)]
pub struct CliContext {
    pub home: PathBuf,
    pub config: ProviderConfig,
}

impl CliContext {
    pub fn new(api_root_flag: Option<String>) -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        let config = config::load_at(&home)
            .context("failed to load configuration")?
            .with_api_root(api_root_flag, std::env::var(API_ROOT_ENV).ok());
        Ok(Self { home, config })
    }

    /// Configuration checked for control-plane use.
    pub fn validated_config(&self) -> Result<&ProviderConfig> {
        self.config
            .validate()
            .context("control plane is not configured")?;
        Ok(&self.config)
    }

    pub fn load_state(&self) -> Result<StateFile> {
        state::load_at(&self.home).context("failed to load local state")
    }

    pub fn save_state(&self, state: &StateFile) -> Result<()> {
        state::save_at(&self.home, state).context("failed to save local state")
    }
}
