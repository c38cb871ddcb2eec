//! Command-line options shared by the binaries.

use std::path::PathBuf;

use clap::Args;

use crate::config::{load_config, validate_config, ConfigError, ServerConfig};

#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override `listener.bind_address`
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Override `observability.log_level`
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl ServerArgs {
    /// Load the configuration file (if any), apply overrides, validate.
    pub fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}
