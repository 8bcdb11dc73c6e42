//! Configuration System
//!
//! Host-level settings: program identity shown to commands, output silencing and
//! logging. Layered with the `config` crate; later layers override earlier ones:
//! defaults, the user config file, an explicit file, then `CLIWEAVE_*` variables.

use crate::context::CommandEnv;
use crate::error::CliError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod merge;
mod sources;

pub use sources::user_config_path;

const ENV_PREFIX: &str = "CLIWEAVE";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Program name
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Silence the user-facing logger of every command
    #[serde(default)]
    pub usage_silent: bool,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Identity exposed to commands through their context
    pub fn env(&self) -> CommandEnv {
        CommandEnv {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            usage_silent: self.usage_silent,
        }
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for `app`: defaults, user file, environment.
    pub fn load(app: &str) -> Result<CliConfig, CliError> {
        Self::load_with(app, None)
    }

    /// Like [`load`](Self::load), with an explicit file layered above the user file.
    pub fn load_with(app: &str, explicit: Option<&Path>) -> Result<CliConfig, CliError> {
        let mut builder = merge::builder_with_defaults(app)?;
        builder = sources::add_user_file(builder, app)?;
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from a single file; no other layer applies.
    pub fn load_from_file(path: &Path) -> Result<CliConfig, CliError> {
        let config = Config::builder()
            .add_source(File::from(path).required(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
