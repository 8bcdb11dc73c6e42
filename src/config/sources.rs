//! User config file source: `<config dir>/<app>/config.toml`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

/// Path to the user config file for `app`, if a home directory is known.
pub fn user_config_path(app: &str) -> Option<PathBuf> {
    ProjectDirs::from("", "", app).map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Add the user config file to the builder if it exists.
pub fn add_user_file(
    builder: ConfigBuilder<DefaultState>,
    app: &str,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match user_config_path(app) {
        Some(path) if path.exists() => Ok(builder.add_source(File::from(path).required(false))),
        Some(path) => {
            debug!(config_path = %path.display(), "No user configuration file");
            Ok(builder)
        }
        None => Ok(builder),
    }
}
