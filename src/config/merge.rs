//! Merge rules: defaults applied beneath every other source.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with defaults applied.
pub fn builder_with_defaults(app: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("name", app)?
        .set_default("usage_silent", false)?
        .set_default("logging.level", "warn")?
        .set_default("logging.output", "stderr")
}
