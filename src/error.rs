//! Error types for the plugin composition core and its host.

use crate::parser::ValidationFailure;
use crate::plugin::PluginId;
use thiserror::Error;

/// Assembly-time failures. These are programmer errors in how plugins are
/// composed and are never retried.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("plugin '{dependent}' depends on missing plugin '{missing}'")]
    MissingDependency { missing: PluginId, dependent: PluginId },

    #[error("circular plugin dependency: {}", format_chain(.chain))]
    CircularDependency { chain: Vec<PluginId> },

    #[error("global option name must not be empty")]
    EmptyOptionName,

    #[error("global option '{0}' is already registered")]
    DuplicateOption(String),

    #[error("short flag '-{short}' of global option '{option}' is already used by '{existing}'")]
    DuplicateShort {
        short: char,
        option: String,
        existing: String,
    },

    #[error("sub-command name must not be empty")]
    EmptyCommandName,

    #[error("sub-command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("setup of plugin '{plugin}' failed: {source}")]
    Setup {
        plugin: PluginId,
        #[source]
        source: anyhow::Error,
    },
}

impl ConfigurationError {
    /// Plugin ids mentioned by this error, in the order they appear in the message.
    pub fn plugin_ids(&self) -> Vec<&PluginId> {
        match self {
            ConfigurationError::MissingDependency { missing, dependent } => {
                vec![dependent, missing]
            }
            ConfigurationError::CircularDependency { chain } => chain.iter().collect(),
            ConfigurationError::Setup { plugin, .. } => vec![plugin],
            _ => Vec::new(),
        }
    }
}

fn format_chain(chain: &[PluginId]) -> String {
    chain
        .iter()
        .map(PluginId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Per-invocation failures raised by plugin-supplied code.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("extension factory of plugin '{plugin}' failed: {source}")]
    Factory {
        plugin: PluginId,
        #[source]
        source: anyhow::Error,
    },

    #[error("extension hook of plugin '{plugin}' failed: {source}")]
    Notify {
        plugin: PluginId,
        #[source]
        source: anyhow::Error,
    },

    #[error("renderer failed: {source}")]
    Render {
        #[source]
        source: anyhow::Error,
    },

    #[error("command '{command}' failed: {source}")]
    Command {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors surfaced by the [`Cli`](crate::cli::Cli) host to its entry point.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error("{failure}")]
    Validation {
        failure: ValidationFailure,
        /// Output of the compiled header and validation-errors renderers.
        rendered: String,
    },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("failed to load command '{name}': {source}")]
    CommandLoad {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Settings(String),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Settings(err.to_string())
    }
}
