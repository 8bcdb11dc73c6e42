//! [`Cli`] construction

use super::Cli;
use crate::command::{CommandDef, CommandEntry};
use crate::config::CliConfig;
use crate::context::Logger;
use crate::error::CliError;
use crate::parser::{ArgumentParser, ClapParser};
use crate::plugin::{resolve_plugins, Plugin};
use crate::render::{Render, Renderers};
use crate::surface::PluginSurface;
use std::sync::Arc;
use tracing::debug;

/// Collects plugins, commands and collaborators for a [`Cli`]
pub struct CliBuilder {
    config: CliConfig,
    plugins: Vec<Arc<Plugin>>,
    entry: Option<Arc<CommandDef>>,
    commands: Vec<(String, CommandEntry)>,
    renderers: Renderers,
    parser: Arc<dyn ArgumentParser>,
    logger: Option<Logger>,
}

impl CliBuilder {
    pub fn new(config: CliConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            entry: None,
            commands: Vec::new(),
            renderers: Renderers::default(),
            parser: Arc::new(ClapParser),
            logger: None,
        }
    }

    pub fn plugin(mut self, plugin: impl Into<Arc<Plugin>>) -> Self {
        self.plugins.push(plugin.into());
        self
    }

    /// Command run when no sub-command is named
    pub fn entry(mut self, command: CommandDef) -> Self {
        self.entry = Some(Arc::new(command));
        self
    }

    /// Register a host sub-command. Plugins see it during setup.
    pub fn command(mut self, name: impl Into<String>, entry: impl Into<CommandEntry>) -> Self {
        self.commands.push((name.into(), entry.into()));
        self
    }

    pub fn renderers(mut self, renderers: Renderers) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn header_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderers.header = renderer;
        self
    }

    pub fn usage_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderers.usage = renderer;
        self
    }

    pub fn validation_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderers.validation = renderer;
        self
    }

    pub fn parser(mut self, parser: impl ArgumentParser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// User-facing output channel; stdout unless set. `usage_silent` overrides it.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Resolve plugins and run every setup routine once.
    pub async fn build(self) -> Result<Cli, CliError> {
        let order = resolve_plugins(&self.plugins)?;
        debug!(
            plugins = ?order.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
            "Resolved plugin order"
        );

        let mut surface = PluginSurface::new();
        for (name, entry) in self.commands {
            surface.add_command(name, entry)?;
        }
        surface.setup(&order).await?;
        let surface = surface.compile(self.renderers);

        let env = self.config.env();
        let logger = if env.usage_silent {
            Logger::silent()
        } else {
            self.logger.unwrap_or_default()
        };

        Ok(Cli {
            config: self.config,
            env,
            order,
            surface,
            entry: self.entry,
            parser: self.parser,
            logger,
        })
    }
}
