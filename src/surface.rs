//! Registration Surface
//!
//! The mutable builder plugins write into during setup. Setup runs once, in
//! resolved order, against a single surface; compiling consumes it into an
//! immutable [`CompiledSurface`] shared by every invocation.

use crate::command::{CommandDef, CommandEntry, OptionSchema};
use crate::context::CommandContext;
use crate::error::ConfigurationError;
use crate::parser::ValidationFailure;
use crate::plugin::Plugin;
use crate::render::{compile_renderer, render_decorator, Render, RenderDecorator, Renderers};
use crate::runner::{compile_command, CommandDecorator, CommandRunner};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Mutable registration target handed to each plugin's setup routine
#[derive(Default)]
pub struct PluginSurface {
    global_options: BTreeMap<String, OptionSchema>,
    commands: BTreeMap<String, CommandEntry>,
    header: Vec<Arc<dyn RenderDecorator>>,
    usage: Vec<Arc<dyn RenderDecorator>>,
    validation: Vec<Arc<dyn RenderDecorator>>,
    /// Outermost first: the most recent registration sits at index 0
    command_decorators: Vec<Arc<dyn CommandDecorator>>,
}

impl PluginSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_option(
        &mut self,
        name: impl Into<String>,
        schema: OptionSchema,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyOptionName);
        }
        if self.global_options.contains_key(&name) {
            return Err(ConfigurationError::DuplicateOption(name));
        }
        if let Some(short) = schema.short {
            let owner = self
                .global_options
                .iter()
                .find(|(_, existing)| existing.short == Some(short));
            if let Some((existing, _)) = owner {
                return Err(ConfigurationError::DuplicateShort {
                    short,
                    option: name,
                    existing: existing.clone(),
                });
            }
        }
        self.global_options.insert(name, schema);
        Ok(())
    }

    pub fn add_command(
        &mut self,
        name: impl Into<String>,
        entry: impl Into<CommandEntry>,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyCommandName);
        }
        if self.commands.contains_key(&name) {
            return Err(ConfigurationError::DuplicateCommand(name));
        }
        self.commands.insert(name, entry.into());
        Ok(())
    }

    /// Options registered so far
    pub fn global_options(&self) -> &BTreeMap<String, OptionSchema> {
        &self.global_options
    }

    /// Sub-commands registered so far
    pub fn commands(&self) -> &BTreeMap<String, CommandEntry> {
        &self.commands
    }

    pub fn decorate_header_renderer<F>(&mut self, decorator: F)
    where
        F: for<'a> Fn(
                &'a dyn Render,
                &'a CommandContext,
                Option<&'a ValidationFailure>,
            ) -> BoxFuture<'a, anyhow::Result<String>>
            + Send
            + Sync
            + 'static,
    {
        self.header.push(render_decorator(decorator));
    }

    pub fn decorate_usage_renderer<F>(&mut self, decorator: F)
    where
        F: for<'a> Fn(
                &'a dyn Render,
                &'a CommandContext,
                Option<&'a ValidationFailure>,
            ) -> BoxFuture<'a, anyhow::Result<String>>
            + Send
            + Sync
            + 'static,
    {
        self.usage.push(render_decorator(decorator));
    }

    pub fn decorate_validation_errors_renderer<F>(&mut self, decorator: F)
    where
        F: for<'a> Fn(
                &'a dyn Render,
                &'a CommandContext,
                Option<&'a ValidationFailure>,
            ) -> BoxFuture<'a, anyhow::Result<String>>
            + Send
            + Sync
            + 'static,
    {
        self.validation.push(render_decorator(decorator));
    }

    /// Register a renderer decorator implemented as a type rather than a closure
    pub fn decorate_renderer_with(&mut self, kind: RendererKind, decorator: Arc<dyn RenderDecorator>) {
        match kind {
            RendererKind::Header => self.header.push(decorator),
            RendererKind::Usage => self.usage.push(decorator),
            RendererKind::Validation => self.validation.push(decorator),
        }
    }

    /// Wrap the command chain. Later registrations run before earlier ones.
    pub fn decorate_command<F>(&mut self, decorator: F)
    where
        F: Fn(Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner> + Send + Sync + 'static,
    {
        self.decorate_command_with(Arc::new(decorator));
    }

    pub fn decorate_command_with(&mut self, decorator: Arc<dyn CommandDecorator>) {
        self.command_decorators.insert(0, decorator);
    }

    /// Run every plugin's setup in resolved order.
    pub async fn setup(&mut self, order: &[Arc<Plugin>]) -> Result<(), ConfigurationError> {
        for plugin in order {
            debug!(plugin = %plugin.id(), "Running plugin setup");
            plugin.setup(self).await.map_err(|source| {
                match source.downcast::<ConfigurationError>() {
                    Ok(err) => err,
                    Err(source) => ConfigurationError::Setup {
                        plugin: plugin.id().clone(),
                        source,
                    },
                }
            })?;
        }
        Ok(())
    }

    /// Consume the surface, compiling each renderer chain over `defaults`
    pub fn compile(self, defaults: Renderers) -> CompiledSurface {
        CompiledSurface {
            renderers: Renderers {
                header: compile_renderer(defaults.header, &self.header),
                usage: compile_renderer(defaults.usage, &self.usage),
                validation: compile_renderer(defaults.validation, &self.validation),
            },
            global_options: self.global_options,
            commands: self.commands,
            command_decorators: self.command_decorators,
        }
    }
}

impl fmt::Debug for PluginSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginSurface")
            .field("global_options", &self.global_options)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("header_decorators", &self.header.len())
            .field("usage_decorators", &self.usage.len())
            .field("validation_decorators", &self.validation.len())
            .field("command_decorators", &self.command_decorators.len())
            .finish()
    }
}

/// Which renderer chain a decorator belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Header,
    Usage,
    Validation,
}

/// Immutable result of setup
pub struct CompiledSurface {
    global_options: BTreeMap<String, OptionSchema>,
    commands: BTreeMap<String, CommandEntry>,
    renderers: Renderers,
    command_decorators: Vec<Arc<dyn CommandDecorator>>,
}

impl CompiledSurface {
    pub fn global_options(&self) -> &BTreeMap<String, OptionSchema> {
        &self.global_options
    }

    pub fn commands(&self) -> &BTreeMap<String, CommandEntry> {
        &self.commands
    }

    pub fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    pub fn renderers(&self) -> &Renderers {
        &self.renderers
    }

    /// The command's body wrapped in every registered command decorator
    pub fn command_runner(&self, command: &CommandDef) -> Arc<dyn CommandRunner> {
        self.decorate(command.body())
    }

    /// Wrap an arbitrary runner in the registered command decorators
    pub fn decorate(&self, base: Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner> {
        compile_command(base, &self.command_decorators)
    }
}

impl fmt::Debug for CompiledSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSurface")
            .field("global_options", &self.global_options)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("command_decorators", &self.command_decorators.len())
            .finish()
    }
}

/// Run setup on a fresh surface and compile it
pub async fn build_surface(
    order: &[Arc<Plugin>],
    defaults: Renderers,
) -> Result<CompiledSurface, ConfigurationError> {
    let mut surface = PluginSurface::new();
    surface.setup(order).await?;
    Ok(surface.compile(defaults))
}
