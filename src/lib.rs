//! Cliweave: Plugin Composition for Command-Line Programs
//!
//! Independent plugins contribute global options, sub-commands, output renderers,
//! command decorators and per-invocation extensions to a single program. Plugins
//! are ordered by their declared dependencies, set up once against a shared
//! registration surface, and assembled into a frozen context for every run.

pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod parser;
pub mod plugin;
pub mod plugins;
pub mod render;
pub mod runner;
pub mod surface;

pub use cli::{Cli, CliBuilder};
pub use command::{ArgValue, CommandDef, CommandEntry, CommandLoader, OptionKind, OptionSchema};
pub use context::{
    assemble_context, CommandContext, CommandEnv, CoreContext, ExtensionKey, Extensions, Logger,
    RawInputs,
};
pub use error::{CliError, ConfigurationError, ExtensionError};
pub use parser::{ArgumentParser, ClapParser, ParsedArgs, ValidationFailure};
pub use plugin::{resolve_plugins, Dependency, Plugin, PluginBuilder, PluginId};
pub use render::{compile_renderer, render_decorator, render_fn, Render, RenderDecorator, Renderers};
pub use runner::{compile_command, runner_fn, CommandDecorator, CommandRunner};
pub use surface::{build_surface, CompiledSurface, PluginSurface, RendererKind};
