//! CLI host
//!
//! Wires the composition core into a runnable program: plugins are resolved and
//! set up once at build time, then every [`Cli::run`] selects a command, parses
//! its arguments, assembles a fresh context and runs the decorated command chain.

use crate::command::CommandDef;
use crate::config::CliConfig;
use crate::context::{assemble_context, CommandContext, CommandEnv, Logger, RawInputs};
use crate::error::{CliError, ExtensionError};
use crate::parser::{merge_options, ArgumentParser, ValidationFailure};
use crate::plugin::Plugin;
use crate::runner::{runner_fn, CommandRunner};
use crate::surface::CompiledSurface;
use std::sync::Arc;
use tracing::{debug, info};

mod builder;

pub use builder::CliBuilder;

/// A composed command-line program
pub struct Cli {
    config: CliConfig,
    env: CommandEnv,
    order: Vec<Arc<Plugin>>,
    surface: CompiledSurface,
    entry: Option<Arc<CommandDef>>,
    parser: Arc<dyn ArgumentParser>,
    logger: Logger,
}

impl Cli {
    pub fn builder(config: CliConfig) -> CliBuilder {
        CliBuilder::new(config)
    }

    pub fn config(&self) -> &CliConfig {
        &self.config
    }

    /// Plugins in resolved order
    pub fn plugins(&self) -> &[Arc<Plugin>] {
        &self.order
    }

    pub fn surface(&self) -> &CompiledSurface {
        &self.surface
    }

    /// Run one invocation. `args` excludes the program name.
    pub async fn run<I, S>(&self, args: I) -> Result<Option<String>, CliError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let (command, args) = self.select(&args).await?;
        info!(command = %command.name(), "Running command");

        let options = merge_options(self.surface.global_options(), command.options());
        let (parsed, failure) = match self.parser.parse(command.name(), &options, args) {
            Ok(parsed) => (parsed, None),
            Err(failure) => {
                debug!(command = %command.name(), %failure, "Argument validation failed");
                (self.parser.parse_lenient(&options, args), Some(failure))
            }
        };

        let inputs = RawInputs {
            command: Arc::clone(&command),
            options: Arc::new(options),
            values: parsed.values,
            positionals: parsed.positionals,
            rest: parsed.rest,
            env: self.env.clone(),
            logger: self.logger.clone(),
            renderers: self.surface.renderers().clone(),
        };
        let ctx = assemble_context(inputs, &self.order).await?;

        let Some(failure) = failure else {
            let runner = self.surface.command_runner(&command);
            return runner
                .run(&ctx)
                .await
                .map_err(|source| command_error(&command, source));
        };

        // Decorators still get a chance to answer, e.g. `--help`; reaching the
        // body means nobody did and the failure is reported.
        let runner = self.surface.decorate(rejecting(failure));
        match runner.run(&ctx).await {
            Ok(output) => {
                debug!(command = %command.name(), "Decorator answered an invalid invocation");
                Ok(output)
            }
            Err(source) => match source.downcast::<ValidationFailure>() {
                Ok(failure) => {
                    let rendered = self.render_failure(&ctx, &failure).await?;
                    Err(CliError::Validation { failure, rendered })
                }
                Err(source) => Err(command_error(&command, source)),
            },
        }
    }

    /// Pick the sub-command named by the first argument, else the entry command.
    async fn select<'a>(
        &self,
        args: &'a [String],
    ) -> Result<(Arc<CommandDef>, &'a [String]), CliError> {
        if let Some((first, remaining)) = args.split_first() {
            if let Some(entry) = self.surface.command(first) {
                debug!(command = %first, lazy = entry.is_lazy(), "Selected sub-command");
                let command = entry.load().await.map_err(|source| CliError::CommandLoad {
                    name: first.clone(),
                    source,
                })?;
                return Ok((command, remaining));
            }
        }

        match &self.entry {
            Some(entry) => Ok((Arc::clone(entry), args)),
            None => Err(CliError::CommandNotFound(
                args.first().cloned().unwrap_or_default(),
            )),
        }
    }

    async fn render_failure(
        &self,
        ctx: &CommandContext,
        failure: &ValidationFailure,
    ) -> Result<String, CliError> {
        let header = ctx.render_header().await?;
        let errors = ctx.render_validation(failure).await?;
        Ok([header, errors]
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn command_error(command: &CommandDef, source: anyhow::Error) -> CliError {
    CliError::from(ExtensionError::Command {
        command: command.name().to_string(),
        source,
    })
}

/// Stand-in body for an invocation whose arguments were rejected
fn rejecting(failure: ValidationFailure) -> Arc<dyn CommandRunner> {
    runner_fn(move |_| {
        let failure = failure.clone();
        Box::pin(async move { Err(anyhow::Error::new(failure)) })
    })
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("config", &self.config)
            .field(
                "plugins",
                &self.order.iter().map(|p| p.id().as_str()).collect::<Vec<_>>(),
            )
            .field("surface", &self.surface)
            .field("entry", &self.entry.as_ref().map(|e| e.name()))
            .finish()
    }
}
