//! `--help` and `--version` as a plugin.
//!
//! Registers the two flags as global options and wraps the command chain so that
//! either flag prints its output and stops before the command body runs.

use crate::command::OptionSchema;
use crate::context::{CommandContext, ExtensionKey};
use crate::plugin::Plugin;
use crate::runner::{runner_fn, CommandRunner};
use std::sync::Arc;

pub const HELP: &str = "help";
pub const VERSION: &str = "version";

/// Extension published by [`globals`]
pub const GLOBALS: ExtensionKey<GlobalsExtension> = ExtensionKey::new("globals");

/// Flag state for one invocation plus helpers to produce the standard output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalsExtension {
    pub help: bool,
    pub version: bool,
}

impl GlobalsExtension {
    /// `name version`, or whichever part is known
    pub fn show_version(&self, ctx: &CommandContext) -> String {
        let env = ctx.env();
        match (env.name.as_deref(), env.version.as_deref()) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (None, Some(version)) => version.to_string(),
            (Some(name), None) => format!("{name} (version unknown)"),
            (None, None) => "version unknown".to_string(),
        }
    }

    pub async fn show_header(&self, ctx: &CommandContext) -> anyhow::Result<String> {
        Ok(ctx.render_header().await?)
    }

    pub async fn show_usage(&self, ctx: &CommandContext) -> anyhow::Result<String> {
        Ok(ctx.render_usage().await?)
    }

    /// Header and usage separated by a blank line; empty sections are skipped
    pub async fn show_help(&self, ctx: &CommandContext) -> anyhow::Result<String> {
        let sections = [self.show_header(ctx).await?, self.show_usage(ctx).await?];
        Ok(sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}

/// The `globals` plugin
pub fn globals() -> Plugin {
    Plugin::builder(GLOBALS.id())
        .name("Global options")
        .setup(|surface| {
            surface.add_global_option(
                HELP,
                OptionSchema::boolean().short('h').description("Print help"),
            )?;
            surface.add_global_option(
                VERSION,
                OptionSchema::boolean().short('v').description("Print version"),
            )?;
            surface.decorate_command(short_circuit);
            Ok(())
        })
        .extension(|core, _| {
            Ok(GlobalsExtension {
                help: core.flag(HELP),
                version: core.flag(VERSION),
            })
        })
        .build()
}

fn short_circuit(base: Arc<dyn CommandRunner>) -> Arc<dyn CommandRunner> {
    runner_fn(move |ctx| {
        let base = Arc::clone(&base);
        Box::pin(async move {
            match ctx.extension(&GLOBALS) {
                Some(globals) if globals.version => Ok(Some(globals.show_version(ctx))),
                Some(globals) if globals.help => Ok(Some(globals.show_help(ctx).await?)),
                _ => base.run(ctx).await,
            }
        })
    })
}
