//! Cliweave Demo Binary
//!
//! A small program assembled entirely from plugins: the built-in `globals` plugin
//! plus a greeting plugin and a usage plugin defined below.

use async_trait::async_trait;
use cliweave::config::{CliConfig, ConfigLoader};
use cliweave::logging::init_logging;
use cliweave::plugins::{self, GLOBALS};
use cliweave::{
    render_fn, Cli, CliError, CommandDef, CommandEntry, CommandLoader, ExtensionKey,
    OptionSchema, Plugin,
};
use serde_json::json;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, info};

const APP: &str = "cliweave";

const GREETER: ExtensionKey<Greeter> = ExtensionKey::new("greeting");

/// Greeting capability shared with every command
#[derive(Debug, Clone)]
struct Greeter {
    loud: bool,
}

impl Greeter {
    fn greet(&self, who: &str) -> String {
        let greeting = format!("Hello, {who}!");
        if self.loud {
            greeting.to_uppercase()
        } else {
            greeting
        }
    }
}

fn greeting_plugin() -> Plugin {
    Plugin::builder(GREETER.id())
        .name("Greeting")
        .setup(|surface| {
            surface.add_global_option(
                "loud",
                OptionSchema::boolean().short('l').description("Greet loudly"),
            )?;
            Ok(())
        })
        .extension(|core, _| {
            Ok(Greeter {
                loud: core.flag("loud"),
            })
        })
        .on_extension(|ctx, command| {
            debug!(
                command = %command.name(),
                extensions = ctx.extensions().len(),
                "Greeter ready"
            );
            Ok(())
        })
        .build()
}

/// Appends options and sub-commands to the usage text
fn usage_plugin() -> Plugin {
    Plugin::builder("usage")
        .name("Usage listing")
        .depends_on(&GLOBALS)
        .optionally_depends_on(GREETER.id())
        .setup(|surface| {
            let commands: Arc<Vec<(String, String)>> = Arc::new(
                surface
                    .commands()
                    .iter()
                    .map(|(name, entry)| (name.clone(), entry.description().to_string()))
                    .collect(),
            );
            surface.decorate_usage_renderer(move |base, ctx, failure| {
                let commands = Arc::clone(&commands);
                Box::pin(async move {
                    let mut lines = vec![base.render(ctx, failure).await?];
                    lines.push(String::from("Options:"));
                    for (name, schema) in ctx.options() {
                        let short = schema.short.map(|c| format!("-{c}, ")).unwrap_or_default();
                        lines.push(format!("  {short}--{name}  {}", schema.description));
                    }
                    if !commands.is_empty() {
                        lines.push(String::from("Commands:"));
                        for (name, description) in commands.iter() {
                            lines.push(format!("  {name}  {description}"));
                        }
                    }
                    Ok(lines.join("\n"))
                })
            });
            Ok(())
        })
        .build()
}

fn main_command() -> CommandDef {
    CommandDef::new(APP)
        .description("Greet someone")
        .run(|ctx| {
            Box::pin(async move {
                let who = ctx.positionals().first().map(String::as_str).unwrap_or("world");
                let greeter = ctx
                    .extension(&GREETER)
                    .ok_or_else(|| anyhow::anyhow!("greeting plugin not installed"))?;
                Ok(Some(greeter.greet(who)))
            })
        })
}

fn inspect_command() -> CommandDef {
    CommandDef::new("inspect")
        .description("Print parsed arguments as JSON")
        .option(
            "tag",
            OptionSchema::string().multiple().description("Attach a tag"),
        )
        .run(|ctx| {
            Box::pin(async move {
                let report = json!({
                    "command": ctx.command_name(),
                    "values": ctx.values(),
                    "positionals": ctx.positionals(),
                    "rest": ctx.rest(),
                    "extensions": ctx.extensions().ids().map(|id| id.as_str()).collect::<Vec<_>>(),
                });
                Ok(Some(serde_json::to_string_pretty(&report)?))
            })
        })
}

struct CountLoader;

#[async_trait]
impl CommandLoader for CountLoader {
    async fn load(&self) -> anyhow::Result<CommandDef> {
        Ok(CommandDef::new("count")
            .description("Count positional arguments")
            .run(|ctx| {
                Box::pin(async move {
                    let count = ctx.positionals().len();
                    ctx.log(format!("counted {count} argument(s)"));
                    Ok(Some(count.to_string()))
                })
            }))
    }
}

async fn build_cli(config: CliConfig) -> Result<Cli, CliError> {
    Cli::builder(config)
        .plugin(plugins::globals())
        .plugin(usage_plugin())
        .plugin(greeting_plugin())
        .entry(main_command())
        .command("inspect", inspect_command())
        .command(
            "count",
            CommandEntry::lazy("Count positional arguments", CountLoader),
        )
        .header_renderer(render_fn(|ctx, _| {
            Box::pin(async move {
                let env = ctx.env();
                let mut header = match (&env.name, &env.version) {
                    (Some(name), Some(version)) => format!("{name} {version}"),
                    (Some(name), None) => name.clone(),
                    _ => String::new(),
                };
                if let Some(description) = &env.description {
                    header.push_str(&format!("\n{description}"));
                }
                Ok(header)
            })
        }))
        .usage_renderer(render_fn(|ctx, _| {
            Box::pin(async move { Ok(format!("Usage: {} [OPTIONS] [ARGS]...", ctx.command_name())) })
        }))
        .validation_renderer(render_fn(|_, failure| {
            Box::pin(async move {
                Ok(failure
                    .map(|f| {
                        f.errors()
                            .iter()
                            .map(|e| format!("error: {e}"))
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_default())
            })
        }))
        .build()
        .await
}

#[tokio::main]
async fn main() {
    let mut config = match ConfigLoader::load(APP) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    if config.version.is_none() {
        config.version = Some(env!("CARGO_PKG_VERSION").to_string());
    }

    if let Err(e) = init_logging(Some(&config.logging)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let cli = match build_cli(config).await {
        Ok(cli) => cli,
        Err(e) => {
            let plugins: Vec<&str> = match &e {
                CliError::Configuration(err) => {
                    err.plugin_ids().into_iter().map(|id| id.as_str()).collect()
                }
                _ => Vec::new(),
            };
            error!(?plugins, "Plugin composition failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match cli.run(std::env::args().skip(1)).await {
        Ok(Some(output)) => println!("{}", output),
        Ok(None) => {}
        Err(CliError::Validation { rendered, .. }) => {
            eprintln!("{}", rendered);
            process::exit(1);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
    info!("Done");
}
