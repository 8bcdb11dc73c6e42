//! End-to-end runs through the `Cli` host

use async_trait::async_trait;
use cliweave::config::CliConfig;
use cliweave::plugins::{self, GLOBALS};
use cliweave::{
    render_fn, Cli, CliError, CommandDef, CommandEntry, CommandLoader, ConfigurationError,
    ExtensionKey, Logger, OptionSchema, Plugin,
};
use parking_lot::Mutex;
use std::sync::Arc;

const COUNTER: ExtensionKey<usize> = ExtensionKey::new("counter");

fn config() -> CliConfig {
    CliConfig {
        name: Some("tool".into()),
        version: Some("1.4.0".into()),
        ..CliConfig::default()
    }
}

fn counter_plugin() -> Plugin {
    Plugin::builder(COUNTER.id())
        .depends_on(&GLOBALS)
        .extension(|core, _| Ok(core.positionals().len()))
        .build()
}

fn entry() -> CommandDef {
    CommandDef::new("tool").run(|ctx| {
        Box::pin(async move {
            let count = ctx.extension(&COUNTER).copied().unwrap_or_default();
            ctx.log(format!("saw {count} positional(s)"));
            Ok(Some(format!("{count}")))
        })
    })
}

struct DeployLoader {
    loads: Arc<Mutex<usize>>,
}

#[async_trait]
impl CommandLoader for DeployLoader {
    async fn load(&self) -> anyhow::Result<CommandDef> {
        *self.loads.lock() += 1;
        Ok(CommandDef::new("deploy")
            .option("target", OptionSchema::choice(["staging", "prod"]).required())
            .run(|ctx| {
                Box::pin(async move {
                    Ok(Some(format!(
                        "deploying to {}",
                        ctx.string("target").unwrap_or_default()
                    )))
                })
            }))
    }
}

async fn build(loads: Arc<Mutex<usize>>, logger: Logger) -> Cli {
    Cli::builder(config())
        .plugin(counter_plugin())
        .plugin(plugins::globals())
        .entry(entry())
        .command("deploy", CommandEntry::lazy("Deploy the build", DeployLoader { loads }))
        .usage_renderer(render_fn(|ctx, _| {
            Box::pin(async move {
                let names: Vec<&str> = ctx.options().keys().map(String::as_str).collect();
                Ok(format!("Usage: tool [{}]", names.join("|")))
            })
        }))
        .logger(logger)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_plugins_are_resolved_before_setup() {
    let cli = build(Arc::new(Mutex::new(0)), Logger::silent()).await;
    let order: Vec<&str> = cli.plugins().iter().map(|p| p.id().as_str()).collect();
    assert_eq!(order, vec!["globals", "counter"]);
}

#[tokio::test]
async fn test_entry_command_sees_extensions_and_logger() {
    let (logger, buffer) = Logger::buffered();
    let cli = build(Arc::new(Mutex::new(0)), logger).await;

    let output = cli.run(["a", "b", "--", "c"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("2"));
    assert_eq!(buffer.lines(), vec!["saw 2 positional(s)"]);
}

#[tokio::test]
async fn test_version_flag_short_circuits_entry() {
    let (logger, buffer) = Logger::buffered();
    let cli = build(Arc::new(Mutex::new(0)), logger).await;

    let output = cli.run(["--version"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("tool 1.4.0"));
    assert!(buffer.lines().is_empty());
}

#[tokio::test]
async fn test_help_renders_merged_options() {
    let cli = build(Arc::new(Mutex::new(0)), Logger::silent()).await;

    let output = cli.run(["-h"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("Usage: tool [help|version]"));
}

#[tokio::test]
async fn test_lazy_command_loads_only_when_selected() {
    let loads = Arc::new(Mutex::new(0));
    let cli = build(Arc::clone(&loads), Logger::silent()).await;

    cli.run(Vec::<String>::new()).await.unwrap();
    assert_eq!(*loads.lock(), 0);

    let output = cli.run(["deploy", "--target", "prod"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("deploying to prod"));
    assert_eq!(*loads.lock(), 1);
}

#[tokio::test]
async fn test_invalid_choice_is_a_validation_error() {
    let cli = build(Arc::new(Mutex::new(0)), Logger::silent()).await;

    let err = cli.run(["deploy", "--target", "moon"]).await.unwrap_err();
    assert!(matches!(err, CliError::Validation { .. }));
}

#[tokio::test]
async fn test_help_answers_despite_missing_required_option() {
    let cli = build(Arc::new(Mutex::new(0)), Logger::silent()).await;

    let output = cli.run(["deploy", "--help"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("Usage: tool [help|target|version]"));

    let output = cli.run(["deploy", "--target", "moon", "-v"]).await.unwrap();
    assert_eq!(output.as_deref(), Some("tool 1.4.0"));

    let err = cli.run(["deploy"]).await.unwrap_err();
    assert!(matches!(err, CliError::Validation { .. }));
}

#[tokio::test]
async fn test_global_short_flag_clash_fails_build() {
    let verbose = Plugin::builder("verbose")
        .setup(|surface| {
            surface.add_global_option("verbose", OptionSchema::boolean().short('v'))?;
            Ok(())
        })
        .build();

    let err = Cli::builder(config())
        .plugin(plugins::globals())
        .plugin(verbose)
        .entry(entry())
        .build()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CliError::Configuration(ConfigurationError::DuplicateShort { short: 'v', .. })
    ));
}

#[tokio::test]
async fn test_command_short_flag_takes_over_global() {
    let cli = Cli::builder(config())
        .plugin(plugins::globals())
        .entry(
            CommandDef::new("tool")
                .option("verbose", OptionSchema::boolean().short('v'))
                .run(|ctx| {
                    Box::pin(async move { Ok(Some(format!("verbose={}", ctx.flag("verbose")))) })
                }),
        )
        .build()
        .await
        .unwrap();

    assert_eq!(cli.run(["-v"]).await.unwrap().as_deref(), Some("verbose=true"));
    assert_eq!(cli.run(["--version"]).await.unwrap().as_deref(), Some("tool 1.4.0"));
}
