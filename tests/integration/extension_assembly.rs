//! Extension build and notify passes over a resolved plugin order

use async_trait::async_trait;
use cliweave::{
    assemble_context, resolve_plugins, CommandContext, CommandDef, CoreContext, ExtensionError,
    ExtensionKey, Plugin, RawInputs,
};
use cliweave::plugin::{ExtensionFactory, ExtensionHook};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Stand-in for a localization collaborator
#[derive(Debug)]
struct Catalog {
    messages: HashMap<&'static str, &'static str>,
}

impl Catalog {
    fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.messages.get(key).copied().unwrap_or(key)
    }
}

#[derive(Debug)]
struct UsageText {
    title: String,
}

const I18N: ExtensionKey<Catalog> = ExtensionKey::new("i18n");
const USAGE: ExtensionKey<UsageText> = ExtensionKey::new("usage");

struct CatalogFactory;

#[async_trait]
impl ExtensionFactory for CatalogFactory {
    type Output = Catalog;

    async fn create(&self, _core: &CoreContext, _command: &CommandDef) -> anyhow::Result<Catalog> {
        Ok(Catalog {
            messages: HashMap::from([("usage.title", "Utilisation")]),
        })
    }
}

fn i18n_plugin() -> Arc<Plugin> {
    Arc::new(Plugin::builder(I18N.id()).extension_with(CatalogFactory).build())
}

fn usage_plugin() -> Arc<Plugin> {
    Arc::new(
        Plugin::builder(USAGE.id())
            .optionally_depends_on(I18N.id())
            .extension(|core, _| {
                let title = match core.extension(&I18N) {
                    Some(catalog) => catalog.translate("usage.title").to_string(),
                    None => "Usage".to_string(),
                };
                Ok(UsageText { title })
            })
            .build(),
    )
}

fn inputs() -> RawInputs {
    RawInputs::new(Arc::new(CommandDef::new("main")))
}

#[tokio::test]
async fn test_optional_dependency_present_is_consumed() {
    let order = resolve_plugins(&[usage_plugin(), i18n_plugin()]).unwrap();
    let ctx = assemble_context(inputs(), &order).await.unwrap();

    assert_eq!(ctx.extension(&USAGE).unwrap().title, "Utilisation");
    assert!(ctx.extension(&I18N).is_some());
}

#[tokio::test]
async fn test_optional_dependency_absent_reads_as_none() {
    let order = resolve_plugins(&[usage_plugin()]).unwrap();
    let ctx = assemble_context(inputs(), &order).await.unwrap();

    assert_eq!(ctx.extension(&USAGE).unwrap().title, "Usage");
    assert!(ctx.extension(&I18N).is_none());
}

#[tokio::test]
async fn test_type_mismatch_reads_as_none() {
    let order = resolve_plugins(&[i18n_plugin()]).unwrap();
    let ctx = assemble_context(inputs(), &order).await.unwrap();

    let wrong: ExtensionKey<UsageText> = ExtensionKey::new("i18n");
    assert!(ctx.extension(&wrong).is_none());
}

struct SnapshotHook {
    seen: Arc<Mutex<Vec<(String, bool)>>>,
}

#[async_trait]
impl ExtensionHook for SnapshotHook {
    async fn on_extension(&self, ctx: &CommandContext, command: &CommandDef) -> anyhow::Result<()> {
        let complete = ctx.extension(&I18N).is_some() && ctx.extension(&USAGE).is_some();
        self.seen.lock().push((command.name().to_string(), complete));
        Ok(())
    }
}

#[tokio::test]
async fn test_notify_runs_after_every_extension_is_built() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    // first in resolved order, so its hook would see an empty map if notify ran early
    let early = Arc::new(
        Plugin::builder("early")
            .extension(|_, _| Ok(()))
            .on_extension_with(SnapshotHook {
                seen: Arc::clone(&seen),
            })
            .build(),
    );

    let order = resolve_plugins(&[early, usage_plugin(), i18n_plugin()]).unwrap();
    assemble_context(inputs(), &order).await.unwrap();

    assert_eq!(*seen.lock(), vec![("main".to_string(), true)]);
}

#[tokio::test]
async fn test_hooks_on_both_ends_of_a_dependency_see_the_full_map() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let catalog = Arc::new(
        Plugin::builder(I18N.id())
            .extension_with(CatalogFactory)
            .on_extension_with(SnapshotHook {
                seen: Arc::clone(&seen),
            })
            .build(),
    );
    let usage = Arc::new(
        Plugin::builder(USAGE.id())
            .depends_on(&I18N)
            .extension(|core, _| {
                let catalog = core
                    .extension(&I18N)
                    .ok_or_else(|| anyhow::anyhow!("catalog not built yet"))?;
                Ok(UsageText {
                    title: catalog.translate("usage.title").to_string(),
                })
            })
            .on_extension_with(SnapshotHook {
                seen: Arc::clone(&seen),
            })
            .build(),
    );

    let order = resolve_plugins(&[usage, catalog]).unwrap();
    let ctx = assemble_context(inputs(), &order).await.unwrap();

    assert_eq!(ctx.extension(&USAGE).unwrap().title, "Utilisation");
    assert_eq!(
        *seen.lock(),
        vec![("main".to_string(), true), ("main".to_string(), true)]
    );
}

#[tokio::test]
async fn test_factory_failure_stops_assembly() {
    let built = Arc::new(Mutex::new(Vec::new()));
    let later_built = Arc::clone(&built);
    let failing = Arc::new(
        Plugin::builder("failing")
            .extension(|_, _| -> anyhow::Result<()> { anyhow::bail!("backend unavailable") })
            .build(),
    );
    let later = Arc::new(
        Plugin::builder("later")
            .extension(move |_, _| {
                later_built.lock().push("later");
                Ok(())
            })
            .build(),
    );

    let err = assemble_context(inputs(), &[failing, later]).await.unwrap_err();
    assert!(matches!(err, ExtensionError::Factory { ref plugin, .. } if plugin.as_str() == "failing"));
    assert!(built.lock().is_empty());
}
