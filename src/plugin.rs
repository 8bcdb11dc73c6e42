//! Plugin Definitions
//!
//! A plugin is an identifiable unit that contributes global options, sub-commands,
//! decorators, and/or a typed extension to a shared command. Plugins are built once
//! through [`PluginBuilder`] and shared as `Arc<Plugin>` for the rest of the process.

use crate::command::CommandDef;
use crate::context::{CommandContext, CoreContext, ExtensionKey, ExtensionValue};
use crate::surface::PluginSurface;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

pub mod resolve;

pub use resolve::{resolve_plugins, Resolver};

/// Identifier under which a plugin and its extension are registered
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PluginId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A declared dependency on another plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub id: PluginId,
    pub optional: bool,
}

impl Dependency {
    pub fn required(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            optional: false,
        }
    }

    pub fn optional(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            optional: true,
        }
    }
}

impl From<&str> for Dependency {
    fn from(id: &str) -> Self {
        Dependency::required(id)
    }
}

impl From<String> for Dependency {
    fn from(id: String) -> Self {
        Dependency::required(id)
    }
}

impl From<PluginId> for Dependency {
    fn from(id: PluginId) -> Self {
        Dependency::required(id)
    }
}

impl<T> From<&ExtensionKey<T>> for Dependency {
    fn from(key: &ExtensionKey<T>) -> Self {
        Dependency::required(key.id())
    }
}

/// Setup routine run once against the registration surface.
#[async_trait]
pub trait PluginSetup: Send + Sync {
    async fn setup(&self, surface: &mut PluginSurface) -> anyhow::Result<()>;
}

/// Builds a plugin's extension value for one invocation.
///
/// The core context exposes the extensions of every plugin earlier in the
/// resolved order, so a factory may consume its dependencies' capabilities.
#[async_trait]
pub trait ExtensionFactory: Send + Sync {
    type Output: Any + Send + Sync;

    async fn create(
        &self,
        core: &CoreContext,
        command: &CommandDef,
    ) -> anyhow::Result<Self::Output>;
}

/// Notified once the full context, with every extension built, is frozen.
#[async_trait]
pub trait ExtensionHook: Send + Sync {
    async fn on_extension(&self, ctx: &CommandContext, command: &CommandDef)
        -> anyhow::Result<()>;
}

/// Type-erased factory stored on the descriptor
#[async_trait]
pub(crate) trait ErasedFactory: Send + Sync {
    async fn create_erased(
        &self,
        core: &CoreContext,
        command: &CommandDef,
    ) -> anyhow::Result<ExtensionValue>;
}

#[async_trait]
impl<F: ExtensionFactory> ErasedFactory for F {
    async fn create_erased(
        &self,
        core: &CoreContext,
        command: &CommandDef,
    ) -> anyhow::Result<ExtensionValue> {
        let value = self.create(core, command).await?;
        Ok(Arc::new(value))
    }
}

struct FnSetup<F>(F);

#[async_trait]
impl<F> PluginSetup for FnSetup<F>
where
    F: Fn(&mut PluginSurface) -> anyhow::Result<()> + Send + Sync,
{
    async fn setup(&self, surface: &mut PluginSurface) -> anyhow::Result<()> {
        (self.0)(surface)
    }
}

struct FnFactory<F, T> {
    factory: F,
    _output: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, T> ExtensionFactory for FnFactory<F, T>
where
    F: Fn(&CoreContext, &CommandDef) -> anyhow::Result<T> + Send + Sync,
    T: Any + Send + Sync,
{
    type Output = T;

    async fn create(&self, core: &CoreContext, command: &CommandDef) -> anyhow::Result<T> {
        (self.factory)(core, command)
    }
}

struct FnHook<F>(F);

#[async_trait]
impl<F> ExtensionHook for FnHook<F>
where
    F: Fn(&CommandContext, &CommandDef) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_extension(
        &self,
        ctx: &CommandContext,
        command: &CommandDef,
    ) -> anyhow::Result<()> {
        (self.0)(ctx, command)
    }
}

/// Factory plus optional notify hook, keyed by the owning plugin's id
#[derive(Clone)]
pub struct ExtensionDescriptor {
    key: PluginId,
    pub(crate) factory: Arc<dyn ErasedFactory>,
    pub(crate) hook: Option<Arc<dyn ExtensionHook>>,
}

impl ExtensionDescriptor {
    pub fn key(&self) -> &PluginId {
        &self.key
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }
}

impl fmt::Debug for ExtensionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionDescriptor")
            .field("key", &self.key)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}

/// A composable unit of CLI behavior
pub struct Plugin {
    id: PluginId,
    name: Option<String>,
    dependencies: Vec<Dependency>,
    setup: Option<Arc<dyn PluginSetup>>,
    extension: Option<ExtensionDescriptor>,
}

impl Plugin {
    /// Start defining a plugin with the given id
    pub fn builder(id: impl Into<PluginId>) -> PluginBuilder {
        PluginBuilder::new(id)
    }

    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Display name, falling back to the id
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn extension(&self) -> Option<&ExtensionDescriptor> {
        self.extension.as_ref()
    }

    /// Run this plugin's setup routine against the surface.
    pub async fn setup(&self, surface: &mut PluginSurface) -> anyhow::Result<()> {
        match &self.setup {
            Some(setup) => setup.setup(surface).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("extension", &self.extension)
            .finish()
    }
}

/// Plugin definition factory
pub struct PluginBuilder {
    id: PluginId,
    name: Option<String>,
    dependencies: Vec<Dependency>,
    setup: Option<Arc<dyn PluginSetup>>,
    factory: Option<Arc<dyn ErasedFactory>>,
    hook: Option<Arc<dyn ExtensionHook>>,
}

impl PluginBuilder {
    pub fn new(id: impl Into<PluginId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            dependencies: Vec::new(),
            setup: None,
            factory: None,
            hook: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a dependency. Plain ids are required dependencies.
    pub fn depends_on(mut self, dependency: impl Into<Dependency>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn optionally_depends_on(mut self, id: impl Into<PluginId>) -> Self {
        self.dependencies.push(Dependency::optional(id));
        self
    }

    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&mut PluginSurface) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(FnSetup(setup)));
        self
    }

    pub fn setup_with(mut self, setup: impl PluginSetup + 'static) -> Self {
        self.setup = Some(Arc::new(setup));
        self
    }

    pub fn extension<F, T>(mut self, factory: F) -> Self
    where
        F: Fn(&CoreContext, &CommandDef) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        self.factory = Some(Arc::new(FnFactory {
            factory,
            _output: PhantomData,
        }));
        self
    }

    pub fn extension_with(mut self, factory: impl ExtensionFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn on_extension<F>(mut self, hook: F) -> Self
    where
        F: Fn(&CommandContext, &CommandDef) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(FnHook(hook)));
        self
    }

    pub fn on_extension_with(mut self, hook: impl ExtensionHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Plugin {
        let extension = match (self.factory, self.hook) {
            (Some(factory), hook) => Some(ExtensionDescriptor {
                key: self.id.clone(),
                factory,
                hook,
            }),
            (None, Some(_)) => {
                warn!(plugin = %self.id, "extension hook ignored: plugin declares no extension");
                None
            }
            (None, None) => None,
        };

        Plugin {
            id: self.id,
            name: self.name,
            dependencies: self.dependencies,
            setup: self.setup,
            extension,
        }
    }
}
