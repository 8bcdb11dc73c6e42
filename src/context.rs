//! Command Context
//!
//! Per-invocation state shared by extension factories, notify hooks, decorators
//! and the command body. Extension factories see a [`CoreContext`] that grows as
//! the assembler walks the resolved order; everyone else sees the frozen
//! [`CommandContext`], an immutable snapshot behind an `Arc`.

use crate::command::{ArgValue, CommandDef, OptionSchema};
use crate::error::ExtensionError;
use crate::parser::ValidationFailure;
use crate::plugin::PluginId;
use crate::render::Renderers;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

pub mod assemble;

pub use assemble::assemble_context;

/// Type-erased extension value
pub type ExtensionValue = Arc<dyn Any + Send + Sync>;

/// Typed handle to the extension a plugin publishes under its id
pub struct ExtensionKey<T> {
    id: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<T> ExtensionKey<T> {
    pub const fn new(id: &'static str) -> Self {
        Self {
            id,
            _value: PhantomData,
        }
    }

    pub const fn id(&self) -> &'static str {
        self.id
    }
}

impl<T> Clone for ExtensionKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ExtensionKey<T> {}

impl<T> fmt::Debug for ExtensionKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExtensionKey").field(&self.id).finish()
    }
}

/// Extensions namespaced by plugin id
#[derive(Clone, Default)]
pub struct Extensions {
    entries: HashMap<PluginId, ExtensionValue>,
}

impl Extensions {
    /// Typed lookup. `None` when the plugin is absent or published another type.
    pub fn get<T: Any>(&self, key: &ExtensionKey<T>) -> Option<&T> {
        self.get_by_id(key.id())
    }

    pub fn get_by_id<T: Any>(&self, id: &str) -> Option<&T> {
        self.entries.get(id).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &PluginId> {
        self.entries.keys()
    }

    /// Append-only: returns false and keeps the existing entry if `id` is taken.
    pub(crate) fn insert(&mut self, id: PluginId, value: ExtensionValue) -> bool {
        match self.entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.entries.keys().map(PluginId::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("Extensions").field("ids", &ids).finish()
    }
}

/// Program identity available to every command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEnv {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// Suppress [`Logger`] output
    pub usage_silent: bool,
}

type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// User-facing output channel of a command
#[derive(Clone)]
pub struct Logger {
    sink: Option<LogSink>,
}

impl Logger {
    /// Writes each message as a line on stdout
    pub fn stdout() -> Self {
        Self::from_fn(|message| println!("{message}"))
    }

    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn from_fn(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// Logger that records messages in memory
    pub fn buffered() -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        let lines = Arc::clone(&buffer.lines);
        let logger = Self::from_fn(move |message| lines.lock().push(message.to_string()));
        (logger, buffer)
    }

    pub fn log(&self, message: impl AsRef<str>) {
        if let Some(sink) = &self.sink {
            sink(message.as_ref());
        }
    }

    pub fn is_silent(&self) -> bool {
        self.sink.is_none()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("silent", &self.is_silent())
            .finish()
    }
}

/// Messages captured by [`Logger::buffered`]
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

/// Everything the host knows before extensions are built
#[derive(Debug, Clone)]
pub struct RawInputs {
    pub command: Arc<CommandDef>,
    /// Merged global and command option schema
    pub options: Arc<BTreeMap<String, OptionSchema>>,
    pub values: BTreeMap<String, ArgValue>,
    pub positionals: Vec<String>,
    pub rest: Vec<String>,
    pub env: CommandEnv,
    pub logger: Logger,
    pub renderers: Renderers,
}

impl RawInputs {
    /// Inputs for `command` with nothing parsed
    pub fn new(command: Arc<CommandDef>) -> Self {
        let options = Arc::new(command.options().clone());
        Self {
            command,
            options,
            values: BTreeMap::new(),
            positionals: Vec::new(),
            rest: Vec::new(),
            env: CommandEnv::default(),
            logger: Logger::silent(),
            renderers: Renderers::default(),
        }
    }
}

/// Fields shared by the core and frozen contexts
#[derive(Debug)]
pub struct ContextData {
    command: Arc<CommandDef>,
    options: Arc<BTreeMap<String, OptionSchema>>,
    values: BTreeMap<String, ArgValue>,
    positionals: Vec<String>,
    rest: Vec<String>,
    env: CommandEnv,
    logger: Logger,
    renderers: Renderers,
    extensions: Extensions,
}

impl ContextData {
    fn from_inputs(inputs: RawInputs) -> Self {
        Self {
            command: inputs.command,
            options: inputs.options,
            values: inputs.values,
            positionals: inputs.positionals,
            rest: inputs.rest,
            env: inputs.env,
            logger: inputs.logger,
            renderers: inputs.renderers,
            extensions: Extensions::default(),
        }
    }

    pub fn command(&self) -> &CommandDef {
        &self.command
    }

    pub fn command_name(&self) -> &str {
        self.command.name()
    }

    pub fn options(&self) -> &BTreeMap<String, OptionSchema> {
        &self.options
    }

    pub fn values(&self) -> &BTreeMap<String, ArgValue> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    /// True only when a boolean option was set
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).and_then(ArgValue::as_bool).unwrap_or(false)
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(ArgValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(ArgValue::as_f64)
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    pub fn env(&self) -> &CommandEnv {
        &self.env
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extension<T: Any>(&self, key: &ExtensionKey<T>) -> Option<&T> {
        self.extensions.get(key)
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.logger.log(message);
    }

    pub fn renderers(&self) -> &Renderers {
        &self.renderers
    }
}

/// Context seen by extension factories while the build pass is running
#[derive(Debug)]
pub struct CoreContext {
    data: ContextData,
}

impl CoreContext {
    pub(crate) fn new(inputs: RawInputs) -> Self {
        Self {
            data: ContextData::from_inputs(inputs),
        }
    }

    pub(crate) fn insert_extension(&mut self, id: PluginId, value: ExtensionValue) -> bool {
        self.data.extensions.insert(id, value)
    }

    pub(crate) fn freeze(self) -> CommandContext {
        CommandContext {
            data: Arc::new(self.data),
        }
    }
}

impl Deref for CoreContext {
    type Target = ContextData;

    fn deref(&self) -> &ContextData {
        &self.data
    }
}

/// Frozen per-invocation context
#[derive(Debug, Clone)]
pub struct CommandContext {
    data: Arc<ContextData>,
}

impl CommandContext {
    /// A context for `command` with no parsed values and no extensions
    pub fn detached(command: Arc<CommandDef>) -> Self {
        CoreContext::new(RawInputs::new(command)).freeze()
    }

    pub async fn render_header(&self) -> Result<String, ExtensionError> {
        self.data
            .renderers
            .header
            .render(self, None)
            .await
            .map_err(|source| ExtensionError::Render { source })
    }

    pub async fn render_usage(&self) -> Result<String, ExtensionError> {
        self.data
            .renderers
            .usage
            .render(self, None)
            .await
            .map_err(|source| ExtensionError::Render { source })
    }

    pub async fn render_validation(
        &self,
        failure: &ValidationFailure,
    ) -> Result<String, ExtensionError> {
        self.data
            .renderers
            .validation
            .render(self, Some(failure))
            .await
            .map_err(|source| ExtensionError::Render { source })
    }
}

impl Deref for CommandContext {
    type Target = ContextData;

    fn deref(&self) -> &ContextData {
        &self.data
    }
}
