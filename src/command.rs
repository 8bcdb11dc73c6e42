//! Command and option definitions.
//!
//! A [`CommandDef`] pairs a name and option schema with the runner that forms the
//! innermost base of the command decorator chain. Sub-commands may be registered
//! lazily through a [`CommandLoader`] and are only materialized when selected.

use crate::context::CommandContext;
use crate::runner::{runner_fn, CommandRunner};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Value type accepted by an option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Boolean,
    String,
    Number,
    /// One of a fixed set of string values
    Choice(Vec<String>),
}

/// Schema of one option, handed to the argument parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionSchema {
    pub kind: OptionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl OptionSchema {
    pub fn new(kind: OptionKind) -> Self {
        Self {
            kind,
            short: None,
            description: String::new(),
            required: false,
            multiple: false,
            default: None,
        }
    }

    pub fn boolean() -> Self {
        Self::new(OptionKind::Boolean)
    }

    pub fn string() -> Self {
        Self::new(OptionKind::String)
    }

    pub fn number() -> Self {
        Self::new(OptionKind::Number)
    }

    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(OptionKind::Choice(
            choices.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// A parsed option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl ArgValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArgValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A concrete command: name, options, and the body run at the base of the chain
#[derive(Clone)]
pub struct CommandDef {
    name: String,
    description: String,
    options: BTreeMap<String, OptionSchema>,
    runner: Arc<dyn CommandRunner>,
}

impl CommandDef {
    /// A command whose body does nothing and produces no output
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            options: BTreeMap::new(),
            runner: runner_fn(|_| Box::pin(async { Ok(None) })),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn option(mut self, name: impl Into<String>, schema: OptionSchema) -> Self {
        self.options.insert(name.into(), schema);
        self
    }

    /// Set the command body
    pub fn run<F>(mut self, body: F) -> Self
    where
        F: for<'a> Fn(&'a CommandContext) -> BoxFuture<'a, anyhow::Result<Option<String>>>
            + Send
            + Sync
            + 'static,
    {
        self.runner = runner_fn(body);
        self
    }

    pub fn runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn describe(&self) -> &str {
        &self.description
    }

    pub fn options(&self) -> &BTreeMap<String, OptionSchema> {
        &self.options
    }

    pub fn body(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("options", &self.options)
            .finish()
    }
}

/// Resolves a deferred sub-command into its concrete definition
#[async_trait]
pub trait CommandLoader: Send + Sync {
    async fn load(&self) -> anyhow::Result<CommandDef>;
}

/// A registered sub-command, either ready or deferred
#[derive(Clone)]
pub enum CommandEntry {
    Loaded(Arc<CommandDef>),
    Lazy {
        description: String,
        loader: Arc<dyn CommandLoader>,
    },
}

impl CommandEntry {
    pub fn lazy(description: impl Into<String>, loader: impl CommandLoader + 'static) -> Self {
        CommandEntry::Lazy {
            description: description.into(),
            loader: Arc::new(loader),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            CommandEntry::Loaded(def) => def.describe(),
            CommandEntry::Lazy { description, .. } => description,
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, CommandEntry::Lazy { .. })
    }

    /// Materialize the definition, running the loader for lazy entries
    pub async fn load(&self) -> anyhow::Result<Arc<CommandDef>> {
        match self {
            CommandEntry::Loaded(def) => Ok(Arc::clone(def)),
            CommandEntry::Lazy { loader, .. } => Ok(Arc::new(loader.load().await?)),
        }
    }
}

impl From<CommandDef> for CommandEntry {
    fn from(def: CommandDef) -> Self {
        CommandEntry::Loaded(Arc::new(def))
    }
}

impl From<Arc<CommandDef>> for CommandEntry {
    fn from(def: Arc<CommandDef>) -> Self {
        CommandEntry::Loaded(def)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandEntry::Loaded(def) => f.debug_tuple("Loaded").field(def).finish(),
            CommandEntry::Lazy { description, .. } => f
                .debug_struct("Lazy")
                .field("description", description)
                .finish_non_exhaustive(),
        }
    }
}
