//! Shared helpers for integration tests

use cliweave::{CommandContext, CommandDef, Plugin};
use std::sync::Arc;

/// A plugin with the given id and required dependencies and nothing else
pub fn plugin(id: &str, deps: &[&str]) -> Arc<Plugin> {
    let builder = deps
        .iter()
        .fold(Plugin::builder(id), |builder, dep| builder.depends_on(*dep));
    Arc::new(builder.build())
}

pub fn ids(order: &[Arc<Plugin>]) -> Vec<String> {
    order.iter().map(|p| p.id().to_string()).collect()
}

pub fn detached_context() -> CommandContext {
    CommandContext::detached(Arc::new(CommandDef::new("test")))
}
