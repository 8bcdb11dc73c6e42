//! Dependency resolution: orders plugins so every dependency precedes its dependents.
//!
//! Depth-first over the input in original order, so unrelated plugins keep their
//! relative input order and a cycle is reported as the active recursion path.

use super::{Plugin, PluginId};
use crate::error::ConfigurationError;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolve `plugins` into a dependency-safe order.
///
/// Duplicate ids are dropped with a warning (first occurrence wins). A missing
/// required dependency or a cycle fails the whole resolution.
pub fn resolve_plugins(plugins: &[Arc<Plugin>]) -> Result<Vec<Arc<Plugin>>, ConfigurationError> {
    Resolver::new(plugins).resolve()
}

/// Id lookup over one input list
pub struct Resolver<'a> {
    input: &'a [Arc<Plugin>],
    lookup: HashMap<&'a str, &'a Arc<Plugin>>,
    duplicates: Vec<PluginId>,
}

struct Walk<'a> {
    visited: HashSet<&'a str>,
    visiting: Vec<&'a str>,
    order: Vec<Arc<Plugin>>,
}

impl<'a> Resolver<'a> {
    pub fn new(plugins: &'a [Arc<Plugin>]) -> Self {
        let mut lookup = HashMap::with_capacity(plugins.len());
        let mut duplicates = Vec::new();

        for plugin in plugins {
            match lookup.entry(plugin.id().as_str()) {
                Entry::Occupied(_) => {
                    warn!(
                        plugin = %plugin.id(),
                        "Duplicate plugin id '{}', keeping the first registration",
                        plugin.id()
                    );
                    duplicates.push(plugin.id().clone());
                }
                Entry::Vacant(slot) => {
                    slot.insert(plugin);
                }
            }
        }

        Self {
            input: plugins,
            lookup,
            duplicates,
        }
    }

    /// Ids that appeared more than once in the input (one entry per dropped plugin)
    pub fn duplicates(&self) -> &[PluginId] {
        &self.duplicates
    }

    pub fn resolve(&self) -> Result<Vec<Arc<Plugin>>, ConfigurationError> {
        let mut walk = Walk {
            visited: HashSet::with_capacity(self.lookup.len()),
            visiting: Vec::new(),
            order: Vec::with_capacity(self.lookup.len()),
        };

        for plugin in self.input {
            let id = plugin.id().as_str();
            if walk.visited.contains(id) {
                continue;
            }
            // Always emit the first occurrence for an id.
            let first = self.lookup[id];
            self.visit(first, &mut walk)?;
        }

        Ok(walk.order)
    }

    fn visit(&self, plugin: &'a Arc<Plugin>, walk: &mut Walk<'a>) -> Result<(), ConfigurationError> {
        let id = plugin.id().as_str();
        if walk.visited.contains(id) {
            return Ok(());
        }
        walk.visiting.push(id);

        for dependency in plugin.dependencies() {
            let target = match self.lookup.get(dependency.id.as_str()) {
                Some(target) => *target,
                None if dependency.optional => {
                    debug!(
                        plugin = %plugin.id(),
                        dependency = %dependency.id,
                        "Optional dependency not present"
                    );
                    continue;
                }
                None => {
                    return Err(ConfigurationError::MissingDependency {
                        missing: dependency.id.clone(),
                        dependent: plugin.id().clone(),
                    });
                }
            };

            if walk.visiting.contains(&target.id().as_str()) {
                let mut chain: Vec<PluginId> =
                    walk.visiting.iter().map(|id| PluginId::from(*id)).collect();
                chain.push(target.id().clone());
                return Err(ConfigurationError::CircularDependency { chain });
            }

            self.visit(target, walk)?;
        }

        walk.visiting.pop();
        walk.visited.insert(id);
        walk.order.push(Arc::clone(plugin));
        Ok(())
    }
}
