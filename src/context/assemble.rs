//! Extension assembly
//!
//! Two strictly sequential passes over the resolved order. The build pass calls
//! each factory with a core context that already holds every earlier plugin's
//! extension. The notify pass runs after the context is frozen, so every hook
//! observes the complete map.

use crate::context::{CommandContext, CoreContext, RawInputs};
use crate::error::ExtensionError;
use crate::plugin::Plugin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build every extension, freeze the context, then run the notify hooks.
pub async fn assemble_context(
    inputs: RawInputs,
    order: &[Arc<Plugin>],
) -> Result<CommandContext, ExtensionError> {
    let command = Arc::clone(&inputs.command);
    let mut core = CoreContext::new(inputs);

    for plugin in order {
        let Some(descriptor) = plugin.extension() else {
            continue;
        };

        debug!(plugin = %plugin.id(), command = %command.name(), "Building extension");
        let value = descriptor
            .factory
            .create_erased(&core, &command)
            .await
            .map_err(|source| ExtensionError::Factory {
                plugin: plugin.id().clone(),
                source,
            })?;

        if !core.insert_extension(descriptor.key().clone(), value) {
            warn!(plugin = %plugin.id(), "Extension already present, keeping the first");
        }
    }

    let ctx = core.freeze();

    for plugin in order {
        let Some(hook) = plugin.extension().and_then(|d| d.hook.as_ref()) else {
            continue;
        };

        debug!(plugin = %plugin.id(), "Notifying extension hook");
        hook.on_extension(&ctx, &command)
            .await
            .map_err(|source| ExtensionError::Notify {
                plugin: plugin.id().clone(),
                source,
            })?;
    }

    Ok(ctx)
}
