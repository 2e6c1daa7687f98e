use sonobuoy_plugin::{PluginCatalog, PluginContext};
use tracing::debug;

use crate::{Error, GenerationRequest, PluginSet};

/// Decides which plugins get a document in the bundle.
///
/// Static definitions come first, then dynamic names, both in caller order.
/// The config's selections (or the default set when there are none) only
/// apply when the caller listed no plugins itself.
pub fn resolve_plugins(
    request: &GenerationRequest,
    catalog: &PluginCatalog,
    ctx: &PluginContext,
) -> Result<PluginSet, Error> {
    let mut plugins = PluginSet::default();

    if request.has_manual_plugins() {
        for plugin in &request.static_plugins {
            plugins.insert(plugin.clone())?;
        }
        for name in &request.dynamic_plugins {
            let plugin = catalog
                .lookup(name, ctx)
                .ok_or_else(|| Error::UnknownPlugin {
                    name: name.clone(),
                    known: catalog.names().into_iter().map(String::from).collect(),
                })?;
            plugins.insert(plugin)?;
        }
        if request.config.plugin_selections.is_some() {
            debug!("plugins listed explicitly; config selections only filter at runtime");
        }
        return Ok(plugins);
    }

    match &request.config.plugin_selections {
        None => {
            debug!("no plugins chosen; using the default set");
            for plugin in catalog.default_set(ctx) {
                plugins.insert(plugin)?;
            }
        }
        Some(selections) => {
            for selection in selections {
                match catalog.lookup(&selection.name, ctx) {
                    Some(plugin) => plugins.insert(plugin)?,
                    None => debug!(
                        plugin = %selection.name,
                        "selected plugin is not built in; leaving it to the aggregator search path"
                    ),
                }
            }
        }
    }

    Ok(plugins)
}
