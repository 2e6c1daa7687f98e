use std::collections::BTreeMap;

use sonobuoy_plugin::EnvVar;
use tracing::debug;

use crate::{Error, PluginSet};

/// Applies per-plugin env overrides. An empty value removes the variable.
pub fn apply_env_overrides(
    plugins: &mut PluginSet,
    overrides: &BTreeMap<String, BTreeMap<String, String>>,
) -> Result<(), Error> {
    for (name, vars) in overrides {
        let plugin = match plugins.get_mut(name) {
            Some(plugin) => plugin,
            None => {
                return Err(Error::UnknownOverridePlugin {
                    name: name.clone(),
                    have: plugins.names().into_iter().map(String::from).collect(),
                });
            }
        };

        for (var, value) in vars {
            if value.is_empty() {
                let removed = plugin.spec.remove_env(var);
                debug!(plugin = %name, var = %var, removed, "removed env var");
            } else {
                plugin.spec.set_env(EnvVar::literal(var, value));
            }
        }
    }
    Ok(())
}
