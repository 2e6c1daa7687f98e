use sonobuoy_plugin::{PodSpecDefaults, PullPolicy};

use crate::PluginSet;

/// Gives plugins without a pod spec their driver's default, when asked to.
/// A pod spec that is already present is never replaced, even if empty.
pub fn normalize_pod_specs(
    plugins: &mut PluginSet,
    inject_default: bool,
    defaults: &PodSpecDefaults,
) {
    if !inject_default {
        return;
    }
    for plugin in plugins.iter_mut() {
        if plugin.pod_spec.is_none() {
            plugin.pod_spec = Some(defaults.for_driver(plugin.driver()).clone());
        }
    }
}

/// Sets `policy` on every plugin container that does not declare its own.
pub fn apply_image_pull_policy(plugins: &mut PluginSet, policy: PullPolicy) {
    for plugin in plugins.iter_mut() {
        plugin.spec.image_pull_policy.get_or_insert(policy);
    }
}
