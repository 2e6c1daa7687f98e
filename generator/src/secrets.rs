use sonobuoy_plugin::{PodSpec, PodSpecDefaults};

use crate::PluginSet;

/// Attaches the image pull secret to the aggregator and every plugin pod
/// spec. A plugin without a pod spec starts from its driver default.
pub fn propagate_image_pull_secret(
    plugins: &mut PluginSet,
    aggregator: &mut PodSpec,
    secret: &str,
    defaults: &PodSpecDefaults,
) {
    if secret.is_empty() {
        return;
    }
    aggregator.add_image_pull_secret(secret);
    for plugin in plugins.iter_mut() {
        let driver = plugin.driver();
        plugin
            .pod_spec
            .get_or_insert_with(|| defaults.for_driver(driver).clone())
            .add_image_pull_secret(secret);
    }
}

#[cfg(test)]
mod tests {
    use sonobuoy_plugin::{LocalObjectReference, PluginDefinition};

    use super::*;

    fn secret_names(spec: &PodSpec) -> Vec<&str> {
        spec.image_pull_secrets
            .iter()
            .map(|s| s.name.as_str())
            .collect()
    }

    #[test]
    fn attaches_once_everywhere() {
        let defaults = PodSpecDefaults::new();
        let mut aggregator = defaults.aggregator().clone();
        let mut set = PluginSet::default();
        set.insert(PluginDefinition::named("a")).unwrap();
        set.insert(PluginDefinition {
            pod_spec: Some(PodSpec {
                image_pull_secrets: vec![LocalObjectReference {
                    name: "regcred".to_string(),
                }],
                ..Default::default()
            }),
            ..PluginDefinition::named("b")
        })
        .unwrap();

        propagate_image_pull_secret(&mut set, &mut aggregator, "regcred", &defaults);
        propagate_image_pull_secret(&mut set, &mut aggregator, "regcred", &defaults);

        assert_eq!(secret_names(&aggregator), ["regcred"]);
        for plugin in &set {
            let spec = plugin.pod_spec.as_ref().expect("pod spec should be set");
            assert_eq!(secret_names(spec), ["regcred"], "{}", plugin.name());
        }
        let a = set.get("a").unwrap().pod_spec.as_ref().unwrap();
        assert_eq!(a.restart_policy.as_deref(), Some("Never"));
    }

    #[test]
    fn empty_secret_is_a_no_op() {
        let defaults = PodSpecDefaults::new();
        let mut aggregator = defaults.aggregator().clone();
        let mut set = PluginSet::default();
        set.insert(PluginDefinition::named("a")).unwrap();
        let before = set.clone();

        propagate_image_pull_secret(&mut set, &mut aggregator, "", &defaults);
        assert_eq!(set, before);
        assert!(aggregator.image_pull_secrets.is_empty());
    }
}
