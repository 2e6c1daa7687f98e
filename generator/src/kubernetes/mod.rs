//! Kubernetes objects for a sonobuoy run and their assembly into one bundle.

mod resources;

use std::collections::BTreeMap;

use base64::Engine as _;
use serde::Serialize;
use sonobuoy_config::{AggregatorPermissions, Config};
use sonobuoy_plugin::{
    Container, EnvVar, PodSpec, SERVICE_ACCOUNT_NAME, Volume, VolumeMount,
};
use tracing::debug;

pub use self::resources::*;
use crate::{
    Error, ManifestBundle, PluginSet, SshCredentials,
    credentials::CredentialReader,
    ssh::{SSH_KEY_FILE, SSH_SECRET_NAME},
};

pub const CONFIG_MAP_NAME: &str = "sonobuoy-config-cm";
pub const CONFIG_KEY: &str = "config.json";
pub const PLUGIN_CONFIG_MAP_PREFIX: &str = "sonobuoy-plugin";
pub const PLUGIN_NAME_ANNOTATION: &str = "sonobuoy.hept.io/plugin";
pub const AGGREGATOR_POD_NAME: &str = "sonobuoy";
pub const AGGREGATOR_SERVICE_NAME: &str = "sonobuoy-aggregator";

const AGGREGATOR_CONTAINER_NAME: &str = "kube-sonobuoy";
const CONFIG_VOLUME: &str = "sonobuoy-config-volume";
const CONFIG_MOUNT_DIR: &str = "/etc/sonobuoy";
const PLUGINS_VOLUME: &str = "sonobuoy-plugins-volume";
const PLUGINS_MOUNT_DIR: &str = "/plugins.d";
const OUTPUT_VOLUME: &str = "output-volume";

const COMPONENT_LABEL: &str = "component";
const SONOBUOY_COMPONENT_LABEL: &str = "sonobuoy-component";
const PLUGIN_LABEL: &str = "sonobuoy-plugin";
const MAX_LABEL_VALUE_LEN: usize = 63;

/// Endpoints the aggregator scrapes outside the resource API.
const NON_RESOURCE_URLS: &[&str] = &["/metrics", "/logs", "/logs/*"];

/// What the assembler needs once plugins are fully resolved.
#[derive(Clone, Copy, Debug)]
pub struct AssemblyInput<'a> {
    pub config: &'a Config,
    pub plugins: &'a PluginSet,
    pub aggregator_pod_spec: &'a PodSpec,
    pub ssh: Option<SshCredentials<'a>>,
}

/// Serializes every object of a run, in apply order.
pub fn assemble(
    input: &AssemblyInput<'_>,
    reader: &dyn CredentialReader,
) -> Result<ManifestBundle, Error> {
    let config = input.config;
    let namespace = config.namespace.as_str();
    let mut docs = Vec::new();

    docs.push(to_yaml("namespace", &Namespace::new(namespace))?);
    docs.push(to_yaml(
        "service account",
        &ServiceAccount::new(SERVICE_ACCOUNT_NAME, namespace, base_labels()),
    )?);

    let role = aggregator_role(namespace, config.aggregator_permissions);
    let binding = RoleBinding::for_service_account(&role, SERVICE_ACCOUNT_NAME, namespace);
    docs.push(to_yaml("role", &role)?);
    docs.push(to_yaml("role binding", &binding)?);

    if let Some(ssh) = input.ssh {
        let key = reader
            .read_key(ssh.key_path)
            .map_err(|source| Error::ReadSshKey {
                path: ssh.key_path.to_path_buf(),
                source,
            })?;
        let data = BTreeMap::from([(
            SSH_KEY_FILE.to_string(),
            base64::engine::general_purpose::STANDARD.encode(key),
        )]);
        docs.push(to_yaml(
            "ssh secret",
            &Secret::new(SSH_SECRET_NAME, namespace, base_labels(), data),
        )?);
    }

    let config_json = serde_json::to_string(config).map_err(Error::Json)?;
    docs.push(to_yaml(
        "config map",
        &ConfigMap::new(
            CONFIG_MAP_NAME,
            namespace,
            base_labels(),
            BTreeMap::from([(CONFIG_KEY.to_string(), config_json)]),
        ),
    )?);

    let mut plugin_maps = Vec::with_capacity(input.plugins.len());
    for (index, plugin) in input.plugins.iter().enumerate() {
        let map_name = format!("{PLUGIN_CONFIG_MAP_PREFIX}-{index}");
        let definition = to_yaml("plugin definition", plugin)?;

        let mut labels = base_labels();
        labels.insert(
            SONOBUOY_COMPONENT_LABEL.to_string(),
            "plugin".to_string(),
        );
        labels.insert(PLUGIN_LABEL.to_string(), sanitize_label_value(plugin.name()));

        let mut map = ConfigMap::new(
            map_name.as_str(),
            namespace,
            labels,
            BTreeMap::from([(format!("plugin-{index}.yaml"), definition)]),
        );
        map.metadata.annotations.insert(
            PLUGIN_NAME_ANNOTATION.to_string(),
            plugin.name().to_string(),
        );
        debug!(plugin = plugin.name(), config_map = %map_name, "assembled plugin");
        docs.push(to_yaml("plugin config map", &map)?);
        plugin_maps.push(map_name);
    }

    docs.push(to_yaml(
        "aggregator pod",
        &aggregator_pod(config, input.aggregator_pod_spec, &plugin_maps),
    )?);
    docs.push(to_yaml("aggregator service", &aggregator_service(config))?);

    debug!(count = docs.len(), "assembled manifest documents");
    Ok(ManifestBundle::from_documents(docs))
}

fn base_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(COMPONENT_LABEL.to_string(), "sonobuoy".to_string())])
}

fn aggregator_labels() -> BTreeMap<String, String> {
    let mut labels = base_labels();
    labels.insert(
        SONOBUOY_COMPONENT_LABEL.to_string(),
        "aggregator".to_string(),
    );
    labels
}

fn aggregator_role(namespace: &str, permissions: AggregatorPermissions) -> Role {
    let name = format!("{SERVICE_ACCOUNT_NAME}-{namespace}");
    match permissions {
        AggregatorPermissions::ClusterAdmin => {
            let mut labels = base_labels();
            labels.insert("namespace".to_string(), sanitize_label_value(namespace));
            Role::cluster(
                name,
                labels,
                vec![
                    PolicyRule::all_resources(),
                    PolicyRule::get_urls(NON_RESOURCE_URLS.iter().copied()),
                ],
            )
        }
        AggregatorPermissions::NamespaceAdmin => Role::namespaced(
            name,
            namespace,
            base_labels(),
            vec![PolicyRule::all_resources()],
        ),
    }
}

fn aggregator_pod(config: &Config, base: &PodSpec, plugin_maps: &[String]) -> Pod {
    let container = Container {
        name: AGGREGATOR_CONTAINER_NAME.to_string(),
        image: config.worker_image.clone(),
        command: vec!["/sonobuoy".to_string()],
        args: [
            "aggregator",
            "--no-exit",
            "--level=info",
            "-v=4",
            "--alsologtostderr",
        ]
        .map(String::from)
        .to_vec(),
        env: vec![EnvVar::from_field("SONOBUOY_ADVERTISE_IP", "status.podIP")],
        image_pull_policy: Some(config.image_pull_policy),
        volume_mounts: vec![
            VolumeMount::new(CONFIG_VOLUME, CONFIG_MOUNT_DIR),
            VolumeMount::new(PLUGINS_VOLUME, PLUGINS_MOUNT_DIR),
            VolumeMount::new(OUTPUT_VOLUME, config.results_dir.as_str()),
        ],
        ..Default::default()
    };

    // A projected volume needs at least one source.
    let plugins_volume = if plugin_maps.is_empty() {
        Volume::empty_dir(PLUGINS_VOLUME)
    } else {
        Volume::projected_config_maps(PLUGINS_VOLUME, plugin_maps.iter().map(String::as_str))
    };

    let mut spec = base.clone();
    spec.containers.push(container);
    spec.volumes.extend([
        Volume::config_map(CONFIG_VOLUME, CONFIG_MAP_NAME),
        plugins_volume,
        Volume::empty_dir(OUTPUT_VOLUME),
    ]);

    let mut labels = aggregator_labels();
    labels.insert("run".to_string(), "sonobuoy-master".to_string());
    labels.insert("tier".to_string(), "analysis".to_string());

    Pod::new(
        ObjectMeta {
            name: AGGREGATOR_POD_NAME.to_string(),
            namespace: Some(config.namespace.clone()),
            labels,
            annotations: config.custom_annotations.clone(),
        },
        spec,
    )
}

fn aggregator_service(config: &Config) -> Service {
    let port = config.server.bind_port;
    Service::new(
        AGGREGATOR_SERVICE_NAME,
        config.namespace.as_str(),
        aggregator_labels(),
        BTreeMap::from([(
            SONOBUOY_COMPONENT_LABEL.to_string(),
            "aggregator".to_string(),
        )]),
        vec![ServicePort {
            name: "http".to_string(),
            port,
            target_port: port,
            protocol: "TCP",
        }],
    )
}

fn truncate_dns_name(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        s[..max_len].trim_end_matches('-').to_string()
    }
}

/// Label values: at most 63 characters of `[A-Za-z0-9_.-]`, alphanumeric at
/// both ends.
fn sanitize_label_value(s: &str) -> String {
    let not_alnum = |c: char| !c.is_ascii_alphanumeric();
    let out: String = s
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
        .collect();
    truncate_dns_name(out.trim_start_matches(not_alnum), MAX_LABEL_VALUE_LEN)
        .trim_end_matches(not_alnum)
        .to_string()
}

fn to_yaml<T: Serialize>(kind: &'static str, value: &T) -> Result<String, Error> {
    serde_yaml::to_string(value).map_err(|source| Error::Yaml { kind, source })
}

#[cfg(test)]
mod tests;
