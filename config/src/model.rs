use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sonobuoy_plugin::{PluginSelection, PullPolicy};

use crate::error::{ConfigError, Result};

/// Release the generator belongs to; stamped into `Version` and the worker image.
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_NAMESPACE: &str = "sonobuoy";
pub const DEFAULT_RESULTS_DIR: &str = "/tmp/sonobuoy";
pub const DEFAULT_DESCRIPTION: &str = "DEFAULT";
pub const DEFAULT_WORKER_IMAGE_REPOSITORY: &str = "sonobuoy/sonobuoy";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: u16 = 8080;
pub const DEFAULT_AGGREGATION_TIMEOUT_SECONDS: u64 = 10800;

const DEFAULT_PLUGIN_SEARCH_PATH: &[&str] = &[
    "./plugins.d",
    "/etc/sonobuoy/plugins.d",
    "~/sonobuoy/plugins.d",
];

const DEFAULT_RESOURCES: &[&str] = &[
    "apiservices",
    "certificatesigningrequests",
    "clusterrolebindings",
    "clusterroles",
    "componentstatuses",
    "configmaps",
    "controllerrevisions",
    "cronjobs",
    "customresourcedefinitions",
    "daemonsets",
    "deployments",
    "endpoints",
    "ingresses",
    "jobs",
    "leases",
    "limitranges",
    "mutatingwebhookconfigurations",
    "namespaces",
    "networkpolicies",
    "nodes",
    "persistentvolumeclaims",
    "persistentvolumes",
    "poddisruptionbudgets",
    "pods",
    "podlogs",
    "podsecuritypolicies",
    "podtemplates",
    "priorityclasses",
    "replicasets",
    "replicationcontrollers",
    "resourcequotas",
    "rolebindings",
    "roles",
    "servergroups",
    "serverversion",
    "serviceaccounts",
    "services",
    "statefulsets",
    "storageclasses",
    "validatingwebhookconfigurations",
    "volumeattachments",
];

/// Worker image for the given release, e.g. `sonobuoy/sonobuoy:v0.19.0`.
pub fn worker_image(version: &str) -> String {
    format!("{DEFAULT_WORKER_IMAGE_REPOSITORY}:{version}")
}

/// Settings for the aggregator's results server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AggregationConfig {
    pub bind_address: String,
    pub bind_port: u16,
    pub advertise_address: String,
    pub timeout_seconds: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            bind_port: DEFAULT_BIND_PORT,
            advertise_address: String::new(),
            timeout_seconds: DEFAULT_AGGREGATION_TIMEOUT_SECONDS,
        }
    }
}

/// Which objects the aggregator queries for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FilterOptions {
    pub namespaces: String,
    pub label_selector: String,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            namespaces: ".*".to_string(),
            label_selector: String::new(),
        }
    }
}

/// Breadth of the RBAC rules granted to the aggregator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregatorPermissions {
    /// Cluster-wide access through a ClusterRole.
    #[default]
    ClusterAdmin,
    /// Access limited to the sonobuoy namespace through a Role.
    NamespaceAdmin,
}

impl std::str::FromStr for AggregatorPermissions {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "clusterAdmin" => Ok(Self::ClusterAdmin),
            "namespaceAdmin" => Ok(Self::NamespaceAdmin),
            other => Err(ConfigError::invalid(
                "AggregatorPermissions",
                format!(
                    "unknown permission mode `{other}` (expected `clusterAdmin` or \
                     `namespaceAdmin`)"
                ),
            )),
        }
    }
}

/// The aggregator configuration, serialized verbatim into the bundle.
///
/// Fields missing from a deserialized document keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub description: String,
    pub version: String,
    pub results_dir: String,
    pub resources: Vec<String>,
    pub filters: FilterOptions,
    pub server: AggregationConfig,
    /// `None` and `Some(vec![])` differ: the first means "no choice made".
    #[serde(rename = "Plugins")]
    pub plugin_selections: Option<Vec<PluginSelection>>,
    /// Searched in order; duplicates are kept.
    pub plugin_search_path: Vec<String>,
    pub namespace: String,
    pub worker_image: String,
    pub image_pull_policy: PullPolicy,
    pub image_pull_secrets: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_annotations: BTreeMap<String, String>,
    pub aggregator_permissions: AggregatorPermissions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            description: DEFAULT_DESCRIPTION.to_string(),
            version: VERSION.to_string(),
            results_dir: DEFAULT_RESULTS_DIR.to_string(),
            resources: DEFAULT_RESOURCES.iter().map(|r| r.to_string()).collect(),
            filters: FilterOptions::default(),
            server: AggregationConfig::default(),
            plugin_selections: None,
            plugin_search_path: DEFAULT_PLUGIN_SEARCH_PATH
                .iter()
                .map(|p| p.to_string())
                .collect(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            worker_image: worker_image(VERSION),
            image_pull_policy: PullPolicy::IfNotPresent,
            image_pull_secrets: String::new(),
            custom_annotations: BTreeMap::new(),
            aggregator_permissions: AggregatorPermissions::ClusterAdmin,
        }
    }
}

impl Config {
    /// Defaults plus a freshly generated run UUID.
    pub fn new() -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            ..Self::default()
        }
    }

    /// Parses a JSON config document; absent fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn ensure_uuid(&mut self) {
        if self.uuid.is_empty() {
            self.uuid = uuid::Uuid::new_v4().to_string();
        }
    }
}
