use std::collections::BTreeMap;

use serde::Serialize;
use sonobuoy_plugin::PodSpec;

const RBAC_API_VERSION: &str = "rbac.authorization.k8s.io/v1";
const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// Kubernetes object metadata.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    fn namespaced(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            labels,
            ..Default::default()
        }
    }
}

// ---- Namespace ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: "v1",
            kind: "Namespace",
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
        }
    }
}

// ---- ServiceAccount ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
}

impl ServiceAccount {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            api_version: "v1",
            kind: "ServiceAccount",
            metadata: ObjectMeta::namespaced(name, namespace, labels),
        }
    }
}

// ---- RBAC ----

/// A ClusterRole or a namespaced Role; the two share one shape.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    pub rules: Vec<PolicyRule>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub api_groups: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(rename = "nonResourceURLs", skip_serializing_if = "Vec::is_empty")]
    pub non_resource_urls: Vec<String>,
    pub verbs: Vec<String>,
}

impl PolicyRule {
    /// Every verb on every resource of every API group.
    pub fn all_resources() -> Self {
        Self {
            api_groups: vec!["*".to_string()],
            resources: vec!["*".to_string()],
            verbs: vec!["*".to_string()],
            ..Default::default()
        }
    }

    pub fn get_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            non_resource_urls: urls.into_iter().map(Into::into).collect(),
            verbs: vec!["get".to_string()],
            ..Default::default()
        }
    }
}

impl Role {
    pub fn cluster(
        name: impl Into<String>,
        labels: BTreeMap<String, String>,
        rules: Vec<PolicyRule>,
    ) -> Self {
        Self {
            api_version: RBAC_API_VERSION,
            kind: "ClusterRole",
            metadata: ObjectMeta {
                name: name.into(),
                labels,
                ..Default::default()
            },
            rules,
        }
    }

    pub fn namespaced(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        rules: Vec<PolicyRule>,
    ) -> Self {
        Self {
            api_version: RBAC_API_VERSION,
            kind: "Role",
            metadata: ObjectMeta::namespaced(name, namespace, labels),
            rules,
        }
    }
}

/// A ClusterRoleBinding or RoleBinding, matching the kind of its role.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    pub role_ref: RoleRef,
    pub subjects: Vec<Subject>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    pub api_group: &'static str,
    pub kind: &'static str,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub kind: &'static str,
    pub name: String,
    pub namespace: String,
}

impl RoleBinding {
    /// Binds `role` to a service account in `namespace`.
    pub fn for_service_account(
        role: &Role,
        service_account: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let kind = if role.kind == "ClusterRole" {
            "ClusterRoleBinding"
        } else {
            "RoleBinding"
        };
        Self {
            api_version: RBAC_API_VERSION,
            kind,
            metadata: role.metadata.clone(),
            role_ref: RoleRef {
                api_group: RBAC_API_GROUP,
                kind: role.kind,
                name: role.metadata.name.clone(),
            },
            subjects: vec![Subject {
                kind: "ServiceAccount",
                name: service_account.into(),
                namespace: namespace.into(),
            }],
        }
    }
}

// ---- ConfigMap ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        data: BTreeMap<String, String>,
    ) -> Self {
        Self {
            api_version: "v1",
            kind: "ConfigMap",
            metadata: ObjectMeta::namespaced(name, namespace, labels),
            data,
        }
    }
}

// ---- Secret ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    #[serde(rename = "type")]
    pub secret_type: &'static str,
    /// Values are base64-encoded.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Secret {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        data: BTreeMap<String, String>,
    ) -> Self {
        Self {
            api_version: "v1",
            kind: "Secret",
            metadata: ObjectMeta::namespaced(name, namespace, labels),
            secret_type: "Opaque",
            data,
        }
    }
}

// ---- Pod ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
}

impl Pod {
    pub fn new(metadata: ObjectMeta, spec: PodSpec) -> Self {
        Self {
            api_version: "v1",
            kind: "Pod",
            metadata,
            spec,
        }
    }
}

// ---- Service ----

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: ObjectMeta,
    pub spec: ServiceSpec,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub selector: BTreeMap<String, String>,
    pub ports: Vec<ServicePort>,
    #[serde(rename = "type")]
    pub service_type: &'static str,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
    pub target_port: u16,
    pub protocol: &'static str,
}

impl Service {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        labels: BTreeMap<String, String>,
        selector: BTreeMap<String, String>,
        ports: Vec<ServicePort>,
    ) -> Self {
        Self {
            api_version: "v1",
            kind: "Service",
            metadata: ObjectMeta::namespaced(name, namespace, labels),
            spec: ServiceSpec {
                selector,
                ports,
                service_type: "ClusterIP",
            },
        }
    }
}
