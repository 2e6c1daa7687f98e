//! The subset of the Kubernetes core/v1 pod API that plugin definitions carry.
//!
//! These types are both read (static plugin definitions supplied by callers)
//! and written (plugin documents in the generated bundle), so unlike the
//! top-level resource objects they derive `Deserialize` as well. Only the
//! fields the generator reads or writes are modeled; every other field a
//! caller supplies is kept in [`UnmodeledFields`] and written back unchanged.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::error::Error;

/// Fields of a Kubernetes object that are carried through verbatim.
pub type UnmodeledFields = BTreeMap<String, serde_yaml::Value>;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }
}

impl fmt::Display for PullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Always" => Ok(PullPolicy::Always),
            "IfNotPresent" => Ok(PullPolicy::IfNotPresent),
            "Never" => Ok(PullPolicy::Never),
            other => Err(Error::InvalidPullPolicy {
                value: other.to_string(),
            }),
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<PullPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_context: Option<SecurityContext>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl Container {
    pub fn env_var(&self, name: &str) -> Option<&EnvVar> {
        self.env.iter().find(|var| var.name == name)
    }

    /// Sets `var`. A variable of the same name is replaced where it stands;
    /// a new one is appended, since `$(VAR)` references only resolve against
    /// earlier entries.
    pub fn set_env(&mut self, var: EnvVar) {
        match self.env.iter_mut().find(|existing| existing.name == var.name) {
            Some(existing) => *existing = var,
            None => self.env.push(var),
        }
    }

    pub fn remove_env(&mut self, name: &str) -> bool {
        let before = self.env.len();
        self.env.retain(|var| var.name != name);
        self.env.len() != before
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvVarSource>,
}

impl EnvVar {
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            value_from: None,
        }
    }

    pub fn from_field(name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: field_path.into(),
                }),
                ..Default::default()
            }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_ref: Option<ObjectFieldSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeyRef>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectFieldSelector {
    pub field_path: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRef {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_as_user: Option<i64>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_dir: Option<EmptyDirVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_path: Option<HostPathVolumeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected: Option<ProjectedVolumeSource>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl Volume {
    pub fn config_map(name: impl Into<String>, config_map_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_map: Some(ConfigMapVolumeSource::named(config_map_name)),
            ..Default::default()
        }
    }

    pub fn secret(
        name: impl Into<String>,
        secret_name: impl Into<String>,
        default_mode: Option<i32>,
    ) -> Self {
        Self {
            name: name.into(),
            secret: Some(SecretVolumeSource {
                secret_name: secret_name.into(),
                default_mode,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        }
    }

    pub fn host_path(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_path: Some(HostPathVolumeSource {
                path: path.into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// A projected volume merging the given ConfigMaps into one directory.
    pub fn projected_config_maps<I, S>(name: impl Into<String>, config_maps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            projected: Some(ProjectedVolumeSource {
                sources: config_maps
                    .into_iter()
                    .map(|cm| VolumeProjection {
                        config_map: Some(ConfigMapVolumeSource::named(cm)),
                    })
                    .collect(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMapVolumeSource {
    pub name: String,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl ConfigMapVolumeSource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVolumeSource {
    pub secret_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_mode: Option<i32>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyDirVolumeSource {
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPathVolumeSource {
    pub path: String,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedVolumeSource {
    pub sources: Vec<VolumeProjection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProjection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map: Option<ConfigMapVolumeSource>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl Toleration {
    pub fn exists(key: Option<&str>, effect: Option<&str>) -> Self {
        Self {
            key: key.map(str::to_string),
            operator: "Exists".to_string(),
            effect: effect.map(str::to_string),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
    pub name: String,
}

/// Pod-level settings for a plugin (or the aggregator).
///
/// Every field is optional so that a caller-supplied `podSpec: {}` stays
/// empty when serialized back out.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_network: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_pid: Option<bool>,
    #[serde(default, rename = "hostIPC", skip_serializing_if = "Option::is_none")]
    pub host_ipc: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_policy: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub node_selector: BTreeMap<String, String>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tolerations: Vec<Toleration>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_pull_secrets: Vec<LocalObjectReference>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(flatten)]
    pub extra: UnmodeledFields,
}

impl PodSpec {
    /// Adds an image pull secret reference unless one with the same name is
    /// already present. Returns whether the spec changed.
    pub fn add_image_pull_secret(&mut self, name: &str) -> bool {
        if self.image_pull_secrets.iter().any(|s| s.name == name) {
            return false;
        }
        self.image_pull_secrets.push(LocalObjectReference {
            name: name.to_string(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_env_replaces_in_place_and_appends_new_names() {
        let mut c = Container {
            name: "c".to_string(),
            env: vec![
                EnvVar::literal("ZBASE", "/data"),
                EnvVar::literal("APATH", "$(ZBASE)/out"),
                EnvVar::from_field("NODE", "spec.nodeName"),
            ],
            ..Default::default()
        };

        c.set_env(EnvVar::literal("NODE", "literal"));
        c.set_env(EnvVar::literal("B", "3"));

        let names: Vec<_> = c.env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["ZBASE", "APATH", "NODE", "B"]);
        assert_eq!(c.env_var("NODE"), Some(&EnvVar::literal("NODE", "literal")));
    }

    #[test]
    fn unmodeled_fields_survive_a_round_trip() {
        let yaml = "\
name: plugin
image: plugin:v1
workingDir: /work
resources:
  limits:
    memory: 1Gi
volumeMounts:
- name: data
  mountPath: /data
  subPath: run
";
        let container: Container = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(container.extra["workingDir"], "/work");
        assert_eq!(container.volume_mounts[0].extra["subPath"], "run");

        let back: serde_yaml::Value =
            serde_yaml::from_str(&serde_yaml::to_string(&container).unwrap()).unwrap();
        assert_eq!(back, serde_yaml::from_str::<serde_yaml::Value>(yaml).unwrap());
    }

    #[test]
    fn unmodeled_volume_sources_are_kept() {
        let volume: Volume =
            serde_yaml::from_str("name: data\npersistentVolumeClaim:\n  claimName: results\n")
                .unwrap();
        assert!(volume.config_map.is_none() && volume.empty_dir.is_none());

        let yaml = serde_yaml::to_string(&volume).unwrap();
        assert!(yaml.contains("claimName: results"), "{yaml}");
    }

    #[test]
    fn remove_env_reports_whether_anything_was_removed() {
        let mut c = Container {
            name: "c".to_string(),
            env: vec![EnvVar::literal("A", "1")],
            ..Default::default()
        };
        assert!(c.remove_env("A"));
        assert!(!c.remove_env("A"));
        assert!(c.env.is_empty());
    }

    #[test]
    fn image_pull_secret_is_added_once() {
        let mut spec = PodSpec::default();
        assert!(spec.add_image_pull_secret("regcred"));
        assert!(!spec.add_image_pull_secret("regcred"));
        assert_eq!(spec.image_pull_secrets.len(), 1);
    }

    #[test]
    fn empty_pod_spec_serializes_to_empty_mapping() {
        let yaml = serde_yaml::to_string(&PodSpec::default()).unwrap();
        assert_eq!(yaml.trim(), "{}");
    }

    #[test]
    fn null_lists_deserialize_as_empty() {
        let spec: PodSpec = serde_yaml::from_str("tolerations: null\nvolumes: null\n").unwrap();
        assert!(spec.tolerations.is_empty());
        assert!(spec.volumes.is_empty());
    }

    #[test]
    fn pull_policy_parses_known_values_only() {
        assert_eq!("Always".parse::<PullPolicy>().unwrap(), PullPolicy::Always);
        assert!("sometimes".parse::<PullPolicy>().is_err());
    }
}
