use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use semver::Version;
use serde::{Deserialize, Serialize};
use serde_with::{MapPreventDuplicates, serde_as};
use sonobuoy_config::Config;
use sonobuoy_plugin::{
    DEFAULT_KUBE_VERSION, DEFAULT_SYSTEMD_LOGS_IMAGE, E2eConfig, PluginContext, PluginDefinition,
    conformance_image,
};
use tracing::warn;

/// Everything a caller can ask of one manifest generation.
///
/// The image pull secret lives on [`Config::image_pull_secrets`] because the
/// aggregator needs it at runtime as well.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationRequest {
    #[builder(default)]
    pub config: Config,
    #[builder(default)]
    pub e2e: E2eConfig,
    /// Built-in plugins to include by name.
    #[builder(default)]
    pub dynamic_plugins: Vec<String>,
    /// Full plugin definitions supplied by the caller.
    #[builder(default)]
    pub static_plugins: Vec<PluginDefinition>,
    /// Plugin name -> variable name -> value. An empty value removes the
    /// variable from the plugin.
    #[serde_as(as = "MapPreventDuplicates<_, MapPreventDuplicates<_, _>>")]
    #[builder(default)]
    pub plugin_env_overrides: BTreeMap<String, BTreeMap<String, String>>,
    pub ssh_key_path: Option<PathBuf>,
    pub ssh_user: Option<String>,
    #[builder(default)]
    pub show_default_pod_spec: bool,
    /// Overrides the conformance image derived from `kube_version`.
    pub kube_conformance_image: Option<String>,
    pub kube_version: Option<Version>,
    pub systemd_logs_image: Option<String>,
}

/// SSH access handed to the e2e plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SshCredentials<'a> {
    pub key_path: &'a Path,
    pub user: &'a str,
}

impl GenerationRequest {
    /// Whether the caller listed plugins explicitly rather than through the
    /// config's selections.
    pub fn has_manual_plugins(&self) -> bool {
        !self.static_plugins.is_empty() || !self.dynamic_plugins.is_empty()
    }

    /// SSH credentials, present only when both the key path and the user are.
    pub fn ssh_credentials(&self) -> Option<SshCredentials<'_>> {
        let user = self.ssh_user.as_deref().filter(|u| !u.is_empty());
        match (self.ssh_key_path.as_deref(), user) {
            (Some(key_path), Some(user)) => Some(SshCredentials { key_path, user }),
            (None, None) => None,
            (key_path, user) => {
                warn!(
                    has_key = key_path.is_some(),
                    has_user = user.is_some(),
                    "ssh key path and ssh user must be given together; skipping ssh setup"
                );
                None
            }
        }
    }

    /// Inputs for constructing built-in plugins for this request.
    pub fn plugin_context(&self) -> PluginContext {
        let conformance_image = match (&self.kube_conformance_image, &self.kube_version) {
            (Some(image), _) => image.clone(),
            (None, Some(version)) => conformance_image(version),
            (None, None) => conformance_image(&DEFAULT_KUBE_VERSION),
        };
        PluginContext {
            e2e: self.e2e.clone(),
            conformance_image,
            systemd_logs_image: self
                .systemd_logs_image
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEMD_LOGS_IMAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_plugins_are_detected_from_either_list() {
        assert!(!GenerationRequest::default().has_manual_plugins());
        assert!(
            GenerationRequest::builder()
                .dynamic_plugins(vec!["e2e".to_string()])
                .build()
                .has_manual_plugins()
        );
        assert!(
            GenerationRequest::builder()
                .static_plugins(vec![PluginDefinition::named("foo")])
                .build()
                .has_manual_plugins()
        );
    }

    #[test]
    fn ssh_requires_both_key_and_user() {
        let both = GenerationRequest::builder()
            .ssh_key_path(PathBuf::from("/keys/id_rsa"))
            .ssh_user("core")
            .build();
        let creds = both.ssh_credentials().expect("credentials should be present");
        assert_eq!(creds.user, "core");
        assert_eq!(creds.key_path, Path::new("/keys/id_rsa"));

        let key_only = GenerationRequest::builder()
            .ssh_key_path(PathBuf::from("/keys/id_rsa"))
            .build();
        assert!(key_only.ssh_credentials().is_none());

        let empty_user = GenerationRequest::builder()
            .ssh_key_path(PathBuf::from("/keys/id_rsa"))
            .ssh_user("")
            .build();
        assert!(empty_user.ssh_credentials().is_none());
    }

    #[test]
    fn conformance_image_prefers_explicit_image_over_version() {
        let request = GenerationRequest::builder()
            .kube_version(Version::new(1, 20, 4))
            .build();
        assert_eq!(
            request.plugin_context().conformance_image,
            "k8s.gcr.io/conformance:v1.20.4"
        );

        let request = GenerationRequest::builder()
            .kube_version(Version::new(1, 20, 4))
            .kube_conformance_image("registry.local/conformance:custom")
            .build();
        assert_eq!(
            request.plugin_context().conformance_image,
            "registry.local/conformance:custom"
        );
    }

    #[test]
    fn deserializes_from_yaml_with_defaults() {
        let yaml = r#"
dynamicPlugins: [e2e]
pluginEnvOverrides:
  e2e:
    E2E_SKIP: override
e2e:
  focus: sig-network
"#;
        let request: GenerationRequest = serde_yaml::from_str(yaml).expect("request should parse");
        assert_eq!(request.dynamic_plugins, ["e2e"]);
        assert_eq!(request.e2e.focus, "sig-network");
        assert_eq!(request.plugin_env_overrides["e2e"]["E2E_SKIP"], "override");
        assert_eq!(request.config, Config::default());
        assert!(!request.show_default_pod_spec);
    }

    #[test]
    fn duplicate_override_keys_are_rejected() {
        let yaml = r#"
pluginEnvOverrides:
  e2e:
    E2E_SKIP: a
    E2E_SKIP: b
"#;
        assert!(serde_yaml::from_str::<GenerationRequest>(yaml).is_err());
    }
}
