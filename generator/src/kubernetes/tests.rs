use std::{
    io,
    path::{Path, PathBuf},
};

use serde_json::Value;
use sonobuoy_config::{AggregatorPermissions, Config};
use sonobuoy_plugin::{PluginDefinition, PodSpec, PodSpecDefaults};

use super::*;

struct StaticKey(&'static [u8]);

impl CredentialReader for StaticKey {
    fn read_key(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Ok(self.0.to_vec())
    }
}

struct MissingKey;

impl CredentialReader for MissingKey {
    fn read_key(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::NotFound, "no such key"))
    }
}

fn parse(bundle: &ManifestBundle) -> Vec<Value> {
    bundle
        .documents()
        .map(|doc| serde_yaml::from_str(doc).expect("document should be YAML"))
        .collect()
}

fn kinds(docs: &[Value]) -> Vec<&str> {
    docs.iter()
        .map(|d| d["kind"].as_str().expect("kind"))
        .collect()
}

fn plugin_set(names: &[&str]) -> PluginSet {
    let mut set = PluginSet::default();
    for name in names {
        set.insert(PluginDefinition::named(*name)).unwrap();
    }
    set
}

fn assemble_with(
    config: &Config,
    plugins: &PluginSet,
    ssh: Option<SshCredentials<'_>>,
    reader: &dyn CredentialReader,
) -> Result<ManifestBundle, Error> {
    let defaults = PodSpecDefaults::new();
    assemble(
        &AssemblyInput {
            config,
            plugins,
            aggregator_pod_spec: defaults.aggregator(),
            ssh,
        },
        reader,
    )
}

#[test]
fn documents_follow_apply_order() {
    let bundle = assemble_with(
        &Config::default(),
        &plugin_set(&["a", "b"]),
        None,
        &MissingKey,
    )
    .unwrap();
    let docs = parse(&bundle);
    assert_eq!(
        kinds(&docs),
        [
            "Namespace",
            "ServiceAccount",
            "ClusterRole",
            "ClusterRoleBinding",
            "ConfigMap",
            "ConfigMap",
            "ConfigMap",
            "Pod",
            "Service",
        ]
    );
    assert_eq!(docs[4]["metadata"]["name"], "sonobuoy-config-cm");
    assert_eq!(docs[5]["metadata"]["name"], "sonobuoy-plugin-0");
    assert_eq!(
        docs[5]["metadata"]["annotations"]["sonobuoy.hept.io/plugin"],
        "a"
    );
    assert_eq!(docs[6]["metadata"]["name"], "sonobuoy-plugin-1");
    assert!(docs[6]["data"]["plugin-1.yaml"].as_str().unwrap().contains("plugin-name: b"));
}

#[test]
fn cluster_role_is_bound_to_the_service_account() {
    let bundle =
        assemble_with(&Config::default(), &PluginSet::default(), None, &MissingKey).unwrap();
    let docs = parse(&bundle);
    let role = &docs[2];
    let binding = &docs[3];

    assert_eq!(role["metadata"]["name"], "sonobuoy-serviceaccount-sonobuoy");
    assert!(role["metadata"]["namespace"].is_null());
    assert_eq!(role["rules"][1]["nonResourceURLs"][0], "/metrics");
    assert_eq!(binding["roleRef"]["kind"], "ClusterRole");
    assert_eq!(binding["roleRef"]["name"], role["metadata"]["name"]);
    assert_eq!(binding["subjects"][0]["name"], "sonobuoy-serviceaccount");
    assert_eq!(binding["subjects"][0]["namespace"], "sonobuoy");
}

#[test]
fn namespace_admin_uses_namespaced_role() {
    let config = Config {
        aggregator_permissions: AggregatorPermissions::NamespaceAdmin,
        ..Config::default()
    };
    let bundle = assemble_with(&config, &PluginSet::default(), None, &MissingKey).unwrap();
    let docs = parse(&bundle);
    assert_eq!(kinds(&docs)[2..4], ["Role", "RoleBinding"]);
    assert_eq!(docs[2]["metadata"]["namespace"], "sonobuoy");
    assert_eq!(docs[3]["roleRef"]["kind"], "Role");
}

#[test]
fn ssh_secret_carries_base64_key() {
    let creds = SshCredentials {
        key_path: Path::new("/keys/id_rsa"),
        user: "core",
    };
    let bundle = assemble_with(
        &Config::default(),
        &PluginSet::default(),
        Some(creds),
        &StaticKey(b"private"),
    )
    .unwrap();
    let docs = parse(&bundle);
    let secret = docs
        .iter()
        .find(|d| d["kind"] == "Secret")
        .expect("ssh secret");
    assert_eq!(secret["metadata"]["name"], "ssh-key");
    assert_eq!(secret["type"], "Opaque");
    assert_eq!(secret["data"]["id_rsa"], "cHJpdmF0ZQ==");
    assert_eq!(kinds(&docs)[4], "Secret");
}

#[test]
fn unreadable_ssh_key_fails_assembly() {
    let creds = SshCredentials {
        key_path: Path::new("/keys/missing"),
        user: "core",
    };
    let err = assemble_with(&Config::default(), &PluginSet::default(), Some(creds), &MissingKey)
        .unwrap_err();
    match err {
        Error::ReadSshKey { path, source } => {
            assert_eq!(path, PathBuf::from("/keys/missing"));
            assert_eq!(source.kind(), io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn aggregator_pod_mounts_plugins_and_carries_annotations() {
    let mut config = Config::default();
    config
        .custom_annotations
        .insert("team".to_string(), "conformance".to_string());
    config.image_pull_secrets = "regcred".to_string();

    let mut aggregator = PodSpecDefaults::new().aggregator().clone();
    aggregator.add_image_pull_secret("regcred");
    let plugins = plugin_set(&["a", "b"]);
    let bundle = assemble(
        &AssemblyInput {
            config: &config,
            plugins: &plugins,
            aggregator_pod_spec: &aggregator,
            ssh: None,
        },
        &MissingKey,
    )
    .unwrap();
    let docs = parse(&bundle);
    let pod = docs.iter().find(|d| d["kind"] == "Pod").expect("pod");

    assert_eq!(pod["metadata"]["annotations"]["team"], "conformance");
    assert_eq!(pod["spec"]["imagePullSecrets"][0]["name"], "regcred");
    assert_eq!(pod["spec"]["serviceAccountName"], "sonobuoy-serviceaccount");
    let container = &pod["spec"]["containers"][0];
    assert_eq!(container["name"], "kube-sonobuoy");
    assert_eq!(container["image"], config.worker_image.as_str());
    assert_eq!(container["imagePullPolicy"], "IfNotPresent");

    let sources = &pod["spec"]["volumes"][1]["projected"]["sources"];
    assert_eq!(sources[0]["configMap"]["name"], "sonobuoy-plugin-0");
    assert_eq!(sources[1]["configMap"]["name"], "sonobuoy-plugin-1");
}

#[test]
fn no_plugins_mounts_an_empty_dir() {
    let bundle =
        assemble_with(&Config::default(), &PluginSet::default(), None, &MissingKey).unwrap();
    let docs = parse(&bundle);
    let pod = docs.iter().find(|d| d["kind"] == "Pod").expect("pod");
    let volume = &pod["spec"]["volumes"][1];
    assert_eq!(volume["name"], "sonobuoy-plugins-volume");
    assert!(volume["emptyDir"].is_object(), "{volume}");
}

#[test]
fn service_uses_bind_port() {
    let mut config = Config::default();
    config.server.bind_port = 9090;
    let bundle = assemble_with(&config, &PluginSet::default(), None, &MissingKey).unwrap();
    let docs = parse(&bundle);
    let service = docs.last().expect("service");
    assert_eq!(service["metadata"]["name"], "sonobuoy-aggregator");
    assert_eq!(service["spec"]["ports"][0]["port"], 9090);
    assert_eq!(service["spec"]["ports"][0]["targetPort"], 9090);
    assert_eq!(service["spec"]["selector"]["sonobuoy-component"], "aggregator");
}

#[test]
fn empty_aggregator_base_still_gets_a_container() {
    let plugins = PluginSet::default();
    let bundle = assemble(
        &AssemblyInput {
            config: &Config::default(),
            plugins: &plugins,
            aggregator_pod_spec: &PodSpec::default(),
            ssh: None,
        },
        &MissingKey,
    )
    .unwrap();
    let docs = parse(&bundle);
    let pod = docs.iter().find(|d| d["kind"] == "Pod").expect("pod");
    assert_eq!(pod["spec"]["containers"].as_array().map(Vec::len), Some(1));
}

#[test]
fn label_values_are_sanitized() {
    assert_eq!(sanitize_label_value("e2e"), "e2e");
    assert_eq!(sanitize_label_value("my plugin/v2"), "mypluginv2");
    assert_eq!(sanitize_label_value("-_x_-"), "x");
    assert_eq!(sanitize_label_value(&"a".repeat(80)).len(), 63);
}
