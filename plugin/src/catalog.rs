use semver::Version;

use crate::{
    definition::{Driver, PluginConfig, PluginDefinition, ResultFormat},
    e2e::E2eConfig,
    pod::{Container, EnvVar, SecurityContext, Volume, VolumeMount},
};

pub const E2E_PLUGIN_NAME: &str = "e2e";
pub const SYSTEMD_LOGS_PLUGIN_NAME: &str = "systemd-logs";

pub const DEFAULT_CONFORMANCE_REPOSITORY: &str = "k8s.gcr.io/conformance";
pub const DEFAULT_KUBE_VERSION: Version = Version::new(1, 19, 0);
pub const DEFAULT_SYSTEMD_LOGS_IMAGE: &str = "sonobuoy/systemd-logs:v0.3";

const RESULTS_DIR: &str = "/tmp/results";
const RESULTS_VOLUME: &str = "results";
const NODE_ROOT_DIR: &str = "/node";
const NODE_ROOT_VOLUME: &str = "root";
const SYSTEMD_LOGS_COMMAND: &str = "/get_systemd_logs.sh; while true; do echo \"Plugin is \
    complete. Sleeping indefinitely to avoid container exit and automatic restarts from \
    Kubernetes\"; sleep 3600; done";

/// Conformance image for a Kubernetes release, e.g. `k8s.gcr.io/conformance:v1.19.0`.
pub fn conformance_image(version: &Version) -> String {
    format!("{DEFAULT_CONFORMANCE_REPOSITORY}:v{version}")
}

/// Per-request inputs to the built-in plugin constructors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginContext {
    pub e2e: E2eConfig,
    pub conformance_image: String,
    pub systemd_logs_image: String,
}

impl Default for PluginContext {
    fn default() -> Self {
        Self {
            e2e: E2eConfig::default(),
            conformance_image: conformance_image(&DEFAULT_KUBE_VERSION),
            systemd_logs_image: DEFAULT_SYSTEMD_LOGS_IMAGE.to_string(),
        }
    }
}

/// The plugins shipped with sonobuoy. Closed: adding a built-in means adding
/// a variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinPlugin {
    E2e,
    SystemdLogs,
}

impl BuiltinPlugin {
    pub const ALL: [BuiltinPlugin; 2] = [BuiltinPlugin::E2e, BuiltinPlugin::SystemdLogs];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinPlugin::E2e => E2E_PLUGIN_NAME,
            BuiltinPlugin::SystemdLogs => SYSTEMD_LOGS_PLUGIN_NAME,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|plugin| plugin.name() == name)
    }

    pub fn definition(self, ctx: &PluginContext) -> PluginDefinition {
        match self {
            BuiltinPlugin::E2e => e2e_definition(ctx),
            BuiltinPlugin::SystemdLogs => systemd_logs_definition(ctx),
        }
    }
}

/// The set of plugins that can be included by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginCatalog {
    plugins: Vec<BuiltinPlugin>,
    defaults: Vec<BuiltinPlugin>,
}

impl PluginCatalog {
    /// All built-ins, with e2e and systemd-logs as the fallback set.
    pub fn builtin() -> Self {
        Self {
            plugins: BuiltinPlugin::ALL.to_vec(),
            defaults: vec![BuiltinPlugin::E2e, BuiltinPlugin::SystemdLogs],
        }
    }

    pub fn lookup(&self, name: &str, ctx: &PluginContext) -> Option<PluginDefinition> {
        self.plugins
            .iter()
            .find(|plugin| plugin.name() == name)
            .map(|plugin| plugin.definition(ctx))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|plugin| plugin.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|plugin| plugin.name()).collect()
    }

    /// Plugins used when a caller expresses no plugin choice at all.
    pub fn default_set(&self, ctx: &PluginContext) -> Vec<PluginDefinition> {
        self.defaults
            .iter()
            .map(|plugin| plugin.definition(ctx))
            .collect()
    }
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn e2e_definition(ctx: &PluginContext) -> PluginDefinition {
    let mut env = vec![
        EnvVar::literal("E2E_USE_GO_RUNNER", "true"),
        EnvVar::literal("RESULTS_DIR", RESULTS_DIR),
    ];
    if !ctx.e2e.focus.is_empty() {
        env.push(EnvVar::literal("E2E_FOCUS", ctx.e2e.focus.as_str()));
    }
    if !ctx.e2e.skip.is_empty() {
        env.push(EnvVar::literal("E2E_SKIP", ctx.e2e.skip.as_str()));
    }
    if ctx.e2e.parallel {
        env.push(EnvVar::literal("E2E_PARALLEL", "true"));
    }
    env.sort_by(|a, b| a.name.cmp(&b.name));

    PluginDefinition::builder()
        .sonobuoy_config(
            PluginConfig::builder()
                .driver(Driver::Job)
                .plugin_name(E2E_PLUGIN_NAME)
                .result_format(ResultFormat::Junit)
                .build(),
        )
        .spec(Container {
            name: E2E_PLUGIN_NAME.to_string(),
            image: ctx.conformance_image.clone(),
            command: vec!["/run_e2e.sh".to_string()],
            env,
            volume_mounts: vec![VolumeMount::new(RESULTS_VOLUME, RESULTS_DIR)],
            ..Default::default()
        })
        .build()
}

fn systemd_logs_definition(ctx: &PluginContext) -> PluginDefinition {
    PluginDefinition::builder()
        .sonobuoy_config(
            PluginConfig::builder()
                .driver(Driver::DaemonSet)
                .plugin_name(SYSTEMD_LOGS_PLUGIN_NAME)
                .result_format(ResultFormat::Raw)
                .build(),
        )
        .spec(Container {
            name: SYSTEMD_LOGS_PLUGIN_NAME.to_string(),
            image: ctx.systemd_logs_image.clone(),
            command: vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                SYSTEMD_LOGS_COMMAND.to_string(),
            ],
            env: vec![
                EnvVar::literal("CHROOT_DIR", NODE_ROOT_DIR),
                EnvVar::from_field("NODE_NAME", "spec.nodeName"),
                EnvVar::literal("RESULTS_DIR", RESULTS_DIR),
            ],
            security_context: Some(SecurityContext {
                privileged: Some(true),
                ..Default::default()
            }),
            volume_mounts: vec![
                VolumeMount::new(RESULTS_VOLUME, RESULTS_DIR),
                VolumeMount::new(NODE_ROOT_VOLUME, NODE_ROOT_DIR),
            ],
            ..Default::default()
        })
        .extra_volumes(vec![Volume::host_path(NODE_ROOT_VOLUME, "/")])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_constructs_known_plugins() {
        let catalog = PluginCatalog::builtin();
        let ctx = PluginContext::default();

        let e2e = catalog.lookup("e2e", &ctx).expect("e2e is built in");
        assert_eq!(e2e.name(), "e2e");
        assert_eq!(e2e.driver(), Driver::Job);
        assert_eq!(e2e.spec.image, "k8s.gcr.io/conformance:v1.19.0");

        let logs = catalog.lookup("systemd-logs", &ctx).expect("systemd-logs is built in");
        assert_eq!(logs.driver(), Driver::DaemonSet);
        assert!(logs.spec.env_var("NODE_NAME").unwrap().value_from.is_some());

        assert!(catalog.lookup("e2e2", &ctx).is_none());
    }

    #[test]
    fn default_set_is_e2e_then_systemd_logs() {
        let catalog = PluginCatalog::builtin();
        let names: Vec<_> = catalog
            .default_set(&PluginContext::default())
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["e2e", "systemd-logs"]);
    }

    #[test]
    fn e2e_env_reflects_selection_and_stays_sorted() {
        let ctx = PluginContext {
            e2e: E2eConfig {
                focus: "sig-storage".to_string(),
                skip: String::new(),
                parallel: true,
            },
            ..Default::default()
        };
        let e2e = BuiltinPlugin::E2e.definition(&ctx);
        let names: Vec<_> = e2e.spec.env.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            ["E2E_FOCUS", "E2E_PARALLEL", "E2E_USE_GO_RUNNER", "RESULTS_DIR"]
        );
    }

    #[test]
    fn builtin_names_resolve_back_to_variants() {
        for plugin in BuiltinPlugin::ALL {
            assert_eq!(BuiltinPlugin::from_name(plugin.name()), Some(plugin));
        }
        assert_eq!(BuiltinPlugin::from_name("nope"), None);
    }

    #[test]
    fn conformance_image_is_tagged_with_the_release() {
        assert_eq!(
            conformance_image(&Version::new(1, 21, 2)),
            "k8s.gcr.io/conformance:v1.21.2"
        );
    }
}
