//! Plugin definitions and the pod-level Kubernetes types they embed.

mod catalog;
mod defaults;
mod definition;
mod e2e;
mod error;
mod pod;

pub use catalog::{
    BuiltinPlugin, DEFAULT_CONFORMANCE_REPOSITORY, DEFAULT_KUBE_VERSION,
    DEFAULT_SYSTEMD_LOGS_IMAGE, E2E_PLUGIN_NAME, PluginCatalog, PluginContext,
    SYSTEMD_LOGS_PLUGIN_NAME, conformance_image,
};
pub use defaults::{PodSpecDefaults, SERVICE_ACCOUNT_NAME};
pub use definition::{Driver, PluginConfig, PluginDefinition, PluginSelection, ResultFormat};
pub use e2e::{E2eConfig, E2eMode};
pub use error::Error;
pub use pod::{
    ConfigMapVolumeSource, Container, EmptyDirVolumeSource, EnvVar, EnvVarSource,
    HostPathVolumeSource, KeyRef, LocalObjectReference, ObjectFieldSelector, PodSpec,
    ProjectedVolumeSource, PullPolicy, SecretVolumeSource, SecurityContext, Toleration,
    UnmodeledFields, Volume, VolumeMount, VolumeProjection,
};
