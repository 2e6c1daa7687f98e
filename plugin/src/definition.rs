use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};

use crate::{
    error::Error,
    pod::{Container, PodSpec, Volume},
};

/// How the aggregator schedules a plugin's pods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Driver {
    /// One pod for the whole cluster.
    #[default]
    Job,
    /// One pod per node.
    DaemonSet,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Driver::Job => "Job",
            Driver::DaemonSet => "DaemonSet",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Junit,
    E2e,
    Raw,
    Manual,
    Gojson,
}

/// The `sonobuoy-config` block of a plugin definition.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[builder(on(String, into))]
#[serde(rename_all = "kebab-case")]
pub struct PluginConfig {
    #[serde(default)]
    #[builder(default)]
    pub driver: Driver,
    pub plugin_name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[builder(default)]
    pub skip_cleanup: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_format: Option<ResultFormat>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub result_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A plugin: a named unit of work deployed next to the aggregator.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
pub struct PluginDefinition {
    #[serde(rename = "sonobuoy-config")]
    pub sonobuoy_config: PluginConfig,
    #[serde(default)]
    #[builder(default)]
    pub spec: Container,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(rename = "extra-volumes", default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub extra_volumes: Vec<Volume>,
    #[serde(rename = "podSpec", default, skip_serializing_if = "Option::is_none")]
    pub pod_spec: Option<PodSpec>,
}

impl PluginDefinition {
    /// A definition carrying only a name; every other field takes its default.
    pub fn named(name: impl Into<String>) -> Self {
        Self::builder()
            .sonobuoy_config(PluginConfig::builder().plugin_name(name).build())
            .build()
    }

    pub fn name(&self) -> &str {
        &self.sonobuoy_config.plugin_name
    }

    pub fn driver(&self) -> Driver {
        self.sonobuoy_config.driver
    }

    pub fn from_yaml(input: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// A legacy by-name plugin choice, stored in the aggregator config.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginSelection {
    pub name: String,
}

impl PluginSelection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
