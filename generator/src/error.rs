use std::{io, path::PathBuf};

use miette::Diagnostic;
use sonobuoy_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("nil config provided")]
    #[diagnostic(code(generator::nil_request))]
    NilRequest,

    #[error("config validation failed: {0}")]
    #[diagnostic(code(generator::invalid_config))]
    InvalidConfig(ConfigError),

    #[error(
        "plugin YAML generation: plugin names must be unique, got duplicated plugin name '{name}'"
    )]
    #[diagnostic(code(generator::duplicate_plugin_name))]
    DuplicatePluginName { name: String },

    #[error("plugin YAML generation: plugin name must not be empty")]
    #[diagnostic(code(generator::empty_plugin_name))]
    EmptyPluginName,

    #[error(
        "failed to resolve plugin {name}, no built-in plugin with that name found; have plugins: [{}]",
        .known.join(" ")
    )]
    #[diagnostic(code(generator::unknown_plugin))]
    UnknownPlugin { name: String, known: Vec<String> },

    #[error(
        "failed to override env vars for plugin {name}, no plugin with that name found; have plugins: [{}]",
        .have.join(" ")
    )]
    #[diagnostic(code(generator::unknown_override_plugin))]
    UnknownOverridePlugin { name: String, have: Vec<String> },

    #[error("failed to read ssh key `{}`: {source}", .path.display())]
    #[diagnostic(code(generator::read_ssh_key))]
    ReadSshKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to serialize {kind} as YAML: {source}")]
    #[diagnostic(code(generator::yaml))]
    Yaml {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config as JSON: {0}")]
    #[diagnostic(code(generator::json))]
    Json(#[source] serde_json::Error),
}
