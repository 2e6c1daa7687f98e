use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid plugin definition: {0}")]
    #[diagnostic(code(plugin::invalid_definition))]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid image pull policy `{value}`")]
    #[diagnostic(
        code(plugin::invalid_pull_policy),
        help("Use one of `Always`, `IfNotPresent` or `Never`.")
    )]
    InvalidPullPolicy { value: String },

    #[error("invalid e2e mode `{value}`")]
    #[diagnostic(
        code(plugin::invalid_e2e_mode),
        help("Use one of `non-disruptive-conformance`, `quick` or `certified-conformance`.")
    )]
    InvalidMode { value: String },
}
