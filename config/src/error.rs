use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{field}: must not be empty")]
    #[diagnostic(code(config::empty_field))]
    Empty { field: &'static str },

    #[error("{field}: `{value}` is not a valid DNS-1123 label")]
    #[diagnostic(
        code(config::invalid_label),
        help("Use at most 63 lowercase alphanumeric characters or `-`, starting and ending with an alphanumeric character.")
    )]
    InvalidLabel { field: &'static str, value: String },

    #[error("{field}: {message}")]
    #[diagnostic(code(config::invalid_field))]
    Invalid {
        field: &'static str,
        message: String,
    },

    #[error("failed to parse config: {0}")]
    #[diagnostic(code(config::parse_error))]
    Parse(String),
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// The config field the error is about, if it concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Empty { field }
            | Self::InvalidLabel { field, .. }
            | Self::Invalid { field, .. } => Some(*field),
            Self::Parse(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
