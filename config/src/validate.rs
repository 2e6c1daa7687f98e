use crate::{
    error::{ConfigError, Result},
    model::Config,
};

const MAX_LABEL_LEN: usize = 63;

impl Config {
    /// Structural checks that must hold before any manifest is generated.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(ConfigError::Empty { field: "Namespace" });
        }
        if !is_dns_label(&self.namespace) {
            return Err(ConfigError::InvalidLabel {
                field: "Namespace",
                value: self.namespace.clone(),
            });
        }
        if self.worker_image.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "WorkerImage",
            });
        }
        if self.server.bind_port == 0 {
            return Err(ConfigError::invalid("Server.BindPort", "must be non-zero"));
        }
        Ok(())
    }
}

pub fn is_dns_label(s: &str) -> bool {
    let bytes = s.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= MAX_LABEL_LEN
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}
