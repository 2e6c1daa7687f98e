//! Turns a [`GenerationRequest`] into the manifest bundle that launches a
//! sonobuoy run.

mod bundle;
mod credentials;
mod error;
pub mod kubernetes;
mod overrides;
mod plugin_set;
mod pod_spec;
mod request;
mod resolve;
mod secrets;
mod ssh;

use sonobuoy_plugin::{PluginCatalog, PodSpecDefaults};
use tracing::info;

pub use crate::{
    bundle::{DOCUMENT_SEPARATOR, ManifestBundle},
    credentials::{CredentialReader, FsCredentialReader},
    error::Error,
    overrides::apply_env_overrides,
    plugin_set::PluginSet,
    pod_spec::{apply_image_pull_policy, normalize_pod_specs},
    request::{GenerationRequest, SshCredentials},
    resolve::resolve_plugins,
    secrets::propagate_image_pull_secret,
    ssh::{SSH_KEY_FILE, SSH_SECRET_NAME, wire_ssh},
};
use crate::kubernetes::{AssemblyInput, assemble};

/// Owns the immutable inputs shared by every generation: the built-in plugin
/// catalog, the default pod specs and the SSH key source.
#[derive(Clone, Debug)]
pub struct Generator<R = FsCredentialReader> {
    catalog: PluginCatalog,
    pod_specs: PodSpecDefaults,
    reader: R,
}

impl Generator {
    pub fn new() -> Self {
        Self {
            catalog: PluginCatalog::builtin(),
            pod_specs: PodSpecDefaults::new(),
            reader: FsCredentialReader,
        }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CredentialReader> Generator<R> {
    /// Replaces the SSH key source.
    pub fn with_reader<T: CredentialReader>(self, reader: T) -> Generator<T> {
        Generator {
            catalog: self.catalog,
            pod_specs: self.pod_specs,
            reader,
        }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    pub fn pod_specs(&self) -> &PodSpecDefaults {
        &self.pod_specs
    }

    /// Runs the whole pipeline. `None` stands for an absent request and is
    /// rejected before anything else happens.
    pub fn generate_manifest(
        &self,
        request: Option<&GenerationRequest>,
    ) -> Result<ManifestBundle, Error> {
        let request = request.ok_or(Error::NilRequest)?;
        let config = &request.config;
        config.validate().map_err(Error::InvalidConfig)?;

        let ctx = request.plugin_context();
        let mut plugins = resolve_plugins(request, &self.catalog, &ctx)?;

        let ssh = request.ssh_credentials();
        if let Some(creds) = &ssh {
            wire_ssh(&mut plugins, creds);
        }
        apply_image_pull_policy(&mut plugins, config.image_pull_policy);
        apply_env_overrides(&mut plugins, &request.plugin_env_overrides)?;
        normalize_pod_specs(
            &mut plugins,
            request.show_default_pod_spec,
            &self.pod_specs,
        );

        let mut aggregator = self.pod_specs.aggregator().clone();
        propagate_image_pull_secret(
            &mut plugins,
            &mut aggregator,
            &config.image_pull_secrets,
            &self.pod_specs,
        );

        let bundle = assemble(
            &AssemblyInput {
                config,
                plugins: &plugins,
                aggregator_pod_spec: &aggregator,
                ssh,
            },
            &self.reader,
        )?;

        info!(
            namespace = %config.namespace,
            plugins = ?plugins.names(),
            documents = bundle.documents().len(),
            "generated manifest"
        );
        Ok(bundle)
    }
}

/// [`Generator::generate_manifest`] with the built-in catalog and the
/// filesystem key reader.
pub fn generate_manifest(request: Option<&GenerationRequest>) -> Result<ManifestBundle, Error> {
    Generator::new().generate_manifest(request)
}
