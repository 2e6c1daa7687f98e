use sonobuoy_plugin::{E2E_PLUGIN_NAME, EnvVar, Volume, VolumeMount};
use tracing::debug;

use crate::{PluginSet, SshCredentials};

pub const SSH_SECRET_NAME: &str = "ssh-key";
pub const SSH_KEY_FILE: &str = "id_rsa";

const SSH_VOLUME_NAME: &str = "sshkey-vol";
const SSH_MOUNT_DIR: &str = "/root/.ssh";
const SSH_KEY_MODE: i32 = 0o400;

/// Gives the e2e plugin access to the node SSH key.
pub fn wire_ssh(plugins: &mut PluginSet, creds: &SshCredentials<'_>) {
    let Some(e2e) = plugins.get_mut(E2E_PLUGIN_NAME) else {
        debug!("ssh credentials given but no e2e plugin resolved");
        return;
    };

    e2e.spec.set_env(EnvVar::literal("KUBE_SSH_USER", creds.user));
    e2e.spec.set_env(EnvVar::literal(
        "KUBE_SSH_KEY_PATH",
        format!("{SSH_MOUNT_DIR}/{SSH_KEY_FILE}"),
    ));
    e2e.spec.set_env(EnvVar::literal("LOCAL_SSH_KEY", SSH_KEY_FILE));

    if !e2e.spec.volume_mounts.iter().any(|m| m.name == SSH_VOLUME_NAME) {
        e2e.spec.volume_mounts.push(VolumeMount {
            read_only: Some(true),
            ..VolumeMount::new(SSH_VOLUME_NAME, SSH_MOUNT_DIR)
        });
    }
    if !e2e.extra_volumes.iter().any(|v| v.name == SSH_VOLUME_NAME) {
        e2e.extra_volumes.push(Volume::secret(
            SSH_VOLUME_NAME,
            SSH_SECRET_NAME,
            Some(SSH_KEY_MODE),
        ));
    }
}
