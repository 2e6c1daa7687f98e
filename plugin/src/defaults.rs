use crate::{
    definition::Driver,
    pod::{PodSpec, Toleration},
};

pub const SERVICE_ACCOUNT_NAME: &str = "sonobuoy-serviceaccount";

/// The canonical pod specs used when a plugin brings none of its own, and
/// the base spec for the aggregator pod.
///
/// Built once and shared by reference; nothing mutates it after
/// construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodSpecDefaults {
    job: PodSpec,
    daemon_set: PodSpec,
    aggregator: PodSpec,
}

impl PodSpecDefaults {
    pub fn new() -> Self {
        Self {
            job: PodSpec {
                restart_policy: Some("Never".to_string()),
                service_account_name: Some(SERVICE_ACCOUNT_NAME.to_string()),
                tolerations: vec![
                    Toleration::exists(Some("node-role.kubernetes.io/master"), Some("NoSchedule")),
                    Toleration::exists(Some("CriticalAddonsOnly"), None),
                    Toleration::exists(Some("kubernetes.io/e2e-evict-taint-key"), None),
                ],
                ..Default::default()
            },
            daemon_set: PodSpec {
                service_account_name: Some(SERVICE_ACCOUNT_NAME.to_string()),
                host_network: Some(true),
                host_ipc: Some(true),
                host_pid: Some(true),
                dns_policy: Some("ClusterFirstWithHostNet".to_string()),
                tolerations: vec![
                    Toleration::exists(Some("CriticalAddonsOnly"), None),
                    Toleration::exists(None, Some("NoSchedule")),
                    Toleration::exists(None, Some("NoExecute")),
                ],
                ..Default::default()
            },
            aggregator: PodSpec {
                restart_policy: Some("Never".to_string()),
                service_account_name: Some(SERVICE_ACCOUNT_NAME.to_string()),
                tolerations: vec![Toleration::exists(
                    Some("kubernetes.io/e2e-evict-taint-key"),
                    None,
                )],
                ..Default::default()
            },
        }
    }

    pub fn for_driver(&self, driver: Driver) -> &PodSpec {
        match driver {
            Driver::Job => &self.job,
            Driver::DaemonSet => &self.daemon_set,
        }
    }

    pub fn aggregator(&self) -> &PodSpec {
        &self.aggregator
    }
}

impl Default for PodSpecDefaults {
    fn default() -> Self {
        Self::new()
    }
}
