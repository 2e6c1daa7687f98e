mod error;
mod model;
mod validate;

pub use error::{ConfigError, Result};
pub use model::{
    AggregationConfig, AggregatorPermissions, Config, DEFAULT_AGGREGATION_TIMEOUT_SECONDS,
    DEFAULT_BIND_ADDRESS, DEFAULT_BIND_PORT, DEFAULT_DESCRIPTION, DEFAULT_NAMESPACE,
    DEFAULT_RESULTS_DIR, DEFAULT_WORKER_IMAGE_REPOSITORY, FilterOptions, VERSION, worker_image,
};
pub use validate::is_dns_label;

#[cfg(test)]
mod tests {
    use serde_json::json;
    use sonobuoy_plugin::{PluginSelection, PullPolicy};

    use super::*;

    #[test]
    fn serializes_with_aggregator_field_names() {
        let value = serde_json::to_value(Config::default()).expect("config should serialize");
        let obj = value.as_object().expect("config is an object");

        for key in [
            "UUID",
            "Description",
            "Version",
            "ResultsDir",
            "Resources",
            "Filters",
            "Server",
            "Plugins",
            "PluginSearchPath",
            "Namespace",
            "WorkerImage",
            "ImagePullPolicy",
            "ImagePullSecrets",
            "AggregatorPermissions",
        ] {
            assert!(obj.contains_key(key), "missing {key} in {value}");
        }
        assert!(!obj.contains_key("CustomAnnotations"));
        assert_eq!(value["Plugins"], serde_json::Value::Null);
        assert_eq!(value["Server"]["BindAddress"], "0.0.0.0");
        assert_eq!(value["ImagePullPolicy"], "IfNotPresent");
        assert_eq!(value["AggregatorPermissions"], "clusterAdmin");
    }

    #[test]
    fn missing_fields_keep_their_defaults() {
        let config = Config::from_json(r#"{"Namespace": "conformance"}"#).expect("should parse");
        assert_eq!(config.namespace, "conformance");
        assert_eq!(config.server, AggregationConfig::default());
        assert_eq!(config.worker_image, worker_image(VERSION));
        assert_eq!(config.plugin_selections, None);
    }

    #[test]
    fn null_and_empty_selections_stay_distinct() {
        let unset = Config::from_json(r#"{"Plugins": null}"#).unwrap();
        assert_eq!(unset.plugin_selections, None);

        let empty = Config::from_json(r#"{"Plugins": []}"#).unwrap();
        assert_eq!(empty.plugin_selections, Some(vec![]));
    }

    #[test]
    fn plugin_search_path_is_kept_verbatim() {
        let config: Config =
            serde_json::from_value(json!({ "PluginSearchPath": ["a", "b", "c", "a"] })).unwrap();
        assert_eq!(config.plugin_search_path, ["a", "b", "c", "a"]);
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = Config::new();
        config.plugin_selections = Some(vec![PluginSelection::new("systemd-logs")]);
        config.image_pull_policy = PullPolicy::Always;
        config.server.bind_address = "10.0.0.1".to_string();
        config
            .custom_annotations
            .insert("team".to_string(), "conformance".to_string());

        let json = serde_json::to_string(&config).unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn new_generates_a_uuid_and_default_does_not() {
        assert!(Config::default().uuid.is_empty());
        let a = Config::new();
        let b = Config::new();
        assert!(!a.uuid.is_empty());
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn ensure_uuid_keeps_an_existing_id() {
        let mut config = Config {
            uuid: "fixed".to_string(),
            ..Config::default()
        };
        config.ensure_uuid();
        assert_eq!(config.uuid, "fixed");

        let mut config = Config::default();
        config.ensure_uuid();
        assert!(!config.uuid.is_empty());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = Config::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert_eq!(err.field(), None);
    }

    #[test]
    fn permission_modes_parse() {
        assert_eq!(
            "namespaceAdmin".parse::<AggregatorPermissions>().unwrap(),
            AggregatorPermissions::NamespaceAdmin
        );
        assert!("root".parse::<AggregatorPermissions>().is_err());
    }
}
