use resequencer_rs::endpoint::{ConfigError, DEFAULT_SEQUENCE_NUMBER_KEY, ResequencerConfig};
use resequencer_rs::exchange::{ExchangeTarget, QName};
use resequencer_rs::resequence::ShutdownPolicy;
use std::io::Write;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "capacity": 100,
        "timeout_ms": 1500,
        "comparator": {
            "sequence_number_key": "seqnum",
            "sequence_number_as_string": true,
            "first_sequence_number": 1
        },
        "target": { "uri": "service:urn:test:target" },
        "shutdown": "discard",
        "reader_batch_size": 8
    }"#;

    // --- parsing ---

    #[test]
    fn test_full_configuration() {
        let config = ResequencerConfig::from_json(FULL).unwrap();
        assert_eq!(config.capacity, 100);
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert_eq!(config.comparator.sequence_number_key, "seqnum");
        assert!(config.comparator.sequence_number_as_string);
        assert_eq!(config.comparator.first_sequence_number, Some(1));
        assert_eq!(config.target.uri.as_deref(), Some("service:urn:test:target"));
        assert_eq!(config.shutdown, ShutdownPolicy::Discard);
        assert_eq!(config.reader_batch_size, 8);
    }

    #[test]
    fn test_minimal_configuration_defaults() {
        let config =
            ResequencerConfig::from_json(r#"{"capacity": 5, "target": {"service": "target"}}"#).unwrap();
        assert_eq!(config.timeout(), Duration::ZERO);
        assert_eq!(config.comparator.sequence_number_key, DEFAULT_SEQUENCE_NUMBER_KEY);
        assert!(!config.comparator.sequence_number_as_string);
        assert_eq!(config.target.service, Some(QName::local("target")));
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
        assert_eq!(config.reader_batch_size, 1);
    }

    #[test]
    fn test_builder_matches_parsed() {
        let built = ResequencerConfig::new(5, ExchangeTarget::service(QName::local("target")));
        let parsed =
            ResequencerConfig::from_json(r#"{"capacity": 5, "target": {"service": "target"}}"#).unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn test_serialize_round_trip() {
        let config = ResequencerConfig::from_json(FULL).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(ResequencerConfig::from_json(&json).unwrap(), config);
    }

    // --- validation ---

    #[test]
    fn test_missing_capacity_rejected() {
        let result = ResequencerConfig::from_json(r#"{"target": {"service": "target"}}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = ResequencerConfig::from_json(r#"{"capacity": 0, "target": {"service": "target"}}"#);
        assert!(matches!(result, Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = ResequencerConfig::new(5, ExchangeTarget::service(QName::local("target")))
            .with_reader_batch_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroBatchSize)));
    }

    #[test]
    fn test_empty_sequence_number_key_rejected() {
        let result = ResequencerConfig::from_json(
            r#"{"capacity": 5, "comparator": {"sequence_number_key": ""}, "target": {"service": "target"}}"#,
        );
        assert!(matches!(result, Err(ConfigError::EmptySequenceNumberKey)));
    }

    #[test]
    fn test_empty_target_rejected() {
        let result = ResequencerConfig::from_json(r#"{"capacity": 5, "target": {}}"#);
        assert!(matches!(result, Err(ConfigError::Target(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result =
            ResequencerConfig::from_json(r#"{"capacity": 5, "target": {"service": "t"}, "capacty": 6}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let result =
            ResequencerConfig::from_json(r#"{"capacity": 5, "timeout_ms": -1, "target": {"service": "t"}}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_shutdown_policy_rejected() {
        let result =
            ResequencerConfig::from_json(r#"{"capacity": 5, "shutdown": "flush", "target": {"service": "t"}}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // --- files ---

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = ResequencerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.capacity, 100);
    }

    #[test]
    fn test_missing_file_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resequencer.json");

        let err = ResequencerConfig::from_file(&path).unwrap_err();
        assert!(matches!(&err, ConfigError::Io { path: p, .. } if *p == path));
        assert!(err.to_string().contains("resequencer.json"));
    }

    #[test]
    fn test_with_timeout() {
        let config = ResequencerConfig::new(5, ExchangeTarget::service(QName::local("target")))
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout_ms, 250);
    }
}
