/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Deployment configuration of a resequencer endpoint.

use super::comparator::DefaultComparator;
use super::error::ConfigError;
use crate::exchange::ExchangeTarget;
use crate::resequence::ShutdownPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_batch_size() -> usize {
    1
}

/// Settings of a [`ResequencerEndpoint`](super::ResequencerEndpoint).
///
/// # Examples
///
/// ```
/// use resequencer_rs::endpoint::ResequencerConfig;
///
/// let config = ResequencerConfig::from_json(
///     r#"{
///         "capacity": 100,
///         "timeout_ms": 500,
///         "comparator": { "sequence_number_key": "seqnum" },
///         "target": { "service": "{urn:test}target" }
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(config.capacity, 100);
/// assert_eq!(config.reader_batch_size, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResequencerConfig {
    /// Maximum number of buffered out-of-order exchanges.
    pub capacity: usize,

    /// Forced-release timeout in milliseconds, 0 disables it.
    #[serde(default)]
    pub timeout_ms: u64,

    /// How sequence numbers are read from exchanges.
    #[serde(default)]
    pub comparator: DefaultComparator,

    /// Where resequenced exchanges are sent.
    pub target: ExchangeTarget,

    /// What happens to buffered exchanges on shutdown.
    #[serde(default)]
    pub shutdown: ShutdownPolicy,

    /// Maximum number of released exchanges delivered per reader batch.
    #[serde(default = "default_batch_size")]
    pub reader_batch_size: usize,
}

impl ResequencerConfig {
    /// Creates a configuration with default comparator, no timeout and
    /// unbatched delivery.
    #[must_use]
    pub fn new(capacity: usize, target: ExchangeTarget) -> Self {
        Self {
            capacity,
            timeout_ms: 0,
            comparator: DefaultComparator::default(),
            target,
            shutdown: ShutdownPolicy::default(),
            reader_batch_size: default_batch_size(),
        }
    }

    /// Sets the forced-release timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the comparator settings.
    #[must_use]
    pub fn with_comparator(mut self, comparator: DefaultComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Sets the shutdown policy.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: ShutdownPolicy) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Sets the reader batch size.
    #[must_use]
    pub fn with_reader_batch_size(mut self, batch_size: usize) -> Self {
        self.reader_batch_size = batch_size;
        self
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields,
    /// and any error of [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, and any error
    /// of [`from_json`](Self::from_json).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks the configuration before an endpoint is started with it.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroCapacity`]
    /// - [`ConfigError::ZeroBatchSize`]
    /// - [`ConfigError::EmptySequenceNumberKey`]
    /// - [`ConfigError::Target`] if the target addresses nothing
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.reader_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.comparator.sequence_number_key.is_empty() {
            return Err(ConfigError::EmptySequenceNumberKey);
        }
        self.target.validate()?;
        Ok(())
    }

    /// The forced-release timeout, [`Duration::ZERO`] when disabled.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
