/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Error types for the resequencer endpoint.

use crate::exchange::{ExchangePattern, MessagingError};
use crate::resequence::ResequencerError;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinError;

/// Errors found while loading or validating a [`ResequencerConfig`](super::ResequencerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured capacity is zero.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,

    /// The configured reader batch size is zero.
    #[error("reader batch size must be greater than zero")]
    ZeroBatchSize,

    /// The sequence number property name is empty.
    #[error("sequence number key must not be empty")]
    EmptySequenceNumberKey,

    /// The target addresses nothing or is malformed.
    #[error("invalid target: {0}")]
    Target(#[from] MessagingError),

    /// The configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },
}

/// Errors returned by [`ResequencerEndpoint`](super::ResequencerEndpoint) operations.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The endpoint configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation is not offered by this endpoint.
    #[error("{0}")]
    UnsupportedOperation(&'static str),

    /// The inbound exchange uses a pattern this endpoint does not accept.
    #[error("exchange pattern {0} not supported")]
    UnsupportedPattern(ExchangePattern),

    /// The resequencer engine refused the exchange.
    #[error(transparent)]
    Resequencer(#[from] ResequencerError),

    /// The bus reported a problem.
    #[error(transparent)]
    Messaging(#[from] MessagingError),

    /// The delivery task panicked or was cancelled.
    #[error("sequence reader failed: {0}")]
    Reader(#[from] JoinError),
}
