/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Errors raised by the bus model.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while addressing or moving exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    /// An exchange target names neither an interface, a service nor a uri.
    #[error("interface, service or uri should be specified")]
    NoTarget,

    /// A qualified name could not be parsed.
    #[error("invalid qualified name {0:?}")]
    InvalidName(String),

    /// A target uri could not be split into its parts.
    #[error("invalid target uri {uri:?}: {reason}")]
    InvalidUri {
        /// The offending uri.
        uri: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A target uri uses a scheme that cannot be resolved.
    #[error("unsupported target uri {0:?}")]
    UnsupportedUri(String),

    /// The exchange lacks the message the operation needs.
    #[error("exchange {id} has no {message} message")]
    MissingMessage {
        /// The exchange.
        id: Uuid,
        /// Name of the missing message.
        message: &'static str,
    },

    /// The delivery channel is closed.
    #[error("delivery channel closed")]
    ChannelClosed,

    /// The bus refused the exchange.
    #[error("exchange {id} rejected: {reason}")]
    Rejected {
        /// The exchange.
        id: Uuid,
        /// Why it was refused.
        reason: String,
    },
}
