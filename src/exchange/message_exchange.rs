/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Message exchanges and their addressing.

use super::error::MessagingError;
use super::message::{Fault, NormalizedMessage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A namespace-qualified name, written `{namespace}local`.
///
/// # Examples
///
/// ```
/// use resequencer_rs::exchange::QName;
///
/// let name: QName = "{urn:test}target".parse().unwrap();
/// assert_eq!(name.namespace, "urn:test");
/// assert_eq!(name.local, "target");
/// assert_eq!(name.to_string(), "{urn:test}target");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QName {
    /// Namespace uri, empty for unqualified names.
    pub namespace: String,

    /// Local part.
    pub local: String,
}

impl QName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// Creates a name without namespace.
    #[must_use]
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl FromStr for QName {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MessagingError::InvalidName(s.to_string());
        let name = match s.strip_prefix('{') {
            Some(rest) => {
                let (namespace, local) = rest.split_once('}').ok_or_else(invalid)?;
                Self::new(namespace, local)
            }
            None => Self::local(s),
        };
        if name.local.is_empty() || name.local.contains(['{', '}']) {
            return Err(invalid());
        }
        Ok(name)
    }
}

impl TryFrom<String> for QName {
    type Error = MessagingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<QName> for String {
    fn from(name: QName) -> Self {
        name.to_string()
    }
}

/// Reference to a concrete endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointRef {
    /// Service the endpoint belongs to.
    pub service: QName,

    /// Endpoint name within the service.
    pub name: String,
}

/// Interaction pattern of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExchangePattern {
    /// One-way, no response.
    InOnly,
    /// One-way, with an optional fault.
    RobustInOnly,
    /// Request/response.
    InOut,
    /// Request with an optional response.
    InOptionalOut,
}

impl ExchangePattern {
    /// Returns `true` if no normal response is ever produced.
    #[inline]
    #[must_use]
    pub fn is_one_way(&self) -> bool {
        matches!(self, Self::InOnly | Self::RobustInOnly)
    }
}

impl fmt::Display for ExchangePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InOnly => "in-only",
            Self::RobustInOnly => "robust-in-only",
            Self::InOut => "in-out",
            Self::InOptionalOut => "in-optional-out",
        };
        f.write_str(name)
    }
}

/// Lifecycle status of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeStatus {
    /// In flight.
    Active,
    /// Completed successfully.
    Done,
    /// Completed with an error.
    Error,
}

/// A request envelope moving between endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageExchange {
    /// Unique exchange id.
    pub id: Uuid,

    /// Interaction pattern.
    pub pattern: ExchangePattern,

    /// Current status.
    pub status: ExchangeStatus,

    /// Addressed service.
    pub service: Option<QName>,

    /// Addressed interface.
    pub interface: Option<QName>,

    /// Addressed operation.
    pub operation: Option<QName>,

    /// Addressed endpoint.
    pub endpoint: Option<EndpointRef>,

    /// The "in" message.
    pub in_message: Option<NormalizedMessage>,

    /// The "out" message, for request/response patterns.
    pub out_message: Option<NormalizedMessage>,

    /// Fault returned by the provider.
    pub fault: Option<Fault>,

    /// Error description once the status is [`ExchangeStatus::Error`].
    pub error: Option<String>,
}

impl MessageExchange {
    /// Creates an active exchange with a fresh id.
    #[must_use]
    pub fn new(pattern: ExchangePattern) -> Self {
        Self {
            id: Uuid::new_v4(),
            pattern,
            status: ExchangeStatus::Active,
            service: None,
            interface: None,
            operation: None,
            endpoint: None,
            in_message: None,
            out_message: None,
            fault: None,
            error: None,
        }
    }

    /// Creates an active in-only exchange carrying `message`.
    #[must_use]
    pub fn in_only(message: NormalizedMessage) -> Self {
        Self::new(ExchangePattern::InOnly).with_in_message(message)
    }

    /// Sets the in message, builder style.
    #[must_use]
    pub fn with_in_message(mut self, message: NormalizedMessage) -> Self {
        self.in_message = Some(message);
        self
    }

    /// Addresses the exchange to `service`, builder style.
    #[must_use]
    pub fn with_service(mut self, service: QName) -> Self {
        self.service = Some(service);
        self
    }

    /// Returns the in message.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::MissingMessage`] if there is none.
    pub fn require_in_message(&self) -> Result<&NormalizedMessage, MessagingError> {
        self.in_message.as_ref().ok_or(MessagingError::MissingMessage {
            id: self.id,
            message: "in",
        })
    }

    /// Marks the exchange done.
    pub fn set_done(&mut self) {
        self.status = ExchangeStatus::Done;
    }

    /// Marks the exchange failed with `error`.
    pub fn set_error(&mut self, error: impl fmt::Display) {
        self.status = ExchangeStatus::Error;
        self.error = Some(error.to_string());
    }

    /// Returns `true` while the exchange is in flight.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ExchangeStatus::Active
    }
}
