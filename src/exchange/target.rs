/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Addressing of outbound exchanges.
//!
//! A target names where an exchange created by a pattern should go: an
//! interface, a service (optionally narrowed to one endpoint), an operation,
//! or a uri of the form `service:`, `interface:`, `operation:` or
//! `endpoint:` followed by namespace and names. The namespace is separated
//! from the names by the last `/` when the uri contains one, otherwise by
//! the last `:`.

use super::error::MessagingError;
use super::message_exchange::{EndpointRef, MessageExchange, QName};
use serde::{Deserialize, Serialize};

/// Where outbound exchanges are sent.
///
/// # Examples
///
/// ```
/// use resequencer_rs::exchange::{ExchangeTarget, MessageExchange, NormalizedMessage, QName};
///
/// let target = ExchangeTarget::uri("service:urn:test:target");
/// let mut exchange = MessageExchange::in_only(NormalizedMessage::new());
/// target.configure_target(&mut exchange).unwrap();
/// assert_eq!(exchange.service, Some(QName::new("urn:test", "target")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExchangeTarget {
    /// Interface to address.
    pub interface: Option<QName>,

    /// Operation to invoke.
    pub operation: Option<QName>,

    /// Service to address.
    pub service: Option<QName>,

    /// Endpoint within `service`.
    pub endpoint: Option<String>,

    /// Target uri.
    pub uri: Option<String>,
}

impl ExchangeTarget {
    /// Targets a service.
    #[must_use]
    pub fn service(service: QName) -> Self {
        Self {
            service: Some(service),
            ..Self::default()
        }
    }

    /// Targets an interface.
    #[must_use]
    pub fn interface(interface: QName) -> Self {
        Self {
            interface: Some(interface),
            ..Self::default()
        }
    }

    /// Targets a uri.
    #[must_use]
    pub fn uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Narrows a service target to one endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the operation to invoke.
    #[must_use]
    pub fn with_operation(mut self, operation: QName) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Checks that the target addresses something.
    ///
    /// # Errors
    ///
    /// Returns [`MessagingError::NoTarget`] if neither interface, service nor
    /// uri is set.
    pub fn validate(&self) -> Result<(), MessagingError> {
        if self.interface.is_none() && self.service.is_none() && self.uri.is_none() {
            return Err(MessagingError::NoTarget);
        }
        Ok(())
    }

    /// Addresses `exchange` to this target.
    ///
    /// The uri is applied first; explicit interface, operation and service
    /// settings then take precedence over what the uri set.
    ///
    /// # Errors
    ///
    /// - [`MessagingError::NoTarget`] if the target addresses nothing
    /// - [`MessagingError::InvalidUri`] if the uri cannot be split
    /// - [`MessagingError::UnsupportedUri`] for unknown uri schemes
    pub fn configure_target(&self, exchange: &mut MessageExchange) -> Result<(), MessagingError> {
        self.validate()?;

        if let Some(uri) = &self.uri {
            if let Some(rest) = uri.strip_prefix("interface:") {
                let [namespace, name] = split2(uri, rest)?;
                exchange.interface = Some(QName::new(namespace, name));
            } else if let Some(rest) = uri.strip_prefix("operation:") {
                let [namespace, interface, operation] = split3(uri, rest)?;
                exchange.interface = Some(QName::new(namespace, interface));
                exchange.operation = Some(QName::new(namespace, operation));
            } else if let Some(rest) = uri.strip_prefix("service:") {
                let [namespace, name] = split2(uri, rest)?;
                exchange.service = Some(QName::new(namespace, name));
            } else if let Some(rest) = uri.strip_prefix("endpoint:") {
                let [namespace, service, endpoint] = split3(uri, rest)?;
                exchange.endpoint = Some(EndpointRef {
                    service: QName::new(namespace, service),
                    name: endpoint.to_string(),
                });
            } else {
                return Err(MessagingError::UnsupportedUri(uri.clone()));
            }
        }

        if let Some(interface) = &self.interface {
            exchange.interface = Some(interface.clone());
        }
        if let Some(operation) = &self.operation {
            exchange.operation = Some(operation.clone());
        }
        if let Some(service) = &self.service {
            exchange.service = Some(service.clone());
            if let Some(endpoint) = &self.endpoint {
                exchange.endpoint = Some(EndpointRef {
                    service: service.clone(),
                    name: endpoint.clone(),
                });
            }
        }
        Ok(())
    }
}

fn separator(rest: &str) -> char {
    if rest.find('/').is_some_and(|idx| idx > 0) {
        '/'
    } else {
        ':'
    }
}

fn split2<'a>(uri: &str, rest: &'a str) -> Result<[&'a str; 2], MessagingError> {
    let rest = rest.trim();
    let sep = separator(rest);
    match rest.rsplit_once(sep) {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => Ok([namespace, name]),
        _ => Err(MessagingError::InvalidUri {
            uri: uri.to_string(),
            reason: "expected <namespace><sep><name>",
        }),
    }
}

fn split3<'a>(uri: &str, rest: &'a str) -> Result<[&'a str; 3], MessagingError> {
    let rest = rest.trim();
    let sep = separator(rest);
    let invalid = || MessagingError::InvalidUri {
        uri: uri.to_string(),
        reason: "expected <namespace><sep><name><sep><name>",
    };
    let (head, last) = rest.rsplit_once(sep).ok_or_else(invalid)?;
    let (namespace, middle) = head.rsplit_once(sep).ok_or_else(invalid)?;
    if namespace.is_empty() || middle.is_empty() || last.is_empty() {
        return Err(invalid());
    }
    Ok([namespace, middle, last])
}
