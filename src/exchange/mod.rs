/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Message exchange bus model.
//!
//! The minimal slice of a normalized message bus the resequencer endpoint
//! needs: exchanges with a pattern and status, messages with properties,
//! targets that address outbound exchanges, and the [`DeliveryChannel`]
//! trait through which exchanges enter and leave a component.

pub mod channel;
pub mod error;
pub mod message;
pub mod message_exchange;
pub mod target;

// Re-export main types
pub use channel::DeliveryChannel;
pub use error::MessagingError;
pub use message::{Fault, NormalizedMessage};
pub use message_exchange::{EndpointRef, ExchangePattern, ExchangeStatus, MessageExchange, QName};
pub use target::ExchangeTarget;

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(target: &ExchangeTarget) -> Result<MessageExchange, MessagingError> {
        let mut exchange = MessageExchange::in_only(NormalizedMessage::new());
        target.configure_target(&mut exchange)?;
        Ok(exchange)
    }

    // --- QName ---

    #[test]
    fn test_qname_parse_and_display() {
        let name: QName = "{urn:test}target".parse().unwrap();
        assert_eq!(name, QName::new("urn:test", "target"));
        assert_eq!(name.to_string(), "{urn:test}target");

        let plain: QName = "target".parse().unwrap();
        assert_eq!(plain, QName::local("target"));
        assert_eq!(plain.to_string(), "target");
    }

    #[test]
    fn test_qname_rejects_malformed() {
        assert!(matches!("{urn:test".parse::<QName>(), Err(MessagingError::InvalidName(_))));
        assert!(matches!("".parse::<QName>(), Err(MessagingError::InvalidName(_))));
    }

    #[test]
    fn test_qname_serde_as_string() {
        let name = QName::new("urn:test", "target");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"{urn:test}target\"");
        let back: QName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }

    // --- MessageExchange ---

    #[test]
    fn test_exchange_lifecycle() {
        let mut exchange = MessageExchange::in_only(NormalizedMessage::new().with_property("seqnum", 1));
        assert!(exchange.is_active());
        assert!(exchange.pattern.is_one_way());
        assert!(exchange.require_in_message().is_ok());

        exchange.set_error("boom");
        assert_eq!(exchange.status, ExchangeStatus::Error);
        assert_eq!(exchange.error.as_deref(), Some("boom"));
        assert!(!exchange.is_active());
    }

    #[test]
    fn test_missing_in_message() {
        let exchange = MessageExchange::new(ExchangePattern::InOnly);
        assert_eq!(
            exchange.require_in_message(),
            Err(MessagingError::MissingMessage {
                id: exchange.id,
                message: "in",
            })
        );
    }

    #[test]
    fn test_exchange_ids_are_unique() {
        let a = MessageExchange::new(ExchangePattern::InOnly);
        let b = MessageExchange::new(ExchangePattern::InOnly);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_pattern_one_way() {
        assert!(ExchangePattern::InOnly.is_one_way());
        assert!(ExchangePattern::RobustInOnly.is_one_way());
        assert!(!ExchangePattern::InOut.is_one_way());
        assert!(!ExchangePattern::InOptionalOut.is_one_way());
    }

    // --- ExchangeTarget ---

    #[test]
    fn test_empty_target_rejected() {
        assert_eq!(ExchangeTarget::default().validate(), Err(MessagingError::NoTarget));
        assert_eq!(configured(&ExchangeTarget::default()).unwrap_err(), MessagingError::NoTarget);
    }

    #[test]
    fn test_service_target_with_endpoint() {
        let service = QName::new("urn:test", "target");
        let exchange = configured(&ExchangeTarget::service(service.clone()).with_endpoint("ep")).unwrap();
        assert_eq!(exchange.service, Some(service.clone()));
        assert_eq!(
            exchange.endpoint,
            Some(EndpointRef {
                service,
                name: "ep".to_string(),
            })
        );
    }

    #[test]
    fn test_interface_target_with_operation() {
        let interface = QName::new("urn:test", "Iface");
        let operation = QName::new("urn:test", "op");
        let exchange =
            configured(&ExchangeTarget::interface(interface.clone()).with_operation(operation.clone())).unwrap();
        assert_eq!(exchange.interface, Some(interface));
        assert_eq!(exchange.operation, Some(operation));
        assert_eq!(exchange.service, None);
    }

    #[test]
    fn test_service_uri_colon_separated() {
        let exchange = configured(&ExchangeTarget::uri("service:urn:test:target")).unwrap();
        assert_eq!(exchange.service, Some(QName::new("urn:test", "target")));
    }

    #[test]
    fn test_service_uri_slash_separated() {
        let exchange = configured(&ExchangeTarget::uri("service:http://test.org/ns/target")).unwrap();
        assert_eq!(exchange.service, Some(QName::new("http://test.org/ns", "target")));
    }

    #[test]
    fn test_interface_uri() {
        let exchange = configured(&ExchangeTarget::uri("interface:urn:test:Iface")).unwrap();
        assert_eq!(exchange.interface, Some(QName::new("urn:test", "Iface")));
    }

    #[test]
    fn test_operation_uri() {
        let exchange = configured(&ExchangeTarget::uri("operation:urn:test:Iface:op")).unwrap();
        assert_eq!(exchange.interface, Some(QName::new("urn:test", "Iface")));
        assert_eq!(exchange.operation, Some(QName::new("urn:test", "op")));
    }

    #[test]
    fn test_endpoint_uri() {
        let exchange = configured(&ExchangeTarget::uri("endpoint:urn:test:target:ep")).unwrap();
        assert_eq!(
            exchange.endpoint,
            Some(EndpointRef {
                service: QName::new("urn:test", "target"),
                name: "ep".to_string(),
            })
        );
    }

    #[test]
    fn test_unsupported_uri_scheme() {
        let err = configured(&ExchangeTarget::uri("jms:queue")).unwrap_err();
        assert_eq!(err, MessagingError::UnsupportedUri("jms:queue".to_string()));
    }

    #[test]
    fn test_uri_missing_parts() {
        assert!(matches!(
            configured(&ExchangeTarget::uri("service:target")),
            Err(MessagingError::InvalidUri { .. })
        ));
        assert!(matches!(
            configured(&ExchangeTarget::uri("endpoint:urn:target")),
            Err(MessagingError::InvalidUri { .. })
        ));
    }

    #[test]
    fn test_explicit_fields_override_uri() {
        let target = ExchangeTarget {
            service: Some(QName::new("urn:other", "svc")),
            uri: Some("service:urn:test:target".to_string()),
            ..ExchangeTarget::default()
        };
        let exchange = configured(&target).unwrap();
        assert_eq!(exchange.service, Some(QName::new("urn:other", "svc")));
    }

    #[test]
    fn test_target_deserialize_rejects_unknown_fields() {
        let ok: ExchangeTarget = serde_json::from_str(r#"{"service": "{urn:test}target"}"#).unwrap();
        assert_eq!(ok.service, Some(QName::new("urn:test", "target")));
        assert!(serde_json::from_str::<ExchangeTarget>(r#"{"queue": "x"}"#).is_err());
    }
}
