/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Resequencer endpoint for message exchange buses.
//!
//! Wires the [`resequence`](crate::resequence) engine and reader to the
//! [`exchange`](crate::exchange) model: inbound one-way exchanges are keyed
//! by a sequence number property, buffered, and forwarded to a configured
//! target in sequence-number order.
//!
//! # Examples
//!
//! ```no_run
//! use resequencer_rs::endpoint::{ResequencerConfig, ResequencerEndpoint};
//! use resequencer_rs::exchange::{
//!     DeliveryChannel, ExchangeTarget, MessageExchange, MessagingError, NormalizedMessage, QName,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Bus;
//!
//! impl DeliveryChannel for Bus {
//!     async fn send_sync(&self, mut exchange: MessageExchange) -> Result<MessageExchange, MessagingError> {
//!         exchange.set_done();
//!         Ok(exchange)
//!     }
//!
//!     async fn send(&self, _exchange: MessageExchange) -> Result<(), MessagingError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResequencerConfig::new(100, ExchangeTarget::service(QName::local("target")))
//!     .with_timeout(Duration::from_millis(500));
//! let endpoint = ResequencerEndpoint::start(config, Arc::new(Bus), &tokio::runtime::Handle::current())?;
//!
//! let message = NormalizedMessage::new().with_property("org.apache.servicemix.eip.sequence.number", 1);
//! endpoint.process(MessageExchange::in_only(message)).await?;
//!
//! let report = endpoint.shutdown().await?;
//! println!("delivered {}", report.reader.delivered);
//! # Ok(())
//! # }
//! ```

pub mod comparator;
pub mod config;
pub mod error;
pub mod resequencer;
pub mod sender;

#[cfg(test)]
mod tests;

// Re-export main types
pub use comparator::{DEFAULT_SEQUENCE_NUMBER_KEY, DefaultComparator};
pub use config::ResequencerConfig;
pub use error::{ConfigError, EndpointError};
pub use resequencer::{ResequencerEndpoint, ShutdownReport};
pub use sender::ExchangeSender;
