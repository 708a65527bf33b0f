/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! The delivery channel seam between components and the bus.

use super::error::MessagingError;
use super::message_exchange::MessageExchange;
use std::future::Future;

/// Moves exchanges between a component and the bus.
///
/// Implementations route the exchange to the provider named by its service,
/// interface or endpoint. The bus itself is outside this crate; tests and
/// embedders supply their own channel.
pub trait DeliveryChannel: Send + Sync + 'static {
    /// Sends `exchange` and waits for the provider to answer it.
    ///
    /// The returned exchange carries the provider's status, and a fault if
    /// the provider raised one.
    ///
    /// # Errors
    ///
    /// Returns a [`MessagingError`] if the exchange could not be routed or
    /// the channel is closed.
    fn send_sync(
        &self,
        exchange: MessageExchange,
    ) -> impl Future<Output = Result<MessageExchange, MessagingError>> + Send;

    /// Sends `exchange` without waiting for an answer.
    ///
    /// Used to return status updates (done, error) for exchanges this
    /// component received.
    ///
    /// # Errors
    ///
    /// Returns a [`MessagingError`] if the channel is closed.
    fn send(&self, exchange: MessageExchange) -> impl Future<Output = Result<(), MessagingError>> + Send;
}
