/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Delivery of resequenced exchanges to their target.

use crate::exchange::{DeliveryChannel, ExchangeStatus, MessageExchange};
use crate::resequence::{SendError, SequenceSender};
use std::sync::Arc;
use tracing::{debug, warn};

/// Sends each released exchange to its target over a [`DeliveryChannel`]
/// and waits for the answer.
pub struct ExchangeSender<Ch> {
    channel: Arc<Ch>,
}

impl<Ch> ExchangeSender<Ch> {
    /// Creates a sender over `channel`.
    #[must_use]
    pub fn new(channel: Arc<Ch>) -> Self {
        Self { channel }
    }
}

impl<Ch: DeliveryChannel> SequenceSender<MessageExchange> for ExchangeSender<Ch> {
    async fn send_sync(&self, exchange: MessageExchange) -> Result<(), SendError> {
        let id = exchange.id;
        let mut reply = self
            .channel
            .send_sync(exchange)
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        if let Some(fault) = reply.fault.take() {
            warn!(exchange = %id, fault = %fault.content, "target answered with fault");
            reply.set_done();
            if let Err(e) = self.channel.send(reply).await {
                warn!(exchange = %id, error = %e, "cannot acknowledge fault");
            }
            return Err(SendError::Fault(fault.content));
        }

        match reply.status {
            ExchangeStatus::Error => Err(SendError::Rejected(
                reply.error.unwrap_or_else(|| format!("exchange {id} failed")),
            )),
            _ => {
                debug!(exchange = %id, "exchange delivered");
                Ok(())
            }
        }
    }
}
