/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Default ordering of message exchanges.

use crate::exchange::MessageExchange;
use crate::resequence::{ResequencerError, SequenceElementComparator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property read by [`DefaultComparator`] unless configured otherwise.
pub const DEFAULT_SEQUENCE_NUMBER_KEY: &str = "org.apache.servicemix.eip.sequence.number";

/// Orders exchanges by an integer sequence number stored as a property of
/// their in message.
///
/// The property must hold a JSON integer, or with `sequence_number_as_string`
/// a JSON string containing one. Anything else makes the exchange malformed.
///
/// Nothing marks where a stream starts unless `first_sequence_number` is
/// set. Without it, the first exchange of a stream (even one numbered 1) is
/// held until the timeout expires, or until the engine is stopped when the
/// timeout is disabled. Set `first_sequence_number` to forward the opening
/// exchange immediately.
///
/// # Examples
///
/// ```
/// use resequencer_rs::endpoint::DefaultComparator;
/// use resequencer_rs::exchange::{MessageExchange, NormalizedMessage};
/// use resequencer_rs::resequence::SequenceElementComparator;
///
/// let comparator = DefaultComparator::with_key("seqnum");
/// let exchange = MessageExchange::in_only(NormalizedMessage::new().with_property("seqnum", 4));
/// assert_eq!(comparator.sequence_key(&exchange), Ok(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultComparator {
    /// Name of the in-message property holding the sequence number.
    pub sequence_number_key: String,

    /// Whether the sequence number is carried as a string.
    pub sequence_number_as_string: bool,

    /// Sequence number that opens the stream, released without waiting.
    pub first_sequence_number: Option<i64>,
}

impl Default for DefaultComparator {
    fn default() -> Self {
        Self {
            sequence_number_key: DEFAULT_SEQUENCE_NUMBER_KEY.to_string(),
            sequence_number_as_string: false,
            first_sequence_number: None,
        }
    }
}

impl DefaultComparator {
    /// Creates a comparator reading the property `key`.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            sequence_number_key: key.into(),
            ..Self::default()
        }
    }

    /// Reads the sequence number from a string property.
    #[must_use]
    pub fn as_string(mut self, as_string: bool) -> Self {
        self.sequence_number_as_string = as_string;
        self
    }

    /// Designates the sequence number that opens the stream.
    #[must_use]
    pub fn with_first(mut self, first: i64) -> Self {
        self.first_sequence_number = Some(first);
        self
    }

    fn parse(&self, value: &Value) -> Option<i64> {
        if self.sequence_number_as_string {
            value.as_str().and_then(|s| s.trim().parse().ok())
        } else {
            value.as_i64()
        }
    }
}

impl SequenceElementComparator<MessageExchange> for DefaultComparator {
    type Key = i64;

    fn sequence_key(&self, exchange: &MessageExchange) -> Result<i64, ResequencerError> {
        let message = exchange
            .require_in_message()
            .map_err(|e| ResequencerError::MalformedElement(e.to_string()))?;
        let value = message.property(&self.sequence_number_key).ok_or_else(|| {
            ResequencerError::MalformedElement(format!(
                "exchange {} has no {} property",
                exchange.id, self.sequence_number_key
            ))
        })?;
        self.parse(value).ok_or_else(|| {
            ResequencerError::MalformedElement(format!(
                "exchange {} has invalid {} property {value}",
                exchange.id, self.sequence_number_key
            ))
        })
    }

    #[inline]
    fn is_successor(&self, previous: &i64, next: &i64) -> bool {
        previous.checked_add(1) == Some(*next)
    }

    #[inline]
    fn is_first(&self, key: &i64) -> bool {
        self.first_sequence_number == Some(*key)
    }
}
