/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Ordering strategies for sequence elements.
//!
//! A comparator extracts a sequence key from each element once, when the
//! element enters the engine. Ordering between elements is the natural
//! [`Ord`] of that key; the comparator additionally decides adjacency, i.e.
//! whether one key is the gap-free successor of another.

use super::error::ResequencerError;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Strategy that orders elements of type `T` by an extracted sequence key.
///
/// Implementations must be deterministic and free of side effects. Key
/// extraction may fail for malformed input, in which case the element is
/// rejected before it touches the reordering buffer.
pub trait SequenceElementComparator<T>: Send + Sync + 'static {
    /// The extracted sequence key.
    type Key: Ord + Clone + Debug + Send + Sync + 'static;

    /// Extracts the sequence key of `element`.
    ///
    /// # Errors
    ///
    /// Returns [`ResequencerError::MalformedElement`] if no key can be
    /// extracted.
    fn sequence_key(&self, element: &T) -> Result<Self::Key, ResequencerError>;

    /// Returns `true` if `next` immediately follows `previous` with no gap.
    fn is_successor(&self, previous: &Self::Key, next: &Self::Key) -> bool;

    /// Returns `true` if `key` opens a sequence, so that it may be released
    /// before anything else has been released.
    fn is_first(&self, _key: &Self::Key) -> bool {
        false
    }

    /// Orders two elements by their extracted keys.
    ///
    /// # Errors
    ///
    /// Propagates key extraction failures of either element.
    fn compare(&self, a: &T, b: &T) -> Result<Ordering, ResequencerError> {
        Ok(self.sequence_key(a)?.cmp(&self.sequence_key(b)?))
    }

    /// Returns `true` if `second` is the immediate successor of `first`.
    ///
    /// # Errors
    ///
    /// Propagates key extraction failures of either element.
    fn is_in_sequence(&self, first: &T, second: &T) -> Result<bool, ResequencerError> {
        Ok(self.is_successor(&self.sequence_key(first)?, &self.sequence_key(second)?))
    }
}

/// Comparator for elements that are their own integer sequence number.
///
/// # Examples
///
/// ```
/// use resequencer_rs::resequence::{NumericComparator, SequenceElementComparator};
///
/// let comparator = NumericComparator::new().with_first(1);
/// let ordering: &dyn SequenceElementComparator<i64, Key = i64> = &comparator;
/// assert!(ordering.is_successor(&4, &5));
/// assert!(!ordering.is_successor(&4, &6));
/// assert!(ordering.is_first(&1));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericComparator {
    first: Option<i64>,
}

impl NumericComparator {
    /// Creates a comparator with no designated first sequence number.
    #[must_use]
    pub fn new() -> Self {
        Self { first: None }
    }

    /// Designates the sequence number that opens the sequence.
    #[must_use]
    pub fn with_first(mut self, first: i64) -> Self {
        self.first = Some(first);
        self
    }
}

impl<T> SequenceElementComparator<T> for NumericComparator
where
    T: Copy + Into<i64> + Send + Sync + 'static,
{
    type Key = i64;

    fn sequence_key(&self, element: &T) -> Result<i64, ResequencerError> {
        Ok((*element).into())
    }

    #[inline]
    fn is_successor(&self, previous: &i64, next: &i64) -> bool {
        previous.checked_add(1) == Some(*next)
    }

    #[inline]
    fn is_first(&self, key: &i64) -> bool {
        self.first == Some(*key)
    }
}
