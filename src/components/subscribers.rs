//! Counted observer list used by sensors to deliver notifications.
//!
//! Subscribing the same observer twice registers it twice, and each
//! registration has to be removed separately. Removing from an empty list is
//! refused with [`SubscriptionError::NoSubscribers`] instead of wrapping the
//! count around.

use smallvec::SmallVec;
use thiserror::Error;

/// Errors raised when an unsubscription would break the subscriber count.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("attempted to remove a subscriber when there are none")]
    NoSubscribers,

    #[error("observer is not subscribed to this sensor")]
    NotSubscribed,
}

/// Ordered list of observers; notification order is subscription order.
#[derive(Debug, Clone)]
pub struct Subscribers<T: Copy + PartialEq> {
    observers: SmallVec<[T; 4]>,
}

impl<T: Copy + PartialEq> Default for Subscribers<T> {
    fn default() -> Self {
        Self {
            observers: SmallVec::new(),
        }
    }
}

impl<T: Copy + PartialEq> Subscribers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: T) {
        self.observers.push(observer);
    }

    /// Remove the most recent registration of `observer`.
    pub fn unsubscribe(&mut self, observer: T) -> Result<(), SubscriptionError> {
        if self.observers.is_empty() {
            return Err(SubscriptionError::NoSubscribers);
        }
        let index = self
            .observers
            .iter()
            .rposition(|o| *o == observer)
            .ok_or(SubscriptionError::NotSubscribed)?;
        self.observers.remove(index);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.observers.len()
    }

    pub fn contains(&self, observer: T) -> bool {
        self.observers.contains(&observer)
    }

    /// Copy of the current observers, safe to iterate while the owner mutates.
    pub fn snapshot(&self) -> SmallVec<[T; 4]> {
        self.observers.clone()
    }
}
