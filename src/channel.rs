//! Single-slot mailbox used for every cross-loop notification
//!
//! A [`Mailbox`] holds at most one value. Sending never blocks: a value that
//! has not been received yet is overwritten, so the receiver always sees the
//! latest one and repeated triggers collapse into a single pending trigger.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Capacity-one, overwrite-on-full channel. Clones share the same slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

/// A wake-up with no payload
pub type Signal = Mailbox<()>;

impl<T> Mailbox<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(None),
                notify: Notify::new(),
            }),
        }
    }

    /// Store `value`, returning the unreceived value it displaced, if any
    pub fn send(&self, value: T) -> Option<T> {
        let displaced = self.inner.slot.lock().replace(value);
        self.inner.notify.notify_one();
        displaced
    }

    /// Take the pending value without waiting
    pub fn try_recv(&self) -> Option<T> {
        self.inner.slot.lock().take()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    /// Wait for a value. Cancel safe: a value is only removed from the slot
    /// in the same poll that returns it.
    pub async fn recv(&self) -> T {
        loop {
            if let Some(value) = self.try_recv() {
                return value;
            }
            self.inner.notify.notified().await;
        }
    }
}

impl Mailbox<()> {
    /// Raise the signal; a signal that is already pending stays a single one
    pub fn notify(&self) {
        self.send(());
    }
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
