//! Shared RX state and the hardware-facing delivery handle.
//!
//! The port core owns an [`RxShared`]; the hardware collaborator only ever
//! sees the write-only [`RxHandle`] it is given at attach time. Delivery
//! appends into the [`StreamBuffer`] and wakes the consumer; it never blocks,
//! even when the buffer is full.

use crate::buffer::StreamBuffer;
use crate::deadline::Deadline;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::trace;

/// RX state shared between the consumer side and the delivery handle.
#[derive(Debug)]
pub(crate) struct RxShared {
    pub(crate) buffer: Mutex<StreamBuffer>,
    notify: Notify,
}

impl RxShared {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            buffer: Mutex::new(StreamBuffer::new(capacity)),
            notify: Notify::new(),
        })
    }

    /// Suspend until at least one byte is pending or the deadline expires.
    /// Returns whether data is pending. The lock is never held across an
    /// await.
    pub(crate) async fn wait_for_data(&self, deadline: &Deadline) -> bool {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a delivery racing with the check
            // cannot be missed.
            notified.as_mut().enable();
            if !self.buffer.lock().is_empty() {
                return true;
            }
            match deadline {
                Deadline::Never => notified.await,
                Deadline::At(at) => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep_until(*at) => {
                            return !self.buffer.lock().is_empty();
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn deliver(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let evicted = self.buffer.lock().append(bytes);
        if evicted > 0 {
            trace!(evicted, "rx buffer overflow, oldest bytes dropped");
        }
        self.notify.notify_waiters();
    }
}

/// Write-only handle the hardware layer uses to push received bytes into the
/// stream buffer. Cloneable; dropping it does not tear anything down.
#[derive(Debug, Clone)]
pub struct RxHandle {
    shared: Arc<RxShared>,
}

impl RxHandle {
    pub(crate) fn new(shared: Arc<RxShared>) -> Self {
        Self { shared }
    }

    /// Push received bytes into the stream buffer and wake the consumer.
    /// Never blocks; on overflow the oldest unread bytes are evicted.
    pub fn deliver(&self, bytes: &[u8]) {
        self.shared.deliver(bytes);
    }
}
