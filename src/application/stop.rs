//! Graceful-stop request primitive shared between the recorder and its callers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct StopInner {
    requested: AtomicBool,
    notify: Notify,
}

/// One-way "stop requested" flag with async notification.
///
/// Clones share the same flag. Once requested it stays requested.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop.
    ///
    /// Returns `true` only for the first request.
    pub fn request(&self) -> bool {
        let first = !self.inner.requested.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// Check if a stop was requested
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested
    pub async fn requested(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);

        loop {
            // Register before checking so a concurrent request is not missed
            notified.as_mut().enable();
            if self.is_requested() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }
}
