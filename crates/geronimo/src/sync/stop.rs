use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Stop conditions shared by the workers of one run.
///
/// `shutdown` is the caller's flag (Ctrl+C). `cancel` is owned by the run and
/// set when its deadline expires; waiters on [`StopSignal::cancelled_wait`]
/// are woken at that point.
#[derive(Debug, Clone, Default)]
pub(crate) struct StopSignal {
    shutdown: Option<Arc<AtomicBool>>,
    cancel: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopSignal {
    pub(crate) fn new(shutdown: Option<Arc<AtomicBool>>) -> Self {
        Self {
            shutdown,
            cancel: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|f| f.load(Ordering::Relaxed))
    }

    pub(crate) fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.cancelled() || self.shutdown_requested()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub(crate) async fn cancelled_wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.cancel.load(Ordering::Acquire) {
            return;
        }
        notified.await;
    }
}
