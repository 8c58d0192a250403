//! Cancellation for in-flight reads.

use std::sync::Arc;

use tokio::sync::watch;

/// Cancellable context handed to every read.
///
/// Cloning is cheap; all clones observe the same cancellation.
#[derive(Clone, Debug)]
pub struct ReadContext {
    cancelled: watch::Receiver<bool>,
}

/// Cancels the [`ReadContext`] it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadContext {
    pub fn new() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self { cancelled: rx },
            CancelHandle { tx: Arc::new(tx) },
        )
    }

    /// A context nobody can cancel.
    pub fn background() -> Self {
        let (_, rx) = watch::channel(false);
        Self { cancelled: rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the context is cancelled; never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender gone without cancelling: nothing can cancel us any more.
            std::future::pending::<()>().await;
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}
