//! Root cancellation scope: a cheap, cloneable shutdown signal shared by the store
//! and its background purger thread.
//!
//! An `AtomicBool` flag paired with a channel used to wake a blocked `recv_timeout` —
//! the same shutdown-doorbell idiom a signal handler would use to wake a daemon loop,
//! generalized here into a library-level primitive rather than a daemon-only one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

/// A cancellation scope. Clones share the same underlying flag/doorbell.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    doorbell_tx: Sender<()>,
    doorbell_rx: Receiver<()>,
}

impl CancelToken {
    /// Create a fresh, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (doorbell_tx, doorbell_rx) = bounded(1);
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            doorbell_tx,
            doorbell_rx,
        }
    }

    /// Signal cancellation. Idempotent; wakes any thread parked in `sleep`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Best-effort wake; a full doorbell (already-pending wake) is fine to ignore.
        let _ = self.doorbell_tx.try_send(());
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep up to `dur`, returning early (with `false`) if cancelled in the meantime.
    /// Returns `true` if the full duration elapsed without cancellation.
    pub fn sleep(&self, dur: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        match self.doorbell_rx.recv_timeout(dur) {
            Ok(()) => false,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => !self.is_cancelled(),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
