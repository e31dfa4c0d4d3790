//! # Single-fire unsubscribe acknowledgment signal.
//!
//! The router fires it when an unsubscribe response arrives; the lifecycle
//! controller races its receiver against the wait timer. Firing, taking the
//! receiver and closing each succeed at most once.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

pub(crate) struct AckSignal {
    tx: Mutex<Option<oneshot::Sender<()>>>,
    rx: Mutex<Option<oneshot::Receiver<()>>>,
}

impl AckSignal {
    pub(crate) fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Fires the signal. Returns `false` if it already fired or was closed.
    pub(crate) fn fire(&self) -> bool {
        match lock(&self.tx).take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Hands out the receiving side; `None` after the first call or after close.
    pub(crate) fn take_receiver(&self) -> Option<oneshot::Receiver<()>> {
        lock(&self.rx).take()
    }

    /// Releases both ends. Returns `true` only for the call that released something.
    pub(crate) fn close(&self) -> bool {
        let tx = lock(&self.tx).take();
        let rx = lock(&self.rx).take();
        tx.is_some() || rx.is_some()
    }
}

pub(super) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fires_once() {
        let sig = AckSignal::new();
        let rx = sig.take_receiver().unwrap();
        assert!(sig.take_receiver().is_none());

        assert!(sig.fire());
        assert!(!sig.fire());
        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_close_drops_pending_receiver() {
        let sig = AckSignal::new();
        let rx = sig.take_receiver().unwrap();
        assert!(sig.close());
        assert!(!sig.close());
        assert!(rx.await.is_err());
        assert!(!sig.fire());
    }
}
