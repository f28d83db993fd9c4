//! Single-shot result hand-off between the coordinator and the caller
//!
//! A [`Completer`] is consumed by `complete`, so a result can be sent at
//! most once. Dropping a completer that never completed resolves its
//! [`Pending`] with [`EnclaveError::Shutdown`], so callers never hang on a
//! request the coordinator abandoned.

use std::fmt;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::error::{EnclaveError, EnclaveResult};

/// Creates a connected completer / pending pair.
pub(crate) fn channel<T>() -> (Completer<T>, Pending<T>) {
    let (tx, rx) = bounded(1);
    (
        Completer { tx: Some(tx) },
        Pending {
            rx,
            taken: false,
        },
    )
}

/// Sending half, owned by whoever will produce the result
pub(crate) struct Completer<T> {
    tx: Option<Sender<EnclaveResult<T>>>,
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: EnclaveResult<T>) {
        if let Some(tx) = self.tx.take() {
            // the caller may have dropped its Pending; nothing to deliver to
            let _ = tx.send(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(EnclaveError::Shutdown));
        }
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("completed", &self.tx.is_none())
            .finish()
    }
}

/// Result of a caller-facing operation, resolved exactly once
///
/// Obtained from every [`SecureEnclave`](crate::SecureEnclave) operation.
/// Block with [`wait`](Self::wait), bound the wait with
/// [`wait_timeout`](Self::wait_timeout), or poll with
/// [`try_take`](Self::try_take).
#[must_use = "the operation's result is only observable through Pending"]
pub struct Pending<T> {
    rx: Receiver<EnclaveResult<T>>,
    taken: bool,
}

impl<T> Pending<T> {
    /// An already-resolved result
    pub fn ready(result: EnclaveResult<T>) -> Self {
        let (completer, pending) = channel();
        completer.complete(result);
        pending
    }

    /// Block until the result is available.
    pub fn wait(self) -> EnclaveResult<T> {
        if self.taken {
            return Err(EnclaveError::Shutdown);
        }
        self.rx.recv().unwrap_or(Err(EnclaveError::Shutdown))
    }

    /// Block for at most `timeout`; gives `self` back if nothing arrived.
    pub fn wait_timeout(self, timeout: Duration) -> Result<EnclaveResult<T>, Self> {
        if self.taken {
            return Ok(Err(EnclaveError::Shutdown));
        }
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(EnclaveError::Shutdown)),
        }
    }

    /// Take the result if it has arrived.
    ///
    /// Returns `Some` at most once; later calls return `None`.
    pub fn try_take(&mut self) -> Option<EnclaveResult<T>> {
        if self.taken {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(EnclaveError::Shutdown),
        };
        self.taken = true;
        Some(result)
    }
}

impl<T> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("ready", &(!self.rx.is_empty()))
            .field("taken", &self.taken)
            .finish()
    }
}
