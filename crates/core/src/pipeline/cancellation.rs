//! A cooperative cancellation flag shared between a pipeline and its caller.

use crate::error::{CancelKind, Error, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const NONE: u8 = 0;
const ABORT: u8 = 1;
const TIMEOUT: u8 = 2;

/// A cheaply cloneable handle a caller holds onto to cancel an in-flight
/// [`super::Pipeline`] from another thread.
///
/// [`Pipeline::transform`](super::Pipeline::transform) and
/// [`Pipeline::flush`](super::Pipeline::flush) check this at the start of the
/// call, after every emission-budget slice, and again at flush entry; once
/// tripped it stays tripped; there is no "uncancel".
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<AtomicU8>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            state: Arc::new(AtomicU8::new(NONE)),
        }
    }

    /// Requests cancellation via a caller-initiated abort.
    pub fn abort(&self) {
        self.state.store(ABORT, Ordering::SeqCst);
    }

    /// Requests cancellation because a deadline elapsed.
    pub fn timeout(&self) {
        self.state.store(TIMEOUT, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) != NONE
    }

    /// Returns `Err(Error::Cancelled)` with the right sub-kind if cancellation
    /// was requested, `Ok(())` otherwise.
    pub fn check(&self) -> Result<()> {
        match self.state.load(Ordering::SeqCst) {
            NONE => Ok(()),
            ABORT => Err(Error::Cancelled {
                sub_kind: CancelKind::Abort,
            }),
            _ => Err(Error::Cancelled {
                sub_kind: CancelKind::Timeout,
            }),
        }
    }
}
