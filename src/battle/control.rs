//! Pause and cancellation signals shared between a battle and whoever drives it.
//!
//! A `BattleControl` is a cloneable handle. The runner polls it at every
//! checkpoint, and blocking selectors select on its cancellation channel so a
//! cancel request wakes them immediately.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Returned by a checkpoint once the run has been canceled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

#[derive(Debug)]
struct ControlInner {
    canceled: AtomicBool,
    paused: Mutex<bool>,
    wake: Condvar,
    // Dropping the sender disconnects `cancel_signal`, which wakes every select on it.
    cancel_guard: Mutex<Option<Sender<()>>>,
    cancel_signal: Receiver<()>,
    poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct BattleControl {
    inner: Arc<ControlInner>,
}

impl Default for BattleControl {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

impl BattleControl {
    pub fn new(poll_interval: Duration) -> Self {
        let (guard, signal) = bounded(0);
        Self {
            inner: Arc::new(ControlInner {
                canceled: AtomicBool::new(false),
                paused: Mutex::new(false),
                wake: Condvar::new(),
                cancel_guard: Mutex::new(Some(guard)),
                cancel_signal: signal,
                poll_interval,
            }),
        }
    }

    pub fn pause(&self) {
        *self.inner.paused.lock() = true;
    }

    pub fn resume(&self) {
        *self.inner.paused.lock() = false;
        self.inner.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.inner.paused.lock()
    }

    /// Request cancellation. Honored at the next checkpoint; wakes paused
    /// waits and blocked selectors.
    pub fn cancel(&self) {
        self.inner.canceled.store(true, Ordering::SeqCst);
        self.inner.cancel_guard.lock().take();
        let _paused = self.inner.paused.lock();
        self.inner.wake.notify_all();
    }

    pub fn is_canceled(&self) -> bool {
        self.inner.canceled.load(Ordering::SeqCst)
    }

    /// A receiver that never yields a message and disconnects on cancel.
    /// Meant for `crossbeam_channel::select!` next to a blocking receive.
    pub fn cancellation(&self) -> Receiver<()> {
        self.inner.cancel_signal.clone()
    }

    /// Block while paused, then report whether the run may continue.
    pub fn checkpoint(&self) -> Result<(), Canceled> {
        let mut paused = self.inner.paused.lock();
        while *paused && !self.is_canceled() {
            self.inner
                .wake
                .wait_for(&mut paused, self.inner.poll_interval);
        }
        drop(paused);

        if self.is_canceled() {
            Err(Canceled)
        } else {
            Ok(())
        }
    }
}
