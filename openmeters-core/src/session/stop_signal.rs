use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Manual-reset stop event shared between the controller and the capture thread.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and wake any waiter. Stays set until [`reset`](Self::reset).
    pub fn signal(&self) {
        *self.stopped.lock() = true;
        self.cond.notify_all();
    }

    pub fn reset(&self) {
        *self.stopped.lock() = false;
    }

    pub fn is_signaled(&self) -> bool {
        *self.stopped.lock()
    }

    /// Wait up to `timeout` for the signal. Returns true if it is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.cond.wait_for(&mut stopped, timeout);
        }
        *stopped
    }
}
