use parking_lot::{Condvar, Mutex};

/// A one-shot countdown latch: `wait` returns once `count_down` has been
/// called as many times as the latch was created with.
///
/// The line aggregator uses it to close the shared line queue only after every
/// line source has finished.
#[derive(Debug)]
pub struct CompletionLatch {
    remaining: Mutex<usize>,
    released: Condvar,
}

impl CompletionLatch {
    /// Create a latch expecting `count` completion signals.
    /// A latch created with zero is already released.
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            released: Condvar::new(),
        }
    }

    /// Record one completion signal. Extra signals past zero are ignored.
    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return;
        }
        *remaining -= 1;
        if *remaining == 0 {
            self.released.notify_all();
        }
    }

    /// Block until all expected signals have arrived
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.released.wait(&mut remaining);
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock()
    }

    /// Hand out a guard that signals completion when dropped.
    pub fn guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { latch: self }
    }
}

/// Signals its latch exactly once, on drop.
///
/// Owning one of these is how a producer promises to report completion on
/// every exit path: normal return, early error return, or unwinding.
#[derive(Debug)]
#[must_use = "dropping the guard immediately signals completion"]
pub struct CompletionGuard<'a> {
    latch: &'a CompletionLatch,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
