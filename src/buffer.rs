use crossbeam::queue::ArrayQueue;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{fence, AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Shared<T> {
    queue: ArrayQueue<T>,
    closed: AtomicBool,
    // Guards only the check-then-wait of a parked thread.
    lock: Mutex<()>,
    not_empty: Condvar,
    not_full: Condvar,
    waiting_consumers: AtomicUsize,
    waiting_producers: AtomicUsize,
    block_count: AtomicU64,
    pushed: AtomicU64,
}

impl<T> Shared<T> {
    /// Wake one thread parked on `cv` if any thread registered in `waiters`.
    ///
    /// The fence pairs with the one in [`Shared::park_until`]: either the
    /// waiter sees the queue change, or this sees the waiter.
    fn wake(&self, waiters: &AtomicUsize, cv: &Condvar) {
        fence(Ordering::SeqCst);
        if waiters.load(Ordering::SeqCst) > 0 {
            let _guard = self.lock.lock();
            cv.notify_one();
        }
    }

    /// Park on `cv` until `attempt` yields a value.
    fn park_until<R>(
        &self,
        waiters: &AtomicUsize,
        cv: &Condvar,
        mut attempt: impl FnMut() -> Option<R>,
    ) -> R {
        let mut guard = self.lock.lock();
        waiters.fetch_add(1, Ordering::SeqCst);
        fence(Ordering::SeqCst);
        let result = loop {
            if let Some(result) = attempt() {
                break result;
            }
            cv.wait(&mut guard);
        };
        waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A bounded, closable hand-off queue between two pipeline stages, built on
/// crossbeam's lock-free `ArrayQueue`.
///
/// `push` blocks while the queue is full; `pop` blocks while it is empty and
/// still open. Blocked threads are parked, not spinning. Once closed, `pop`
/// drains whatever is left and then returns `None` forever.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Create a new open queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; `PipelineBuilder` rejects that earlier.
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: ArrayQueue::new(capacity),
                closed: AtomicBool::new(false),
                lock: Mutex::new(()),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                waiting_consumers: AtomicUsize::new(0),
                waiting_producers: AtomicUsize::new(0),
                block_count: AtomicU64::new(0),
                pushed: AtomicU64::new(0),
            }),
        }
    }

    /// Push an item, blocking while the queue is full.
    ///
    /// Returns the item back if the queue is (or becomes) closed.
    pub fn push(&self, item: T) -> Result<(), T> {
        if self.is_closed() {
            return Err(item);
        }
        let result = match self.shared.queue.push(item) {
            Ok(()) => Ok(()),
            Err(item) => {
                self.shared.block_count.fetch_add(1, Ordering::Relaxed);
                self.push_blocking(item)
            }
        };
        if result.is_ok() {
            self.shared.pushed.fetch_add(1, Ordering::Relaxed);
            let shared = &self.shared;
            shared.wake(&shared.waiting_consumers, &shared.not_empty);
        }
        result
    }

    fn push_blocking(&self, item: T) -> Result<(), T> {
        let shared = &self.shared;
        let mut pending = Some(item);
        shared.park_until(&shared.waiting_producers, &shared.not_full, || {
            let item = pending.take()?;
            if shared.closed.load(Ordering::SeqCst) {
                return Some(Err(item));
            }
            match shared.queue.push(item) {
                Ok(()) => Some(Ok(())),
                Err(item) => {
                    pending = Some(item);
                    None
                }
            }
        })
    }

    /// Pop the next item, blocking while the queue is empty and open.
    ///
    /// Returns `None` only once the queue is closed and fully drained.
    pub fn pop(&self) -> Option<T> {
        let shared = &self.shared;
        let item = match shared.queue.pop() {
            Some(item) => Some(item),
            None => shared.park_until(&shared.waiting_consumers, &shared.not_empty, || {
                if let Some(item) = shared.queue.pop() {
                    return Some(Some(item));
                }
                if shared.closed.load(Ordering::SeqCst) {
                    // Every push that happened before close is visible here.
                    return Some(shared.queue.pop());
                }
                None
            }),
        };
        if item.is_some() {
            shared.wake(&shared.waiting_producers, &shared.not_full);
        }
        item
    }

    /// Close the queue and release every parked thread. Returns `true` only
    /// for the call that actually closed it.
    pub fn close(&self) -> bool {
        let first = !self.shared.closed.swap(true, Ordering::SeqCst);
        let _guard = self.shared.lock.lock();
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        first
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.queue.capacity()
    }

    /// Number of pushes that found the queue full and had to wait
    pub fn block_count(&self) -> u64 {
        self.shared.block_count.load(Ordering::Relaxed)
    }

    /// Number of items accepted over the queue's lifetime
    pub fn pushed_count(&self) -> u64 {
        self.shared.pushed.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            capacity: self.capacity(),
            pushed: self.pushed_count(),
            blocks: self.block_count(),
        }
    }
}

/// Closes a queue when dropped, so a stage that exits early (or unwinds)
/// never leaves its neighbours waiting.
pub struct CloseOnDrop<'a, T>(pub &'a BoundedQueue<T>);

impl<T> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Lifetime counters of one queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub capacity: usize,
    pub pushed: u64,
    pub blocks: u64,
}
