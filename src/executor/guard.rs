//! Reentrancy exclusion for `executeFromExecutor` and the per-thread
//! transaction lock that serializes module entry points

use super::{ExecutorError, ExecutorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::{self, ThreadId};

/// Serializes module entry points across threads.
///
/// The thread holding the lock may enter again (a forwarded call re-entering
/// the module runs on the caller's thread); any other thread waits until the
/// outermost guard is dropped.
#[derive(Debug, Default)]
pub struct TransactionLock {
    owner: Mutex<Option<Owner>>,
    released: Condvar,
}

#[derive(Debug, Clone, Copy)]
struct Owner {
    thread: ThreadId,
    depth: usize,
}

impl TransactionLock {
    pub const fn new() -> Self {
        Self {
            owner: Mutex::new(None),
            released: Condvar::new(),
        }
    }

    /// Block until no other thread holds the lock, then take or deepen it
    pub fn enter(&self) -> TransactionGuard<'_> {
        let me = thread::current().id();
        let owner = self.owner.lock().unwrap_or_else(|e| e.into_inner());
        let mut owner = self
            .released
            .wait_while(owner, |owner| owner.is_some_and(|o| o.thread != me))
            .unwrap_or_else(|e| e.into_inner());
        let depth = owner.map_or(0, |o| o.depth);
        *owner = Some(Owner {
            thread: me,
            depth: depth + 1,
        });
        TransactionGuard { lock: self }
    }

    /// True if the current thread holds the lock
    pub fn is_held_by_current_thread(&self) -> bool {
        let me = thread::current().id();
        self.owner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some_and(|o| o.thread == me)
    }
}

/// Leave one level of the transaction on drop
#[derive(Debug)]
pub struct TransactionGuard<'a> {
    lock: &'a TransactionLock,
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        let mut owner = self.lock.owner.lock().unwrap_or_else(|e| e.into_inner());
        match owner.as_mut() {
            Some(o) if o.depth > 1 => o.depth -= 1,
            _ => {
                *owner = None;
                self.lock.released.notify_all();
            }
        }
    }
}

/// Module-wide "entered" flag.
///
/// Entry points hold the `TransactionLock` first, so a closed gate always
/// means a re-entry from the forwarded call on the same thread.
#[derive(Debug, Default)]
pub struct ReentrancyLock {
    entered: AtomicBool,
}

impl ReentrancyLock {
    pub const fn new() -> Self {
        Self {
            entered: AtomicBool::new(false),
        }
    }

    /// Close the gate, or fail with `ReentrantCall` if it is already closed.
    ///
    /// The gate reopens when the returned guard is dropped, on success and
    /// on every error path.
    pub fn enter(&self) -> ExecutorResult<ReentrancyGuard<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExecutorError::ReentrantCall)?;
        Ok(ReentrancyGuard { lock: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Open gate on drop
#[derive(Debug)]
pub struct ReentrancyGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.lock.entered.store(false, Ordering::Release);
    }
}
