use core::sync::atomic::Ordering::Relaxed;

use crate::error::SyncResult;
use crate::sys::futex::{self, Futex};
use crate::sys::mutex::Mutex;
use crate::sys::timespec::Timespec;

/// A futex based condition variable, used by the event backend.
pub struct Condvar {
    // The value of this atomic is simply incremented on every notification.
    // This is used by `.wait()` to not miss any notifications after
    // unlocking the mutex and before waiting for notifications.
    futex: Futex,
}

impl Condvar {
    #[inline]
    pub const fn new() -> Self {
        Self { futex: Futex::new(0) }
    }

    // All the memory orderings here are `Relaxed`,
    // because synchronization is done by unlocking and locking the mutex.

    pub fn notify_one(&self) -> SyncResult<()> {
        self.futex.fetch_add(1, Relaxed);
        futex::futex_wake(&self.futex).map(|_| ())
    }

    pub fn notify_all(&self) -> SyncResult<()> {
        self.futex.fetch_add(1, Relaxed);
        futex::futex_wake_all(&self.futex)
    }

    /// Atomically releases `mutex` and waits for a notification or `deadline`.
    ///
    /// Returns `Ok(false)` if the deadline passed. The mutex is re-acquired before
    /// returning, also when the wait itself failed, unless re-acquiring it is what
    /// failed.
    ///
    /// # Safety
    ///
    /// `mutex` must be locked by the current thread.
    pub unsafe fn wait_until(&self, mutex: &Mutex, deadline: Option<Timespec>) -> SyncResult<bool> {
        // Examine the notification counter _before_ we unlock the mutex.
        let futex_value = self.futex.load(Relaxed);

        // Unlock the mutex before going to sleep.
        mutex.unlock()?;

        // Wait, but only if there hasn't been any
        // notification since we unlocked the mutex.
        let r = futex::futex_wait_until(&self.futex, futex_value, deadline);

        // Lock the mutex again.
        mutex.lock()?;

        r
    }
}
