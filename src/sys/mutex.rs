use core::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use syscalls::Errno;

use crate::error::{SyncError, SyncResult};
use crate::sync::Timeout;
use crate::sys::futex::{self, Futex, Primitive};
use crate::sys::timespec::Timespec;

/// A futex based exclusive lock.
pub struct Mutex {
    futex: Futex,
}

const UNLOCKED: Primitive = 0;
const LOCKED: Primitive = 1; // locked, no other threads waiting
const CONTENDED: Primitive = 2; // locked, and other threads waiting (contended)

impl Mutex {
    #[inline]
    pub const fn new() -> Self {
        Self { futex: Futex::new(UNLOCKED) }
    }

    /// Attempts to acquire the lock without blocking. `Ok(false)` means it is held
    /// by someone else.
    #[inline]
    pub fn try_lock(&self) -> SyncResult<bool> {
        Ok(self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed).is_ok())
    }

    #[inline]
    #[track_caller]
    pub fn lock(&self) -> SyncResult<()> {
        if self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed).is_err() {
            self.lock_contended(None)?;
        }
        Ok(())
    }

    /// Acquires the lock, giving up after `timeout`. `Ok(false)` means it is still
    /// held by someone else.
    #[track_caller]
    pub fn lock_timeout(&self, timeout: Timeout) -> SyncResult<bool> {
        if self.try_lock()? {
            return Ok(true);
        }
        self.lock_contended(futex::deadline(timeout)?)
    }

    /// Returns `Ok(false)` if `deadline` passed before the lock was acquired.
    #[cold]
    #[track_caller]
    fn lock_contended(&self, deadline: Option<Timespec>) -> SyncResult<bool> {
        // Spin first to speed things up if the lock is released quickly.
        let mut state = self.spin();

        // If it's unlocked now, attempt to take the lock
        // without marking it as contended.
        if state == UNLOCKED {
            match self.futex.compare_exchange(UNLOCKED, LOCKED, Acquire, Relaxed) {
                Ok(_) => return Ok(true), // Locked!
                Err(s) => state = s,
            }
        }

        loop {
            // Put the lock in contended state.
            // We avoid an unnecessary write if it as already set to CONTENDED,
            // to be friendlier for the caches.
            if state != CONTENDED && self.futex.swap(CONTENDED, Acquire) == UNLOCKED {
                // We changed it from UNLOCKED to CONTENDED, so we just successfully locked it.
                return Ok(true);
            }

            // Wait for the futex to change state, assuming it is still CONTENDED.
            if !futex::futex_wait_until(&self.futex, CONTENDED, deadline)? {
                // Out of time. Leaving it CONTENDED only costs the owner a spurious wake.
                return Ok(false);
            }

            // Spin again after waking up.
            state = self.spin();
        }
    }

    fn spin(&self) -> Primitive {
        let mut spin = 100;
        loop {
            // We only use `load` (and not `swap` or `compare_exchange`)
            // while spinning, to be easier on the caches.
            let state = self.futex.load(Relaxed);

            // We stop spinning when the mutex is UNLOCKED,
            // but also when it's CONTENDED.
            if state != LOCKED || spin == 0 {
                return state;
            }

            core::hint::spin_loop();
            spin -= 1;
        }
    }

    /// Releases the lock.
    ///
    /// Releasing a lock that is not held fails with `EPERM`. Releasing a lock held
    /// by another thread is not detected.
    #[inline]
    #[track_caller]
    pub fn unlock(&self) -> SyncResult<()> {
        match self.futex.swap(UNLOCKED, Release) {
            UNLOCKED => Err(SyncError::os(Errno::EPERM.into_raw(), "unlock of a mutex that is not locked")),
            CONTENDED => {
                // We only wake up one thread. When that thread locks the mutex, it
                // will mark the mutex as CONTENDED (see lock_contended above),
                // which makes sure that any other waiting threads will also be
                // woken up eventually.
                futex::futex_wake(&self.futex).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}
