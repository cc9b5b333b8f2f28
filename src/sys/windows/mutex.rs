use core::ptr::null;
use core::sync::atomic::AtomicU32;
use core::sync::atomic::Ordering::Relaxed;
use windows_sys::Win32::System::Threading::{CreateMutexW, GetCurrentThreadId, ReleaseMutex};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::sync::Timeout;
use crate::sys::windows::handle::{self, Handle, WaitOutcome};

/// No thread has id 0.
const NO_OWNER: u32 = 0;

/// A kernel mutex object.
///
/// Kernel mutexes are recursive, the owner is tracked so that a second acquire
/// from the owning thread is refused instead of handing out a second guard.
pub struct Mutex {
    handle: Handle,
    // Only the owning thread stores its own id here, so a thread reading its own
    // id knows it holds the lock.
    owner: AtomicU32,
}

impl Mutex {
    pub fn new() -> Self {
        let raw = unsafe { CreateMutexW(null(), 0, null()) };
        Self { handle: Handle::new(raw, "mutex"), owner: AtomicU32::new(NO_OWNER) }
    }

    #[track_caller]
    pub fn lock(&self) -> SyncResult<()> {
        if self.held_by_current() {
            return Err(SyncError::new(
                ErrorKind::ParamError,
                "mutex is already locked by the current thread",
            ));
        }
        self.acquire(Timeout::INFINITE).map(|_| ())
    }

    #[track_caller]
    pub fn try_lock(&self) -> SyncResult<bool> {
        self.lock_timeout(Timeout::ZERO)
    }

    /// Acquires the lock, giving up after `timeout`. `Ok(false)` means it is still
    /// held, possibly by the current thread.
    #[track_caller]
    pub fn lock_timeout(&self, timeout: Timeout) -> SyncResult<bool> {
        if self.held_by_current() {
            return Ok(false);
        }
        self.acquire(timeout)
    }

    fn held_by_current(&self) -> bool {
        self.owner.load(Relaxed) == unsafe { GetCurrentThreadId() }
    }

    #[track_caller]
    fn acquire(&self, timeout: Timeout) -> SyncResult<bool> {
        match self.handle.wait(timeout)? {
            WaitOutcome::Signaled => {
                self.owner.store(unsafe { GetCurrentThreadId() }, Relaxed);
                Ok(true)
            }
            WaitOutcome::TimedOut => Ok(false),
            WaitOutcome::Abandoned => {
                // The wait handed us ownership. Give it back so the lock stays
                // usable, the caller learns about the abandonment from the error.
                self.release()?;
                Err(SyncError::new(ErrorKind::WaitCanceled, "mutex was abandoned by its owner"))
            }
        }
    }

    #[track_caller]
    pub fn unlock(&self) -> SyncResult<()> {
        let owned = self.held_by_current();
        if owned {
            self.owner.store(NO_OWNER, Relaxed);
        }
        let result = self.release();
        if owned && result.is_err() {
            self.owner.store(unsafe { GetCurrentThreadId() }, Relaxed);
        }
        result
    }

    #[track_caller]
    fn release(&self) -> SyncResult<()> {
        let raw = self.handle.get()?;
        handle::check(unsafe { ReleaseMutex(raw) }, "ReleaseMutex()")
    }
}
