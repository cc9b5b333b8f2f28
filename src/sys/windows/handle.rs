use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, HANDLE, WAIT_ABANDONED, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows_sys::Win32::System::Threading::{INFINITE, WaitForSingleObject};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::sync::Timeout;

/// What a wait on a kernel object returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled,
    TimedOut,
    /// The owner of a mutex terminated while holding it. The caller now owns it.
    Abandoned,
}

/// An owned kernel object handle. A null handle means creating the object failed,
/// every use then reports [`ErrorKind::InternalError`].
pub struct Handle {
    raw: HANDLE,
    what: &'static str,
}

// Kernel object handles may be used from any thread.
unsafe impl Send for Handle {}
unsafe impl Sync for Handle {}

impl Handle {
    pub fn new(raw: HANDLE, what: &'static str) -> Handle {
        if raw.is_null() {
            tracing::warn!(object = what, os_code = last_error(), "creating kernel object failed");
        }
        Handle { raw, what }
    }

    #[track_caller]
    pub fn get(&self) -> SyncResult<HANDLE> {
        if self.raw.is_null() {
            return Err(SyncError::new(ErrorKind::InternalError, format!("{} handle is null", self.what)));
        }
        Ok(self.raw)
    }

    #[track_caller]
    pub fn wait(&self, timeout: Timeout) -> SyncResult<WaitOutcome> {
        let raw = self.get()?;
        match unsafe { WaitForSingleObject(raw, millis(timeout)) } {
            WAIT_OBJECT_0 => Ok(WaitOutcome::Signaled),
            WAIT_TIMEOUT => Ok(WaitOutcome::TimedOut),
            WAIT_ABANDONED => Ok(WaitOutcome::Abandoned),
            WAIT_FAILED => Err(SyncError::os(last_error(), "WaitForSingleObject() failed")),
            other => Err(SyncError::new(
                ErrorKind::OsError,
                format!("WaitForSingleObject() returned {other:#x}"),
            )),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if !self.raw.is_null() && unsafe { CloseHandle(self.raw) } == 0 {
            tracing::warn!(object = self.what, os_code = last_error(), "CloseHandle() failed");
        }
    }
}

/// Checks the `BOOL` result of a Win32 call.
#[track_caller]
pub fn check(ok: i32, call: &str) -> SyncResult<()> {
    if ok == 0 {
        return Err(SyncError::os(last_error(), format!("{call} failed")));
    }
    Ok(())
}

pub fn last_error() -> i32 {
    unsafe { GetLastError() as i32 }
}

/// Converts a timeout to the millisecond count of the Win32 wait functions.
///
/// Finite timeouts saturate just below `INFINITE`.
pub fn millis(timeout: Timeout) -> u32 {
    match timeout.as_millis() {
        None => INFINITE,
        Some(ms) => u32::try_from(ms).unwrap_or(INFINITE - 1).min(INFINITE - 1),
    }
}
