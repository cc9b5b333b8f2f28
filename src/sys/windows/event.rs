use core::ptr::null;
use windows_sys::Win32::System::Threading::{CreateEventW, PulseEvent, ResetEvent, SetEvent};

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::sync::Timeout;
use crate::sys::windows::handle::{self, Handle, WaitOutcome};

/// A kernel event object.
pub struct Event {
    handle: Handle,
}

impl Event {
    pub fn new(manual_reset: bool) -> Event {
        let raw = unsafe { CreateEventW(null(), i32::from(manual_reset), 0, null()) };
        Event { handle: Handle::new(raw, "event") }
    }

    #[track_caller]
    pub fn timed_wait(&self, timeout: Timeout) -> SyncResult<bool> {
        match self.handle.wait(timeout)? {
            WaitOutcome::Signaled => Ok(true),
            WaitOutcome::TimedOut => Ok(false),
            WaitOutcome::Abandoned => {
                Err(SyncError::new(ErrorKind::WaitCanceled, "wait on event was abandoned"))
            }
        }
    }

    #[track_caller]
    pub fn signal(&self) -> SyncResult<()> {
        let raw = self.handle.get()?;
        handle::check(unsafe { SetEvent(raw) }, "SetEvent()")
    }

    #[track_caller]
    pub fn pulse(&self) -> SyncResult<()> {
        let raw = self.handle.get()?;
        handle::check(unsafe { PulseEvent(raw) }, "PulseEvent()")
    }

    #[track_caller]
    pub fn reset(&self) -> SyncResult<()> {
        let raw = self.handle.get()?;
        handle::check(unsafe { ResetEvent(raw) }, "ResetEvent()")
    }
}
