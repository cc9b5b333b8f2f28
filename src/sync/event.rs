use core::fmt;

use crate::error::SyncResult;
use crate::sync::Timeout;
use crate::sys;

/// How an [`Event`] returns to the non-signaled state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResetMode {
    /// The event stays signaled until [`Event::reset`] is called.
    Manual,
    /// The first waiter that observes the event clears it.
    Auto,
}

/// A flag threads can block on until another thread signals it.
///
/// # Examples
///
/// ```
/// use native_sync::sync::{Event, ResetMode};
/// use std::sync::Arc;
/// use std::thread;
///
/// let ready = Arc::new(Event::new(ResetMode::Manual));
/// let c_ready = Arc::clone(&ready);
///
/// let waiter = thread::spawn(move || {
///     c_ready.wait().unwrap();
/// });
///
/// ready.signal().unwrap();
/// waiter.join().unwrap();
/// ```
pub struct Event {
    inner: sys::Event,
    mode: ResetMode,
}

impl Event {
    /// Creates a new, non-signaled event.
    pub fn new(mode: ResetMode) -> Event {
        Event { inner: sys::Event::new(mode == ResetMode::Manual), mode }
    }

    pub fn is_manual_reset(&self) -> bool {
        self.mode == ResetMode::Manual
    }

    /// Blocks the current thread until the event is signaled.
    #[track_caller]
    pub fn wait(&self) -> SyncResult<()> {
        self.timed_wait(Timeout::INFINITE).map(drop)
    }

    /// Blocks the current thread until the event is signaled or `timeout` elapses.
    ///
    /// Returns `true` if the event was signaled and `false` if the wait timed out.
    /// For an auto reset event a `true` result also means this call cleared it.
    /// [`Timeout::ZERO`] polls without blocking.
    ///
    /// # Errors
    ///
    /// * [`InternalError`] if the native event failed to initialize.
    /// * [`OsError`] if the native wait failed.
    /// * [`WaitCanceled`] if the native wait was abandoned.
    ///
    /// [`InternalError`]: crate::error::ErrorKind::InternalError
    /// [`OsError`]: crate::error::ErrorKind::OsError
    /// [`WaitCanceled`]: crate::error::ErrorKind::WaitCanceled
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::{Event, ResetMode, Timeout};
    ///
    /// let event = Event::new(ResetMode::Auto);
    /// assert!(!event.timed_wait(Timeout::from_millis(10)).unwrap());
    ///
    /// event.signal().unwrap();
    /// assert!(event.timed_wait(Timeout::ZERO).unwrap());
    /// assert!(!event.timed_wait(Timeout::ZERO).unwrap());
    /// ```
    #[track_caller]
    pub fn timed_wait(&self, timeout: impl Into<Timeout>) -> SyncResult<bool> {
        self.inner.timed_wait(timeout.into())
    }

    /// Puts the event into the signaled state.
    ///
    /// A manual reset event releases every waiter, current and future, until it is
    /// reset. An auto reset event releases exactly one.
    #[track_caller]
    pub fn signal(&self) -> SyncResult<()> {
        self.inner.signal()
    }

    /// Releases the threads waiting right now and leaves the event non-signaled.
    ///
    /// A manual reset event releases all of them, an auto reset event at most one.
    /// A pulse with no waiters is lost.
    ///
    /// A thread that is about to wait but has not blocked yet misses the pulse, so
    /// this cannot be used reliably to hand off work. Prefer [`signal`](Self::signal).
    #[track_caller]
    pub fn pulse(&self) -> SyncResult<()> {
        tracing::trace!(manual_reset = self.is_manual_reset(), "pulsing event");
        self.inner.pulse()
    }

    /// Puts the event into the non-signaled state.
    #[track_caller]
    pub fn reset(&self) -> SyncResult<()> {
        self.inner.reset()
    }

    #[cfg(all(test, target_os = "linux"))]
    pub(crate) fn waiters(&self) -> usize {
        self.inner.waiters()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event").field("mode", &self.mode).finish_non_exhaustive()
    }
}
