//! Event backend built from a lock, a condition variable and a small state record.

use core::cell::UnsafeCell;

use crate::error::SyncResult;
use crate::sync::Timeout;
use crate::sys::condvar::Condvar;
use crate::sys::futex;
use crate::sys::mutex::Mutex;

struct State {
    signaled: bool,
    /// Threads currently blocked in `timed_wait`.
    waiters: usize,
    /// Bumped by every pulse that found waiters. A waiter that entered before the
    /// latest pulse sees a different value than the one it recorded.
    pulse_epoch: u64,
    /// How many of the waiters blocked at the time of a pulse may still be released
    /// by it. Never exceeds `waiters`.
    pulse_releases: usize,
}

pub struct Event {
    lock: Mutex,
    cond: Condvar,
    manual_reset: bool,
    state: UnsafeCell<State>,
}

// `state` is only touched with `lock` held.
unsafe impl Send for Event {}
unsafe impl Sync for Event {}

impl Event {
    pub fn new(manual_reset: bool) -> Event {
        Event {
            lock: Mutex::new(),
            cond: Condvar::new(),
            manual_reset,
            state: UnsafeCell::new(State {
                signaled: false,
                waiters: 0,
                pulse_epoch: 0,
                pulse_releases: 0,
            }),
        }
    }

    /// Runs `f` on the state with the internal lock held.
    fn locked<R>(&self, f: impl FnOnce(&mut State) -> SyncResult<R>) -> SyncResult<R> {
        self.lock.lock()?;
        let r = f(unsafe { &mut *self.state.get() });
        self.lock.unlock()?;
        r
    }

    #[track_caller]
    pub fn timed_wait(&self, timeout: Timeout) -> SyncResult<bool> {
        let deadline = futex::deadline(timeout)?;

        self.lock.lock()?;
        let state = self.state.get();

        // Fast path: already signaled.
        if unsafe { (*state).signaled } {
            if !self.manual_reset {
                unsafe { (*state).signaled = false };
            }
            self.lock.unlock()?;
            return Ok(true);
        }

        if timeout == Timeout::ZERO {
            self.lock.unlock()?;
            return Ok(false);
        }

        let epoch = unsafe {
            (*state).waiters += 1;
            (*state).pulse_epoch
        };

        let outcome = loop {
            let timed_out = match unsafe { self.cond.wait_until(&self.lock, deadline) } {
                Ok(woken) => !woken,
                Err(err) => break Err(err),
            };

            let s = unsafe { &mut *state };

            // A pulse that arrived while we were blocked releases us even though
            // the event is no longer signaled.
            if s.pulse_epoch != epoch && s.pulse_releases > 0 {
                s.pulse_releases -= 1;
                // A signal's single wakeup may have landed on us, hand it on.
                if s.signaled && !self.manual_reset {
                    if let Err(err) = self.cond.notify_one() {
                        break Err(err);
                    }
                }
                break Ok(true);
            }

            if s.signaled {
                if !self.manual_reset {
                    s.signaled = false;
                }
                break Ok(true);
            }

            if timed_out {
                break Ok(false);
            }
        };

        let s = unsafe { &mut *state };
        s.waiters -= 1;
        s.pulse_releases = s.pulse_releases.min(s.waiters);

        self.lock.unlock()?;
        outcome
    }

    pub fn signal(&self) -> SyncResult<()> {
        self.locked(|state| {
            state.signaled = true;
            if self.manual_reset {
                self.cond.notify_all()
            } else {
                self.cond.notify_one()
            }
        })
    }

    /// Releases the threads that are blocked right now (all of them for a manual
    /// reset event, at most one otherwise) and leaves the event cleared.
    pub fn pulse(&self) -> SyncResult<()> {
        self.locked(|state| {
            state.signaled = false;
            if state.waiters == 0 {
                return Ok(());
            }

            let released = if self.manual_reset { state.waiters } else { 1 };
            state.pulse_epoch = state.pulse_epoch.wrapping_add(1);
            state.pulse_releases = (state.pulse_releases + released).min(state.waiters);

            // Waiters that are not eligible, or lose the race for an auto reset
            // pulse, simply go back to sleep.
            self.cond.notify_all()
        })
    }

    pub fn reset(&self) -> SyncResult<()> {
        self.locked(|state| {
            state.signaled = false;
            Ok(())
        })
    }

    #[cfg(test)]
    pub fn waiters(&self) -> usize {
        self.locked(|state| Ok(state.waiters)).unwrap_or(0)
    }
}
