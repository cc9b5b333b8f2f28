//! Platform backends. Exactly one of them is compiled for a target; both expose a
//! `Mutex` with `{lock, try_lock, unlock}` and an `Event` with
//! `{timed_wait, signal, pulse, reset}`.

#[cfg(target_os = "linux")]
mod condvar;
#[cfg(target_os = "linux")]
mod event;
#[cfg(target_os = "linux")]
mod futex;
#[cfg(target_os = "linux")]
mod mutex;
#[cfg(target_os = "linux")]
pub(crate) mod timespec;

#[cfg(target_os = "linux")]
pub(crate) use event::Event;
#[cfg(target_os = "linux")]
pub(crate) use mutex::Mutex;

#[cfg(windows)]
mod windows;

#[cfg(windows)]
pub(crate) use windows::{Event, Mutex};

pub(crate) mod thread;
