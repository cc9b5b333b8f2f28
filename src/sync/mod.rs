//! Native synchronization objects.
//!
//! - [`Mutex`]: Mutual Exclusion mechanism, which ensures that at
//!   most one thread at a time is able to access some data. Unlike the
//!   [std equivalent](https://doc.rust-lang.org/std/sync/struct.Mutex.html),
//!   it does not have a poison mechanism, and every operation is fallible.
//!
//! - [`Event`]: A signaled/non-signaled flag threads can block on, either
//!   manual reset (stays signaled until [`reset`](Event::reset)) or auto reset
//!   (cleared by the first waiter it releases), with Win32 style
//!   [`pulse`](Event::pulse).
//!
//! - [`Thread`]: Owns a [`Runnable`] and runs it on a native thread that can be
//!   started, asked to stop and joined, any number of times.
//!
//! Blocking calls take a [`Timeout`].

mod event;
mod mutex;
mod thread;
mod timeout;

pub use event::Event;
pub use event::ResetMode;
pub use mutex::Mutex;
pub use mutex::MutexGuard;
pub use mutex::TryLockError;
pub use mutex::TryLockResult;
pub use thread::Runnable;
pub use thread::Thread;
pub use timeout::Timeout;
