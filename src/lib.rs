/*!
Portable native synchronization primitives: a [`Mutex`](sync::Mutex), a
manual or auto reset [`Event`](sync::Event) with pulse support, and a
restartable [`Thread`](sync::Thread) wrapper around a [`Runnable`](sync::Runnable).

Every operation reports failures as a [`SyncError`](error::SyncError) that
carries an [`ErrorKind`](error::ErrorKind), a short description and the source
location where it was produced, instead of panicking.

On Linux the primitives are built directly on futex syscalls and never go
through libc. On Windows they wrap the corresponding kernel objects.

# Crate features

* **not_process_private** -
  Linux only. Issues futex operations without `FUTEX_PRIVATE_FLAG`, allowing the
  primitives to be placed in memory shared with other processes.
*/

#![cfg(any(target_os = "linux", windows))]

pub mod error;
pub mod log;
pub mod sync;
mod sys;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, SyncError, SyncResult};
