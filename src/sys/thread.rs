//! Native execution contexts, spawned through the platform thread API that
//! `std::thread` wraps (`clone(2)` on Linux, `CreateThread` on Windows).

use std::any::Any;
use std::thread::{Builder, JoinHandle};

use crate::error::{ErrorKind, SyncError, SyncResult};

/// A spawned execution context that has not been joined yet.
pub struct Handle {
    inner: JoinHandle<()>,
}

#[track_caller]
pub fn spawn(name: Option<&str>, body: impl FnOnce() + Send + 'static) -> SyncResult<Handle> {
    let mut builder = Builder::new();
    if let Some(name) = name {
        builder = builder.name(name.to_owned());
    }
    builder
        .spawn(body)
        .map(|inner| Handle { inner })
        .map_err(|err| SyncError::from_io(&err, "spawning thread failed"))
}

/// Blocks until the execution context finishes.
///
/// A context that unwound out of its body is reported as
/// [`ErrorKind::ThreadCanceled`].
#[track_caller]
pub fn join(handle: Handle) -> SyncResult<()> {
    handle.inner.join().map_err(|payload| {
        SyncError::new(
            ErrorKind::ThreadCanceled,
            format!("thread terminated abnormally: {}", panic_message(&*payload)),
        )
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
