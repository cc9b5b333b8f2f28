use core::sync::atomic::AtomicU32;
use syscalls::{syscall, Errno, Sysno};

use crate::error::{SyncError, SyncResult};
use crate::sync::Timeout;
use crate::sys::timespec::Timespec;

/// An atomic for use as a futex, the kernel requires 32 bits.
pub type Futex = AtomicU32;
/// Must be the underlying type of Futex
pub type Primitive = u32;

/// Converts a relative timeout into an absolute `CLOCK_MONOTONIC` deadline.
///
/// Deadlines past the end of the clock saturate at [`Timespec::MAX`].
/// [`Timeout::INFINITE`] has no deadline.
#[track_caller]
pub fn deadline(timeout: Timeout) -> SyncResult<Option<Timespec>> {
    match timeout.as_duration() {
        None => Ok(None),
        Some(d) => Ok(Some(Timespec::now(nc::CLOCK_MONOTONIC)?.saturating_add_duration(&d))),
    }
}

/// Waits for a `futex_wake` operation to wake us, or until `deadline` passes.
///
/// Returns directly if the futex doesn't hold the expected value.
///
/// Returns `Ok(false)` once the deadline has passed and `Ok(true)` when woken (or
/// when the value already changed). Other errors from the kernel are reported as
/// [`OsError`](crate::error::ErrorKind::OsError).
pub fn futex_wait_until(
    futex: &Futex,
    expected: Primitive,
    deadline: Option<Timespec>,
) -> SyncResult<bool> {
    use core::ptr::null;
    use core::sync::atomic::Ordering::Relaxed;

    // A deadline the kernel can't represent is as good as no deadline.
    let timespec = deadline.and_then(|t| t.to_timespec());

    loop {
        // No need to wait if the value already changed.
        if futex.load(Relaxed) != expected {
            return Ok(true);
        }

        #[cfg(feature = "not_process_private")]
        let op = nc::FUTEX_WAIT_BITSET;
        #[cfg(not(feature = "not_process_private"))]
        let op = nc::FUTEX_WAIT_BITSET | nc::FUTEX_PRIVATE_FLAG;
        let r = unsafe {
            // Use FUTEX_WAIT_BITSET rather than FUTEX_WAIT to be able to give an
            // absolute time rather than a relative time.
            syscall!(
                Sysno::futex,
                futex as *const Futex,
                op,
                expected,
                timespec.as_ref().map_or(null(), |t| t as *const nc::timespec_t),
                null::<u32>(), // This argument is unused for FUTEX_WAIT_BITSET.
                !0u32          // A full bitmask, to make it behave like a regular FUTEX_WAIT.
            )
        };

        match r {
            Ok(_) | Err(Errno::EAGAIN) => return Ok(true),
            Err(Errno::ETIMEDOUT) => return Ok(false),
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(SyncError::os(errno.into_raw(), "futex(FUTEX_WAIT_BITSET) failed")),
        }
    }
}

/// Wakes up one thread that's blocked on `futex_wait_until` on this futex.
///
/// Returns true if this actually woke up such a thread,
/// or false if no thread was waiting on this futex.
pub fn futex_wake(futex: &Futex) -> SyncResult<bool> {
    futex_wake_n(futex, 1).map(|woken| woken > 0)
}

/// Wakes up all threads that are waiting on `futex_wait_until` on this futex.
pub fn futex_wake_all(futex: &Futex) -> SyncResult<()> {
    futex_wake_n(futex, i32::MAX).map(|_| ())
}

fn futex_wake_n(futex: &Futex, n: i32) -> SyncResult<usize> {
    let ptr = futex as *const Futex;

    #[cfg(feature = "not_process_private")]
    let op = nc::FUTEX_WAKE;
    #[cfg(not(feature = "not_process_private"))]
    let op = nc::FUTEX_WAKE | nc::FUTEX_PRIVATE_FLAG;
    unsafe { syscall!(Sysno::futex, ptr, op, n) }
        .map_err(|errno| SyncError::os(errno.into_raw(), "futex(FUTEX_WAKE) failed"))
}
