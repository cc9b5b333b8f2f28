use core::time::Duration;
use nc::timespec_t;

use crate::error::{SyncError, SyncResult};

const NSEC_PER_SEC: u64 = 1_000_000_000;

/// An absolute point in time on one of the kernel clocks, used as a futex deadline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct Timespec {
    tv_sec: i64,
    tv_nsec: u32,
}

impl Timespec {
    /// The latest representable deadline.
    pub const MAX: Timespec = Timespec { tv_sec: i64::MAX, tv_nsec: (NSEC_PER_SEC - 1) as u32 };

    pub const fn new(tv_sec: i64, tv_nsec: i64) -> Timespec {
        if tv_nsec >= 0 && tv_nsec < NSEC_PER_SEC as i64 {
            Timespec { tv_sec, tv_nsec: tv_nsec as u32 }
        } else {
            panic!("invalid timestamp");
        }
    }

    #[track_caller]
    pub fn now(clock: nc::clockid_t) -> SyncResult<Timespec> {
        use core::mem::MaybeUninit;

        let mut t: MaybeUninit<timespec_t> = MaybeUninit::uninit();
        unsafe { nc::clock_gettime(clock, &mut *t.as_mut_ptr()) }
            .map_err(|errno| SyncError::os(errno, "clock_gettime() failed"))?;
        let t = unsafe { t.assume_init() };
        Ok(Timespec::new(t.tv_sec as i64, t.tv_nsec as i64))
    }

    pub fn checked_add_duration(&self, other: &Duration) -> Option<Timespec> {
        let mut secs = self.tv_sec.checked_add_unsigned(other.as_secs())?;

        // Nano calculations can't overflow because nanos are <1B which fit
        // in a u32.
        let mut nsec = other.subsec_nanos() + self.tv_nsec;
        if nsec >= NSEC_PER_SEC as u32 {
            nsec -= NSEC_PER_SEC as u32;
            secs = secs.checked_add(1)?;
        }
        Some(Timespec { tv_sec: secs, tv_nsec: nsec })
    }

    /// Like [`checked_add_duration`](Self::checked_add_duration), but clamps to
    /// [`Timespec::MAX`] instead of failing on overflow.
    pub fn saturating_add_duration(&self, other: &Duration) -> Timespec {
        self.checked_add_duration(other).unwrap_or(Timespec::MAX)
    }

    /// Converts to the kernel representation. Fails if the seconds do not fit the
    /// target's `time_t`, which callers treat as an unbounded deadline.
    pub fn to_timespec(&self) -> Option<timespec_t> {
        Some(timespec_t {
            tv_sec: self.tv_sec.try_into().ok()?,
            tv_nsec: self.tv_nsec.try_into().ok()?,
        })
    }
}
