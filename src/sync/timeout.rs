use core::fmt;
use core::time::Duration;

/// How long a blocking call may wait.
///
/// A timeout is either a finite [`Duration`] or [`Timeout::INFINITE`], which waits
/// until the awaited condition occurs. Timeouts are usually given in whole
/// milliseconds with [`Timeout::from_millis`], but any `Duration` converts into one.
///
/// # Examples
///
/// ```
/// use native_sync::sync::Timeout;
/// use std::time::Duration;
///
/// assert_eq!(Timeout::from_millis(1500), Timeout::from(Duration::from_millis(1500)));
/// assert!(Timeout::INFINITE.is_infinite());
/// assert_eq!(Timeout::from_millis(10).as_duration(), Some(Duration::from_millis(10)));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Timeout(Option<Duration>);

impl Timeout {
    /// Wait indefinitely.
    pub const INFINITE: Timeout = Timeout(None);

    /// Do not wait at all; only poll the current state.
    pub const ZERO: Timeout = Timeout(Some(Duration::ZERO));

    /// A timeout of `millis` milliseconds.
    #[inline]
    pub const fn from_millis(millis: u64) -> Timeout {
        Timeout(Some(Duration::from_millis(millis)))
    }

    #[inline]
    pub const fn is_infinite(&self) -> bool {
        self.0.is_none()
    }

    /// The finite duration of this timeout, or `None` for [`Timeout::INFINITE`].
    #[inline]
    pub const fn as_duration(&self) -> Option<Duration> {
        self.0
    }

    /// The timeout in whole milliseconds, saturating at `u64::MAX`. `None` for
    /// [`Timeout::INFINITE`].
    pub fn as_millis(&self) -> Option<u64> {
        self.0.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Timeout {
        Timeout(Some(d))
    }
}

impl From<Option<Duration>> for Timeout {
    /// `None` maps to [`Timeout::INFINITE`].
    fn from(d: Option<Duration>) -> Timeout {
        Timeout(d)
    }
}

impl Default for Timeout {
    fn default() -> Timeout {
        Timeout::INFINITE
    }
}

impl fmt::Debug for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => f.debug_tuple("Timeout").field(&d).finish(),
            None => f.write_str("Timeout::INFINITE"),
        }
    }
}
