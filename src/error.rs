//! Errors reported by the synchronization primitives.
//!
//! Every fallible operation in this crate returns a [`SyncResult`]. The error carries
//! an [`ErrorKind`], a short human readable description, the source location where the
//! failure was detected and, for failures of a native call, the OS error code.

use core::fmt;
use core::panic::Location;
use thiserror::Error;

/// Descriptions are capped to this many bytes, the remainder is dropped.
pub const MAX_DESCRIPTION_LEN: usize = 127;

/// The family an [`ErrorKind`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    /// Raised by mutexes and events.
    SyncObject,
    /// Raised by thread lifecycle operations.
    Thread,
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A native call failed. [`SyncError::os_code`] holds the OS error code.
    OsError,
    /// An allocation failed.
    MemoryError,
    /// The call is illegal in the current state, e.g. starting a thread that is
    /// still running.
    ParamError,
    /// The operation is not valid on this object.
    InvalidOperation,
    /// An internal invariant does not hold, e.g. the native object failed to
    /// initialize.
    InternalError,
    /// A synchronization object is in a state that does not allow the operation.
    IllegalObjectState,
    /// A wait was abandoned: the previous owner of the object terminated while
    /// holding it, so the state it protects may be inconsistent.
    WaitCanceled,
    /// A thread lifecycle operation was called out of order, e.g. `join` before
    /// `start`.
    IllegalThreadState,
    /// The thread terminated abnormally and its join was abandoned.
    ThreadCanceled,
}

/// First code used by family specific kinds.
const SUB_CLASS_ERROR: u32 = 32768;

impl ErrorKind {
    /// The numeric code of this kind.
    ///
    /// Family specific kinds share the code space above `32768`, use
    /// [`family`](Self::family) to tell them apart.
    pub const fn code(self) -> u32 {
        match self {
            ErrorKind::OsError => 1,
            ErrorKind::MemoryError => 2,
            ErrorKind::ParamError => 3,
            ErrorKind::InvalidOperation => 4,
            ErrorKind::InternalError => 5,
            ErrorKind::IllegalObjectState | ErrorKind::IllegalThreadState => SUB_CLASS_ERROR,
            ErrorKind::WaitCanceled | ErrorKind::ThreadCanceled => SUB_CLASS_ERROR + 1,
        }
    }

    /// The family this kind belongs to. Generic kinds report
    /// [`ErrorFamily::SyncObject`].
    pub const fn family(self) -> ErrorFamily {
        match self {
            ErrorKind::IllegalThreadState | ErrorKind::ThreadCanceled => ErrorFamily::Thread,
            _ => ErrorFamily::SyncObject,
        }
    }

    /// Returns `true` for the abandoned-wait kinds.
    pub const fn is_canceled(self) -> bool {
        matches!(self, ErrorKind::WaitCanceled | ErrorKind::ThreadCanceled)
    }

    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::OsError => "os error",
            ErrorKind::MemoryError => "memory error",
            ErrorKind::ParamError => "parameter error",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::InternalError => "internal error",
            ErrorKind::IllegalObjectState => "illegal object state",
            ErrorKind::WaitCanceled => "wait canceled",
            ErrorKind::IllegalThreadState => "illegal thread state",
            ErrorKind::ThreadCanceled => "thread canceled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error raised by a mutex, event or thread operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {description}{} at {location}", OsCode(.os_code))]
pub struct SyncError {
    kind: ErrorKind,
    description: String,
    location: &'static Location<'static>,
    os_code: Option<i32>,
}

struct OsCode<'a>(&'a Option<i32>);

impl fmt::Display for OsCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self.0 {
            Some(code) => write!(f, " (os error {code})"),
            None => Ok(()),
        }
    }
}

impl SyncError {
    /// Creates an error of `kind`, tagged with the caller's location.
    #[track_caller]
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> SyncError {
        SyncError {
            kind,
            description: truncate(description.into()),
            location: Location::caller(),
            os_code: None,
        }
    }

    /// Creates an [`ErrorKind::OsError`] carrying the native error `code`.
    #[track_caller]
    pub fn os(code: i32, description: impl Into<String>) -> SyncError {
        SyncError {
            os_code: Some(code),
            ..SyncError::new(ErrorKind::OsError, description)
        }
    }

    /// Creates an [`ErrorKind::OsError`] from an [`std::io::Error`] returned by the
    /// standard library's wrappers around native calls.
    #[track_caller]
    pub(crate) fn from_io(err: &std::io::Error, description: &str) -> SyncError {
        match err.raw_os_error() {
            Some(code) => SyncError::os(code, description),
            None => SyncError::new(ErrorKind::OsError, format!("{description}: {err}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Where the failure was detected.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// The native error code, for [`ErrorKind::OsError`].
    pub fn os_code(&self) -> Option<i32> {
        self.os_code
    }
}

/// The result of a synchronization operation.
pub type SyncResult<T> = Result<T, SyncError>;

fn truncate(mut description: String) -> String {
    if description.len() > MAX_DESCRIPTION_LEN {
        let mut end = MAX_DESCRIPTION_LEN;
        while !description.is_char_boundary(end) {
            end -= 1;
        }
        description.truncate(end);
    }
    description
}
