use crate::error::{ErrorFamily, ErrorKind, SyncError, MAX_DESCRIPTION_LEN};

#[test]
fn codes() {
    assert_eq!(ErrorKind::OsError.code(), 1);
    assert_eq!(ErrorKind::MemoryError.code(), 2);
    assert_eq!(ErrorKind::ParamError.code(), 3);
    assert_eq!(ErrorKind::InvalidOperation.code(), 4);
    assert_eq!(ErrorKind::InternalError.code(), 5);
    assert_eq!(ErrorKind::IllegalObjectState.code(), 32768);
    assert_eq!(ErrorKind::WaitCanceled.code(), 32769);
    assert_eq!(ErrorKind::IllegalThreadState.code(), 32768);
    assert_eq!(ErrorKind::ThreadCanceled.code(), 32769);
}

#[test]
fn families() {
    assert_eq!(ErrorKind::WaitCanceled.family(), ErrorFamily::SyncObject);
    assert_eq!(ErrorKind::ThreadCanceled.family(), ErrorFamily::Thread);
    assert_eq!(ErrorKind::OsError.family(), ErrorFamily::SyncObject);
    assert!(ErrorKind::WaitCanceled.is_canceled());
    assert!(!ErrorKind::IllegalThreadState.is_canceled());
}

#[test]
fn long_description_is_truncated() {
    let err = SyncError::new(ErrorKind::ParamError, "x".repeat(300));
    assert_eq!(err.description().len(), MAX_DESCRIPTION_LEN);

    // 'é' is two bytes, so byte 127 falls inside a character.
    let err = SyncError::new(ErrorKind::ParamError, "é".repeat(100));
    assert_eq!(err.description().len(), 126);
    assert!(err.description().chars().all(|c| c == 'é'));

    let err = SyncError::new(ErrorKind::ParamError, "short");
    assert_eq!(err.description(), "short");
}

#[test]
fn location_is_caller() {
    let line = line!() + 1;
    let err = SyncError::new(ErrorKind::InternalError, "here");
    assert_eq!(err.location().line(), line);
    assert!(err.location().file().ends_with("error.rs"));
}

#[test]
fn display() {
    let err = SyncError::os(22, "futex() failed");
    assert_eq!(err.kind(), ErrorKind::OsError);
    assert_eq!(err.os_code(), Some(22));
    let shown = err.to_string();
    assert!(shown.starts_with("os error: futex() failed (os error 22) at "), "{shown}");

    let err = SyncError::new(ErrorKind::IllegalThreadState, "not started");
    assert_eq!(err.os_code(), None);
    assert!(err.to_string().starts_with("illegal thread state: not started at "));
}

#[test]
fn from_io_keeps_os_code() {
    let io = std::io::Error::from_raw_os_error(12);
    let err = SyncError::from_io(&io, "spawning thread failed");
    assert_eq!(err.kind(), ErrorKind::OsError);
    assert_eq!(err.os_code(), Some(12));

    let io = std::io::Error::other("boom");
    let err = SyncError::from_io(&io, "spawning thread failed");
    assert_eq!(err.os_code(), None);
    assert!(err.description().ends_with("boom"));
}
