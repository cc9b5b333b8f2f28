//! Handle based backend: every primitive is a Win32 kernel object waited on with
//! `WaitForSingleObject`.

mod event;
mod handle;
mod mutex;

pub use event::Event;
pub use mutex::Mutex;
