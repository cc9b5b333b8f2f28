mod error;
mod event;
mod mutex;
