use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{ErrorKind, SyncError, SyncResult};
use crate::sync::{Event, Mutex, ResetMode, Timeout};
use crate::sys;

/// The body of a [`Thread`].
///
/// `run` executes on the spawned native thread. `stop` is called from whichever
/// thread calls [`Thread::signal_stop`] while `run` is still executing, and should
/// make `run` return soon. Nothing forces `run` to return.
pub trait Runnable: Send + Sync + 'static {
    fn run(&self);

    fn stop(&self);
}

/// Completion record of a single run.
struct Completion {
    /// Signaled once `run` has returned or unwound.
    finished: Event,
    /// Signaled once the native thread has been joined and `outcome` is final.
    joined: Event,
    outcome: Mutex<Option<SyncError>>,
}

impl Completion {
    fn new() -> Completion {
        Completion {
            finished: Event::new(ResetMode::Manual),
            joined: Event::new(ResetMode::Manual),
            outcome: Mutex::new(None),
        }
    }

    #[track_caller]
    fn is_finished(&self) -> SyncResult<bool> {
        self.finished.timed_wait(Timeout::ZERO)
    }

    /// Publishes the result of joining the native thread to every other joiner.
    fn publish(&self, result: &SyncResult<()>) {
        if let Err(err) = result {
            match self.outcome.lock() {
                Ok(mut outcome) => *outcome = Some(err.clone()),
                Err(lock_err) => tracing::warn!(err = %lock_err, "recording join outcome failed"),
            }
        }
        if let Err(err) = self.joined.signal() {
            tracing::warn!(%err, "waking concurrent joiners failed");
        }
    }

    #[track_caller]
    fn outcome(&self) -> SyncResult<()> {
        self.joined.wait()?;
        match self.outcome.lock()?.as_ref() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Clears `alive` and signals `finished` when the run body returns or unwinds.
struct FinishOnDrop {
    completion: Arc<Completion>,
    alive: Arc<AtomicBool>,
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        // Cleared before `finished` so a restart observing `finished` cannot have
        // its own `alive` flag overwritten.
        self.alive.store(false, Ordering::Release);
        if let Err(err) = self.completion.finished.signal() {
            tracing::warn!(%err, "marking thread run as finished failed");
        }
    }
}

#[derive(Default)]
struct Lifecycle {
    /// The latest run. `None` until the first successful `start`.
    current: Option<Arc<Completion>>,
    /// Native handle of the latest run, until some caller joins it.
    handle: Option<sys::thread::Handle>,
}

/// A restartable native thread running a [`Runnable`].
///
/// Lifecycle calls are serialized by an internal [`Mutex`], which is never held
/// while the runnable executes or while [`join`](Self::join) blocks.
///
/// Dropping a started `Thread` joins it.
///
/// # Examples
///
/// ```
/// use native_sync::sync::{Event, ResetMode, Runnable, Thread};
///
/// struct Worker {
///     quit: Event,
/// }
///
/// impl Runnable for Worker {
///     fn run(&self) {
///         self.quit.wait().unwrap();
///     }
///
///     fn stop(&self) {
///         self.quit.signal().unwrap();
///     }
/// }
///
/// let thread = Thread::named("worker", Worker { quit: Event::new(ResetMode::Manual) });
/// thread.start().unwrap();
/// assert!(thread.is_alive());
///
/// thread.signal_stop().unwrap();
/// thread.join().unwrap();
/// assert!(!thread.is_alive());
/// ```
pub struct Thread<R: Runnable> {
    runnable: Arc<R>,
    name: Option<String>,
    /// Set by `start`, cleared when the run body returns. Read without the
    /// lifecycle lock.
    alive: Arc<AtomicBool>,
    lifecycle: Mutex<Lifecycle>,
}

impl<R: Runnable> Thread<R> {
    pub fn new(runnable: R) -> Thread<R> {
        Thread::with_name(None, runnable)
    }

    /// Like [`new`](Self::new), naming the native thread `name`.
    pub fn named(name: impl Into<String>, runnable: R) -> Thread<R> {
        Thread::with_name(Some(name.into()), runnable)
    }

    fn with_name(name: Option<String>, runnable: R) -> Thread<R> {
        Thread {
            runnable: Arc::new(runnable),
            name,
            alive: Arc::new(AtomicBool::new(false)),
            lifecycle: Mutex::default(),
        }
    }

    pub fn runnable(&self) -> &R {
        &self.runnable
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Spawns a native thread executing [`Runnable::run`].
    ///
    /// A previous run that finished without being joined is joined first, and its
    /// outcome is discarded.
    ///
    /// # Errors
    ///
    /// * [`ParamError`](ErrorKind::ParamError) if the previous run is still executing.
    /// * [`OsError`](ErrorKind::OsError) if the native thread could not be created.
    #[track_caller]
    pub fn start(&self) -> SyncResult<()> {
        let mut lifecycle = self.lifecycle.lock()?;

        if self.is_alive() {
            return Err(SyncError::new(ErrorKind::ParamError, "thread is already running"));
        }
        if let Some(current) = &lifecycle.current {
            // `alive` is cleared right before `finished` is signaled.
            current.finished.wait()?;
        }
        if let Some(handle) = lifecycle.handle.take() {
            let result = sys::thread::join(handle);
            if let Some(current) = &lifecycle.current {
                current.publish(&result);
            }
            if let Err(err) = result {
                tracing::warn!(thread = self.name(), %err, "previous run ended abnormally");
            }
        }

        let completion = Arc::new(Completion::new());
        let runnable = Arc::clone(&self.runnable);
        let finish = FinishOnDrop { completion: Arc::clone(&completion), alive: Arc::clone(&self.alive) };
        // A failed spawn drops `finish`, which clears the flag again.
        self.alive.store(true, Ordering::Release);
        let handle = sys::thread::spawn(self.name(), move || {
            let _finish = finish;
            runnable.run();
        })?;

        lifecycle.current = Some(completion);
        lifecycle.handle = Some(handle);
        tracing::debug!(thread = self.name(), "thread started");
        Ok(())
    }

    /// Asks the running [`Runnable`] to stop by calling [`Runnable::stop`].
    ///
    /// Does nothing if the latest run already finished.
    ///
    /// # Errors
    ///
    /// [`ParamError`](ErrorKind::ParamError) if the thread was never started.
    #[track_caller]
    pub fn signal_stop(&self) -> SyncResult<()> {
        let lifecycle = self.lifecycle.lock()?;
        let Some(current) = &lifecycle.current else {
            return Err(SyncError::new(ErrorKind::ParamError, "thread was never started"));
        };
        if current.is_finished()? {
            return Ok(());
        }
        tracing::debug!(thread = self.name(), "signaling thread to stop");
        self.runnable.stop();
        Ok(())
    }

    /// Blocks until the latest run finishes.
    ///
    /// Any number of threads may join concurrently, and joining a run that was
    /// already joined returns its outcome again without blocking.
    ///
    /// # Errors
    ///
    /// * [`IllegalThreadState`](ErrorKind::IllegalThreadState) if the thread was never
    ///   started.
    /// * [`ThreadCanceled`](ErrorKind::ThreadCanceled) if [`Runnable::run`] panicked.
    #[track_caller]
    pub fn join(&self) -> SyncResult<()> {
        let (completion, handle) = {
            let mut lifecycle = self.lifecycle.lock()?;
            let Some(current) = lifecycle.current.clone() else {
                return Err(SyncError::new(
                    ErrorKind::IllegalThreadState,
                    "join called on a thread that was never started",
                ));
            };
            (current, lifecycle.handle.take())
        };

        match handle {
            Some(handle) => {
                let result = sys::thread::join(handle);
                completion.publish(&result);
                tracing::debug!(thread = self.name(), ok = result.is_ok(), "thread joined");
                result
            }
            None => completion.outcome(),
        }
    }

    /// Whether the latest run is still executing.
    ///
    /// Never blocks, it may be called from [`Runnable::stop`] or while another
    /// thread is inside a lifecycle call.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl<R: Runnable> Drop for Thread<R> {
    fn drop(&mut self) {
        if self.lifecycle.get_mut().current.is_none() {
            return;
        }
        if let Err(err) = self.join() {
            tracing::warn!(thread = self.name(), %err, "joining thread on drop failed");
        }
    }
}

impl<R: Runnable> fmt::Debug for Thread<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread").field("name", &self.name).finish_non_exhaustive()
    }
}
