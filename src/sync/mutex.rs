use crate::error::SyncError;
use crate::error::SyncResult;
use crate::sync::Timeout;
use crate::sys;
use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ops::{Deref, DerefMut};
use thiserror::Error;

/// An enumeration of possible errors associated with a [`TryLockResult`] which
/// can occur while trying to acquire a lock, from the [`try_lock`] method on a
/// [`Mutex`].
///
/// [`try_lock`]: Mutex::try_lock
/// [`Mutex`]: Mutex
#[derive(Debug, Error)]
pub enum TryLockError {
    /// The lock could not be acquired at this time because the operation would
    /// otherwise block.
    #[error("try_lock failed because the operation would block")]
    WouldBlock,
    /// The native lock reported a failure other than being busy.
    #[error(transparent)]
    Failed(#[from] SyncError),
}

/// A type alias for the result of a nonblocking locking method.
pub type TryLockResult<Guard> = Result<Guard, TryLockError>;

/// A mutual exclusion primitive useful for protecting shared data
///
/// This mutex will block threads waiting for the lock to become available. The
/// mutex can be created via a [`new`] constructor. Each mutex has a type parameter
/// which represents the data that it is protecting. The data can only be accessed
/// through the RAII guards returned from [`lock`] and [`try_lock`], which
/// guarantees that the data is only ever accessed when the mutex is locked.
///
/// Locking is fallible: the native lock may fail to initialize, a native call may
/// fail, or (on Windows) the previous owner may have terminated while holding the
/// lock. All of these are reported as a [`SyncError`].
///
/// # Poisoning
///
/// This mutex does not implement poisoning. An abandoned native lock is reported
/// once as [`WaitCanceled`](crate::error::ErrorKind::WaitCanceled), and the lock is
/// usable again afterwards.
///
/// [`new`]: Self::new
/// [`lock`]: Self::lock
/// [`try_lock`]: Self::try_lock
///
/// # Examples
///
/// ```
/// use native_sync::sync::Mutex;
/// use std::sync::Arc;
/// use std::thread;
/// use std::sync::mpsc::channel;
///
/// const N: usize = 10;
///
/// // Spawn a few threads to increment a shared variable (non-atomically), and
/// // let the main thread know once all increments are done.
/// let data = Arc::new(Mutex::new(0));
///
/// let (tx, rx) = channel();
/// for _ in 0..N {
///     let (data, tx) = (Arc::clone(&data), tx.clone());
///     thread::spawn(move || {
///         let mut data = data.lock().unwrap();
///         *data += 1;
///         if *data == N {
///             tx.send(()).unwrap();
///         }
///         // the lock is unlocked here when `data` goes out of scope.
///     });
/// }
///
/// rx.recv().unwrap();
/// ```
pub struct Mutex<T: ?Sized> {
    inner: sys::Mutex,
    data: UnsafeCell<T>,
}

/// `T` must be `Send` for a [`Mutex`] to be `Send` because it is possible to acquire
/// the owned `T` from the `Mutex` via [`into_inner`].
///
/// [`into_inner`]: Mutex::into_inner
unsafe impl<T: ?Sized + Send> Send for Mutex<T> {}

/// `T` must be `Send` for [`Mutex`] to be `Sync`.
/// This ensures that the protected data can be accessed safely from multiple threads
/// without causing data races or other unsafe behavior.
unsafe impl<T: ?Sized + Send> Sync for Mutex<T> {}

/// An RAII implementation of a "scoped lock" of a mutex. When this structure is
/// dropped (falls out of scope), the lock will be unlocked.
///
/// The data protected by the mutex can be accessed through this guard via its
/// [`Deref`] and [`DerefMut`] implementations. Use [`MutexGuard::unlock`] to
/// observe a failure of the native release call, which dropping only logs.
///
/// This structure is created by the [`lock`] and [`try_lock`] methods on
/// [`Mutex`].
///
/// [`lock`]: Mutex::lock
/// [`try_lock`]: Mutex::try_lock
#[must_use = "if unused the Mutex will immediately unlock"]
#[clippy::has_significant_drop]
pub struct MutexGuard<'a, T: ?Sized + 'a> {
    lock: &'a Mutex<T>,
    // Native mutexes must be released by the thread that acquired them.
    _not_send: PhantomData<*const ()>,
}

/// `T` must be `Sync` for a [`MutexGuard<T>`] to be `Sync`
/// because it is possible to get a `&T` from `&MutexGuard` (via `Deref`).
unsafe impl<T: ?Sized + Sync> Sync for MutexGuard<'_, T> {}

impl<T> Mutex<T> {
    /// Creates a new mutex in an unlocked state ready for use.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::Mutex;
    ///
    /// let mutex = Mutex::new(0);
    /// ```
    #[inline]
    pub fn new(t: T) -> Mutex<T> {
        Mutex { inner: sys::Mutex::new(), data: UnsafeCell::new(t) }
    }
}

impl<T: ?Sized> Mutex<T> {
    /// Acquires a mutex, blocking the current thread until it is able to do so.
    ///
    /// This function will block the local thread until it is available to acquire
    /// the mutex. Upon returning, the thread is the only thread with the lock
    /// held. An RAII guard is returned to allow scoped unlock of the lock. When
    /// the guard goes out of scope, the mutex will be unlocked.
    ///
    /// The exact behavior on locking a mutex in the thread which already holds
    /// the lock is left unspecified. It never hands out a second guard: it
    /// deadlocks on Linux and fails with [`ParamError`] on Windows.
    ///
    /// # Errors
    ///
    /// * [`InternalError`] if the native lock failed to initialize.
    /// * [`OsError`] if the native wait failed.
    /// * [`WaitCanceled`] if the previous owner terminated while holding the lock.
    ///
    /// [`InternalError`]: crate::error::ErrorKind::InternalError
    /// [`OsError`]: crate::error::ErrorKind::OsError
    /// [`WaitCanceled`]: crate::error::ErrorKind::WaitCanceled
    /// [`ParamError`]: crate::error::ErrorKind::ParamError
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::Mutex;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let mutex = Arc::new(Mutex::new(0));
    /// let c_mutex = Arc::clone(&mutex);
    ///
    /// thread::spawn(move || {
    ///     *c_mutex.lock().unwrap() = 10;
    /// }).join().expect("thread::spawn failed");
    /// assert_eq!(*mutex.lock().unwrap(), 10);
    /// ```
    #[track_caller]
    pub fn lock(&self) -> SyncResult<MutexGuard<'_, T>> {
        self.inner.lock()?;
        unsafe { Ok(MutexGuard::new(self)) }
    }

    /// Attempts to acquire this lock.
    ///
    /// If the lock could not be acquired at this time, then [`Err`] is returned.
    /// Otherwise, an RAII guard is returned. The lock will be unlocked when the
    /// guard is dropped.
    ///
    /// This function does not block.
    ///
    /// # Errors
    ///
    /// If the mutex could not be acquired because it is already locked, then
    /// this call will return the [`WouldBlock`] error. Any other failure of the
    /// native lock is returned as [`Failed`].
    ///
    /// [`WouldBlock`]: TryLockError::WouldBlock
    /// [`Failed`]: TryLockError::Failed
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::{Mutex, TryLockError};
    ///
    /// let mutex = Mutex::new(0);
    /// let guard = mutex.lock().unwrap();
    /// assert!(matches!(mutex.try_lock(), Err(TryLockError::WouldBlock)));
    /// drop(guard);
    /// *mutex.try_lock().unwrap() = 10;
    /// assert_eq!(*mutex.lock().unwrap(), 10);
    /// ```
    #[track_caller]
    pub fn try_lock(&self) -> TryLockResult<MutexGuard<'_, T>> {
        if self.inner.try_lock()? {
            unsafe { Ok(MutexGuard::new(self)) }
        } else {
            Err(TryLockError::WouldBlock)
        }
    }

    /// Attempts to acquire this lock, blocking for at most `timeout`.
    ///
    /// [`Timeout::ZERO`] behaves like [`try_lock`](Self::try_lock) and
    /// [`Timeout::INFINITE`] like [`lock`](Self::lock), except that it reports
    /// [`WouldBlock`] instead of blocking when the current thread already holds the
    /// lock on Windows.
    ///
    /// # Errors
    ///
    /// If the mutex is still locked once `timeout` elapsed, then this call will
    /// return the [`WouldBlock`] error. Any other failure of the native lock is
    /// returned as [`Failed`].
    ///
    /// [`WouldBlock`]: TryLockError::WouldBlock
    /// [`Failed`]: TryLockError::Failed
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::{Mutex, Timeout, TryLockError};
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let mutex = Arc::new(Mutex::new(0));
    /// let guard = mutex.lock().unwrap();
    ///
    /// let c_mutex = Arc::clone(&mutex);
    /// thread::spawn(move || {
    ///     let r = c_mutex.try_lock_for(Timeout::from_millis(10));
    ///     assert!(matches!(r, Err(TryLockError::WouldBlock)));
    /// }).join().unwrap();
    ///
    /// drop(guard);
    /// *mutex.try_lock_for(Timeout::from_millis(10)).unwrap() = 10;
    /// ```
    #[track_caller]
    pub fn try_lock_for(&self, timeout: impl Into<Timeout>) -> TryLockResult<MutexGuard<'_, T>> {
        if self.inner.lock_timeout(timeout.into())? {
            unsafe { Ok(MutexGuard::new(self)) }
        } else {
            Err(TryLockError::WouldBlock)
        }
    }

    /// Releases the native lock without a guard.
    ///
    /// Releasing a mutex that is not locked is reported as an
    /// [`OsError`](crate::error::ErrorKind::OsError).
    ///
    /// # Safety
    ///
    /// The lock must not be held through a live [`MutexGuard`] on another thread,
    /// typically it was acquired by a guard that was passed to [`mem::forget`].
    #[track_caller]
    pub unsafe fn force_unlock(&self) -> SyncResult<()> {
        self.inner.unlock()
    }

    /// Consumes this mutex, returning the underlying data.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::Mutex;
    ///
    /// let mutex = Mutex::new(0);
    /// assert_eq!(mutex.into_inner(), 0);
    /// ```
    pub fn into_inner(self) -> T
    where
        T: Sized,
    {
        self.data.into_inner()
    }

    /// Returns a mutable reference to the underlying data.
    ///
    /// Since this call borrows the `Mutex` mutably, no actual locking needs to
    /// take place -- the mutable borrow statically guarantees no new locks can be acquired
    /// while this reference exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::Mutex;
    ///
    /// let mut mutex = Mutex::new(0);
    /// *mutex.get_mut() = 10;
    /// assert_eq!(*mutex.lock().unwrap(), 10);
    /// ```
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T> From<T> for Mutex<T> {
    /// Creates a new mutex in an unlocked state ready for use.
    /// This is equivalent to [`Mutex::new`].
    fn from(t: T) -> Self {
        Mutex::new(t)
    }
}

impl<T: Default> Default for Mutex<T> {
    /// Creates a `Mutex<T>`, with the `Default` value for T.
    fn default() -> Mutex<T> {
        Mutex::new(Default::default())
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Mutex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Mutex");
        match self.try_lock() {
            Ok(guard) => {
                d.field("data", &&*guard);
            }
            Err(TryLockError::WouldBlock) => {
                d.field("data", &format_args!("<locked>"));
            }
            Err(TryLockError::Failed(_)) => {
                d.field("data", &format_args!("<unavailable>"));
            }
        }
        d.finish_non_exhaustive()
    }
}

impl<'mutex, T: ?Sized> MutexGuard<'mutex, T> {
    unsafe fn new(lock: &'mutex Mutex<T>) -> MutexGuard<'mutex, T> {
        MutexGuard { lock, _not_send: PhantomData }
    }

    /// Releases the lock, reporting a failure of the native release call.
    ///
    /// # Examples
    ///
    /// ```
    /// use native_sync::sync::Mutex;
    ///
    /// let mutex = Mutex::new(());
    /// let guard = mutex.lock().unwrap();
    /// guard.unlock().unwrap();
    /// assert!(mutex.try_lock().is_ok());
    /// ```
    #[track_caller]
    pub fn unlock(self) -> SyncResult<()> {
        let lock = self.lock;
        mem::forget(self);
        lock.inner.unlock()
    }
}

impl<T: ?Sized> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for MutexGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        if let Err(err) = self.lock.inner.unlock() {
            tracing::warn!(%err, "releasing mutex on guard drop failed");
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for MutexGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (**self).fmt(f)
    }
}
