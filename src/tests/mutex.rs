use core::mem;
use std::time::{Duration, Instant};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

use crate::error::ErrorKind;
use crate::sync::{Mutex, Timeout, TryLockError};

#[derive(Eq, PartialEq, Debug)]
struct NonCopy(i32);

#[test]
fn smoke() {
    let m = Mutex::new(());
    drop(m.lock().unwrap());
    drop(m.lock().unwrap());
}

#[test]
fn lots_and_lots() {
    const J: u32 = 5000;
    const K: u32 = 4;

    let m = Arc::new(Mutex::new(0));

    fn inc(m: &Mutex<u32>) {
        for _ in 0..J {
            *m.lock().unwrap() += 1;
        }
    }

    let (tx, rx) = channel();
    for _ in 0..K {
        let tx2 = tx.clone();
        let m2 = m.clone();
        thread::spawn(move || {
            inc(&m2);
            tx2.send(()).unwrap();
        });
        let tx2 = tx.clone();
        let m2 = m.clone();
        thread::spawn(move || {
            inc(&m2);
            tx2.send(()).unwrap();
        });
    }

    drop(tx);
    for _ in 0..2 * K {
        rx.recv().unwrap();
    }
    assert_eq!(*m.lock().unwrap(), J * K * 2);
}

#[test]
fn try_lock() {
    let m = Mutex::new(());
    *m.try_lock().unwrap() = ();
}

#[test]
fn try_lock_held_elsewhere() {
    let m = Arc::new(Mutex::new(0));
    let m2 = m.clone();
    let (locked_tx, locked_rx) = channel();
    let (release_tx, release_rx) = channel::<()>();

    let t = thread::spawn(move || {
        let guard = m2.lock().unwrap();
        locked_tx.send(()).unwrap();
        release_rx.recv().unwrap();
        drop(guard);
    });

    locked_rx.recv().unwrap();
    assert!(matches!(m.try_lock(), Err(TryLockError::WouldBlock)));
    release_tx.send(()).unwrap();
    t.join().unwrap();

    *m.try_lock().unwrap() += 1;
    assert_eq!(*m.lock().unwrap(), 1);
}

#[test]
fn explicit_unlock() {
    let m = Mutex::new(NonCopy(1));
    let guard = m.lock().unwrap();
    assert_eq!(*guard, NonCopy(1));
    guard.unlock().unwrap();
    assert!(m.try_lock().is_ok());
}

#[test]
fn force_unlock_after_forget() {
    let m = Mutex::new(5);
    mem::forget(m.lock().unwrap());
    assert!(matches!(m.try_lock(), Err(TryLockError::WouldBlock)));
    unsafe { m.force_unlock().unwrap() };
    assert_eq!(*m.try_lock().unwrap(), 5);
}

#[test]
fn force_unlock_not_locked() {
    let m = Mutex::new(());
    let err = unsafe { m.force_unlock() }.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OsError);
    assert!(err.os_code().is_some());
}

#[test]
fn test_into_inner() {
    let m = Mutex::new(NonCopy(10));
    assert_eq!(m.into_inner(), NonCopy(10));
}

#[test]
fn test_into_inner_drop() {
    struct Foo(Arc<AtomicUsize>);
    impl Drop for Foo {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
    let num_drops = Arc::new(AtomicUsize::new(0));
    let m = Mutex::new(Foo(num_drops.clone()));
    assert_eq!(num_drops.load(Ordering::SeqCst), 0);
    {
        let _inner = m.into_inner();
        assert_eq!(num_drops.load(Ordering::SeqCst), 0);
    }
    assert_eq!(num_drops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_get_mut() {
    let mut m = Mutex::new(NonCopy(10));
    *m.get_mut() = NonCopy(20);
    assert_eq!(m.into_inner(), NonCopy(20));
}

#[test]
fn test_mutex_arc_nested() {
    // Tests nested mutexes and access
    // to underlying data.
    let arc = Arc::new(Mutex::new(1));
    let arc2 = Arc::new(Mutex::new(arc));
    let (tx, rx) = channel();
    let _t = thread::spawn(move || {
        let lock = arc2.lock().unwrap();
        let lock2 = lock.lock().unwrap();
        assert_eq!(*lock2, 1);
        tx.send(()).unwrap();
    });
    rx.recv().unwrap();
}

#[test]
#[cfg_attr(not(panic = "unwind"), ignore = "test requires unwinding support")]
fn test_mutex_arc_access_in_unwind() {
    let arc = Arc::new(Mutex::new(1));
    let arc2 = arc.clone();
    let _ = thread::spawn(move || -> () {
        struct Unwinder {
            i: Arc<Mutex<i32>>,
        }
        impl Drop for Unwinder {
            fn drop(&mut self) {
                *self.i.lock().unwrap() += 1;
            }
        }
        let _u = Unwinder { i: arc2 };
        panic!();
    })
    .join();
    let lock = arc.lock().unwrap();
    assert_eq!(*lock, 2);
}

#[test]
fn test_mutex_unsized() {
    let mutex: &Mutex<[i32]> = &Mutex::new([1, 2, 3]);
    {
        let b = &mut *mutex.lock().unwrap();
        b[0] = 4;
        b[2] = 5;
    }
    let comp: &[i32] = &[4, 2, 5];
    assert_eq!(&*mutex.lock().unwrap(), comp);
}

#[test]
fn debug_shows_locked_state() {
    let m = Mutex::new(7);
    assert_eq!(format!("{m:?}"), "Mutex { data: 7, .. }");
    let _guard = m.lock().unwrap();
    assert_eq!(format!("{m:?}"), "Mutex { data: <locked>, .. }");
}

#[test]
fn try_lock_for_times_out() {
    let m = Arc::new(Mutex::new(0));
    let _guard = m.lock().unwrap();

    let m2 = m.clone();
    let elapsed = thread::spawn(move || {
        let start = Instant::now();
        assert!(matches!(m2.try_lock_for(Timeout::from_millis(50)), Err(TryLockError::WouldBlock)));
        start.elapsed()
    })
    .join()
    .unwrap();
    assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
}

#[test]
fn try_lock_for_acquires_when_released() {
    let m = Arc::new(Mutex::new(0));
    let guard = m.lock().unwrap();
    let (tx, rx) = channel();

    let m2 = m.clone();
    let t = thread::spawn(move || {
        tx.send(()).unwrap();
        *m2.try_lock_for(Timeout::from_millis(10_000)).unwrap() += 1;
    });

    rx.recv().unwrap();
    thread::sleep(Duration::from_millis(20));
    drop(guard);
    t.join().unwrap();
    assert_eq!(*m.lock().unwrap(), 1);
}

#[test]
fn try_lock_for_uncontended() {
    let m = Mutex::new(3);
    assert_eq!(*m.try_lock_for(Timeout::ZERO).unwrap(), 3);
    assert_eq!(*m.try_lock_for(Duration::from_millis(5)).unwrap(), 3);
    assert_eq!(*m.try_lock_for(Timeout::INFINITE).unwrap(), 3);
}

#[cfg(windows)]
#[test]
fn relock_on_owner_thread_is_refused() {
    let m = Mutex::new(0);
    let mut guard = m.lock().unwrap();
    assert_eq!(m.lock().unwrap_err().kind(), ErrorKind::ParamError);
    assert!(matches!(m.try_lock(), Err(TryLockError::WouldBlock)));
    assert!(matches!(m.try_lock_for(Timeout::from_millis(10)), Err(TryLockError::WouldBlock)));
    *guard += 1;
    drop(guard);

    assert_eq!(*m.lock().unwrap(), 1);
}
