use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::sync::{Event, ResetMode, Timeout};

#[test]
fn smoke() {
    let e = Event::new(ResetMode::Auto);
    e.signal().unwrap();
    e.wait().unwrap();
    e.reset().unwrap();
    e.pulse().unwrap();
    assert!(!e.is_manual_reset());
    assert!(Event::new(ResetMode::Manual).is_manual_reset());
}

#[test]
fn manual_stays_signaled_until_reset() {
    let e = Event::new(ResetMode::Manual);
    e.signal().unwrap();
    for _ in 0..5 {
        assert!(e.timed_wait(Timeout::ZERO).unwrap());
    }
    assert!(e.timed_wait(Timeout::INFINITE).unwrap());
    e.reset().unwrap();
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
}

#[test]
fn manual_signal_releases_all_waiters() {
    const N: usize = 6;
    let e = Arc::new(Event::new(ResetMode::Manual));
    let (tx, rx) = channel();
    for _ in 0..N {
        let (e, tx) = (e.clone(), tx.clone());
        thread::spawn(move || {
            e.wait().unwrap();
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    e.signal().unwrap();
    for _ in 0..N {
        rx.recv().unwrap();
    }
    assert!(e.timed_wait(Timeout::ZERO).unwrap());
}

#[test]
fn auto_releases_one_wait() {
    let e = Event::new(ResetMode::Auto);
    e.signal().unwrap();
    assert!(e.timed_wait(Timeout::ZERO).unwrap());
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
    assert!(!e.timed_wait(Duration::from_millis(10)).unwrap());
}

#[test]
fn auto_signal_hands_off_between_threads() {
    const N: usize = 4;
    let e = Arc::new(Event::new(ResetMode::Auto));
    let (tx, rx) = channel();
    for _ in 0..N {
        let (e, tx) = (e.clone(), tx.clone());
        thread::spawn(move || {
            e.wait().unwrap();
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    for _ in 0..N {
        e.signal().unwrap();
        rx.recv().unwrap();
    }
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
}

#[test]
fn zero_timeout_returns_promptly() {
    let e = Event::new(ResetMode::Auto);
    let start = Instant::now();
    assert!(!e.timed_wait(Timeout::from_millis(0)).unwrap());
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn timed_wait_times_out() {
    let e = Event::new(ResetMode::Manual);
    let start = Instant::now();
    assert!(!e.timed_wait(Timeout::from_millis(30)).unwrap());
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[test]
fn timed_wait_observes_late_signal() {
    let e = Arc::new(Event::new(ResetMode::Auto));
    let e2 = e.clone();
    let start = Instant::now();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        e2.signal().unwrap();
    });

    assert!(e.timed_wait(Timeout::from_millis(100)).unwrap());
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(100), "{elapsed:?}");
    t.join().unwrap();
}

#[test]
fn huge_timeout_does_not_overflow() {
    let e = Event::new(ResetMode::Manual);
    e.signal().unwrap();
    assert!(e.timed_wait(Duration::MAX).unwrap());
    assert!(e.timed_wait(Timeout::from_millis(u64::MAX)).unwrap());
}

#[test]
fn pulse_without_waiters_is_lost() {
    for mode in [ResetMode::Manual, ResetMode::Auto] {
        let e = Event::new(mode);
        e.pulse().unwrap();
        assert!(!e.timed_wait(Timeout::from_millis(20)).unwrap());
    }
}

#[test]
fn pulse_clears_signaled_event() {
    let e = Event::new(ResetMode::Manual);
    e.signal().unwrap();
    e.pulse().unwrap();
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
}

#[test]
fn manual_pulse_eventually_releases_all() {
    const N: usize = 4;
    let e = Arc::new(Event::new(ResetMode::Manual));
    let (tx, rx) = channel();
    for _ in 0..N {
        let (e, tx) = (e.clone(), tx.clone());
        thread::spawn(move || {
            e.wait().unwrap();
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    // A pulse only reaches threads that are already blocked, keep pulsing until
    // every waiter got one.
    let mut released = 0;
    while released < N {
        e.pulse().unwrap();
        while rx.recv_timeout(Duration::from_millis(10)).is_ok() {
            released += 1;
        }
    }
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
}

#[cfg(target_os = "linux")]
fn wait_for_waiters(e: &Event, n: usize) {
    while e.waiters() != n {
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(target_os = "linux")]
#[test]
fn manual_pulse_releases_every_blocked_waiter() {
    const N: usize = 5;
    let e = Arc::new(Event::new(ResetMode::Manual));
    let (tx, rx) = channel();
    for _ in 0..N {
        let (e, tx) = (e.clone(), tx.clone());
        thread::spawn(move || {
            assert!(e.timed_wait(Timeout::INFINITE).unwrap());
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    wait_for_waiters(&e, N);
    e.pulse().unwrap();
    for _ in 0..N {
        rx.recv().unwrap();
    }
    assert_eq!(e.waiters(), 0);
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());
}

#[cfg(target_os = "linux")]
#[test]
fn auto_pulse_releases_exactly_one() {
    const N: usize = 3;
    let e = Arc::new(Event::new(ResetMode::Auto));
    let (tx, rx) = channel();
    for _ in 0..N {
        let (e, tx) = (e.clone(), tx.clone());
        thread::spawn(move || {
            assert!(e.timed_wait(Timeout::INFINITE).unwrap());
            tx.send(()).unwrap();
        });
    }
    drop(tx);

    wait_for_waiters(&e, N);
    e.pulse().unwrap();
    rx.recv().unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    assert_eq!(e.waiters(), N - 1);
    assert!(!e.timed_wait(Timeout::ZERO).unwrap());

    for _ in 1..N {
        e.signal().unwrap();
        rx.recv().unwrap();
    }
}

#[cfg(target_os = "linux")]
#[test]
fn pulse_does_not_release_later_waiters() {
    let e = Arc::new(Event::new(ResetMode::Manual));
    let e2 = e.clone();
    let (tx, rx) = channel();

    let t = thread::spawn(move || {
        tx.send(e2.timed_wait(Timeout::from_millis(5_000)).unwrap()).unwrap();
    });
    wait_for_waiters(&e, 1);
    e.pulse().unwrap();
    assert!(rx.recv().unwrap());
    t.join().unwrap();

    assert!(!e.timed_wait(Timeout::from_millis(20)).unwrap());
}
