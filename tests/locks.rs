//! Lock protocol tests: the embedded slot tracks acquire and release,
//! the locks still exclude, and a self-deadlocking acquire is reported
//! instead of spinning forever.

use std::sync::Arc;
use std::thread;

use ownable::OwnerId;
use ownable::sync::{RwLock, SpinLock};

fn id(raw: u64) -> OwnerId {
    OwnerId::new(raw).unwrap()
}

#[test]
fn spinlock_smoke() {
    const WORKERS: u64 = 32;

    let output = Arc::new(SpinLock::new(Vec::new()));
    let handles: Vec<_> = (1..=WORKERS)
        .map(|i| {
            let output = Arc::clone(&output);
            thread::spawn(move || {
                let mut guard = output.lock(id(i));
                guard.push(i);
                guard.unlock();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut output = output.lock(id(WORKERS + 1));
    output.sort();
    assert_eq!(&*output, &(1..=WORKERS).collect::<Vec<_>>());
}

#[test]
fn holder_tracks_acquire_and_release() {
    let lock = SpinLock::new(());
    let me = id(1);

    assert_eq!(lock.holder(), None);
    let guard = lock.lock(me);
    assert_eq!(lock.holder(), Some(me));
    guard.unlock();
    assert_eq!(lock.holder(), None);
}

#[test]
fn holder_is_visible_to_a_diagnostic_thread() {
    let lock = Arc::new(SpinLock::new(()));
    let me = id(7);

    let guard = lock.lock(me);
    // Spawning the observer after the acquire gives it the ordering the
    // slot itself never promises.
    let seen = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || lock.holder()).join().unwrap()
    };
    assert_eq!(seen, Some(me));
    guard.unlock();
}

#[test]
fn dropping_the_guard_releases() {
    let lock = SpinLock::new(1);
    {
        let mut guard = lock.lock(id(1));
        *guard += 1;
    }
    assert_eq!(lock.holder(), None);
    assert_eq!(lock.into_inner(), 2);
}

#[test]
fn try_lock_reports_contention() {
    let lock = SpinLock::new(0);

    let guard = lock.lock(id(1));
    assert!(lock.try_lock(id(2)).is_err());
    // A failed probe by the holder itself is an error, not a panic.
    assert!(lock.try_lock(id(1)).is_err());
    guard.unlock();
    assert!(lock.try_lock(id(2)).is_ok());
}

#[test]
#[should_panic(expected = "re-acquire a SpinLock")]
fn reentrant_spinlock_acquire_panics() {
    let lock = SpinLock::new(0);
    let me = id(1);
    let _guard = lock.lock(me);
    let _ = lock.lock(me);
}

#[test]
fn rwlock_readers_share_writer_excludes() {
    let lock = RwLock::new(0);
    let (a, b, c) = (id(1), id(2), id(3));

    let r1 = lock.read(a);
    let r2 = lock.read(b);
    assert_eq!((*r1, *r2), (0, 0));
    assert_eq!(lock.writer(), None);
    assert!(lock.try_write(c).is_err());
    drop(r1);
    drop(r2);

    let mut w = lock.write(c);
    *w = 9;
    assert_eq!(lock.writer(), Some(c));
    assert!(lock.try_read(a).is_err());
    drop(w);

    assert_eq!(lock.writer(), None);
    assert_eq!(*lock.read(a), 9);
}

#[test]
fn rwlock_write_smoke() {
    const WORKERS: u64 = 16;
    const ROUNDS: u64 = 100;

    let total = Arc::new(RwLock::new(0u64));
    let handles: Vec<_> = (1..=WORKERS)
        .map(|i| {
            let total = Arc::clone(&total);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    let mut w = total.write(id(i));
                    *w += 1;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(*total.read(id(WORKERS + 1)), WORKERS * ROUNDS);
}

#[test]
fn writer_is_visible_to_a_diagnostic_thread() {
    let lock = Arc::new(RwLock::new(()));
    let me = id(5);

    let w = lock.write(me);
    let seen = {
        let lock = Arc::clone(&lock);
        thread::spawn(move || lock.writer()).join().unwrap()
    };
    assert_eq!(seen, Some(me));
    drop(w);
    assert_eq!(lock.writer(), None);
}

#[test]
#[should_panic(expected = "already holds the write side")]
fn read_while_writing_panics() {
    let lock = RwLock::new(());
    let me = id(1);
    let _w = lock.write(me);
    let _ = lock.read(me);
}

#[test]
#[should_panic(expected = "already holds the write side")]
fn reentrant_write_panics() {
    let lock = RwLock::new(());
    let me = id(1);
    let _w = lock.write(me);
    let _ = lock.write(me);
}
