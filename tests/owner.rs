//! Slot behavior: the single-identity contract plus the two racy
//! guarantees, no invented values under contention and visibility
//! whenever the caller arranges its own ordering.

use std::num::NonZeroU64;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use ownable::{OwnerId, OwnerSlot};

fn id(raw: u64) -> OwnerId {
    OwnerId::new(raw).unwrap()
}

#[test]
fn fresh_slot_is_unowned() {
    let slot = OwnerSlot::new();
    assert_eq!(slot.owner(), None);
    assert_eq!(OwnerSlot::default().owner(), None);
}

#[test]
fn set_then_get_round_trips() {
    let slot = OwnerSlot::new();
    let t1 = id(1);
    slot.set_owner(Some(t1));
    assert_eq!(slot.owner(), Some(t1));
    assert!(slot.is_owned_by(t1));
    assert!(!slot.is_owned_by(id(2)));
}

#[test]
fn setting_none_clears_the_record() {
    let slot = OwnerSlot::new();
    slot.set_owner(Some(id(1)));
    slot.set_owner(None);
    assert_eq!(slot.owner(), None);
    assert!(!slot.is_owned_by(id(1)));
}

#[test]
fn setting_the_same_owner_twice_is_idempotent() {
    let slot = OwnerSlot::new();
    let t1 = id(1);
    slot.set_owner(Some(t1));
    slot.set_owner(Some(t1));
    assert_eq!(slot.owner(), Some(t1));
}

#[test]
fn last_write_wins() {
    let slot = OwnerSlot::new();
    slot.set_owner(Some(id(1)));
    slot.set_owner(Some(id(2)));
    assert_eq!(slot.owner(), Some(id(2)));
}

#[test]
fn acquire_release_scenario() {
    let slot = OwnerSlot::new();
    let (t1, t2) = (id(1), id(2));

    assert_eq!(slot.owner(), None);
    slot.set_owner(Some(t1));
    assert_eq!(slot.owner(), Some(t1));
    slot.set_owner(None);
    assert_eq!(slot.owner(), None);
    slot.set_owner(Some(t2));
    assert_eq!(slot.owner(), Some(t2));
}

#[test]
fn zero_is_not_an_id() {
    assert_eq!(OwnerId::new(0), None);
}

#[test]
fn id_accessors_and_formatting() {
    let t = id(7);
    assert_eq!(t.get(), 7);
    assert_eq!(OwnerId::from_nonzero(NonZeroU64::new(7).unwrap()), t);
    assert_eq!(format!("{t}"), "7");

    let slot = OwnerSlot::new();
    slot.set_owner(Some(t));
    assert!(format!("{slot:?}").contains("OwnerSlot"));
}

/// Two writers hammer the slot while a reader polls it. The reader must
/// only ever observe "unowned" or an id one of the writers actually
/// stored.
#[test]
fn racing_writers_never_invent_a_value() {
    const ROUNDS: usize = 10_000;

    let slot = Arc::new(OwnerSlot::new());
    let stop = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = [1u64, 2]
        .into_iter()
        .map(|raw| {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    slot.set_owner(Some(id(raw)));
                    slot.set_owner(None);
                }
            })
        })
        .collect();

    let reader = {
        let (slot, stop) = (Arc::clone(&slot), Arc::clone(&stop));
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                if let Some(seen) = slot.owner() {
                    assert!(
                        seen == id(1) || seen == id(2),
                        "observed {seen:?}, which no writer ever stored"
                    );
                }
            }
        })
    };

    for writer in writers {
        writer.join().unwrap();
    }
    stop.store(true, Ordering::SeqCst);
    reader.join().unwrap();

    // Each writer's final store was a release to "unowned".
    assert_eq!(slot.owner(), None);
}

/// The slot promises nothing about visibility on its own; a flag with
/// release/acquire ordering on the side is enough to make the record
/// reliably visible, which is exactly how an embedding lock uses it.
#[test]
fn caller_ordering_makes_the_record_visible() {
    let slot = Arc::new(OwnerSlot::new());
    let published = Arc::new(AtomicBool::new(false));

    let writer = {
        let (slot, published) = (Arc::clone(&slot), Arc::clone(&published));
        thread::spawn(move || {
            slot.set_owner(Some(id(3)));
            published.store(true, Ordering::Release);
        })
    };

    while !published.load(Ordering::Acquire) {
        std::hint::spin_loop();
    }
    assert_eq!(slot.owner(), Some(id(3)));

    writer.join().unwrap();
}
