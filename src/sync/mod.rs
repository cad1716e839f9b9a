//! Owner-tracking synchronization primitives.
//!
//! These are the reference embedders of [`OwnerSlot`]: each primitive
//! establishes exclusion with its own spin-based protocol and maintains
//! the slot purely as bookkeeping, recording the acquirer's [`OwnerId`]
//! after a successful exclusive acquire and clearing it on release.
//! Neither primitive parks a thread or keeps a wait queue; a contended
//! acquire spins with exponential backoff until the holder leaves.
//!
//! | Primitive    | Access granted                   | Ownership recorded for |
//! |--------------|----------------------------------|------------------------|
//! | [`SpinLock`] | One exclusive holder             | The holder             |
//! | [`RwLock`]   | Many readers or one writer       | The writer             |
//!
//! - **SpinLock** suits short critical sections where contention is
//!   rare and spinning is cheaper than anything clever.
//! - **RwLock** additionally admits concurrent readers; only the
//!   exclusive (writer) side carries a notion of ownership, so only the
//!   writer is recorded.
//!
//! Both primitives use the recorded owner for one correctness-adjacent
//! diagnostic: an exclusive acquire by the unit that already holds
//! exclusion can never succeed, so instead of spinning forever the
//! acquire panics and names the culprit. Everything else about the
//! recorded owner is advisory, exposed through the read-only
//! [`SpinLock::holder`] and [`RwLock::writer`] queries.
//!
//! [`OwnerSlot`]: crate::OwnerSlot
//! [`OwnerId`]: crate::OwnerId

pub mod rwlock;
pub mod spinlock;

pub use rwlock::*;
pub use spinlock::*;
