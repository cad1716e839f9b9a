//! Execution-unit identity and the ownership slot.
//!
//! The types in this module are the bookkeeping half of an exclusive
//! synchronizer. A lock that wants to answer "who holds me?" embeds one
//! [`OwnerSlot`], stores the acquirer's [`OwnerId`] after it has won
//! exclusion through its own mechanism, and clears the slot on release.
//! The slot records; the embedding lock enforces.
//!
//! Neither operation on the slot synchronizes anything. A reader that
//! has not arranged a happens-before edge with the last writer may see
//! a stale owner. This is acceptable for the intended consumers
//! (reentrancy checks made by the current holder itself, best-effort
//! diagnostics); any stronger visibility must come from synchronization
//! the caller already performs, typically the acquire/release edges of
//! the lock the slot sits in.

use core::fmt;
use core::num::NonZeroU64;
use core::sync::atomic::{AtomicU64, Ordering};

/// An opaque, comparable handle identifying one execution unit.
///
/// "Execution unit" means whichever concurrency unit the surrounding
/// runtime schedules, such as a thread or task. The crate attaches no
/// meaning to the payload beyond equality; callers mint ids from their
/// runtime's native identifier (a thread id, for instance) and pass
/// them in explicitly.
///
/// The zero payload is reserved to mean "unowned" inside [`OwnerSlot`],
/// so an id is always non-zero.
///
/// # Examples
///
/// ```
/// use ownable::OwnerId;
///
/// let a = OwnerId::new(1).unwrap();
/// let b = OwnerId::new(2).unwrap();
/// assert_ne!(a, b);
/// assert_eq!(OwnerId::new(0), None);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct OwnerId(NonZeroU64);

impl OwnerId {
    /// Creates an id from a raw value, or `None` if the value is zero.
    #[inline]
    pub const fn new(raw: u64) -> Option<OwnerId> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(OwnerId(raw)),
            None => None,
        }
    }

    /// Creates an id from an already non-zero value.
    #[inline]
    pub const fn from_nonzero(raw: NonZeroU64) -> OwnerId {
        OwnerId(raw)
    }

    /// Returns the raw value of the id.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The ownership slot: which execution unit, if any, currently claims
/// exclusive ownership of the synchronizer embedding this slot.
///
/// The slot is a single word of advisory state. It performs no locking,
/// no validation, and no fencing; both operations are total and return
/// immediately. The embedding synchronizer is trusted to call
/// [`set_owner`] only from the unit that actually acquired or released
/// exclusion; the slot cannot tell and does not check. Keep the slot a
/// private field of the synchronizer so nothing else can reach it.
///
/// All accesses are relaxed atomics on the id payload. That is the
/// whole extent of the slot's guarantees: no torn values, a racing read
/// observes either the initial "unowned" or something some caller
/// wrote, and the last write wins. Visibility beyond that is the
/// caller's problem; in correct usage the embedding lock's own
/// acquire/release ordering already provides it.
///
/// Ownership is a runtime-scoped fact. It never survives the process,
/// so any persistence layer around a synchronizer must leave this state
/// out and start fresh with an unowned slot.
///
/// # Examples
///
/// ```
/// use ownable::{OwnerId, OwnerSlot};
///
/// let slot = OwnerSlot::new();
/// assert_eq!(slot.owner(), None);
///
/// let me = OwnerId::new(7).unwrap();
/// slot.set_owner(Some(me));
/// assert_eq!(slot.owner(), Some(me));
/// assert!(slot.is_owned_by(me));
///
/// slot.set_owner(None);
/// assert_eq!(slot.owner(), None);
/// ```
///
/// [`set_owner`]: Self::set_owner
pub struct OwnerSlot {
    /// Raw id payload; [`UNOWNED`] when no unit claims ownership.
    owner: AtomicU64,
}

/// Reserved payload meaning "no owner".
const UNOWNED: u64 = 0;

impl OwnerSlot {
    /// Creates a new, unowned slot.
    #[inline]
    pub const fn new() -> OwnerSlot {
        OwnerSlot {
            owner: AtomicU64::new(UNOWNED),
        }
    }

    /// Overwrites the recorded owner unconditionally.
    ///
    /// `None` marks the slot unowned. The write is a relaxed store; it
    /// cannot fail and performs no validation or fencing. A synchronizer
    /// calls this after its own acquire has succeeded (or right before
    /// its own release), and that surrounding protocol is what makes
    /// the value meaningful to others.
    #[inline]
    pub fn set_owner(&self, owner: Option<OwnerId>) {
        self.owner
            .store(owner.map_or(UNOWNED, OwnerId::get), Ordering::Relaxed);
    }

    /// Returns the recorded owner, or `None` if the slot is unowned.
    ///
    /// A relaxed load; without a caller-arranged happens-before with the
    /// last [`set_owner`], the answer may be stale. Diagnostic consumers
    /// treat it as best-effort and never base correctness on it.
    ///
    /// [`set_owner`]: Self::set_owner
    #[inline]
    pub fn owner(&self) -> Option<OwnerId> {
        NonZeroU64::new(self.owner.load(Ordering::Relaxed)).map(OwnerId)
    }

    /// Returns whether `id` is the recorded owner.
    ///
    /// Same guarantees as [`owner`]. The one read that *is* reliable is
    /// a unit asking about itself: if `id` is the calling unit's own
    /// identity, a `true` answer can only come from that unit's own
    /// earlier `set_owner`, which is how embedding locks detect a
    /// reentrant acquire.
    ///
    /// [`owner`]: Self::owner
    #[inline]
    pub fn is_owned_by(&self, id: OwnerId) -> bool {
        self.owner.load(Ordering::Relaxed) == id.get()
    }
}

impl Default for OwnerSlot {
    /// Creates an unowned `OwnerSlot`.
    fn default() -> OwnerSlot {
        OwnerSlot::new()
    }
}

impl fmt::Debug for OwnerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnerSlot").field("owner", &self.owner()).finish()
    }
}
