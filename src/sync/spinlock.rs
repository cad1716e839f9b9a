//! Owner-tracking spin lock.
//!
//! The simplest embedder of [`OwnerSlot`]: a test-and-set spin lock
//! that records who holds it. Exclusion comes from an atomic
//! read-modify-write on the lock word; the slot is written strictly
//! inside the window that word creates, so the recorded owner is
//! well-defined whenever the lock is used correctly.
//!
//! A contended acquire spins with exponential backoff. There is no wait
//! queue and no fairness: whichever spinner's read-modify-write lands
//! first wins. This makes the lock suitable for short critical sections
//! where contention is rare.
//!
//! [`OwnerSlot`]: crate::OwnerSlot

use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicBool, Ordering},
};

use crossbeam_utils::{Backoff, CachePadded};

use crate::owner::{OwnerId, OwnerSlot};

/// The lock could not be acquired at this time because the operation
/// would otherwise block.
#[derive(Debug)]
pub struct WouldBlock;

/// A mutual exclusion primitive that knows who holds it.
///
/// The lock protects a value of type `T`; the value can only be reached
/// through the guard returned by [`lock`] and [`try_lock`], so it is
/// only ever accessed under exclusion. On every successful acquire the
/// lock records the acquirer's [`OwnerId`] in its embedded slot, and
/// clears the record when the guard releases. The record feeds the
/// best-effort [`holder`] query and one hard diagnostic: an acquire by
/// the current holder panics instead of spinning forever.
///
/// The acquirer's identity is passed explicitly. The lock never asks
/// the runtime who is calling, which keeps it usable under any
/// scheduler; in return, the diagnostics are only as honest as the ids
/// callers mint. One id per concurrently-running execution unit is the
/// contract.
///
/// [`lock`]: Self::lock
/// [`try_lock`]: Self::try_lock
/// [`holder`]: Self::holder
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use ownable::OwnerId;
/// use ownable::sync::SpinLock;
///
/// let data = Arc::new(SpinLock::new(0));
///
/// let worker = OwnerId::new(2).unwrap();
/// let handle = {
///     let data = Arc::clone(&data);
///     std::thread::spawn(move || {
///         let mut guard = data.lock(worker);
///         *guard += 1;
///         guard.unlock();
///     })
/// };
/// handle.join().unwrap();
///
/// let me = OwnerId::new(1).unwrap();
/// assert_eq!(*data.lock(me), 1);
/// ```
pub struct SpinLock<T: ?Sized> {
    locked: CachePadded<AtomicBool>,
    holder: OwnerSlot,
    data: UnsafeCell<T>,
}

unsafe impl<T: ?Sized + Send> Send for SpinLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates a new spin lock in an unlocked, unowned state.
    ///
    /// # Examples
    ///
    /// ```
    /// use ownable::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(0);
    /// ```
    #[inline]
    pub const fn new(t: T) -> SpinLock<T> {
        SpinLock {
            locked: CachePadded::new(AtomicBool::new(false)),
            holder: OwnerSlot::new(),
            data: UnsafeCell::new(t),
        }
    }

    /// Consumes this lock, returning the underlying data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> SpinLock<T> {
    /// Acquires the lock, spinning until it is available.
    ///
    /// Upon returning, the caller is the only holder. The returned
    /// guard grants access to the data and releases the lock when
    /// dropped (or through the explicit [`SpinLockGuard::unlock`]).
    ///
    /// `who` is the caller's own identity; it is recorded as the holder
    /// for the lifetime of the guard.
    ///
    /// # Panics
    ///
    /// Panics if `who` already holds this lock. Spinning would never
    /// terminate, so the deadlock is reported at the acquire site
    /// instead.
    ///
    /// ```should_panic
    /// use ownable::OwnerId;
    /// use ownable::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(());
    /// let me = OwnerId::new(1).unwrap();
    /// let _guard = lock.lock(me);
    /// let _ = lock.lock(me); // panics: still held above
    /// ```
    #[track_caller]
    pub fn lock(&self, who: OwnerId) -> SpinLockGuard<'_, T> {
        let backoff = Backoff::new();
        loop {
            if !self.locked.fetch_or(true, Ordering::SeqCst) {
                self.holder.set_owner(Some(who));
                return SpinLockGuard {
                    lock: self,
                    _not_send: PhantomData,
                };
            }
            if self.holder.is_owned_by(who) {
                panic!("tried to re-acquire a SpinLock already held as {who:?}");
            }
            backoff.snooze();
        }
    }

    /// Attempts to acquire the lock without spinning.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if the lock is currently held, including
    /// by `who` itself. Unlike [`lock`], a failed probe is not a
    /// deadlock, so no panic.
    ///
    /// [`lock`]: Self::lock
    ///
    /// # Examples
    ///
    /// ```
    /// use ownable::OwnerId;
    /// use ownable::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(0);
    /// let a = OwnerId::new(1).unwrap();
    /// let b = OwnerId::new(2).unwrap();
    ///
    /// let guard = lock.try_lock(a).unwrap();
    /// assert!(lock.try_lock(b).is_err());
    /// guard.unlock();
    /// assert!(lock.try_lock(b).is_ok());
    /// ```
    pub fn try_lock(&self, who: OwnerId) -> Result<SpinLockGuard<'_, T>, WouldBlock> {
        if !self.locked.fetch_or(true, Ordering::SeqCst) {
            self.holder.set_owner(Some(who));
            Ok(SpinLockGuard {
                lock: self,
                _not_send: PhantomData,
            })
        } else {
            Err(WouldBlock)
        }
    }

    /// Returns the recorded holder, or `None` if the lock is unowned.
    ///
    /// Best-effort: a concurrent acquire or release may not be visible
    /// yet. Diagnostic and monitoring consumers only.
    #[inline]
    pub fn holder(&self) -> Option<OwnerId> {
        self.holder.owner()
    }
}

impl<T: Default> Default for SpinLock<T> {
    /// Creates a `SpinLock<T>`, with the `Default` value for T.
    fn default() -> SpinLock<T> {
        SpinLock::new(Default::default())
    }
}

impl<T: ?Sized> fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.locked.load(Ordering::SeqCst))
            .field("holder", &self.holder.owner())
            .finish()
    }
}

/// An implementation of a "scoped lock" of a spin lock. When this
/// structure is dropped (falls out of scope), the lock is released and
/// the recorded holder is cleared.
///
/// The data protected by the lock can be accessed through this guard
/// via its [`Deref`] and [`DerefMut`] implementations.
///
/// This structure is created by the [`lock`] and [`try_lock`] methods
/// on [`SpinLock`].
///
/// [`lock`]: SpinLock::lock
/// [`try_lock`]: SpinLock::try_lock
pub struct SpinLockGuard<'a, T: ?Sized + 'a> {
    lock: &'a SpinLock<T>,
    // Moving a guard to another execution unit would release the lock on
    // behalf of an id that did not acquire it.
    _not_send: PhantomData<*mut ()>,
}

unsafe impl<T: ?Sized + Sync> Sync for SpinLockGuard<'_, T> {}

impl<T: ?Sized> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> SpinLockGuard<'_, T> {
    /// Releases the underlying [`SpinLock`].
    ///
    /// Dropping the guard releases just the same; this spelling exists
    /// for call sites where the release is the point.
    ///
    /// # Example
    /// ```
    /// use ownable::OwnerId;
    /// use ownable::sync::SpinLock;
    ///
    /// let lock = SpinLock::new(123);
    /// let me = OwnerId::new(1).unwrap();
    /// let guard = lock.lock(me);
    ///
    /// // Work with the locked data...
    ///
    /// // Explicitly release the lock.
    /// guard.unlock();
    /// assert_eq!(lock.holder(), None);
    /// ```
    pub fn unlock(self) {
        drop(self);
    }
}

impl<T: ?Sized> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        // Clear the record before the word: once `locked` goes false a
        // new holder may immediately overwrite the slot.
        self.lock.holder.set_owner(None);
        self.lock.locked.store(false, Ordering::SeqCst);
    }
}
