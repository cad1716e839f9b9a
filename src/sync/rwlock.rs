//! Owner-tracking reader-writer lock.
//!
//! This type of lock allows a number of readers or at most one writer
//! at any point in time. Only the writer holds *exclusive* ownership,
//! so only the writer is recorded in the embedded [`OwnerSlot`];
//! readers are counted, not identified.
//!
//! Alongside the writer's id the lock keeps the source location of the
//! winning `write` call. When an execution unit that already holds the
//! write side comes back for any kind of access, the acquire would spin
//! against the caller itself forever; the lock panics instead and names
//! both the unit and where it took the write lock.
//!
//! [`OwnerSlot`]: crate::OwnerSlot

use core::{
    cell::UnsafeCell,
    fmt,
    marker::PhantomData,
    ops::{Deref, DerefMut},
    panic::Location,
    sync::atomic::{AtomicPtr, AtomicUsize, Ordering},
};

use crossbeam_utils::Backoff;

use super::spinlock::WouldBlock;
use crate::owner::{OwnerId, OwnerSlot};

/// Writer flag in the top bit of the state word; the lower bits count
/// active readers.
const WRITER: usize = 1 << (usize::BITS - 1);

/// A reader-writer lock that knows who holds its write side.
///
/// Any number of readers may hold the lock as long as no writer does;
/// the writer excludes everyone. The write portion records the
/// acquirer's [`OwnerId`], queryable through [`writer`] for diagnostic
/// tooling, and used to turn a self-deadlocking acquire into a panic at
/// the acquire site.
///
/// As with [`SpinLock`], callers pass their identity explicitly and the
/// guarantees on the recorded owner are advisory.
///
/// [`writer`]: Self::writer
/// [`SpinLock`]: super::SpinLock
///
/// # Examples
///
/// ```
/// use ownable::OwnerId;
/// use ownable::sync::RwLock;
///
/// let lock = RwLock::new(5);
/// let me = OwnerId::new(1).unwrap();
///
/// {
///     let r = lock.read(me);
///     assert_eq!(*r, 5);
///     assert_eq!(lock.writer(), None);
/// }
/// {
///     let mut w = lock.write(me);
///     *w += 1;
///     assert_eq!(lock.writer(), Some(me));
/// }
/// assert_eq!(lock.into_inner(), 6);
/// ```
pub struct RwLock<T>
where
    T: ?Sized + Send,
{
    state: AtomicUsize,
    holder: OwnerSlot,
    acquired_at: AtomicPtr<Location<'static>>,
    data: UnsafeCell<T>,
}

unsafe impl<T> Sync for RwLock<T> where T: ?Sized + Send {}
unsafe impl<T> Send for RwLock<T> where T: ?Sized + Send {}

impl<T> RwLock<T>
where
    T: Send,
{
    /// Creates a new instance of an `RwLock<T>` which is unlocked.
    #[inline]
    pub const fn new(data: T) -> RwLock<T> {
        RwLock {
            state: AtomicUsize::new(0),
            holder: OwnerSlot::new(),
            acquired_at: AtomicPtr::new(core::ptr::null_mut()),
            data: UnsafeCell::new(data),
        }
    }

    /// Consumes this `RwLock`, returning the underlying data.
    #[inline]
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T> RwLock<T>
where
    T: ?Sized + Send,
{
    /// Panics if `who` is the recorded writer: the caller is about to
    /// spin against itself.
    #[track_caller]
    fn validate_not_writer(&self, who: OwnerId) {
        if self.holder.is_owned_by(who) {
            // A Location is 'static, so even a stale pointer still
            // points at a live location.
            match unsafe { self.acquired_at.load(Ordering::Relaxed).as_ref() } {
                Some(at) => panic!(
                    "{who:?} already holds the write side of this RwLock (acquired at {at:?})"
                ),
                None => panic!("{who:?} already holds the write side of this RwLock"),
            }
        }
    }

    /// Locks this `RwLock` with shared read access, spinning until no
    /// writer holds it.
    ///
    /// There may be other readers inside the lock when this returns.
    /// No ordering is promised between contending readers and writers.
    ///
    /// Returns an RAII guard which releases this shared access once it
    /// is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `who` currently holds the write side: the read could
    /// never be granted.
    #[track_caller]
    pub fn read(&self, who: OwnerId) -> RwLockReadGuard<'_, T> {
        let backoff = Backoff::new();
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state & WRITER != 0 {
                self.validate_not_writer(who);
                backoff.snooze();
            } else if self
                .state
                .compare_exchange(state, state + 1, Ordering::Acquire, Ordering::Acquire)
                .is_ok()
            {
                return RwLockReadGuard {
                    lock: self,
                    _not_send: PhantomData,
                };
            }
        }
    }

    /// Attempts to acquire this `RwLock` with shared read access,
    /// without spinning on a writer.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if a writer holds the lock.
    ///
    /// # Panics
    ///
    /// Panics if `who` itself holds the write side, as no later retry
    /// could succeed.
    #[track_caller]
    pub fn try_read(&self, who: OwnerId) -> Result<RwLockReadGuard<'_, T>, WouldBlock> {
        loop {
            let state = self.state.load(Ordering::Relaxed);
            if state & WRITER != 0 {
                self.validate_not_writer(who);
                return Err(WouldBlock);
            }
            if self
                .state
                .compare_exchange(state, state + 1, Ordering::Acquire, Ordering::Acquire)
                .is_ok()
            {
                return Ok(RwLockReadGuard {
                    lock: self,
                    _not_send: PhantomData,
                });
            }
        }
    }

    /// Locks this `RwLock` with exclusive write access, spinning until
    /// no reader or writer holds it.
    ///
    /// On success, `who` is recorded as the writer together with the
    /// caller's source location, and an RAII guard is returned which
    /// drops the write access (and the record) when dropped.
    ///
    /// # Panics
    ///
    /// Panics if `who` already holds the write side.
    #[track_caller]
    pub fn write(&self, who: OwnerId) -> RwLockWriteGuard<'_, T> {
        let backoff = Backoff::new();
        loop {
            if self
                .state
                .compare_exchange(0, WRITER, Ordering::Acquire, Ordering::Acquire)
                .is_ok()
            {
                self.holder.set_owner(Some(who));
                self.acquired_at.store(
                    Location::caller() as *const Location<'static> as *mut _,
                    Ordering::Relaxed,
                );
                return RwLockWriteGuard {
                    lock: self,
                    _not_send: PhantomData,
                };
            }
            self.validate_not_writer(who);
            backoff.snooze();
        }
    }

    /// Attempts to lock this `RwLock` with exclusive write access,
    /// without spinning.
    ///
    /// # Errors
    ///
    /// Returns [`WouldBlock`] if any reader or writer holds the lock.
    #[track_caller]
    pub fn try_write(&self, who: OwnerId) -> Result<RwLockWriteGuard<'_, T>, WouldBlock> {
        if self
            .state
            .compare_exchange(0, WRITER, Ordering::Acquire, Ordering::Acquire)
            .is_ok()
        {
            self.holder.set_owner(Some(who));
            self.acquired_at.store(
                Location::caller() as *const Location<'static> as *mut _,
                Ordering::Relaxed,
            );
            Ok(RwLockWriteGuard {
                lock: self,
                _not_send: PhantomData,
            })
        } else {
            Err(WouldBlock)
        }
    }

    /// Returns the recorded writer, or `None` if no writer holds the
    /// lock.
    ///
    /// Best-effort, for diagnostic and monitoring consumers only.
    #[inline]
    pub fn writer(&self) -> Option<OwnerId> {
        self.holder.owner()
    }
}

impl<T: Send> fmt::Debug for RwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwLock")
            .field("state", &self.state.load(Ordering::SeqCst))
            .field("writer", &self.holder.owner())
            .finish()
    }
}

/// RAII structure used to release the shared read access of a lock when
/// dropped.
///
/// This structure is created by the [`read`] and [`try_read`] methods
/// on [`RwLock`].
///
/// [`read`]: RwLock::read
/// [`try_read`]: RwLock::try_read
pub struct RwLockReadGuard<'a, T>
where
    T: ?Sized + Send,
    T: 'a,
{
    lock: &'a RwLock<T>,
    _not_send: PhantomData<*mut ()>,
}

unsafe impl<T> Sync for RwLockReadGuard<'_, T> where T: ?Sized + Send + Sync {}

impl<T> Deref for RwLockReadGuard<'_, T>
where
    T: ?Sized + Send,
{
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> Drop for RwLockReadGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn drop(&mut self) {
        debug_assert_eq!(self.lock.state.load(Ordering::Acquire) & WRITER, 0);
        self.lock.state.fetch_sub(1, Ordering::Release);
    }
}

/// RAII structure used to release the exclusive write access of a lock
/// when dropped.
///
/// This structure is created by the [`write`] and [`try_write`] methods
/// on [`RwLock`].
///
/// [`write`]: RwLock::write
/// [`try_write`]: RwLock::try_write
pub struct RwLockWriteGuard<'a, T>
where
    T: ?Sized + Send,
    T: 'a,
{
    lock: &'a RwLock<T>,
    _not_send: PhantomData<*mut ()>,
}

unsafe impl<T> Sync for RwLockWriteGuard<'_, T> where T: ?Sized + Send + Sync {}

impl<T> Deref for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for RwLockWriteGuard<'_, T>
where
    T: ?Sized + Send,
{
    fn drop(&mut self) {
        debug_assert_eq!(
            self.lock.state.load(Ordering::Acquire) & WRITER,
            WRITER
        );
        // Clear the record before the writer bit: once the bit drops a
        // new writer may immediately overwrite both fields.
        self.lock
            .acquired_at
            .store(core::ptr::null_mut(), Ordering::Relaxed);
        self.lock.holder.set_owner(None);
        self.lock.state.fetch_and(!WRITER, Ordering::Release);
    }
}
