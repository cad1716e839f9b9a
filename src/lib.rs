//! # Ownable: advisory ownership tracking for exclusive synchronizers.
//!
//! Exclusive synchronizers (mutex-like locks, latches, semaphores with
//! single-owner semantics) all answer the same question in their
//! diagnostics: which execution unit holds this right now? Deadlock
//! detectors and thread-dump tooling read that answer for best-effort
//! inspection, and reentrancy checks compare it against the caller.
//! None of these users need the answer to be enforced; they need it to
//! be recorded.
//!
//! This crate extracts that bookkeeping into a single reusable piece,
//! the [`OwnerSlot`]: an optional [`OwnerId`] that a synchronizer writes
//! after a successful exclusive acquire and clears on release. The slot
//! itself enforces nothing. It does not block or queue, and it promises
//! no memory ordering of its own; the synchronizer that embeds it
//! already establishes exclusion and the happens-before edges. What the
//! slot does guarantee is that it is safe to read at any time from any
//! thread: a racing read yields some value a caller actually wrote (or
//! the initial "unowned"), never garbage.
//!
//! Two spin-based synchronizers ship alongside the slot and double as
//! its reference embedders:
//!
//! | Primitive             | Exclusion          | Ownership recorded for      |
//! |-----------------------|--------------------|-----------------------------|
//! | [`sync::SpinLock`]    | One holder         | The holder                  |
//! | [`sync::RwLock`]      | Writer xor readers | The writer                  |
//!
//! Both keep the slot as a private field and expose only acquire,
//! release, and a read-only ownership query. That is the intended
//! discipline: arbitrary code must never reach `set_owner` on a slot it
//! does not itself embed.
//!
//! ## Identity is explicit
//!
//! An [`OwnerId`] is an opaque, comparable handle for whichever
//! concurrency unit the surrounding runtime schedules. The crate never
//! asks the runtime who is running; callers pass their identity into
//! every acquire. This keeps the crate free of any scheduler dependency
//! and makes every code path exercisable from a plain unit test.
//!
//! ## What this crate is not
//!
//! Ownership here is advisory. Nothing stops a buggy embedder from
//! recording the wrong id, and nothing persists across a process
//! boundary. An owner id is meaningless to any other process, so the
//! slot offers no serialization surface at all.

#![no_std]
#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod owner;
pub mod sync;

pub use owner::{OwnerId, OwnerSlot};
