// SPDX-License-Identifier: MIT
//
// Freeze lock: batch a burst of mutations into one redraw.
//
// A control that changes several things at once (text, caret, size) would
// otherwise fire an invalidation per change. Holding the freeze lock for
// the duration of the mutation suppresses them: while the depth counter is
// above zero, the renderer's inbox drops every notification it receives.
// When the outermost hold is released (depth 1 → 0) the lock tells its
// target to redraw everything, exactly once.
//
// Partial updates dropped while frozen are not replayed. The single full
// redraw on release covers them.
//
// Holds nest: an inner freeze/unfreeze pair never thaws an outer one.
// `FreezeGuard` releases on drop, so an early return or an unwinding
// panic inside the mutation still balances the counter.
//
// The counter is a plain `Cell`, which makes the lock `!Sync`. The whole
// pipeline runs on the thread that pumps the host loop.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::context::Listener;

// ─── FreezeLock ──────────────────────────────────────────────────────────────

/// Reentrant suspension gate for invalidation notifications.
///
/// ```
/// use std::rc::Rc;
/// use tessera_term::freeze::FreezeLock;
///
/// let lock = Rc::new(FreezeLock::new());
/// {
///     let _outer = lock.hold();
///     {
///         let _inner = lock.hold();
///         assert_eq!(lock.depth(), 2);
///     }
///     assert!(lock.is_frozen());
/// }
/// assert!(!lock.is_frozen());
/// ```
#[derive(Default)]
pub struct FreezeLock {
    depth: Cell<u32>,
    target: RefCell<Option<Weak<dyn Listener>>>,
}

impl FreezeLock {
    /// An unfrozen lock with no release target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener that receives the consolidated redraw on final release.
    pub fn set_target(&self, target: Weak<dyn Listener>) {
        *self.target.borrow_mut() = Some(target);
    }

    /// Current nesting depth.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Whether any hold is active.
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.depth.get() > 0
    }

    /// Enter one level of suspension.
    pub fn freeze(&self) {
        self.depth.set(self.depth.get() + 1);
    }

    /// Leave one level of suspension.
    ///
    /// Returns `true` if this call released the outermost hold, in which
    /// case the target has been asked to redraw. An unfreeze without a
    /// matching freeze is logged and ignored.
    pub fn unfreeze(&self) -> bool {
        let depth = self.depth.get();
        if depth == 0 {
            tracing::warn!("unfreeze without matching freeze");
            return false;
        }
        self.depth.set(depth - 1);
        if depth > 1 {
            return false;
        }

        // Clone out of the RefCell before calling: the target may re-enter.
        let target = self.target.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(target) = target {
            tracing::trace!("freeze released, requesting full redraw");
            target.on_redraw();
        }
        true
    }

    /// Freeze and return a guard that unfreezes on drop.
    #[must_use = "the lock is released as soon as the guard is dropped"]
    pub fn hold(self: &Rc<Self>) -> FreezeGuard {
        self.freeze();
        FreezeGuard {
            lock: Some(Rc::clone(self)),
        }
    }
}

impl std::fmt::Debug for FreezeLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FreezeLock(depth={})", self.depth.get())
    }
}

// ─── FreezeGuard ─────────────────────────────────────────────────────────────

/// A scoped hold on a [`FreezeLock`]. Unfreezes when dropped.
///
/// A guard obtained from an unbound drawing context holds nothing.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct FreezeGuard {
    lock: Option<Rc<FreezeLock>>,
}

impl FreezeGuard {
    /// A guard that holds no lock.
    pub const fn detached() -> Self {
        Self { lock: None }
    }

    /// Whether this guard actually holds a lock.
    #[must_use]
    pub const fn is_holding(&self) -> bool {
        self.lock.is_some()
    }
}

impl Drop for FreezeGuard {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            lock.unfreeze();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
