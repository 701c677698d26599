// SPDX-License-Identifier: MIT
//
// Drawing context: the negotiated surface a control exposes upward.
//
// Every control owns exactly one `DrawingContext`. Its parent (or the
// renderer, for the content root) hands it in through `Control::bind` and
// constrains it through `Control::set_limits`. Going the other way, the
// control reports dirt through the context:
//
//   redraw()      everything this context covers is dirty
//   update(rect)  only `rect`, in the context's local coordinates
//
// A bound context forwards to a single `Listener` (in practice the
// renderer's inbox) after translating into root coordinates. A child
// context's `redraw` therefore arrives as an `on_update` of the child's
// bounds; only the root context ever produces `on_redraw`.
//
// The dummy context is the valid "no content" state: it never notifies,
// and freezing it holds nothing. Contexts are move-only. Replacing one
// drops the previous binding, which releases its listener reference.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::Cell;
use crate::freeze::{FreezeGuard, FreezeLock};
use crate::geometry::{Offset, Position, Rect, Size};

// ─── Listener ────────────────────────────────────────────────────────────────

/// Receiver of invalidation notifications. One per binding, no broadcast.
pub trait Listener {
    /// Everything under the root must be considered dirty.
    fn on_redraw(&self);

    /// `rect`, in root coordinates, must be considered dirty.
    fn on_update(&self, rect: Rect);
}

// ─── Control ─────────────────────────────────────────────────────────────────

/// A render surface: exposes a cell for every position within its size
/// and takes part in the drawing-context protocol.
///
/// All methods return values (no borrowed internals), so a control shared
/// as `Rc<RefCell<T>>` is itself a `Control`.
pub trait Control {
    /// Current negotiated size.
    fn size(&self) -> Size;

    /// Cell at `position` in local coordinates. Only called for positions
    /// inside [`size`](Self::size).
    fn cell(&self, position: Position) -> Cell;

    /// Take ownership of a new context, dropping the previous one.
    fn bind(&mut self, context: DrawingContext);

    /// Constrain the control's size to `[min, max]` and let it re-layout.
    fn set_limits(&mut self, min: Size, max: Size);

    /// Cell at `position`, or [`Cell::EMPTY`] outside the current size.
    fn cell_or_empty(&self, position: Position) -> Cell {
        if self.size().contains(position) {
            self.cell(position)
        } else {
            Cell::EMPTY
        }
    }
}

impl<T: Control + ?Sized> Control for Rc<RefCell<T>> {
    fn size(&self) -> Size {
        self.borrow().size()
    }

    fn cell(&self, position: Position) -> Cell {
        self.borrow().cell(position)
    }

    fn bind(&mut self, context: DrawingContext) {
        self.borrow_mut().bind(context);
    }

    fn set_limits(&mut self, min: Size, max: Size) {
        self.borrow_mut().set_limits(min, max);
    }
}

// ─── DrawingContext ──────────────────────────────────────────────────────────

struct Binding {
    listener: Rc<dyn Listener>,
    freeze: Rc<FreezeLock>,
    /// Where this context's local origin sits in root coordinates.
    origin: Offset,
    root: bool,
}

/// Handle through which a control negotiates its size and reports dirt.
///
/// ```
/// use tessera_term::context::DrawingContext;
/// use tessera_term::geometry::Size;
///
/// let mut ctx = DrawingContext::dummy();
/// ctx.set_limits(Size::new(1, 1), Size::new(10, 1));
/// assert!(ctx.resize(Size::new(40, 3)));
/// assert_eq!(ctx.size(), Size::new(10, 1));
/// ```
pub struct DrawingContext {
    binding: Option<Binding>,
    size: Size,
    min: Size,
    max: Size,
}

impl DrawingContext {
    /// The unbound context. Never notifies.
    #[must_use]
    pub const fn dummy() -> Self {
        Self {
            binding: None,
            size: Size::ZERO,
            min: Size::ZERO,
            max: Size::ZERO,
        }
    }

    /// A root context reporting to `listener` and freezing through `freeze`.
    #[must_use]
    pub fn root(listener: Rc<dyn Listener>, freeze: Rc<FreezeLock>) -> Self {
        Self {
            binding: Some(Binding {
                listener,
                freeze,
                origin: Offset::ZERO,
                root: true,
            }),
            ..Self::dummy()
        }
    }

    /// A context for a sub-control placed at `offset` inside this one.
    ///
    /// Notifications from the child reach the same listener, translated
    /// into root coordinates. The child of a dummy is a dummy.
    #[must_use]
    pub fn child(&self, offset: Offset) -> Self {
        let binding = self.binding.as_ref().map(|parent| Binding {
            listener: Rc::clone(&parent.listener),
            freeze: Rc::clone(&parent.freeze),
            origin: parent.origin + offset,
            root: false,
        });
        Self {
            binding,
            ..Self::dummy()
        }
    }

    /// Whether this context reports anywhere.
    #[inline]
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Current negotiated size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// The `(min, max)` bounds most recently imposed by the parent.
    #[inline]
    #[must_use]
    pub const fn limits(&self) -> (Size, Size) {
        (self.min, self.max)
    }

    /// Store new bounds and re-clamp the current size into them.
    ///
    /// A `max` smaller than `min` is raised to `min`. Returns whether the
    /// size changed (and therefore whether a notification went out).
    pub fn set_limits(&mut self, min: Size, max: Size) -> bool {
        self.min = min;
        self.max = max.max(min);
        self.resize(self.size)
    }

    /// Set the size to `desired` clamped into the current limits.
    ///
    /// On change, a root context requests a full redraw; a child context
    /// requests an update over the union of its old and new extent.
    pub fn resize(&mut self, desired: Size) -> bool {
        let new = desired.clamp(self.min, self.max);
        if new == self.size {
            return false;
        }
        let old = std::mem::replace(&mut self.size, new);

        if let Some(binding) = &self.binding {
            if binding.root {
                binding.listener.on_redraw();
            } else {
                let covered = old.as_rect().union(new.as_rect());
                binding.listener.on_update(covered.translate(binding.origin));
            }
        }
        true
    }

    /// Everything this context covers is dirty.
    pub fn redraw(&self) {
        let Some(binding) = &self.binding else {
            return;
        };
        if binding.root {
            binding.listener.on_redraw();
        } else if !self.size.is_empty() {
            binding
                .listener
                .on_update(self.size.as_rect().translate(binding.origin));
        }
    }

    /// `rect` (local coordinates) is dirty. Clipped to this context's size.
    pub fn update(&self, rect: Rect) {
        let Some(binding) = &self.binding else {
            return;
        };
        let clipped = rect.intersect(self.size.as_rect());
        if clipped.is_empty() {
            return;
        }
        binding.listener.on_update(clipped.translate(binding.origin));
    }

    /// Suspend notifications until the returned guard is dropped.
    pub fn freeze(&self) -> FreezeGuard {
        self.binding
            .as_ref()
            .map_or_else(FreezeGuard::detached, |binding| binding.freeze.hold())
    }

    /// Release the binding and return to the dummy state.
    pub fn detach(&mut self) {
        *self = Self::dummy();
    }
}

impl Default for DrawingContext {
    fn default() -> Self {
        Self::dummy()
    }
}

impl std::fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("DrawingContext");
        match &self.binding {
            Some(b) if b.root => s.field("binding", &"root"),
            Some(b) => s.field("binding", &b.origin),
            None => s.field("binding", &"dummy"),
        };
        s.field("size", &self.size)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Note {
        Redraw,
        Update(Rect),
    }

    #[derive(Default)]
    struct Recorder {
        notes: RefCell<Vec<Note>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<Note> {
            std::mem::take(&mut *self.notes.borrow_mut())
        }
    }

    impl Listener for Recorder {
        fn on_redraw(&self) {
            self.notes.borrow_mut().push(Note::Redraw);
        }

        fn on_update(&self, rect: Rect) {
            self.notes.borrow_mut().push(Note::Update(rect));
        }
    }

    fn root() -> (DrawingContext, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::default());
        let listener: Rc<dyn Listener> = recorder.clone();
        let ctx = DrawingContext::root(listener, Rc::new(FreezeLock::new()));
        (ctx, recorder)
    }

    /// Minimal control: a solid block of one glyph.
    struct Block {
        glyph: char,
        want: Size,
        context: DrawingContext,
    }

    impl Control for Block {
        fn size(&self) -> Size {
            self.context.size()
        }

        fn cell(&self, _position: Position) -> Cell {
            Cell::new(self.glyph)
        }

        fn bind(&mut self, context: DrawingContext) {
            self.context = context;
            self.context.resize(self.want);
        }

        fn set_limits(&mut self, min: Size, max: Size) {
            self.context.set_limits(min, max);
            self.context.resize(self.want);
        }
    }

    // ── Dummy ───────────────────────────────────────────────────────────

    #[test]
    fn dummy_is_unbound_and_silent() {
        let mut ctx = DrawingContext::dummy();
        assert!(!ctx.is_bound());
        ctx.set_limits(Size::ZERO, Size::new(5, 5));
        ctx.resize(Size::new(3, 3));
        ctx.redraw();
        ctx.update(Rect::new(0, 0, 1, 1));
        assert!(!ctx.freeze().is_holding());
    }

    #[test]
    fn child_of_dummy_is_dummy() {
        assert!(!DrawingContext::dummy().child(Offset::new(1, 1)).is_bound());
    }

    // ── Limits ──────────────────────────────────────────────────────────

    #[test]
    fn set_limits_reclamps_size() {
        let (mut ctx, rec) = root();
        assert!(ctx.set_limits(Size::new(80, 24), Size::new(80, 24)));
        assert_eq!(ctx.size(), Size::new(80, 24));
        assert_eq!(rec.take(), vec![Note::Redraw]);

        assert!(!ctx.set_limits(Size::new(80, 24), Size::new(80, 24)));
        assert_eq!(rec.take(), vec![]);
    }

    #[test]
    fn inverted_limits_raise_max() {
        let mut ctx = DrawingContext::dummy();
        ctx.set_limits(Size::new(5, 5), Size::new(1, 1));
        assert_eq!(ctx.limits(), (Size::new(5, 5), Size::new(5, 5)));
        assert_eq!(ctx.size(), Size::new(5, 5));
    }

    // ── Root notifications ──────────────────────────────────────────────

    #[test]
    fn root_update_is_clipped_to_size() {
        let (mut ctx, rec) = root();
        ctx.set_limits(Size::new(10, 2), Size::new(10, 2));
        rec.take();

        ctx.update(Rect::new(8, 1, 5, 5));
        ctx.update(Rect::new(20, 20, 1, 1));
        assert_eq!(rec.take(), vec![Note::Update(Rect::new(8, 1, 2, 1))]);
    }

    #[test]
    fn root_redraw() {
        let (ctx, rec) = root();
        ctx.redraw();
        assert_eq!(rec.take(), vec![Note::Redraw]);
    }

    // ── Child notifications ─────────────────────────────────────────────

    #[test]
    fn child_update_is_translated() {
        let (mut parent, rec) = root();
        parent.set_limits(Size::new(80, 24), Size::new(80, 24));
        let mut child = parent.child(Offset::new(4, 2)).child(Offset::new(1, 1));
        child.set_limits(Size::new(10, 1), Size::new(10, 1));
        rec.take();

        child.update(Rect::new(2, 0, 3, 1));
        assert_eq!(rec.take(), vec![Note::Update(Rect::new(7, 3, 3, 1))]);
    }

    #[test]
    fn child_redraw_becomes_update_of_bounds() {
        let (parent, rec) = root();
        let mut child = parent.child(Offset::new(3, 5));
        child.set_limits(Size::new(4, 2), Size::new(4, 2));
        rec.take();

        child.redraw();
        assert_eq!(rec.take(), vec![Note::Update(Rect::new(3, 5, 4, 2))]);
    }

    #[test]
    fn child_shrink_covers_old_extent() {
        let (parent, rec) = root();
        let mut child = parent.child(Offset::new(0, 2));
        child.set_limits(Size::ZERO, Size::new(20, 1));
        child.resize(Size::new(6, 1));
        rec.take();

        assert!(child.resize(Size::new(2, 1)));
        assert_eq!(rec.take(), vec![Note::Update(Rect::new(0, 2, 6, 1))]);
    }

    // ── Freeze ──────────────────────────────────────────────────────────

    #[test]
    fn freeze_through_context_shares_lock() {
        let (parent, _rec) = root();
        let child = parent.child(Offset::new(1, 1));
        let outer = parent.freeze();
        let inner = child.freeze();
        assert!(outer.is_holding());
        assert!(inner.is_holding());
    }

    // ── Disposal ────────────────────────────────────────────────────────

    #[test]
    fn detach_releases_listener() {
        let (mut ctx, rec) = root();
        assert_eq!(Rc::strong_count(&rec), 2);
        ctx.detach();
        assert!(!ctx.is_bound());
        assert_eq!(Rc::strong_count(&rec), 1);
        ctx.redraw();
        assert_eq!(rec.take(), vec![]);
    }

    #[test]
    fn rebinding_drops_previous_context() {
        let (ctx, rec) = root();
        let mut block = Block {
            glyph: '#',
            want: Size::new(2, 2),
            context: ctx,
        };
        block.bind(DrawingContext::dummy());
        assert_eq!(Rc::strong_count(&rec), 1);
    }

    // ── Control ─────────────────────────────────────────────────────────

    #[test]
    fn cell_or_empty_respects_size() {
        let mut block = Block {
            glyph: '#',
            want: Size::new(2, 1),
            context: DrawingContext::dummy(),
        };
        block.set_limits(Size::ZERO, Size::new(10, 10));
        assert_eq!(block.cell_or_empty(Position::new(1, 0)), Cell::new('#'));
        assert_eq!(block.cell_or_empty(Position::new(2, 0)), Cell::EMPTY);
    }

    #[test]
    fn shared_control_delegates() {
        let shared = Rc::new(RefCell::new(Block {
            glyph: '@',
            want: Size::new(3, 1),
            context: DrawingContext::dummy(),
        }));
        let mut handle = Rc::clone(&shared);
        handle.set_limits(Size::ZERO, Size::new(10, 10));
        assert_eq!(handle.size(), Size::new(3, 1));
        assert_eq!(shared.borrow().size(), Size::new(3, 1));
        assert_eq!(handle.cell(Position::ORIGIN), Cell::new('@'));
    }

    #[test]
    fn debug_shows_binding_kind() {
        let (ctx, _rec) = root();
        assert!(format!("{ctx:?}").contains("root"));
        assert!(format!("{:?}", DrawingContext::dummy()).contains("dummy"));
    }
}
