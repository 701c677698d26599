// SPDX-License-Identifier: MIT
//
// FrameBuffer: what the terminal currently shows, as far as we know.
//
// One slot per screen position, holding the last cell the renderer
// painted there, or "unknown" before the first paint. The renderer asks
// `update(position, cell)` for every cell it considers repainting; the
// answer is `true` only if the resolved cell differs from the slot, in
// which case the slot already holds the new value.
//
// Design:
//
//   - Flat `Vec` with row-major indexing (`y * width + x`), the same order
//     the renderer walks rectangles in.
//
//   - `initialize` re-creates the storage. There is no in-place resize:
//     after the terminal changes size every slot is unknown, so the next
//     redraw repaints the whole screen.
//
//   - Out-of-range positions are rejected with `false`. That is a guard
//     against a renderer that has not yet caught up with a resize, not an
//     error path.

use std::num::NonZeroU16;

use crate::cell::{Cell, ResolvedCell};
use crate::geometry::{Position, Size};

/// Last-painted cell per screen position.
///
/// ```
/// use tessera_term::buffer::FrameBuffer;
/// use tessera_term::cell::Cell;
/// use tessera_term::geometry::{Position, Size};
///
/// let mut buf = FrameBuffer::new(Size::new(10, 1));
/// assert!(buf.update(Position::new(0, 0), &Cell::new('A')));
/// assert!(!buf.update(Position::new(0, 0), &Cell::new('A')));
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
pub struct FrameBuffer {
    size: Size,
    cells: Vec<Option<ResolvedCell>>,
}

impl FrameBuffer {
    /// A buffer of `size` with every slot unknown.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let mut buf = Self::default();
        buf.initialize(size);
        buf
    }

    /// Re-create storage at `size`, marking every slot unknown.
    ///
    /// Call this whenever the terminal dimensions change.
    pub fn initialize(&mut self, size: Size) {
        self.size = size;
        self.cells.clear();
        self.cells.resize(size.area() as usize, None);
    }

    /// Current dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Whether `position` is within the buffer.
    #[inline]
    #[must_use]
    pub const fn in_bounds(&self, position: Position) -> bool {
        self.size.contains(position)
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.in_bounds(position) {
            return None;
        }
        let width = NonZeroU16::new(self.size.width)?;
        usize::try_from(position.unwrap(width).x).ok()
    }

    /// The last painted cell at `position`, or `None` if unknown or out of range.
    #[must_use]
    pub fn get(&self, position: Position) -> Option<ResolvedCell> {
        self.index(position).and_then(|idx| self.cells[idx])
    }

    /// Number of slots that hold a painted cell.
    #[must_use]
    pub fn known_cells(&self) -> usize {
        self.cells.iter().filter(|slot| slot.is_some()).count()
    }

    /// Record `cell` at `position` if it differs from what is stored.
    ///
    /// Returns `true` when the position needs repainting. Out-of-range
    /// positions return `false` and store nothing.
    pub fn update(&mut self, position: Position, cell: &Cell) -> bool {
        let Some(idx) = self.index(position) else {
            return false;
        };
        let resolved = cell.resolve();
        let slot = &mut self.cells[idx];
        if *slot == Some(resolved) {
            return false;
        }
        *slot = Some(resolved);
        true
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameBuffer({}, {} known)", self.size, self.known_cells())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
