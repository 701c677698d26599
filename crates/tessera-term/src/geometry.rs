// SPDX-License-Identifier: MIT
//
// Geometry: discrete 2-D value types for the character grid.
//
// Everything the render pipeline talks about is one of four values:
//
//   Position   a grid coordinate. Signed, because a sub-control's local
//              space can be translated partly off the root's origin.
//   Size       an extent. Unsigned, so a negative size cannot be built.
//   Offset     the signed displacement between two positions.
//   Rect       origin + size, a finite set of positions.
//
// Rect iteration is row-major (left to right, then top to bottom). The
// renderer issues terminal writes in exactly that order, which matters on
// terminals that auto-wrap or scroll when the last writable cell is hit.
//
// Every type here is `Copy` and every operation is pure.

use std::fmt;
use std::iter::FusedIterator;
use std::num::NonZeroU16;
use std::ops::{Add, Neg};

// ─── Offset ─────────────────────────────────────────────────────────────────

/// A signed displacement between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offset {
    /// Horizontal displacement in columns.
    pub dx: i32,
    /// Vertical displacement in rows.
    pub dy: i32,
}

impl Offset {
    /// No displacement.
    pub const ZERO: Self = Self { dx: 0, dy: 0 };

    #[inline]
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

impl Add for Offset {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.dx.saturating_add(rhs.dx), self.dy.saturating_add(rhs.dy))
    }
}

impl Neg for Offset {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(self.dx.saturating_neg(), self.dy.saturating_neg())
    }
}

// ─── Position ───────────────────────────────────────────────────────────────

/// A discrete grid coordinate.
///
/// ```
/// use std::num::NonZeroU16;
/// use tessera_term::geometry::Position;
///
/// let width = NonZeroU16::new(10).unwrap();
/// let p = Position::new(3, 2);
/// assert_eq!(p.unwrap(width), Position::new(23, 0));
/// assert_eq!(Position::new(23, 0).wrap(width), p);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// The top-left corner, `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The position one column to the right.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self::new(self.x.saturating_add(1), self.y)
    }

    /// The first column of the following row.
    #[inline]
    #[must_use]
    pub const fn next_line(self) -> Self {
        Self::new(0, self.y.saturating_add(1))
    }

    /// Move by a displacement. Coordinates saturate at the `i32` range.
    #[inline]
    #[must_use]
    pub const fn translate(self, offset: Offset) -> Self {
        Self::new(
            self.x.saturating_add(offset.dx),
            self.y.saturating_add(offset.dy),
        )
    }

    /// The displacement that takes `origin` to `self`.
    #[inline]
    #[must_use]
    pub const fn offset_from(self, origin: Self) -> Offset {
        Offset::new(self.x.saturating_sub(origin.x), self.y.saturating_sub(origin.y))
    }

    /// This position as a displacement from the origin.
    #[inline]
    #[must_use]
    pub const fn as_offset(self) -> Offset {
        Offset::new(self.x, self.y)
    }

    /// Interpret `x` as a linear offset into rows of `width` columns and
    /// return the 2-D coordinate it lands on.
    #[inline]
    #[must_use]
    pub const fn wrap(self, width: NonZeroU16) -> Self {
        let w = width.get() as i32;
        Self::new(self.x.rem_euclid(w), self.x.div_euclid(w))
    }

    /// Inverse of [`wrap`](Self::wrap): flatten to a linear offset held in `x`.
    #[inline]
    #[must_use]
    pub const fn unwrap(self, width: NonZeroU16) -> Self {
        let w = width.get() as i32;
        Self::new(self.x.saturating_add(self.y.saturating_mul(w)), 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ─── Size ───────────────────────────────────────────────────────────────────

/// Width and height in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl Size {
    /// Zero extent.
    pub const ZERO: Self = Self { width: 0, height: 0 };

    /// The smallest size a terminal accepts: one cell.
    pub const MIN: Self = Self { width: 1, height: 1 };

    #[inline]
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.width as u32 * self.height as u32
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether `position` lies in the rectangle of this size rooted at the origin.
    #[inline]
    #[must_use]
    pub const fn contains(self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    /// The rectangle of this size rooted at the origin.
    #[inline]
    #[must_use]
    pub const fn as_rect(self) -> Rect {
        Rect::from_size(self)
    }

    /// Grow (or shrink, with negative deltas) by `dw` columns and `dh` rows.
    ///
    /// Saturates at zero and at `u16::MAX`.
    #[must_use]
    pub fn expand(self, dw: i32, dh: i32) -> Self {
        Self::new(
            saturate(i32::from(self.width).saturating_add(dw)),
            saturate(i32::from(self.height).saturating_add(dh)),
        )
    }

    /// Component-wise clamp into `[min, max]`.
    ///
    /// A `max` dimension smaller than the matching `min` dimension is
    /// treated as equal to it.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        let max = max.max(min);
        Self::new(
            self.width.max(min.width).min(max.width),
            self.height.max(min.height).min(max.height),
        )
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn saturate(v: i32) -> u16 {
    u16::try_from(v.max(0)).unwrap_or(u16::MAX)
}

// ─── Rect ───────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle: the set of positions `origin + [0, size)`.
///
/// ```
/// use tessera_term::geometry::{Position, Rect};
///
/// let a = Rect::new(0, 0, 20, 20);
/// let b = Rect::new(10, 10, 20, 20);
/// assert_eq!(a.intersect(b), Rect::new(10, 10, 10, 10));
/// assert!(a.intersect(Rect::new(40, 40, 5, 5)).is_empty());
/// assert!(a.contains(Position::new(19, 19)));
/// assert!(!a.contains(Position::new(20, 19)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Position,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// The canonical empty rectangle. Every empty intersection is exactly this.
    pub const EMPTY: Self = Self {
        origin: Position::ORIGIN,
        size: Size::ZERO,
    };

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            origin: Position::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// A rectangle of `size` rooted at the origin.
    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self {
            origin: Position::ORIGIN,
            size,
        }
    }

    /// Left edge (inclusive).
    #[inline]
    #[must_use]
    pub const fn left(self) -> i32 {
        self.origin.x
    }

    /// Top edge (inclusive).
    #[inline]
    #[must_use]
    pub const fn top(self) -> i32 {
        self.origin.y
    }

    /// Right edge (exclusive): `x + width`.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.origin.x.saturating_add(self.size.width as i32)
    }

    /// Bottom edge (exclusive): `y + height`.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.origin.y.saturating_add(self.size.height as i32)
    }

    /// Whether this rectangle contains no positions.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.size.is_empty()
    }

    /// Whether `position` lies inside.
    #[inline]
    #[must_use]
    pub const fn contains(self, position: Position) -> bool {
        position.x >= self.left()
            && position.x < self.right()
            && position.y >= self.top()
            && position.y < self.bottom()
    }

    /// Axis-aligned overlap of two rectangles.
    ///
    /// Disjoint (or merely touching) rectangles yield [`Rect::EMPTY`], never
    /// a negative extent.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let x1 = self.left().max(other.left());
        let y1 = self.top().max(other.top());
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            // Both differences are positive and bounded by a u16 extent.
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            Self::new(x1, y1, (x2 - x1) as u16, (y2 - y1) as u16)
        } else {
            Self::EMPTY
        }
    }

    /// Smallest rectangle covering both. Empty operands are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let x1 = self.left().min(other.left());
        let y1 = self.top().min(other.top());
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Self::new(x1, y1, saturate(x2.saturating_sub(x1)), saturate(y2.saturating_sub(y1)))
    }

    /// Move the rectangle by a displacement.
    #[inline]
    #[must_use]
    pub const fn translate(self, offset: Offset) -> Self {
        Self {
            origin: self.origin.translate(offset),
            size: self.size,
        }
    }

    /// All positions inside, row-major from top-left to bottom-right.
    #[inline]
    #[must_use]
    pub const fn positions(self) -> Positions {
        Positions {
            rect: self,
            index: 0,
            len: self.size.area(),
        }
    }
}

impl IntoIterator for Rect {
    type Item = Position;
    type IntoIter = Positions;

    fn into_iter(self) -> Positions {
        self.positions()
    }
}

// ─── Positions ──────────────────────────────────────────────────────────────

/// Row-major iterator over the positions of a [`Rect`].
///
/// Cloning it (or calling [`Rect::positions`] again) restarts the sequence.
#[derive(Debug, Clone)]
pub struct Positions {
    rect: Rect,
    index: u32,
    len: u32,
}

impl Iterator for Positions {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.index >= self.len {
            return None;
        }
        // len > 0 implies width > 0.
        let width = NonZeroU16::new(self.rect.size.width)?;
        // index < area; terminal grids stay far below i32::MAX cells.
        #[allow(clippy::cast_possible_wrap)]
        let linear = Position::new(self.index as i32, 0);
        self.index += 1;
        Some(linear.wrap(width).translate(self.rect.origin.as_offset()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.index) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Positions {}

impl FusedIterator for Positions {}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn w(n: u16) -> NonZeroU16 {
        NonZeroU16::new(n).unwrap()
    }

    // ── Position ────────────────────────────────────────────────────────

    #[test]
    fn next_and_next_line() {
        let p = Position::new(4, 2);
        assert_eq!(p.next(), Position::new(5, 2));
        assert_eq!(p.next_line(), Position::new(0, 3));
    }

    #[test]
    fn translate_and_offset_from_are_inverse() {
        let a = Position::new(3, -1);
        let b = Position::new(-7, 12);
        assert_eq!(a.translate(b.offset_from(a)), b);
    }

    #[test]
    fn arithmetic_saturates_at_the_coordinate_range() {
        let edge = Position::new(i32::MAX, i32::MIN);
        assert_eq!(edge.next(), edge);
        assert_eq!(edge.translate(Offset::new(5, -5)), edge);
        assert_eq!(
            Offset::new(i32::MAX, 0) + Offset::new(1, 0),
            Offset::new(i32::MAX, 0)
        );
        assert_eq!(-Offset::new(i32::MIN, 0), Offset::new(i32::MAX, 0));
    }

    #[test]
    fn wrap_splits_linear_offset() {
        assert_eq!(Position::new(0, 0).wrap(w(10)), Position::new(0, 0));
        assert_eq!(Position::new(9, 0).wrap(w(10)), Position::new(9, 0));
        assert_eq!(Position::new(10, 0).wrap(w(10)), Position::new(0, 1));
        assert_eq!(Position::new(57, 0).wrap(w(10)), Position::new(7, 5));
    }

    #[test]
    fn unwrap_flattens() {
        assert_eq!(Position::new(7, 5).unwrap(w(10)), Position::new(57, 0));
        assert_eq!(Position::new(0, 1).unwrap(w(80)), Position::new(80, 0));
    }

    #[test]
    fn display_position() {
        assert_eq!(Position::new(3, -4).to_string(), "(3, -4)");
    }

    // ── Offset ──────────────────────────────────────────────────────────

    #[test]
    fn offset_arithmetic() {
        let a = Offset::new(2, 3);
        assert_eq!(a + Offset::new(-1, 4), Offset::new(1, 7));
        assert_eq!(-a, Offset::new(-2, -3));
        assert_eq!(a + -a, Offset::ZERO);
    }

    // ── Size ────────────────────────────────────────────────────────────

    #[test]
    fn size_area_and_empty() {
        assert_eq!(Size::new(80, 24).area(), 1920);
        assert!(Size::new(0, 24).is_empty());
        assert!(Size::new(80, 0).is_empty());
        assert!(!Size::MIN.is_empty());
    }

    #[test]
    fn size_contains_is_origin_rooted() {
        let s = Size::new(10, 5);
        assert!(s.contains(Position::new(0, 0)));
        assert!(s.contains(Position::new(9, 4)));
        assert!(!s.contains(Position::new(10, 4)));
        assert!(!s.contains(Position::new(9, 5)));
        assert!(!s.contains(Position::new(-1, 0)));
    }

    #[test]
    fn expand_grows_and_saturates() {
        assert_eq!(Size::new(3, 1).expand(1, 0), Size::new(4, 1));
        assert_eq!(Size::new(3, 1).expand(-5, -5), Size::ZERO);
        assert_eq!(Size::new(u16::MAX, 1).expand(10, 0).width, u16::MAX);
    }

    #[test]
    fn clamp_respects_bounds() {
        let min = Size::new(2, 2);
        let max = Size::new(10, 4);
        assert_eq!(Size::new(0, 9).clamp(min, max), Size::new(2, 4));
        assert_eq!(Size::new(5, 3).clamp(min, max), Size::new(5, 3));
    }

    #[test]
    fn clamp_with_inverted_bounds_uses_min() {
        let min = Size::new(8, 8);
        let max = Size::new(2, 2);
        assert_eq!(Size::new(5, 5).clamp(min, max), min);
    }

    #[test]
    fn display_size() {
        assert_eq!(Size::new(80, 24).to_string(), "80x24");
    }

    // ── Rect ────────────────────────────────────────────────────────────

    #[test]
    fn rect_edges() {
        let r = Rect::new(10, 5, 80, 24);
        assert_eq!(r.left(), 10);
        assert_eq!(r.top(), 5);
        assert_eq!(r.right(), 90);
        assert_eq!(r.bottom(), 29);
    }

    #[test]
    fn rect_contains_corners() {
        let r = Rect::new(10, 10, 20, 20);
        assert!(r.contains(Position::new(10, 10)));
        assert!(r.contains(Position::new(29, 29)));
        assert!(!r.contains(Position::new(9, 10)));
        assert!(!r.contains(Position::new(30, 10)));
        assert!(!r.contains(Position::new(10, 30)));
    }

    #[test]
    fn empty_rect_contains_nothing() {
        assert!(!Rect::new(0, 0, 0, 5).contains(Position::ORIGIN));
        assert!(!Rect::EMPTY.contains(Position::ORIGIN));
    }

    #[test]
    fn intersect_adjacent_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert_eq!(a.intersect(b), Rect::EMPTY);
    }

    #[test]
    fn intersect_contained_is_inner() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(10, 10, 20, 20);
        assert_eq!(outer.intersect(inner), inner);
    }

    #[test]
    fn intersect_clips_negative_origin() {
        let viewport = Rect::new(0, 0, 80, 24);
        let r = Rect::new(-5, -3, 20, 10);
        assert_eq!(r.intersect(viewport), Rect::new(0, 0, 15, 7));
    }

    #[test]
    fn union_covers_both() {
        let a = Rect::new(0, 0, 3, 1);
        let b = Rect::new(5, 2, 2, 2);
        assert_eq!(a.union(b), Rect::new(0, 0, 7, 4));
        assert_eq!(a.union(Rect::EMPTY), a);
        assert_eq!(Rect::EMPTY.union(b), b);
    }

    #[test]
    fn union_of_far_apart_rects_saturates() {
        let a = Rect::new(i32::MIN, 0, 1, 1);
        let b = Rect::new(i32::MAX - 1, 0, 1, 1);
        assert_eq!(a.union(b), Rect::new(i32::MIN, 0, u16::MAX, 1));
    }

    #[test]
    fn positions_near_the_coordinate_limit_do_not_overflow() {
        let got: Vec<_> = Rect::new(i32::MAX - 1, 0, 5, 1).positions().collect();
        assert_eq!(got.len(), 5);
        assert_eq!(got[0], Position::new(i32::MAX - 1, 0));
        assert!(got[1..].iter().all(|p| *p == Position::new(i32::MAX, 0)));
    }

    #[test]
    fn positions_are_row_major() {
        let got: Vec<_> = Rect::new(1, 1, 2, 2).positions().collect();
        assert_eq!(
            got,
            vec![
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(1, 2),
                Position::new(2, 2),
            ]
        );
    }

    #[test]
    fn positions_of_empty_rect() {
        assert_eq!(Rect::new(3, 3, 0, 9).positions().count(), 0);
        assert_eq!(Rect::new(3, 3, 9, 0).positions().count(), 0);
    }

    #[test]
    fn positions_restart_from_clone() {
        let mut it = Rect::new(0, 0, 3, 1).positions();
        let fresh = it.clone();
        it.next();
        assert_eq!(it.len(), 2);
        assert_eq!(fresh.len(), 3);
        assert_eq!(fresh.last(), Some(Position::new(2, 0)));
    }

    #[test]
    fn rect_into_iter() {
        let mut n = 0;
        for p in Rect::new(0, 0, 4, 3) {
            assert!(Size::new(4, 3).contains(p));
            n += 1;
        }
        assert_eq!(n, 12);
    }

    // ── Properties ──────────────────────────────────────────────────────

    fn rect() -> impl Strategy<Value = Rect> {
        (-40i32..40, -40i32..40, 0u16..30, 0u16..30)
            .prop_map(|(x, y, width, height)| Rect::new(x, y, width, height))
    }

    proptest! {
        #[test]
        fn intersect_is_commutative(a in rect(), b in rect()) {
            prop_assert_eq!(a.intersect(b), b.intersect(a));
        }

        #[test]
        fn intersect_is_contained_in_both(a in rect(), b in rect()) {
            let i = a.intersect(b);
            prop_assert!(i.size.width <= a.size.width && i.size.width <= b.size.width);
            prop_assert!(i.size.height <= a.size.height && i.size.height <= b.size.height);
            for p in i {
                prop_assert!(a.contains(p));
                prop_assert!(b.contains(p));
            }
        }

        #[test]
        fn union_contains_both(a in rect(), b in rect()) {
            let u = a.union(b);
            for p in a.positions().chain(b.positions()) {
                prop_assert!(u.contains(p));
            }
        }

        #[test]
        fn positions_count_matches_area(r in rect()) {
            prop_assert_eq!(r.positions().count() as u32, r.size.area());
            for p in r {
                prop_assert!(r.contains(p));
            }
        }

        #[test]
        fn translate_moves_every_position(r in rect(), dx in -20i32..20, dy in -20i32..20) {
            let offset = Offset::new(dx, dy);
            let moved: Vec<_> = r.translate(offset).positions().collect();
            let expected: Vec<_> = r.positions().map(|p| p.translate(offset)).collect();
            prop_assert_eq!(moved, expected);
        }

        #[test]
        fn wrap_unwrap_round_trip(x in 0i32..500, y in 0i32..500, width in 1u16..200) {
            let width = NonZeroU16::new(width).unwrap();
            let p = Position::new(x % i32::from(width.get()), y);
            prop_assert_eq!(p.unwrap(width).wrap(width), p);
        }
    }
}
