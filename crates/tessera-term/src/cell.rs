// SPDX-License-Identifier: MIT
//
// Cell: one grid position's intended glyph and colors.
//
// A `Cell` is sparse: any of glyph, foreground, and background may be left
// unset, meaning "whatever the default is". Defaults are applied only by
// `resolve()`, which the frame buffer calls when diffing and the renderer
// calls when painting. Nothing upstream of those two ever sees a default.
//
//   glyph       → ' '
//   foreground  → white
//   background  → black
//
// Equality is defined on the resolved form, so an unset field and a field
// explicitly set to its default compare equal.

use crate::color::Color;

/// Glyph used when a cell leaves it unset.
pub const DEFAULT_GLYPH: char = ' ';

/// Foreground used when a cell leaves it unset.
pub const DEFAULT_FG: Color = Color::WHITE;

/// Background used when a cell leaves it unset.
pub const DEFAULT_BG: Color = Color::BLACK;

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A sparse description of a terminal cell.
///
/// ```
/// use tessera_term::cell::Cell;
/// use tessera_term::color::Color;
///
/// let blank = Cell::EMPTY;
/// let explicit = Cell::new(' ').with_fg(Color::WHITE).with_bg(Color::BLACK);
/// assert_eq!(blank, explicit);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Cell {
    /// Character to display, or `None` for the default blank.
    pub glyph: Option<char>,
    /// Foreground color, or `None` for the default.
    pub fg: Option<Color>,
    /// Background color, or `None` for the default.
    pub bg: Option<Color>,
}

impl Cell {
    /// Everything unset.
    pub const EMPTY: Self = Self {
        glyph: None,
        fg: None,
        bg: None,
    };

    /// A cell with a glyph and default colors.
    #[inline]
    #[must_use]
    pub const fn new(glyph: char) -> Self {
        Self {
            glyph: Some(glyph),
            fg: None,
            bg: None,
        }
    }

    /// Set the glyph; `None` leaves it to the default.
    #[inline]
    #[must_use]
    pub const fn with_glyph(self, glyph: Option<char>) -> Self {
        Self { glyph, ..self }
    }

    /// Set the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Color) -> Self {
        Self { fg: Some(fg), ..self }
    }

    /// Set the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self { bg: Some(bg), ..self }
    }

    /// Apply defaults to every unset field.
    #[inline]
    #[must_use]
    pub const fn resolve(self) -> ResolvedCell {
        ResolvedCell {
            glyph: match self.glyph {
                Some(glyph) => glyph,
                None => DEFAULT_GLYPH,
            },
            fg: match self.fg {
                Some(fg) => fg,
                None => DEFAULT_FG,
            },
            bg: match self.bg {
                Some(bg) => bg,
                None => DEFAULT_BG,
            },
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.resolve() == other.resolve()
    }
}

impl Eq for Cell {}

impl From<char> for Cell {
    fn from(glyph: char) -> Self {
        Self::new(glyph)
    }
}

// ─── ResolvedCell ────────────────────────────────────────────────────────────

/// A cell with every default applied: what the screen actually shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedCell {
    pub glyph: char,
    pub fg: Color,
    pub bg: Color,
}

impl Default for ResolvedCell {
    fn default() -> Self {
        Cell::EMPTY.resolve()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
