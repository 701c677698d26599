// SPDX-License-Identifier: MIT
//
// Sink: the terminal device contract the renderer writes to.
//
// A sink is a grid with a cursor. The renderer positions the cursor, then
// writes one glyph in one of two color encodings:
//
//   write_palette    fg/bg from the fixed 16-color palette
//   write_truecolor  exact 24-bit fg/bg
//
// The viewport may change underneath the renderer (the user resizes the
// window). `viewport()` always reports the current size, and a move or
// write outside it fails with `Error::OutOfBounds`, which the renderer
// treats as "skip this cell".
//
// Two implementations ship with the crate:
//
//   MemorySink     headless grid that records every operation (tests, demos)
//   AnsiSink       escape sequences to any `io::Write` (see `output`)

use crate::color::{AnsiColor, Color};
use crate::error::{Error, Result};
use crate::geometry::{Position, Size};

// ─── Sink ────────────────────────────────────────────────────────────────────

/// A character-grid output device.
pub trait Sink {
    /// The device's current size.
    fn viewport(&mut self) -> Size;

    /// Ask the device to take on `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be written.
    fn set_size(&mut self, size: Size) -> Result<()>;

    /// Blank the whole device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be written.
    fn clear(&mut self) -> Result<()>;

    /// Hide the hardware cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be written.
    fn hide_cursor(&mut self) -> Result<()>;

    /// Place the cursor at `position`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `position` is outside the viewport.
    fn move_to(&mut self, position: Position) -> Result<()>;

    /// Write `glyph` at the cursor using palette colors, advancing the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if the cursor is outside the viewport.
    fn write_palette(&mut self, glyph: char, fg: AnsiColor, bg: AnsiColor) -> Result<()>;

    /// Write `glyph` at the cursor using exact colors, advancing the cursor.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if the cursor is outside the viewport.
    fn write_truecolor(&mut self, glyph: char, fg: Color, bg: Color) -> Result<()>;

    /// Push everything written so far to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be written.
    fn flush(&mut self) -> Result<()>;
}

// ─── MemorySink ──────────────────────────────────────────────────────────────

/// Colors a cell was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Palette { fg: AnsiColor, bg: AnsiColor },
    TrueColor { fg: Color, bg: Color },
}

/// One recorded sink call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOp {
    SetSize(Size),
    Clear,
    HideCursor,
    MoveTo(Position),
    Write {
        position: Position,
        glyph: char,
        paint: Paint,
    },
    Flush,
}

/// In-memory sink: a grid of written glyphs plus a log of every call.
///
/// ```
/// use tessera_term::color::Color;
/// use tessera_term::geometry::{Position, Size};
/// use tessera_term::sink::{MemorySink, Sink};
///
/// let mut sink = MemorySink::new(Size::new(4, 1));
/// sink.move_to(Position::new(2, 0)).unwrap();
/// sink.write_truecolor('x', Color::WHITE, Color::BLACK).unwrap();
/// assert_eq!(sink.glyph_at(Position::new(2, 0)), Some('x'));
/// assert!(sink.move_to(Position::new(4, 0)).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    viewport: Size,
    cursor: Position,
    grid: Vec<Option<(char, Paint)>>,
    ops: Vec<SinkOp>,
    resizes: Vec<Size>,
}

impl MemorySink {
    /// A blank sink whose viewport is `viewport`.
    #[must_use]
    pub fn new(viewport: Size) -> Self {
        let mut sink = Self::default();
        sink.reshape(viewport);
        sink
    }

    /// Change the viewport without a request from the renderer, as a user
    /// resizing the window would. Contents are lost.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.reshape(viewport);
    }

    fn reshape(&mut self, viewport: Size) {
        self.viewport = viewport;
        self.grid.clear();
        self.grid.resize(viewport.area() as usize, None);
    }

    fn index(&self, position: Position) -> Option<usize> {
        if !self.viewport.contains(position) {
            return None;
        }
        let row = usize::try_from(position.y).ok()?;
        let col = usize::try_from(position.x).ok()?;
        Some(row * usize::from(self.viewport.width) + col)
    }

    fn out_of_bounds(&self, position: Position) -> Error {
        Error::OutOfBounds {
            position,
            viewport: self.viewport,
        }
    }

    fn write(&mut self, glyph: char, paint: Paint) -> Result<()> {
        let position = self.cursor;
        let idx = self
            .index(position)
            .ok_or_else(|| self.out_of_bounds(position))?;
        self.grid[idx] = Some((glyph, paint));
        self.ops.push(SinkOp::Write {
            position,
            glyph,
            paint,
        });
        self.cursor = position.next();
        Ok(())
    }

    /// Every call recorded so far, oldest first.
    #[must_use]
    pub fn ops(&self) -> &[SinkOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<SinkOp> {
        std::mem::take(&mut self.ops)
    }

    /// Positions written to, in the order they were written.
    #[must_use]
    pub fn written(&self) -> Vec<Position> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SinkOp::Write { position, .. } => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Sizes requested through [`Sink::set_size`], in order.
    #[must_use]
    pub fn resizes(&self) -> &[Size] {
        &self.resizes
    }

    /// Glyph last written at `position`, if any.
    #[must_use]
    pub fn glyph_at(&self, position: Position) -> Option<char> {
        self.index(position)
            .and_then(|idx| self.grid[idx])
            .map(|(glyph, _)| glyph)
    }

    /// Colors last written at `position`, if any.
    #[must_use]
    pub fn paint_at(&self, position: Position) -> Option<Paint> {
        self.index(position)
            .and_then(|idx| self.grid[idx])
            .map(|(_, paint)| paint)
    }

    /// One row of glyphs as a string; unwritten cells read as spaces.
    #[must_use]
    pub fn row_text(&self, y: i32) -> String {
        (0..i32::from(self.viewport.width))
            .map(|x| self.glyph_at(Position::new(x, y)).unwrap_or(' '))
            .collect()
    }
}

impl Sink for MemorySink {
    fn viewport(&mut self) -> Size {
        self.viewport
    }

    fn set_size(&mut self, size: Size) -> Result<()> {
        self.ops.push(SinkOp::SetSize(size));
        self.resizes.push(size);
        self.reshape(size);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.ops.push(SinkOp::Clear);
        self.grid.fill(None);
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.ops.push(SinkOp::HideCursor);
        Ok(())
    }

    fn move_to(&mut self, position: Position) -> Result<()> {
        if !self.viewport.contains(position) {
            return Err(self.out_of_bounds(position));
        }
        self.ops.push(SinkOp::MoveTo(position));
        self.cursor = position;
        Ok(())
    }

    fn write_palette(&mut self, glyph: char, fg: AnsiColor, bg: AnsiColor) -> Result<()> {
        self.write(glyph, Paint::Palette { fg, bg })
    }

    fn write_truecolor(&mut self, glyph: char, fg: Color, bg: Color) -> Result<()> {
        self.write(glyph, Paint::TrueColor { fg, bg })
    }

    fn flush(&mut self) -> Result<()> {
        self.ops.push(SinkOp::Flush);
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
