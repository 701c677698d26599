// SPDX-License-Identifier: MIT
//
// Output buffering and the ANSI terminal sink.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer: accumulates all ANSI bytes in memory so a whole render
//   pass reaches the terminal in a single write() call.
//
//   AnsiSink: implements `Sink` on top of any `io::Write`. It tracks where
//   the terminal's cursor really is and which palette colors are active, and
//   skips escape sequences that would not change anything. Consecutive
//   cells on a row cost one cursor move for the whole run.
//
// Truecolor writes are never elided: every cell carries its exact
// `38;2` / `48;2` pair. Palette writes only emit SGR when the pair changes.
//
// Each flushed pass is wrapped in synchronized-output markers (DEC 2026).

use std::io::{self, Write};

use unicode_width::UnicodeWidthChar;

use crate::ansi;
use crate::color::{AnsiColor, Color};
use crate::error::{Error, Result};
use crate::geometry::{Position, Size};
use crate::sink::Sink;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()` call.
///
/// Default capacity: 16 KB, enough for most passes without reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes, typically one of the `ansi` constants.
    #[inline]
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a character as UTF-8.
    #[inline]
    pub fn write_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w`, flush it, and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── AnsiSink ────────────────────────────────────────────────────────────────

/// Function that reports the device's live size, if it can.
pub type SizeProbe = fn() -> Option<Size>;

/// A [`Sink`] that speaks ANSI escape sequences to `W`.
///
/// # Optimization decisions
///
/// - **Cursor**: `move_to` only records the target. The CUP sequence is
///   emitted at write time, and only if the terminal cursor is not already
///   there (after a write it sits one column to the right).
/// - **Palette colors**: Skipped if unchanged since the last palette write.
///   A truecolor write or a clear invalidates the tracking.
/// - **Truecolor**: Always emitted, so every truecolor cell reads
///   `ESC[38;2;r;g;bm ESC[48;2;r;g;bm glyph`.
pub struct AnsiSink<W: Write> {
    out: W,
    buf: OutputBuffer,
    viewport: Size,
    probe: Option<SizeProbe>,
    /// Where the next write lands.
    cursor: Position,
    /// Where the terminal's cursor actually is, if known.
    terminal_cursor: Option<Position>,
    palette: Option<(AnsiColor, AnsiColor)>,
    in_frame: bool,
}

impl<W: Write> AnsiSink<W> {
    /// A sink writing to `out`, assuming a device of `viewport`.
    pub fn new(out: W, viewport: Size) -> Self {
        Self {
            out,
            buf: OutputBuffer::new(),
            viewport,
            probe: None,
            cursor: Position::ORIGIN,
            terminal_cursor: None,
            palette: None,
            in_frame: false,
        }
    }

    /// Re-query the live device size through `probe` on every `viewport()`.
    #[must_use]
    pub fn with_probe(mut self, probe: SizeProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    /// The underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.out
    }

    /// Consume the sink, returning the underlying writer. Unflushed output
    /// is discarded.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn forget_terminal_state(&mut self) {
        self.terminal_cursor = None;
        self.palette = None;
    }

    fn begin_frame(&mut self) {
        if !self.in_frame {
            self.buf.extend(ansi::SYNC_BEGIN);
            self.in_frame = true;
        }
    }

    /// Validate the cursor and bring the terminal's cursor to it.
    fn place_cursor(&mut self) -> Result<Position> {
        let position = self.cursor;
        let (Ok(x), Ok(y)) = (u16::try_from(position.x), u16::try_from(position.y)) else {
            return Err(self.out_of_bounds(position));
        };
        if !self.viewport.contains(position) {
            return Err(self.out_of_bounds(position));
        }
        self.begin_frame();
        if self.terminal_cursor != Some(position) {
            ansi::cursor_to(&mut self.buf, x, y).ok();
        }
        Ok(position)
    }

    fn put_glyph(&mut self, position: Position, glyph: char) {
        self.buf.write_char(glyph);
        self.cursor = position.next();
        // Wide and zero-width glyphs move the real cursor by 2 or 0 columns,
        // so the next write re-positions explicitly.
        self.terminal_cursor = (glyph.width() == Some(1)).then_some(self.cursor);
    }

    fn out_of_bounds(&self, position: Position) -> Error {
        Error::OutOfBounds {
            position,
            viewport: self.viewport,
        }
    }
}

impl<W: Write> Sink for AnsiSink<W> {
    fn viewport(&mut self) -> Size {
        if let Some(live) = self.probe.and_then(|probe| probe()) {
            if live != self.viewport {
                tracing::debug!(from = %self.viewport, to = %live, "viewport changed");
                self.viewport = live;
                self.forget_terminal_state();
            }
        }
        self.viewport
    }

    fn set_size(&mut self, size: Size) -> Result<()> {
        ansi::resize_window(&mut self.buf, size.width, size.height)?;
        self.buf.flush_to(&mut self.out)?;
        self.viewport = size;
        self.forget_terminal_state();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.begin_frame();
        self.buf.extend(ansi::RESET);
        self.buf.extend(ansi::CLEAR_SCREEN);
        self.forget_terminal_state();
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.buf.extend(ansi::CURSOR_HIDE);
        Ok(())
    }

    fn move_to(&mut self, position: Position) -> Result<()> {
        if !self.viewport.contains(position) {
            return Err(self.out_of_bounds(position));
        }
        self.cursor = position;
        Ok(())
    }

    fn write_palette(&mut self, glyph: char, fg: AnsiColor, bg: AnsiColor) -> Result<()> {
        let position = self.place_cursor()?;
        match self.palette {
            Some((last_fg, last_bg)) if last_fg == fg && last_bg == bg => {}
            Some((last_fg, _)) if last_fg == fg => ansi::bg_palette(&mut self.buf, bg)?,
            Some((_, last_bg)) if last_bg == bg => ansi::fg_palette(&mut self.buf, fg)?,
            _ => ansi::palette_pair(&mut self.buf, fg, bg)?,
        }
        self.palette = Some((fg, bg));
        self.put_glyph(position, glyph);
        Ok(())
    }

    fn write_truecolor(&mut self, glyph: char, fg: Color, bg: Color) -> Result<()> {
        let position = self.place_cursor()?;
        ansi::fg_rgb(&mut self.buf, fg)?;
        ansi::bg_rgb(&mut self.buf, bg)?;
        self.palette = None;
        self.put_glyph(position, glyph);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.in_frame {
            self.buf.extend(ansi::SYNC_END);
            self.in_frame = false;
        }
        self.buf.flush_to(&mut self.out)?;
        Ok(())
    }
}

impl<W: Write> std::fmt::Debug for AnsiSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsiSink")
            .field("viewport", &self.viewport)
            .field("cursor", &self.cursor)
            .field("pending", &self.buf.len())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
