// SPDX-License-Identifier: MIT
//
// ANSI escape sequences.
//
// Fixed sequences are byte constants; anything with a parameter is a small
// writer over `impl Write`. Nothing here tracks state or decides whether a
// sequence is needed. That is `AnsiSink`'s job.
//
// Grid coordinates are 0-based. CUP is 1-based, so `cursor_to` adds one.

use std::io::{self, Write};

use crate::color::{AnsiColor, Color};

// ─── Fixed sequences ────────────────────────────────────────────────────────

/// DECTCEM reset.
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";
/// DECTCEM set.
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";
/// ED 2: erase the whole display.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[2J";
/// SGR 0. Whoever tracks colors must forget them after this.
pub const RESET: &[u8] = b"\x1b[0m";
/// DEC mode 2026: hold output until [`SYNC_END`] so a frame never shows
/// half-painted. Ignored by terminals that lack it.
pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";
pub const SYNC_END: &[u8] = b"\x1b[?2026l";
/// DEC mode 1049: alternate screen, saving the primary one.
pub const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";
pub const ALT_SCREEN_EXIT: &[u8] = b"\x1b[?1049l";

// ─── Parameterized ──────────────────────────────────────────────────────────

/// CUP to the 0-based cell `(x, y)`.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    let (row, col) = (u32::from(y) + 1, u32::from(x) + 1);
    write!(w, "\x1b[{row};{col}H")
}

/// xterm window op 8: ask for a `width` × `height` text area. The terminal
/// may refuse, so the caller re-reads the size afterwards.
#[inline]
pub fn resize_window(w: &mut impl Write, width: u16, height: u16) -> io::Result<()> {
    write!(w, "\x1b[8;{height};{width}t")
}

#[inline]
pub fn fg_rgb(w: &mut impl Write, Color { r, g, b }: Color) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

#[inline]
pub fn bg_rgb(w: &mut impl Write, Color { r, g, b }: Color) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}

/// SGR 30–37 / 90–97.
#[inline]
pub fn fg_palette(w: &mut impl Write, color: AnsiColor) -> io::Result<()> {
    write!(w, "\x1b[{}m", color.fg_code())
}

/// SGR 40–47 / 100–107.
#[inline]
pub fn bg_palette(w: &mut impl Write, color: AnsiColor) -> io::Result<()> {
    write!(w, "\x1b[{}m", color.bg_code())
}

/// Both palette colors in a single SGR.
#[inline]
pub fn palette_pair(w: &mut impl Write, fg: AnsiColor, bg: AnsiColor) -> io::Result<()> {
    write!(w, "\x1b[{};{}m", fg.fg_code(), bg.bg_code())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
