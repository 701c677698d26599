// SPDX-License-Identifier: MIT
//
// Colors: 24-bit RGB plus the fixed 16-entry terminal palette.
//
// Cells carry exact RGB. How that RGB reaches the screen depends on the
// renderer's color mode:
//
//   TrueColor  `ESC[38;2;r;g;bm` / `ESC[48;2;r;g;bm`, the exact value.
//   Palette    the nearest of the 16 classic SGR colors (30–37, 90–97).
//
// Nearest-color selection is a pure function: minimum sum of squared
// channel differences, ties broken by palette index order. The same input
// always picks the same entry, independent of anything painted before.

use std::fmt;

// ─── Color ───────────────────────────────────────────────────────────────────

/// A 24-bit sRGB color.
///
/// ```
/// use tessera_term::color::Color;
///
/// let c = Color::hex("#fa0505").unwrap();
/// assert_eq!(c, Color::rgb(250, 5, 5));
/// assert_eq!(format!("{c:?}"), "#fa0505");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `#RGB` (the leading `#` is optional).
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        let bytes = s.as_bytes();
        match bytes.len() {
            3 => {
                let r = parse_hex_digit(bytes[0])?;
                let g = parse_hex_digit(bytes[1])?;
                let b = parse_hex_digit(bytes[2])?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb(
                parse_hex_byte(&bytes[0..2])?,
                parse_hex_byte(&bytes[2..4])?,
                parse_hex_byte(&bytes[4..6])?,
            )),
            _ => None,
        }
    }

    /// Sum of squared channel differences.
    #[inline]
    #[must_use]
    pub fn distance_sq(self, other: Self) -> u32 {
        let d = |a: u8, b: u8| {
            let v = u32::from(a.abs_diff(b));
            v * v
        };
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }

    /// The nearest entry of the 16-color palette.
    #[inline]
    #[must_use]
    pub fn nearest_ansi(self) -> AnsiColor {
        AnsiColor::nearest(self)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

// ─── AnsiColor ───────────────────────────────────────────────────────────────

/// The 16 classic terminal colors, in SGR index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnsiColor {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
}

impl AnsiColor {
    /// Every palette entry in index order.
    pub const ALL: [Self; 16] = [
        Self::Black,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
        Self::White,
        Self::BrightBlack,
        Self::BrightRed,
        Self::BrightGreen,
        Self::BrightYellow,
        Self::BrightBlue,
        Self::BrightMagenta,
        Self::BrightCyan,
        Self::BrightWhite,
    ];

    /// Reference RGB values (xterm defaults). Individual terminals may
    /// override these; they only steer nearest-match selection.
    pub const RGB: [Color; 16] = [
        Color::rgb(0, 0, 0),
        Color::rgb(128, 0, 0),
        Color::rgb(0, 128, 0),
        Color::rgb(128, 128, 0),
        Color::rgb(0, 0, 128),
        Color::rgb(128, 0, 128),
        Color::rgb(0, 128, 128),
        Color::rgb(192, 192, 192),
        Color::rgb(128, 128, 128),
        Color::rgb(255, 0, 0),
        Color::rgb(0, 255, 0),
        Color::rgb(255, 255, 0),
        Color::rgb(0, 0, 255),
        Color::rgb(255, 0, 255),
        Color::rgb(0, 255, 255),
        Color::rgb(255, 255, 255),
    ];

    /// Palette index, 0–15.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Reference RGB value of this entry.
    #[inline]
    #[must_use]
    pub const fn to_rgb(self) -> Color {
        Self::RGB[self as usize]
    }

    /// SGR parameter selecting this color as foreground (30–37, 90–97).
    #[inline]
    #[must_use]
    pub const fn fg_code(self) -> u8 {
        let idx = self as u8;
        if idx < 8 { 30 + idx } else { 82 + idx }
    }

    /// SGR parameter selecting this color as background (40–47, 100–107).
    #[inline]
    #[must_use]
    pub const fn bg_code(self) -> u8 {
        self.fg_code() + 10
    }

    /// Nearest palette entry by minimum sum of squared channel differences.
    ///
    /// Ties go to the lower index.
    #[must_use]
    pub fn nearest(color: Color) -> Self {
        let mut best = Self::Black;
        let mut best_dist = u32::MAX;

        for entry in Self::ALL {
            let dist = color.distance_sq(entry.to_rgb());
            if dist < best_dist {
                best_dist = dist;
                best = entry;
            }
        }

        best
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
