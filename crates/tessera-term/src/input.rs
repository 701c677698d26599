// SPDX-License-Identifier: MIT
//
// Terminal input: key decoding and listener dispatch.
//
// `decode` turns a chunk of raw stdin bytes into key events. It covers
// what a form of text fields needs:
//
// - ASCII printable and UTF-8 multi-byte characters
// - Control letters (Ctrl+A … Ctrl+Z), Enter, Tab, Backspace
// - Legacy CSI / SS3 navigation keys, with xterm modifier parameters
//   (`ESC [ 1 ; 5 C` is Ctrl+Right)
// - Alt+key (ESC followed by a printable character)
//
// Decoding is stateless. `read_keys` hands over whatever one `read()`
// returned, so a sequence split across reads decodes as its pieces; a
// trailing lone ESC is the Escape key.
//
// Dispatch: each decoded key is wrapped in an `InputEvent` and offered to
// listeners in order. The first listener that marks it handled stops the
// walk.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

// ─── Key Types ──────────────────────────────────────────────────────────────

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

bitflags! {
    /// Keyboard modifier flags.
    ///
    /// Compatible with xterm CSI modifier encoding, where
    /// `param = 1 + bitmask`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key with no modifiers.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A key with `modifiers`.
    #[must_use]
    pub const fn with(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Ctrl + `letter`.
    #[must_use]
    pub const fn ctrl(letter: char) -> Self {
        Self::with(KeyCode::Char(letter), Modifiers::CTRL)
    }

    #[must_use]
    pub const fn has_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }
}

// ─── Decoding ───────────────────────────────────────────────────────────────

/// Decode every key in `bytes`. Unrecognized sequences are skipped.
///
/// ```
/// use tessera_term::input::{decode, KeyCode, KeyEvent, Modifiers};
///
/// let keys = decode(b"a\x1b[1;5C");
/// assert_eq!(keys, vec![
///     KeyEvent::plain(KeyCode::Char('a')),
///     KeyEvent::with(KeyCode::Right, Modifiers::CTRL),
/// ]);
/// ```
#[must_use]
pub fn decode(bytes: &[u8]) -> Vec<KeyEvent> {
    let mut keys = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        match try_parse(&bytes[pos..]) {
            Parsed::Key(key, consumed) => {
                keys.push(key);
                pos += consumed;
            }
            Parsed::Skip(n) => pos += n.max(1),
        }
    }
    keys
}

/// Result of trying to parse one key from the front of a buffer.
enum Parsed {
    Key(KeyEvent, usize),
    /// Unrecognized byte(s), skip this many.
    Skip(usize),
}

fn try_parse(buf: &[u8]) -> Parsed {
    match buf[0] {
        0x1B => parse_escape(buf),
        0x08 | 0x7F => Parsed::Key(KeyEvent::plain(KeyCode::Backspace), 1),
        0x09 => Parsed::Key(KeyEvent::plain(KeyCode::Tab), 1),
        0x0A | 0x0D => Parsed::Key(KeyEvent::plain(KeyCode::Enter), 1),
        b @ 0x01..=0x1A => Parsed::Key(KeyEvent::ctrl(char::from(b + b'a' - 1)), 1),
        b @ 0x20..=0x7E => Parsed::Key(KeyEvent::plain(KeyCode::Char(char::from(b))), 1),
        0xC0..=0xFF => parse_utf8(buf),
        _ => Parsed::Skip(1),
    }
}

fn parse_escape(buf: &[u8]) -> Parsed {
    let Some(&next) = buf.get(1) else {
        return Parsed::Key(KeyEvent::plain(KeyCode::Escape), 1);
    };
    match next {
        b'[' => parse_csi(buf),
        b'O' => parse_ss3(buf),
        b @ 0x20..=0x7E => Parsed::Key(
            KeyEvent::with(KeyCode::Char(char::from(b)), Modifiers::ALT),
            2,
        ),
        _ => Parsed::Key(KeyEvent::plain(KeyCode::Escape), 1),
    }
}

/// `ESC [ params final`.
fn parse_csi(buf: &[u8]) -> Parsed {
    // Parameter and intermediate bytes are 0x20..=0x3F; the final byte
    // is 0x40..=0x7E.
    let mut end = 2;
    while end < buf.len() {
        let b = buf[end];
        if (0x40..=0x7E).contains(&b) {
            break;
        }
        if !(0x20..=0x3F).contains(&b) {
            return Parsed::Skip(end);
        }
        end += 1;
    }
    if end >= buf.len() {
        return Parsed::Skip(end);
    }

    let params = parse_params(&buf[2..end]);
    let consumed = end + 1;
    let modifiers = params.get(1).map_or(Modifiers::empty(), |&p| decode_modifiers(p));

    let code = match buf[end] {
        b'~' => match params.first().copied().unwrap_or(0) {
            1 | 7 => KeyCode::Home,
            2 => KeyCode::Insert,
            3 => KeyCode::Delete,
            4 | 8 => KeyCode::End,
            5 => KeyCode::PageUp,
            6 => KeyCode::PageDown,
            _ => return Parsed::Skip(consumed),
        },
        b'Z' => return Parsed::Key(KeyEvent::with(KeyCode::Tab, Modifiers::SHIFT), consumed),
        letter => match letter_key(letter) {
            Some(code) => code,
            None => return Parsed::Skip(consumed),
        },
    };
    Parsed::Key(KeyEvent::with(code, modifiers), consumed)
}

/// `ESC O letter`, sent by some terminals in application cursor mode.
fn parse_ss3(buf: &[u8]) -> Parsed {
    match buf.get(2).copied().and_then(letter_key) {
        Some(code) => Parsed::Key(KeyEvent::plain(code), 3),
        None => Parsed::Key(KeyEvent::with(KeyCode::Char('O'), Modifiers::ALT), 2),
    }
}

const fn letter_key(b: u8) -> Option<KeyCode> {
    Some(match b {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        _ => return None,
    })
}

/// Semicolon-separated decimal parameters. Empty fields are 0.
fn parse_params(raw: &[u8]) -> Vec<u16> {
    raw.split(|&b| b == b';')
        .map(|field| {
            field
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .fold(0u16, |acc, &d| acc.saturating_mul(10).saturating_add(u16::from(d - b'0')))
        })
        .collect()
}

/// xterm modifier parameter: `1 + bitmask`.
fn decode_modifiers(param: u16) -> Modifiers {
    let mask = u8::try_from(param.saturating_sub(1)).unwrap_or(0);
    Modifiers::from_bits_truncate(mask)
}

fn parse_utf8(buf: &[u8]) -> Parsed {
    let len = match buf[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Parsed::Skip(1),
    };
    let Some(seq) = buf.get(..len) else {
        return Parsed::Skip(buf.len());
    };
    match std::str::from_utf8(seq).ok().and_then(|s| s.chars().next()) {
        Some(ch) => Parsed::Key(KeyEvent::plain(KeyCode::Char(ch)), len),
        None => Parsed::Skip(1),
    }
}

// ─── Dispatch ───────────────────────────────────────────────────────────────

/// A key travelling through the listener chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub key: KeyEvent,
    /// Set by the listener that consumed the key.
    pub handled: bool,
}

impl InputEvent {
    #[must_use]
    pub const fn new(key: KeyEvent) -> Self {
        Self {
            key,
            handled: false,
        }
    }
}

/// Something that reacts to keys.
pub trait InputListener {
    /// Inspect `event`; set `event.handled` to stop further dispatch.
    fn on_input(&mut self, event: &mut InputEvent);
}

impl<T: InputListener + ?Sized> InputListener for Rc<RefCell<T>> {
    fn on_input(&mut self, event: &mut InputEvent) {
        self.borrow_mut().on_input(event);
    }
}

/// Offer `event` to each listener in order until one handles it.
///
/// Returns whether any listener handled it.
pub fn dispatch(event: &mut InputEvent, listeners: &mut [&mut dyn InputListener]) -> bool {
    for listener in listeners.iter_mut() {
        listener.on_input(event);
        if event.handled {
            return true;
        }
    }
    false
}

// ─── Tests ───────────────────────────────────────────────────────────────────
