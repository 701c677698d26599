// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, alternate screen, resize signal, key reads.
//
// Safety: termios, ioctl(TIOCGWINSZ), isatty, sigaction, poll and read are
// only reachable through libc, so this module allows `unsafe`. Every block
// wraps a single call.
#![allow(unsafe_code)]
//
// `Terminal` is the RAII handle a host holds for the life of the program.
// `enter` puts the tty into raw mode (a `RawMode` guard that restores the
// saved termios when dropped) and switches to the alternate screen;
// `leave` or drop undoes both.
//
// A panic can unwind past the handle while stdout is locked, so the panic
// hook writes its restore bytes straight to fd 1 and resets termios from a
// process-wide copy before the default hook prints.
//
// Nothing here spawns a thread. The host pumps `read_keys`, checks
// `take_resized` and renders in between.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;
#[cfg(unix)]
use std::sync::Mutex;
use std::time::Duration;

use crate::ansi;
use crate::geometry::Size;

/// Used when the OS cannot report a size.
pub const FALLBACK_SIZE: Size = Size::new(80, 24);

/// One `read` worth of input. Keys are a few bytes; pastes can be large.
const READ_CHUNK: usize = 4096;

// ─── errno helpers ──────────────────────────────────────────────────────────

#[cfg(unix)]
fn check(ret: libc::c_int) -> io::Result<()> {
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// A signal interrupting a wait is not a failure, just an empty read.
fn empty_if_interrupted(err: io::Error) -> io::Result<Vec<u8>> {
    if err.kind() == io::ErrorKind::Interrupted {
        Ok(Vec::new())
    } else {
        Err(err)
    }
}

// ─── Queries ────────────────────────────────────────────────────────────────

/// The window size of stdout in cells, or `None` when it is not a tty.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    check(unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) }).ok()?;
    let size = Size::new(ws.ws_col, ws.ws_row);
    (!size.is_empty()).then_some(size)
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Resize signal ──────────────────────────────────────────────────────────

static RESIZED: AtomicBool = AtomicBool::new(false);
static WINCH_HANDLER: Once = Once::new();

#[cfg(unix)]
extern "C" fn on_sigwinch(_: libc::c_int) {
    // An atomic store is async-signal-safe.
    RESIZED.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_sigwinch_handler() {
    WINCH_HANDLER.call_once(|| {
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = on_sigwinch as *const () as usize;
        action.sa_flags = libc::SA_RESTART;
        unsafe {
            libc::sigemptyset(&raw mut action.sa_mask);
            libc::sigaction(libc::SIGWINCH, &raw const action, std::ptr::null_mut());
        }
    });
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {
    WINCH_HANDLER.call_once(|| {});
}

/// Whether a resize arrived since the previous call. Clears the flag.
#[must_use]
pub fn take_resized() -> bool {
    RESIZED.swap(false, Ordering::Relaxed)
}

// ─── Key input ──────────────────────────────────────────────────────────────

/// Block for at most `timeout` waiting for stdin, then return the bytes
/// that are there.
///
/// A timeout or an interrupting signal yields an empty vector.
///
/// # Errors
///
/// Returns an error if `poll` or `read` fails for any other reason.
#[cfg(unix)]
pub fn read_keys(timeout: Duration) -> io::Result<Vec<u8>> {
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    let mut pfd = libc::pollfd {
        fd: libc::STDIN_FILENO,
        events: libc::POLLIN,
        revents: 0,
    };
    match unsafe { libc::poll(&raw mut pfd, 1, millis) } {
        0 => return Ok(Vec::new()),
        n if n < 0 => return empty_if_interrupted(io::Error::last_os_error()),
        _ => {}
    }

    let mut chunk = vec![0u8; READ_CHUNK];
    let read = unsafe { libc::read(libc::STDIN_FILENO, chunk.as_mut_ptr().cast(), chunk.len()) };
    let Ok(len) = usize::try_from(read) else {
        return empty_if_interrupted(io::Error::last_os_error());
    };
    chunk.truncate(len);
    Ok(chunk)
}

#[cfg(not(unix))]
pub fn read_keys(_timeout: Duration) -> io::Result<Vec<u8>> {
    use std::io::Read;

    let mut chunk = vec![0u8; READ_CHUNK];
    let len = io::stdin().lock().read(&mut chunk)?;
    chunk.truncate(len);
    Ok(chunk)
}

// ─── Raw mode ───────────────────────────────────────────────────────────────

/// Saved termios for the panic hook, which cannot reach the `RawMode`.
#[cfg(unix)]
static SAVED_TERMIOS: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Raw mode on stdin until restored or dropped.
#[cfg(unix)]
struct RawMode {
    saved: libc::termios,
    restored: bool,
}

#[cfg(unix)]
impl RawMode {
    /// Switch stdin to raw mode. `None` when stdin is not a tty.
    fn enable() -> io::Result<Option<Self>> {
        if !is_tty() {
            return Ok(None);
        }
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        check(unsafe { libc::tcgetattr(libc::STDIN_FILENO, &raw mut saved) })?;

        let mut termios = saved;
        unsafe { libc::cfmakeraw(&raw mut termios) };
        // read() returns once a byte is there; poll() does the waiting.
        termios.c_cc[libc::VMIN] = 1;
        termios.c_cc[libc::VTIME] = 0;
        check(unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) })?;

        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = Some(saved);
        }
        Ok(Some(Self {
            saved,
            restored: false,
        }))
    }

    fn restore(&mut self) -> io::Result<()> {
        if std::mem::replace(&mut self.restored, true) {
            return Ok(());
        }
        if let Ok(mut slot) = SAVED_TERMIOS.lock() {
            *slot = None;
        }
        check(unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const self.saved)
        })
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(%err, "failed to restore termios");
        }
    }
}

#[cfg(not(unix))]
struct RawMode;

#[cfg(not(unix))]
impl RawMode {
    #[allow(clippy::unnecessary_wraps)]
    const fn enable() -> io::Result<Option<Self>> {
        Ok(None)
    }

    #[allow(clippy::unnecessary_wraps, clippy::unused_self)]
    const fn restore(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Panic restore ──────────────────────────────────────────────────────────

/// Undoes `enter`. Leaving the alternate screen goes last so the shell
/// comes back clean.
const RESTORE: [&[u8]; 4] = [
    ansi::SYNC_END,
    ansi::RESET,
    ansi::CURSOR_SHOW,
    ansi::ALT_SCREEN_EXIT,
];

static PANIC_HOOK: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_after_panic();
            previous(info);
        }));
    });
}

/// Bypasses the stdout lock, which the panicking thread may hold.
#[cfg(unix)]
fn restore_after_panic() {
    for bytes in RESTORE {
        unsafe {
            libc::write(libc::STDOUT_FILENO, bytes.as_ptr().cast(), bytes.len());
        }
    }
    if let Ok(slot) = SAVED_TERMIOS.lock() {
        if let Some(saved) = slot.as_ref() {
            unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, saved) };
        }
    }
}

#[cfg(not(unix))]
fn restore_after_panic() {
    let mut out = io::stdout();
    for bytes in RESTORE {
        out.write_all(bytes).ok();
    }
    out.flush().ok();
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Full-screen session handle.
///
/// ```no_run
/// use tessera_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... pump input, render pending damage ...
/// term.leave()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    raw: Option<RawMode>,
    size: Size,
    active: bool,
}

impl Terminal {
    /// A handle sized from the OS (80×24 when unknown). Does not touch the
    /// terminal until [`enter`](Self::enter).
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: None,
            size: get_size().unwrap_or(FALLBACK_SIZE),
            active: false,
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Ask the OS again. Keeps the old size if it cannot answer.
    pub fn refresh_size(&mut self) -> Size {
        self.size = get_size().unwrap_or(self.size);
        self.size
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Raw mode, alternate screen, hidden cursor, cleared screen. Also
    /// installs the panic hook and the resize handler once per process.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if termios or the terminal write fails.
    pub fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        install_sigwinch_handler();
        self.raw = RawMode::enable()?;

        let mut out = io::stdout().lock();
        out.write_all(&[ansi::ALT_SCREEN_ENTER, ansi::CURSOR_HIDE, ansi::CLEAR_SCREEN].concat())?;
        out.flush()?;

        self.active = true;
        tracing::debug!(size = %self.size, "terminal entered");
        Ok(())
    }

    /// Undo [`enter`](Self::enter). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal write or termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        let mut out = io::stdout().lock();
        out.write_all(&RESTORE.concat())?;
        out.flush()?;
        drop(out);

        if let Some(mut raw) = self.raw.take() {
            raw.restore()?;
        }
        tracing::debug!("terminal restored");
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(err) = self.leave() {
            tracing::warn!(%err, "failed to restore terminal");
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn size_query_is_none_or_non_empty() {
        assert!(get_size().is_none_or(|size| !size.is_empty()));
    }

    #[test]
    fn resize_flag_is_consumed() {
        RESIZED.store(true, Ordering::Relaxed);
        assert!(take_resized());
        assert!(!take_resized());
    }

    #[test]
    fn restore_leaves_alt_screen_last() {
        let bytes = RESTORE.concat();
        assert!(bytes.starts_with(ansi::SYNC_END));
        assert!(bytes.ends_with(ansi::ALT_SCREEN_EXIT));
    }

    #[test]
    fn interrupted_reads_are_empty() {
        let err = io::Error::from(io::ErrorKind::Interrupted);
        assert_eq!(empty_if_interrupted(err).unwrap(), Vec::<u8>::new());
        let err = io::Error::from(io::ErrorKind::BrokenPipe);
        assert!(empty_if_interrupted(err).is_err());
    }

    #[test]
    fn new_terminal_is_inactive() {
        let mut term = Terminal::new();
        assert!(!term.is_active());
        assert!(!term.size().is_empty());
        term.leave().unwrap();
        assert_eq!(term.refresh_size(), term.size());
    }
}
