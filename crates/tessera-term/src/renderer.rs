// SPDX-License-Identifier: MIT
//
// Renderer: turns invalidation notifications into minimal terminal writes.
//
// The renderer owns everything stateful between the control tree and the
// device: the frame buffer, the content root, the freeze lock, and the
// inbox that collects damage. One pass:
//
//   1. Drain the inbox: nothing, a list of rectangles, or "everything".
//   2. Clip each rectangle to the sink's *current* viewport. The control
//      tree may still believe in an older size; that is expected.
//   3. Walk the clipped rectangle row-major. For each position, ask the
//      content for its cell (blank outside the content), diff it through
//      the frame buffer, and paint it only if it changed.
//
// Painting resolves defaults, swaps a newline glyph for a blank (a literal
// line break would move the terminal cursor), positions the cursor and
// writes the glyph in the configured color mode. A write that lands
// outside the viewport (the window shrank mid-pass) is dropped and the
// pass carries on. I/O errors end the pass.
//
// Notifications never paint directly. Controls call into their drawing
// context while they are mutably borrowed, so the inbox only records what
// is dirty and the host calls `render_pending` once its mutation is done.
//
// Freeze: while the lock is held, the inbox drops every notification it
// receives. Releasing the outermost hold sends one full redraw.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::buffer::FrameBuffer;
use crate::cell::{Cell, ResolvedCell};
use crate::color::AnsiColor;
use crate::context::{Control, DrawingContext, Listener};
use crate::error::{Error, Result};
use crate::freeze::{FreezeGuard, FreezeLock};
use crate::geometry::{Position, Rect, Size};
use crate::sink::Sink;

// ─── Options ─────────────────────────────────────────────────────────────────

/// How colors reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Exact 24-bit foreground and background on every cell.
    #[default]
    TrueColor,
    /// Nearest entry of the 16-color palette.
    Palette,
}

/// Paint policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub color_mode: ColorMode,
    /// Never write the bottom-right cell of the viewport. Many terminals
    /// scroll when that cell is written.
    pub skip_last_cell: bool,
}

/// What one pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Cells written to the sink.
    pub painted: usize,
    /// Cells the frame buffer already had.
    pub unchanged: usize,
    /// Cells whose write fell outside the viewport.
    pub dropped: usize,
}

impl RenderStats {
    /// Cells visited.
    #[must_use]
    pub const fn visited(&self) -> usize {
        self.painted + self.unchanged + self.dropped
    }
}

impl std::ops::AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.painted += rhs.painted;
        self.unchanged += rhs.unchanged;
        self.dropped += rhs.dropped;
    }
}

// ─── Inbox ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Clean,
    Partial(Vec<Rect>),
    Full,
}

/// The single listener every bound drawing context reports to.
struct Inbox {
    freeze: Rc<FreezeLock>,
    pending: RefCell<Pending>,
}

impl Inbox {
    fn take(&self) -> Pending {
        std::mem::replace(&mut *self.pending.borrow_mut(), Pending::Clean)
    }
}

impl Listener for Inbox {
    fn on_redraw(&self) {
        if self.freeze.is_frozen() {
            return;
        }
        *self.pending.borrow_mut() = Pending::Full;
    }

    fn on_update(&self, rect: Rect) {
        if self.freeze.is_frozen() {
            return;
        }
        let mut pending = self.pending.borrow_mut();
        match &mut *pending {
            Pending::Full => {}
            Pending::Partial(rects) => rects.push(rect),
            Pending::Clean => *pending = Pending::Partial(vec![rect]),
        }
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Differential renderer for one full-screen grid and one content root.
///
/// ```
/// use tessera_term::geometry::{Position, Size};
/// use tessera_term::renderer::{RenderOptions, Renderer};
/// use tessera_term::sink::MemorySink;
///
/// let mut renderer = Renderer::new(MemorySink::new(Size::new(4, 2)), RenderOptions::default());
/// let stats = renderer.setup().unwrap();
/// assert_eq!(stats.painted, 8);
///
/// // Nothing changed since, so nothing is written.
/// renderer.on_redraw();
/// assert_eq!(renderer.render_pending().unwrap().painted, 0);
/// ```
pub struct Renderer<S: Sink> {
    sink: S,
    buffer: FrameBuffer,
    content: Option<Box<dyn Control>>,
    inbox: Rc<Inbox>,
    freeze: Rc<FreezeLock>,
    options: RenderOptions,
    /// Size imposed on the content root at the last initialization.
    root_size: Size,
}

impl<S: Sink> Renderer<S> {
    /// A renderer writing to `sink`. Nothing is drawn until [`setup`](Self::setup).
    pub fn new(sink: S, options: RenderOptions) -> Self {
        let freeze = Rc::new(FreezeLock::new());
        let inbox = Rc::new(Inbox {
            freeze: Rc::clone(&freeze),
            pending: RefCell::new(Pending::Clean),
        });
        let target: Rc<dyn Listener> = inbox.clone();
        freeze.set_target(Rc::downgrade(&target));

        Self {
            sink,
            buffer: FrameBuffer::default(),
            content: None,
            inbox,
            freeze,
            options,
            root_size: Size::ZERO,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Adopt the device's current size, clear it and draw everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn setup(&mut self) -> Result<RenderStats> {
        let size = self.sink.viewport();
        tracing::debug!(%size, "renderer setup");
        self.sink.set_size(size)?;
        self.sink.hide_cursor()?;
        self.initialize(size)
    }

    /// Resize the device to `size`, then start over at the size it reports.
    ///
    /// The device first shrinks to 1×1, since some backends reject a
    /// buffer smaller than the current window.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn resize(&mut self, size: Size) -> Result<RenderStats> {
        tracing::debug!(%size, "renderer resize");
        self.sink.set_size(Size::MIN)?;
        self.sink.set_size(size)?;
        let actual = self.sink.viewport();
        self.initialize(actual)
    }

    /// Start over at the device's current size, after an external resize.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub fn refresh(&mut self) -> Result<RenderStats> {
        let size = self.sink.viewport();
        tracing::debug!(%size, "renderer refresh");
        self.initialize(size)
    }

    /// Forget all painted state, impose `size` on the content and repaint.
    fn initialize(&mut self, size: Size) -> Result<RenderStats> {
        self.buffer.initialize(size);
        self.sink.clear()?;
        self.root_size = size;
        {
            let _hold = self.freeze.hold();
            if let Some(content) = self.content.as_mut() {
                content.set_limits(size, size);
            }
        }
        self.render_pending()
    }

    // ── Content ─────────────────────────────────────────────────────────

    /// Install `control` as the content root, returning the previous one.
    ///
    /// The previous control is re-bound to a dummy context, so it no
    /// longer reports here. The new one is sized to the current root size
    /// and a full redraw is queued.
    pub fn set_content(&mut self, mut control: Box<dyn Control>) -> Option<Box<dyn Control>> {
        let previous = self.detach_content();

        let listener: Rc<dyn Listener> = self.inbox.clone();
        {
            let _hold = self.freeze.hold();
            control.bind(DrawingContext::root(listener, Rc::clone(&self.freeze)));
            control.set_limits(self.root_size, self.root_size);
        }
        tracing::debug!(size = %control.size(), "content installed");
        self.content = Some(control);
        previous
    }

    /// Remove the content root. The screen blanks on the next pass.
    pub fn take_content(&mut self) -> Option<Box<dyn Control>> {
        let previous = self.detach_content();
        self.inbox.on_redraw();
        previous
    }

    fn detach_content(&mut self) -> Option<Box<dyn Control>> {
        let mut previous = self.content.take()?;
        previous.bind(DrawingContext::dummy());
        tracing::debug!("content detached");
        Some(previous)
    }

    #[must_use]
    pub fn content(&self) -> Option<&dyn Control> {
        self.content.as_deref()
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Mark the whole root dirty. Dropped while frozen.
    pub fn on_redraw(&self) {
        self.inbox.on_redraw();
    }

    /// Mark `rect` (root coordinates) dirty. Dropped while frozen.
    pub fn on_update(&self, rect: Rect) {
        self.inbox.on_update(rect);
    }

    /// Hold the freeze lock until the guard drops.
    pub fn freeze(&self) -> FreezeGuard {
        self.freeze.hold()
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.freeze.is_frozen()
    }

    /// Paint everything reported since the last pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails with anything other than an
    /// out-of-viewport write.
    pub fn render_pending(&mut self) -> Result<RenderStats> {
        let mut stats = RenderStats::default();
        match self.inbox.take() {
            Pending::Clean => return Ok(stats),
            Pending::Full => stats += self.paint(self.root_size.as_rect())?,
            Pending::Partial(rects) => {
                for rect in rects {
                    stats += self.paint(rect)?;
                }
            }
        }
        self.sink.flush()?;
        tracing::debug!(
            painted = stats.painted,
            unchanged = stats.unchanged,
            dropped = stats.dropped,
            "render pass"
        );
        Ok(stats)
    }

    // ── Options ─────────────────────────────────────────────────────────

    #[must_use]
    pub const fn options(&self) -> RenderOptions {
        self.options
    }

    /// Switch color mode. Painted history was emitted under the other mode,
    /// so the frame buffer is reset and a full redraw queued.
    pub fn set_color_mode(&mut self, mode: ColorMode) {
        if self.options.color_mode == mode {
            return;
        }
        tracing::debug!(?mode, "color mode changed");
        self.options.color_mode = mode;
        self.buffer.initialize(self.buffer.size());
        self.inbox.on_redraw();
    }

    /// Toggle bottom-right cell suppression and queue a full redraw.
    pub fn set_skip_last_cell(&mut self, skip: bool) {
        self.options.skip_last_cell = skip;
        self.inbox.on_redraw();
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Size imposed on the content root.
    #[must_use]
    pub const fn root_size(&self) -> Size {
        self.root_size
    }

    #[must_use]
    pub const fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    // ── Paint ───────────────────────────────────────────────────────────

    fn paint(&mut self, rect: Rect) -> Result<RenderStats> {
        let viewport = self.sink.viewport();
        let area = rect.intersect(viewport.as_rect());
        let last = (self.options.skip_last_cell && !viewport.is_empty()).then(|| {
            Position::new(
                i32::from(viewport.width) - 1,
                i32::from(viewport.height) - 1,
            )
        });

        let mut stats = RenderStats::default();
        for position in area {
            if Some(position) == last {
                continue;
            }
            let cell = self
                .content
                .as_ref()
                .map_or(Cell::EMPTY, |content| content.cell_or_empty(position));
            if !self.buffer.update(position, &cell) {
                stats.unchanged += 1;
                continue;
            }
            match paint_cell(&mut self.sink, self.options.color_mode, position, cell.resolve()) {
                Ok(()) => stats.painted += 1,
                Err(err @ Error::OutOfBounds { .. }) => {
                    tracing::trace!(%err, "dropped write");
                    stats.dropped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(stats)
    }
}

fn paint_cell<S: Sink>(
    sink: &mut S,
    mode: ColorMode,
    position: Position,
    cell: ResolvedCell,
) -> Result<()> {
    let glyph = if cell.glyph == '\n' { ' ' } else { cell.glyph };
    sink.move_to(position)?;
    match mode {
        ColorMode::TrueColor => sink.write_truecolor(glyph, cell.fg, cell.bg),
        ColorMode::Palette => {
            sink.write_palette(glyph, AnsiColor::nearest(cell.fg), AnsiColor::nearest(cell.bg))
        }
    }
}

impl<S: Sink + std::fmt::Debug> std::fmt::Debug for Renderer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("sink", &self.sink)
            .field("buffer", &self.buffer)
            .field("options", &self.options)
            .field("root_size", &self.root_size)
            .field("frozen", &self.freeze.is_frozen())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::sink::{MemorySink, Paint, SinkOp};
    use pretty_assertions::assert_eq;
    use std::io;

    /// Fixed-size control holding one glyph per position.
    struct Canvas {
        want: Size,
        rows: Vec<Vec<Cell>>,
        context: DrawingContext,
    }

    impl Canvas {
        fn new(width: u16, height: u16, fill: char) -> Self {
            Self {
                want: Size::new(width, height),
                rows: vec![vec![Cell::new(fill); usize::from(width)]; usize::from(height)],
                context: DrawingContext::dummy(),
            }
        }

        fn set(&mut self, x: i32, y: i32, cell: Cell) {
            self.rows[y as usize][x as usize] = cell;
            self.context.update(Rect::new(x, y, 1, 1));
        }
    }

    impl Control for Canvas {
        fn size(&self) -> Size {
            self.context.size()
        }

        fn cell(&self, position: Position) -> Cell {
            self.rows
                .get(position.y as usize)
                .and_then(|row| row.get(position.x as usize))
                .copied()
                .unwrap_or(Cell::EMPTY)
        }

        fn bind(&mut self, context: DrawingContext) {
            self.context = context;
        }

        fn set_limits(&mut self, min: Size, max: Size) {
            self.context.set_limits(min, max);
            self.context.resize(self.want);
        }
    }

    fn renderer(width: u16, height: u16) -> Renderer<MemorySink> {
        Renderer::new(MemorySink::new(Size::new(width, height)), RenderOptions::default())
    }

    fn shared(canvas: Canvas) -> (Rc<RefCell<Canvas>>, Box<dyn Control>) {
        let shared = Rc::new(RefCell::new(canvas));
        let boxed: Box<dyn Control> = Box::new(Rc::clone(&shared));
        (shared, boxed)
    }

    // ── Setup ───────────────────────────────────────────────────────────

    #[test]
    fn setup_paints_every_cell_once() {
        let mut r = renderer(10, 3);
        let stats = r.setup().unwrap();
        assert_eq!(stats.painted, 30);
        assert_eq!(r.buffer().known_cells(), 30);

        let ops = r.sink().ops();
        assert_eq!(ops[0], SinkOp::SetSize(Size::new(10, 3)));
        assert_eq!(ops[1], SinkOp::HideCursor);
        assert_eq!(ops[2], SinkOp::Clear);
        assert_eq!(ops.last(), Some(&SinkOp::Flush));
    }

    #[test]
    fn setup_sizes_content_to_viewport() {
        let mut r = renderer(20, 5);
        let (canvas, boxed) = shared(Canvas::new(3, 1, 'x'));
        r.set_content(boxed);
        r.setup().unwrap();
        assert_eq!(canvas.borrow().size(), Size::new(20, 5));
        assert_eq!(r.root_size(), Size::new(20, 5));
    }

    #[test]
    fn idle_pass_writes_nothing() {
        let mut r = renderer(4, 4);
        r.setup().unwrap();
        r.sink_mut().take_ops();
        assert_eq!(r.render_pending().unwrap(), RenderStats::default());
        assert!(r.sink().ops().is_empty());
    }

    // ── Damage ──────────────────────────────────────────────────────────

    #[test]
    fn update_repaints_only_changed_cells() {
        let mut r = renderer(5, 2);
        let (canvas, boxed) = shared(Canvas::new(5, 2, '.'));
        r.set_content(boxed);
        r.setup().unwrap();
        r.sink_mut().take_ops();

        canvas.borrow_mut().set(3, 1, Cell::new('#'));
        let stats = r.render_pending().unwrap();
        assert_eq!(stats.painted, 1);
        assert_eq!(r.sink().written(), vec![Position::new(3, 1)]);
        assert_eq!(r.sink().glyph_at(Position::new(3, 1)), Some('#'));
    }

    #[test]
    fn full_redraw_of_unchanged_content_is_all_unchanged() {
        let mut r = renderer(5, 2);
        r.set_content(Box::new(Canvas::new(5, 2, '.')));
        r.setup().unwrap();

        r.on_redraw();
        let stats = r.render_pending().unwrap();
        assert_eq!(stats.painted, 0);
        assert_eq!(stats.unchanged, 10);
    }

    #[test]
    fn full_absorbs_partial() {
        let mut r = renderer(3, 3);
        r.setup().unwrap();
        r.on_update(Rect::new(0, 0, 1, 1));
        r.on_redraw();
        r.on_update(Rect::new(1, 1, 1, 1));
        assert_eq!(r.render_pending().unwrap().visited(), 9);
    }

    #[test]
    fn update_outside_viewport_is_clipped() {
        let mut r = renderer(3, 3);
        r.setup().unwrap();
        r.on_update(Rect::new(2, 2, 10, 10));
        let stats = r.render_pending().unwrap();
        assert_eq!(stats.visited(), 1);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn missing_cells_paint_blank() {
        let mut r = renderer(4, 1);
        let mut canvas = Canvas::new(4, 1, 'x');
        canvas.rows[0].truncate(2);
        r.set_content(Box::new(canvas));
        r.setup().unwrap();
        assert_eq!(r.sink().row_text(0), "xx  ");
    }

    // ── Freeze ──────────────────────────────────────────────────────────

    #[test]
    fn frozen_updates_become_one_full_redraw() {
        let mut r = renderer(4, 2);
        let (canvas, boxed) = shared(Canvas::new(4, 2, '.'));
        r.set_content(boxed);
        r.setup().unwrap();

        {
            let _outer = r.freeze();
            let _inner = r.freeze();
            canvas.borrow_mut().set(0, 0, Cell::new('a'));
            canvas.borrow_mut().set(1, 0, Cell::new('b'));
            assert!(r.is_frozen());
        }
        assert!(!r.is_frozen());

        let stats = r.render_pending().unwrap();
        assert_eq!(stats.visited(), 8);
        assert_eq!(stats.painted, 2);
        assert_eq!(r.sink().row_text(0), "ab..");
    }

    #[test]
    fn notifications_while_frozen_are_dropped() {
        let mut r = renderer(4, 2);
        r.setup().unwrap();
        let hold = r.freeze();
        r.on_update(Rect::new(0, 0, 1, 1));
        r.on_redraw();
        assert_eq!(r.render_pending().unwrap(), RenderStats::default());
        drop(hold);
    }

    // ── Paint policy ────────────────────────────────────────────────────

    #[test]
    fn skip_last_cell_never_writes_bottom_right() {
        let mut r = Renderer::new(
            MemorySink::new(Size::new(6, 3)),
            RenderOptions {
                skip_last_cell: true,
                ..RenderOptions::default()
            },
        );
        r.setup().unwrap();
        assert!(!r.sink().written().contains(&Position::new(5, 2)));
        assert_eq!(r.sink().written().len(), 17);
    }

    #[test]
    fn newline_is_painted_as_blank() {
        let mut r = renderer(3, 1);
        r.set_content(Box::new(Canvas::new(3, 1, '\n')));
        r.setup().unwrap();
        assert_eq!(r.sink().row_text(0), "   ");
        assert_eq!(r.sink().written().len(), 3);
    }

    #[test]
    fn truecolor_writes_exact_resolved_colors() {
        let mut r = renderer(1, 1);
        let red = Color::rgb(250, 5, 5);
        r.set_content(Box::new(Canvas::new(1, 1, 'r')));
        r.setup().unwrap();
        assert_eq!(
            r.sink().paint_at(Position::ORIGIN),
            Some(Paint::TrueColor {
                fg: Color::WHITE,
                bg: Color::BLACK,
            })
        );

        let mut r = renderer(1, 1);
        let mut canvas = Canvas::new(1, 1, 'r');
        canvas.rows[0][0] = Cell::new('r').with_fg(red);
        r.set_content(Box::new(canvas));
        r.setup().unwrap();
        assert_eq!(
            r.sink().paint_at(Position::ORIGIN),
            Some(Paint::TrueColor {
                fg: red,
                bg: Color::BLACK,
            })
        );
    }

    #[test]
    fn palette_mode_uses_nearest_entries() {
        let mut r = renderer(2, 1);
        r.set_color_mode(ColorMode::Palette);
        let mut canvas = Canvas::new(2, 1, 'p');
        canvas.rows[0][0] = Cell::new('p').with_fg(Color::rgb(250, 5, 5));
        r.set_content(Box::new(canvas));
        r.setup().unwrap();
        assert_eq!(
            r.sink().paint_at(Position::ORIGIN),
            Some(Paint::Palette {
                fg: AnsiColor::BrightRed,
                bg: AnsiColor::Black,
            })
        );
    }

    #[test]
    fn color_mode_switch_repaints_everything() {
        let mut r = renderer(3, 2);
        r.setup().unwrap();
        r.set_color_mode(ColorMode::Palette);
        assert_eq!(r.render_pending().unwrap().painted, 6);
        assert!(matches!(
            r.sink().paint_at(Position::ORIGIN),
            Some(Paint::Palette { .. })
        ));

        r.set_color_mode(ColorMode::Palette);
        assert_eq!(r.render_pending().unwrap(), RenderStats::default());
    }

    // ── Resize ──────────────────────────────────────────────────────────

    #[test]
    fn resize_shrinks_to_minimum_first() {
        let mut r = renderer(10, 4);
        r.setup().unwrap();
        let stats = r.resize(Size::new(6, 2)).unwrap();
        assert_eq!(
            r.sink().resizes(),
            &[Size::new(10, 4), Size::MIN, Size::new(6, 2)]
        );
        assert_eq!(stats.painted, 12);
        assert_eq!(r.buffer().size(), Size::new(6, 2));
    }

    #[test]
    fn external_shrink_is_clipped() {
        let mut r = renderer(10, 4);
        r.setup().unwrap();
        r.sink_mut().set_viewport(Size::new(5, 2));
        r.on_redraw();
        let stats = r.render_pending().unwrap();
        assert_eq!(stats.visited(), 10);
        assert_eq!(stats.dropped, 0);

        let stats = r.refresh().unwrap();
        assert_eq!(stats.painted, 10);
        assert_eq!(r.root_size(), Size::new(5, 2));
    }

    // ── Content replacement ─────────────────────────────────────────────

    #[test]
    fn replacing_content_detaches_the_old_control() {
        let mut r = renderer(4, 1);
        let (first, boxed) = shared(Canvas::new(4, 1, 'a'));
        r.set_content(boxed);
        r.setup().unwrap();
        assert!(first.borrow().context.is_bound());

        let old = r.set_content(Box::new(Canvas::new(4, 1, 'b')));
        assert!(old.is_some());
        assert!(!first.borrow().context.is_bound());

        r.render_pending().unwrap();
        assert_eq!(r.sink().row_text(0), "bbbb");

        // The old control no longer reaches the renderer.
        first.borrow_mut().set(0, 0, Cell::new('z'));
        assert_eq!(r.render_pending().unwrap(), RenderStats::default());
    }

    #[test]
    fn take_content_blanks_the_screen() {
        let mut r = renderer(2, 1);
        r.set_content(Box::new(Canvas::new(2, 1, 'q')));
        r.setup().unwrap();
        assert!(r.take_content().is_some());
        assert!(r.content().is_none());
        r.render_pending().unwrap();
        assert_eq!(r.sink().row_text(0), "  ");
    }

    // ── Errors ──────────────────────────────────────────────────────────

    /// Reports a viewport larger than it accepts, like a device that
    /// shrank while a pass was running.
    struct Shrinking {
        inner: MemorySink,
        reported: Size,
    }

    impl Sink for Shrinking {
        fn viewport(&mut self) -> Size {
            self.reported
        }
        fn set_size(&mut self, _size: Size) -> Result<()> {
            Ok(())
        }
        fn clear(&mut self) -> Result<()> {
            self.inner.clear()
        }
        fn hide_cursor(&mut self) -> Result<()> {
            self.inner.hide_cursor()
        }
        fn move_to(&mut self, position: Position) -> Result<()> {
            self.inner.move_to(position)
        }
        fn write_palette(&mut self, glyph: char, fg: AnsiColor, bg: AnsiColor) -> Result<()> {
            self.inner.write_palette(glyph, fg, bg)
        }
        fn write_truecolor(&mut self, glyph: char, fg: Color, bg: Color) -> Result<()> {
            self.inner.write_truecolor(glyph, fg, bg)
        }
        fn flush(&mut self) -> Result<()> {
            self.inner.flush()
        }
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let sink = Shrinking {
            inner: MemorySink::new(Size::new(2, 2)),
            reported: Size::new(4, 2),
        };
        let mut r = Renderer::new(sink, RenderOptions::default());
        let stats = r.setup().unwrap();
        assert_eq!(stats.painted, 4);
        assert_eq!(stats.dropped, 4);
    }

    struct Broken;

    impl Sink for Broken {
        fn viewport(&mut self) -> Size {
            Size::new(2, 1)
        }
        fn set_size(&mut self, _size: Size) -> Result<()> {
            Ok(())
        }
        fn clear(&mut self) -> Result<()> {
            Ok(())
        }
        fn hide_cursor(&mut self) -> Result<()> {
            Ok(())
        }
        fn move_to(&mut self, _position: Position) -> Result<()> {
            Ok(())
        }
        fn write_palette(&mut self, _: char, _: AnsiColor, _: AnsiColor) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into())
        }
        fn write_truecolor(&mut self, _: char, _: Color, _: Color) -> Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed").into())
        }
        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_errors_propagate() {
        let mut r = Renderer::new(Broken, RenderOptions::default());
        let err = r.setup().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    // ── Options ─────────────────────────────────────────────────────────

    #[test]
    fn options_deserialize_kebab_case() {
        let opts: RenderOptions = serde::Deserialize::deserialize(
            serde::de::value::MapDeserializer::<_, serde::de::value::Error>::new(
                [("color_mode", "palette")].into_iter(),
            ),
        )
        .unwrap();
        assert_eq!(opts.color_mode, ColorMode::Palette);
        assert!(!opts.skip_last_cell);
    }
}
