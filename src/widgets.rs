// SPDX-License-Identifier: MIT
//
// Demo controls built on the tessera-term control protocol.
//
//   Label     one line of static text, sized to its content
//   TextBox   one editable line with a caret or a selection
//   Form      stacks single-row children at fixed rows
//
// Every control keeps its `DrawingContext` and reports changes through it.
// Mutations that touch more than one thing (text plus caret, text plus
// size) run under a freeze guard, so the renderer sees one redraw.

use tessera_term::input::{InputEvent, InputListener, KeyCode, Modifiers};
use tessera_term::{Cell, Color, Control, DrawingContext, Offset, Position, Size};

/// Background behind a collapsed caret.
const CARET_BG: Color = Color::rgb(70, 70, 70);

fn width_of(len: usize) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX)
}

fn column(position: Position) -> Option<usize> {
    if position.y != 0 {
        return None;
    }
    usize::try_from(position.x).ok()
}

// ─── Label ──────────────────────────────────────────────────────────────────

/// Static text on a single row.
#[derive(Debug, Default)]
pub struct Label {
    text: Vec<char>,
    fg: Option<Color>,
    bg: Option<Color>,
    context: DrawingContext,
}

impl Label {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_colors(mut self, fg: Option<Color>, bg: Option<Color>) -> Self {
        self.fg = fg;
        self.bg = bg;
        self
    }

    pub fn set_text(&mut self, text: &str) {
        let _hold = self.context.freeze();
        self.text = text.chars().collect();
        self.relayout();
        self.context.redraw();
    }

    fn relayout(&mut self) {
        self.context.resize(Size::new(width_of(self.text.len()), 1));
    }
}

impl Control for Label {
    fn size(&self) -> Size {
        self.context.size()
    }

    fn cell(&self, position: Position) -> Cell {
        let glyph = column(position).and_then(|x| self.text.get(x).copied());
        Cell {
            glyph,
            fg: self.fg,
            bg: self.bg,
        }
    }

    fn bind(&mut self, context: DrawingContext) {
        self.context = context;
        self.relayout();
    }

    fn set_limits(&mut self, min: Size, max: Size) {
        self.context.set_limits(min, max);
        self.relayout();
    }
}

// ─── TextBox ────────────────────────────────────────────────────────────────

/// A single editable line.
///
/// The caret is a half-open range `start..end` of character indices. An
/// empty range draws as a grey block; a non-empty one draws inverted.
/// Plain Left/Right move a collapsed caret, Ctrl+Left grows the selection
/// to the left and Ctrl+Right grows it to the right.
#[derive(Debug, Default)]
pub struct TextBox {
    text: Vec<char>,
    caret_start: usize,
    caret_end: usize,
    context: DrawingContext,
}

impl TextBox {
    pub fn new(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        let end = text.len();
        Self {
            text,
            caret_start: end,
            caret_end: end,
            context: DrawingContext::dummy(),
        }
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn char_count(&self) -> usize {
        self.text.len()
    }

    pub fn caret_start(&self) -> usize {
        self.caret_start.min(self.text.len())
    }

    pub fn caret_end(&self) -> usize {
        self.caret_end.clamp(self.caret_start(), self.text.len())
    }

    pub fn set_caret(&mut self, start: usize, end: usize) {
        let _hold = self.context.freeze();
        self.caret_start = start;
        self.caret_end = end;
        self.relayout();
        self.context.redraw();
    }

    /// The text plus one trailing column while the caret sits past the end.
    fn editor_size(&self) -> Size {
        let len = self.text.len();
        let width = if self.caret_end() >= len { len + 1 } else { len };
        Size::new(width_of(width), 1)
    }

    fn relayout(&mut self) {
        let size = self.editor_size();
        self.context.resize(size);
    }

    /// Replace the selection (or nothing, at a collapsed caret) with `ch`.
    fn insert(&mut self, ch: char) {
        let (start, end) = (self.caret_start(), self.caret_end());
        self.text.splice(start..end, [ch]);
        self.caret_start = start + 1;
        self.caret_end = start + 1;
    }

    /// Apply one key. Returns whether the key meant something here.
    fn apply(&mut self, code: KeyCode, modifiers: Modifiers) -> bool {
        let (start, end) = (self.caret_start(), self.caret_end());
        let len = self.text.len();
        let ctrl = modifiers.contains(Modifiers::CTRL);

        match code {
            KeyCode::Left if ctrl => self.caret_start = start.saturating_sub(1),
            KeyCode::Left => {
                let at = start.saturating_sub(1);
                self.caret_start = at;
                self.caret_end = at;
            }
            KeyCode::Right if ctrl => self.caret_end = (end + 1).min(len),
            KeyCode::Right => {
                let at = (end + 1).min(len);
                self.caret_start = at;
                self.caret_end = at;
            }
            KeyCode::Backspace | KeyCode::Delete if start != end => {
                self.text.drain(start..end);
                self.caret_end = start;
            }
            KeyCode::Backspace if start > 0 => {
                self.text.remove(start - 1);
                self.caret_start = start - 1;
                self.caret_end = start - 1;
            }
            KeyCode::Delete if start < len => {
                self.text.remove(start);
            }
            KeyCode::Backspace | KeyCode::Delete => {}
            KeyCode::Char(ch) if !ctrl && !ch.is_control() => self.insert(ch),
            _ => return false,
        }
        true
    }
}

impl Control for TextBox {
    fn size(&self) -> Size {
        self.context.size()
    }

    fn cell(&self, position: Position) -> Cell {
        let Some(x) = column(position) else {
            return Cell::EMPTY;
        };
        if !self.editor_size().contains(position) {
            return Cell::EMPTY;
        }

        let glyph = self.text.get(x).copied();
        let (start, end) = (self.caret_start(), self.caret_end());
        let cell = Cell::EMPTY.with_glyph(glyph);
        if x == start && x == end {
            cell.with_bg(CARET_BG)
        } else if (start..end).contains(&x) {
            cell.with_fg(Color::BLACK).with_bg(Color::WHITE)
        } else {
            cell
        }
    }

    fn bind(&mut self, context: DrawingContext) {
        self.context = context;
        self.relayout();
    }

    fn set_limits(&mut self, min: Size, max: Size) {
        self.context.set_limits(min, max);
        self.relayout();
    }
}

impl InputListener for TextBox {
    fn on_input(&mut self, event: &mut InputEvent) {
        let _hold = self.context.freeze();
        if !self.apply(event.key.code, event.key.modifiers) {
            return;
        }
        self.relayout();
        self.context.redraw();
        event.handled = true;
    }
}

// ─── Form ───────────────────────────────────────────────────────────────────

/// Single-row children pinned to fixed rows, each as wide as the form.
#[derive(Default)]
pub struct Form {
    rows: Vec<(u16, Box<dyn Control>)>,
    context: DrawingContext,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `control` at `row`. A later control on the same row wins.
    #[must_use]
    pub fn row(mut self, row: u16, control: Box<dyn Control>) -> Self {
        self.rows.retain(|(taken, _)| *taken != row);
        self.rows.push((row, control));
        self.rebind();
        self
    }

    fn child_limits(&self) -> Size {
        Size::new(self.context.size().width, 1)
    }

    fn rebind(&mut self) {
        let limits = self.child_limits();
        for (row, child) in &mut self.rows {
            child.bind(self.context.child(Offset::new(0, i32::from(*row))));
            child.set_limits(Size::ZERO, limits);
        }
    }
}

impl Control for Form {
    fn size(&self) -> Size {
        self.context.size()
    }

    fn cell(&self, position: Position) -> Cell {
        self.rows
            .iter()
            .find(|(row, _)| i32::from(*row) == position.y)
            .map_or(Cell::EMPTY, |(_, child)| {
                child.cell_or_empty(Position::new(position.x, 0))
            })
    }

    fn bind(&mut self, context: DrawingContext) {
        self.context = context;
        self.rebind();
    }

    fn set_limits(&mut self, min: Size, max: Size) {
        let _hold = self.context.freeze();
        self.context.set_limits(min, max);
        self.context.resize(max);
        let limits = self.child_limits();
        for (_, child) in &mut self.rows {
            child.set_limits(Size::ZERO, limits);
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Form")
            .field("rows", &self.rows.iter().map(|(row, _)| *row).collect::<Vec<_>>())
            .field("context", &self.context)
            .finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
