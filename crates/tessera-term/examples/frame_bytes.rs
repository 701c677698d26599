// SPDX-License-Identifier: MIT
//
// Shows what diffing saves: renders a small grid into an in-memory ANSI
// sink, changes one cell, and prints the bytes each pass produced.
//
//   cargo run -p tessera-term --example frame_bytes

use std::cell::RefCell;
use std::rc::Rc;

use tessera_term::{
    AnsiSink, Cell, Color, Control, DrawingContext, Position, Rect, RenderOptions, Renderer, Size,
};

/// A checkerboard with one movable marker.
struct Board {
    marker: Position,
    context: DrawingContext,
}

impl Board {
    fn move_marker(&mut self, to: Position) {
        let from = std::mem::replace(&mut self.marker, to);
        self.context.update(Rect::new(from.x, from.y, 1, 1));
        self.context.update(Rect::new(to.x, to.y, 1, 1));
    }
}

impl Control for Board {
    fn size(&self) -> Size {
        self.context.size()
    }

    fn cell(&self, position: Position) -> Cell {
        if position == self.marker {
            return Cell::new('@').with_fg(Color::rgb(255, 200, 0));
        }
        let shade = if (position.x + position.y) % 2 == 0 { 40 } else { 20 };
        Cell::new('.').with_bg(Color::rgb(shade, shade, shade))
    }

    fn bind(&mut self, context: DrawingContext) {
        self.context = context;
    }

    fn set_limits(&mut self, min: Size, max: Size) {
        self.context.set_limits(min, max);
        self.context.resize(max);
    }
}

fn main() -> tessera_term::Result<()> {
    let size = Size::new(40, 12);
    let board = Rc::new(RefCell::new(Board {
        marker: Position::ORIGIN,
        context: DrawingContext::dummy(),
    }));

    let mut renderer = Renderer::new(AnsiSink::new(Vec::new(), size), RenderOptions::default());
    renderer.set_content(Box::new(Rc::clone(&board)));

    let stats = renderer.setup()?;
    let full = renderer.sink().get_ref().len();
    println!("setup:       {:>6} bytes, {} cells painted", full, stats.painted);

    board.borrow_mut().move_marker(Position::new(5, 3));
    let stats = renderer.render_pending()?;
    let step = renderer.sink().get_ref().len() - full;
    println!("marker move: {:>6} bytes, {} cells painted", step, stats.painted);

    renderer.on_redraw();
    let stats = renderer.render_pending()?;
    println!(
        "idle redraw: {:>6} cells visited, {} painted",
        stats.visited(),
        stats.painted
    );
    Ok(())
}
