// SPDX-License-Identifier: MIT
//
// tessera-term: differential character-grid renderer.
//
// Controls describe what each cell of a full-screen grid should show and
// report which parts changed through their drawing context. The renderer
// keeps a copy of what the terminal currently displays, diffs every dirty
// cell against it, and writes only the cells that actually changed.
// Bursts of changes are batched with a freeze lock into a single redraw.
//
// Layers, bottom up:
//
//   geometry, color, cell      value types
//   buffer                     last-painted cell per position
//   freeze, context            invalidation protocol
//   sink, ansi, output         device contract and the ANSI implementation
//   renderer                   diffing orchestrator
//   terminal, input            raw-mode plumbing for a host loop
//
// Everything above `terminal` is single-threaded by construction: the
// shared state lives in `Rc`, `Cell` and `RefCell`.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod context;
pub mod error;
pub mod freeze;
pub mod geometry;
pub mod input;
pub mod output;
pub mod renderer;
pub mod sink;
pub mod terminal;

pub use cell::Cell;
pub use color::{AnsiColor, Color};
pub use context::{Control, DrawingContext, Listener};
pub use error::{Error, Result};
pub use freeze::{FreezeGuard, FreezeLock};
pub use geometry::{Offset, Position, Rect, Size};
pub use output::AnsiSink;
pub use renderer::{ColorMode, RenderOptions, RenderStats, Renderer};
pub use sink::{MemorySink, Sink};
