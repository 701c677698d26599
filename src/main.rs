// SPDX-License-Identifier: MIT
//
// tessera: interactive host for the differential grid renderer.
//
// Wires the pieces of tessera-term together into a full-screen program:
//
//   stdin → read_keys → decode → dispatch → controls mutate under a freeze
//   controls → drawing context → renderer inbox → render_pending → stdout
//
// Layout (one form, fixed rows):
//
//   row 0  title
//   row 2  prompt
//   row 3  text box (focused, receives every key first)
//   row 5  status line
//   row 6  key help
//
// Keys the text box leaves alone are handled here: Ctrl-A selects all,
// Ctrl-P flips between 24-bit and palette color, Ctrl-L forces a full
// repaint, Ctrl-Q quits.

mod config;
mod widgets;

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Stdout};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tessera_term::input::{self, InputEvent, InputListener, KeyCode, KeyEvent};
use tessera_term::terminal::{self, Terminal};
use tessera_term::{AnsiSink, Color, ColorMode, RenderOptions, Renderer};

use config::{Args, Config};
use widgets::{Form, Label, TextBox};

/// How long one wait for input may block before the loop checks for resizes.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const TITLE_FG: Color = Color::rgb(250, 5, 5);
const HELP_FG: Color = Color::rgb(128, 128, 128);

// ─── App ────────────────────────────────────────────────────────────────────

/// What a key asked the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

struct App {
    renderer: Renderer<AnsiSink<Stdout>>,
    editor: Rc<RefCell<TextBox>>,
    status: Rc<RefCell<Label>>,
}

impl App {
    fn new(options: RenderOptions, terminal: &Terminal) -> Self {
        let sink = AnsiSink::new(io::stdout(), terminal.size()).with_probe(terminal::get_size);
        let mut renderer = Renderer::new(sink, options);

        let editor = Rc::new(RefCell::new(TextBox::new("edit me")));
        let status = Rc::new(RefCell::new(Label::new("")));
        let form = Form::new()
            .row(0, Box::new(Label::new("tessera").with_colors(Some(TITLE_FG), None)))
            .row(2, Box::new(Label::new("Type below:")))
            .row(3, Box::new(Rc::clone(&editor)))
            .row(5, Box::new(Rc::clone(&status)))
            .row(
                6,
                Box::new(
                    Label::new("ctrl+arrows select | ctrl-a all | ctrl-p colors | ctrl-l repaint | ctrl-q quit")
                        .with_colors(Some(HELP_FG), None),
                ),
            );
        renderer.set_content(Box::new(form));

        let app = Self {
            renderer,
            editor,
            status,
        };
        app.update_status();
        app
    }

    fn update_status(&self) {
        let chars = self.editor.borrow().char_count();
        let mode = match self.renderer.options().color_mode {
            ColorMode::TrueColor => "24-bit",
            ColorMode::Palette => "16-color",
        };
        self.status
            .borrow_mut()
            .set_text(&format!("{chars} chars | {mode}"));
    }

    /// Route one key: the text box first, then host shortcuts.
    fn on_key(&mut self, key: KeyEvent) -> Result<Action> {
        if key == KeyEvent::ctrl('q') {
            return Ok(Action::Quit);
        }

        let mut event = InputEvent::new(key);
        {
            let _hold = self.renderer.freeze();
            let mut editor = Rc::clone(&self.editor);
            let listeners: &mut [&mut dyn InputListener] = &mut [&mut editor];
            input::dispatch(&mut event, listeners);
            self.update_status();
        }
        if event.handled {
            return Ok(Action::Continue);
        }

        match key.code {
            KeyCode::Char('p') if key.has_ctrl() => {
                let next = match self.renderer.options().color_mode {
                    ColorMode::TrueColor => ColorMode::Palette,
                    ColorMode::Palette => ColorMode::TrueColor,
                };
                self.renderer.set_color_mode(next);
                self.update_status();
            }
            KeyCode::Char('a') if key.has_ctrl() => {
                let mut editor = self.editor.borrow_mut();
                let end = editor.char_count();
                editor.set_caret(0, end);
            }
            KeyCode::Char('l') if key.has_ctrl() => {
                self.renderer.refresh()?;
            }
            _ => tracing::trace!(?key, "unhandled key"),
        }
        Ok(Action::Continue)
    }

    fn run(&mut self) -> Result<()> {
        self.renderer.setup()?;
        loop {
            if terminal::take_resized() {
                self.renderer.refresh()?;
            }

            let bytes = terminal::read_keys(POLL_INTERVAL).context("failed to read input")?;
            for key in input::decode(&bytes) {
                if self.on_key(key)? == Action::Quit {
                    return Ok(());
                }
            }

            self.renderer.render_pending()?;
        }
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn init_logging(path: Option<&std::path::Path>) -> Result<()> {
    // Without a file there is nowhere to log: stdout and stderr both show
    // on the grid.
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to install log subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::resolve(&args)?;
    init_logging(config.log_file.as_deref())?;

    if !terminal::is_tty() {
        bail!("tessera must be run in an interactive terminal");
    }

    let mut terminal = Terminal::new();
    terminal.enter().context("failed to initialize terminal")?;
    tracing::info!(options = ?config.render, size = %terminal.size(), "starting");

    let result = App::new(config.render, &terminal).run();

    terminal.leave().context("failed to restore terminal")?;
    result
}
