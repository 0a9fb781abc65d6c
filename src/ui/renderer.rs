//! Incremental terminal output for a streaming answer.

use std::io::{self, IsTerminal, Write};
use tracing::debug;

use crate::core::aggregator::{RenderState, ResponseRenderer};
use crate::core::constants::STREAMING_CURSOR;

/// Backspace over the cursor glyph, blank it, and step back again.
const ERASE_CURSOR: &str = "\x08 \x08";

/// Writes only the newly arrived part of the answer, keeping a cursor after
/// it while streaming.
pub struct TerminalRenderer<W: Write> {
    out: W,
    printed: usize,
    cursor_visible: bool,
    show_cursor: bool,
}

impl TerminalRenderer<io::Stdout> {
    /// Render to stdout; the cursor is only drawn on a terminal.
    pub fn stdout() -> Self {
        let show_cursor = io::stdout().is_terminal();
        Self::new(io::stdout(), show_cursor)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, show_cursor: bool) -> Self {
        Self {
            out,
            printed: 0,
            cursor_visible: false,
            show_cursor,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, text: &str, state: RenderState) -> io::Result<()> {
        if self.cursor_visible {
            self.out.write_all(ERASE_CURSOR.as_bytes())?;
            self.cursor_visible = false;
        }

        if let Some(fresh) = text.get(self.printed..) {
            self.out.write_all(fresh.as_bytes())?;
            self.printed = text.len();
        }

        match state {
            RenderState::Streaming if self.show_cursor => {
                write!(self.out, "{STREAMING_CURSOR}")?;
                self.cursor_visible = true;
            }
            RenderState::Streaming => {}
            RenderState::Final => {
                if self.printed > 0 {
                    writeln!(self.out)?;
                }
            }
        }
        self.out.flush()
    }

    /// Drop the cursor and end the partial line so an error prints cleanly.
    fn close_partial(&mut self) -> io::Result<()> {
        if self.cursor_visible {
            self.out.write_all(ERASE_CURSOR.as_bytes())?;
            self.cursor_visible = false;
        }
        if self.printed > 0 {
            writeln!(self.out)?;
            self.printed = 0;
        }
        self.out.flush()
    }
}

impl<W: Write> ResponseRenderer for TerminalRenderer<W> {
    fn render(&mut self, text: &str, state: RenderState) {
        if let Err(err) = self.draw(text, state) {
            debug!(error = %err, "Failed to write answer to terminal");
        }
    }

    fn abort(&mut self) {
        if let Err(err) = self.close_partial() {
            debug!(error = %err, "Failed to write answer to terminal");
        }
    }
}
