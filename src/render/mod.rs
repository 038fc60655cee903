pub mod ascii;
pub mod braille;
pub mod canvas;
pub mod draw;
pub mod halfblock;

pub use canvas::{Canvas, ColorMode, RenderMode};

use crossterm::style::Color;

/// Builds an escape-coded frame, only emitting SGR changes when the colour
/// actually differs from what the terminal already has.
pub(crate) struct FrameWriter {
    out: String,
    fg: Option<Color>,
    bg: Option<Color>,
}

impl FrameWriter {
    pub fn with_capacity(cap: usize) -> Self {
        FrameWriter {
            out: String::with_capacity(cap),
            fg: None,
            bg: None,
        }
    }

    pub fn set_colors(&mut self, fg: Option<Color>, bg: Option<Color>) {
        let fg_changed = fg.is_some() && fg != self.fg;
        let bg_changed = bg.is_some() && bg != self.bg;
        if !fg_changed && !bg_changed {
            return;
        }
        let mut params = Vec::with_capacity(2);
        if let (true, Some(c)) = (fg_changed, fg) {
            params.push(canvas::sgr(c, false));
            self.fg = fg;
        }
        if let (true, Some(c)) = (bg_changed, bg) {
            params.push(canvas::sgr(c, true));
            self.bg = bg;
        }
        self.out.push_str("\x1b[");
        self.out.push_str(&params.join(";"));
        self.out.push('m');
    }

    pub fn reset(&mut self) {
        if self.fg.is_some() || self.bg.is_some() {
            self.out.push_str("\x1b[0m");
            self.fg = None;
            self.bg = None;
        }
    }

    pub fn push(&mut self, ch: char) {
        self.out.push(ch);
    }

    /// Reset colours and move the cursor to the start of terminal row `row` (0-based).
    pub fn end_row(&mut self, row: usize) {
        self.reset();
        self.out.push_str(&format!("\x1b[{};1H", row + 2));
    }

    pub fn finish(self) -> String {
        self.out
    }
}
