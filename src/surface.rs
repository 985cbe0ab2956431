//! Display surfaces.
//!
//! The renderer talks to a [`DisplaySurface`]; `TerminalSurface` draws to
//! the real terminal through crossterm, `TextSurface` renders plain text
//! frames for headless runs and tests.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::Print,
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::debug;
use unicode_width::UnicodeWidthChar;

use crate::error::RenderError;

pub const COLUMNS: usize = 4;

pub type TableRow = [String; COLUMNS];

const PID_WIDTH: usize = 7;
const PERCENT_WIDTH: usize = 8;
const SEPARATOR: &str = " | ";
const MIN_NAME_WIDTH: usize = 4;

/// Stand-in for control characters in displayed text.
pub const REPLACEMENT: char = '?';

pub trait DisplaySurface {
    /// Starts a new frame. Fails if the surface cannot hold any cell.
    fn begin_frame(&mut self) -> Result<(), RenderError>;
    fn draw_panel(&mut self, text: &str) -> Result<(), RenderError>;
    fn draw_table(
        &mut self,
        header: &[&str; COLUMNS],
        rows: &[TableRow],
        footer: &str,
    ) -> Result<(), RenderError>;
    /// Makes the frame visible.
    fn present(&mut self) -> Result<(), RenderError>;
    /// Releases the surface. Safe to call more than once.
    fn stop(&mut self) -> Result<(), RenderError>;
}

/// Pads or truncates `text` to exactly `width` display columns. Control
/// characters are replaced with [`REPLACEMENT`] so text from processes can
/// never emit terminal escape sequences.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let ch = if ch.is_control() { REPLACEMENT } else { ch };
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

/// Formats one table line for a table `width` columns wide.
pub fn format_row<S: AsRef<str>>(cells: &[S; COLUMNS], width: usize) -> String {
    let fixed = PID_WIDTH + 2 * PERCENT_WIDTH + 3 * SEPARATOR.len();
    let name_width = width.saturating_sub(fixed).max(MIN_NAME_WIDTH);

    let line = [
        fit(cells[0].as_ref(), PID_WIDTH),
        fit(cells[1].as_ref(), name_width),
        fit(cells[2].as_ref(), PERCENT_WIDTH),
        fit(cells[3].as_ref(), PERCENT_WIDTH),
    ]
    .join(SEPARATOR);
    fit(&line, width)
}

/// Lines of the table block: header, rule, rows, footer. At most
/// `max_lines` lines are produced; rows are cut first so the footer stays.
fn table_lines(
    header: &[&str; COLUMNS],
    rows: &[TableRow],
    footer: &str,
    width: usize,
    max_lines: usize,
) -> Vec<String> {
    let row_budget = max_lines.saturating_sub(3);
    let mut lines = Vec::with_capacity(rows.len().min(row_budget) + 3);
    lines.push(format_row(header, width));
    lines.push("-".repeat(width));
    lines.extend(
        rows.iter()
            .take(row_budget)
            .map(|row| format_row(row, width)),
    );
    lines.push(fit(footer, width));
    lines.truncate(max_lines);
    lines
}

/// Full-screen crossterm surface: stats panel on the left half, process
/// table on the right half.
pub struct TerminalSurface {
    out: Stdout,
    width: u16,
    height: u16,
    active: bool,
}

impl TerminalSurface {
    /// Switches the terminal to raw mode and the alternate screen.
    pub fn new() -> Result<Self, RenderError> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(ClearType::All)
        ) {
            let _ = terminal::disable_raw_mode();
            return Err(e.into());
        }
        debug!("Terminal surface initialised");

        Ok(Self {
            out,
            width: 0,
            height: 0,
            active: true,
        })
    }

    fn split(&self) -> (usize, usize) {
        let half = usize::from(self.width) / 2;
        (half.saturating_sub(1), half + 1)
    }
}

impl DisplaySurface for TerminalSurface {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        let (width, height) = terminal::size()?;
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroSize { width, height });
        }
        self.width = width;
        self.height = height;
        queue!(self.out, terminal::Clear(ClearType::All))?;
        Ok(())
    }

    fn draw_panel(&mut self, text: &str) -> Result<(), RenderError> {
        let (panel_width, divider) = self.split();
        for (y, line) in text.lines().take(usize::from(self.height)).enumerate() {
            queue!(
                self.out,
                cursor::MoveTo(0, y as u16),
                Print(fit(line, panel_width))
            )?;
        }
        for y in 0..self.height {
            queue!(self.out, cursor::MoveTo((divider - 1) as u16, y), Print('│'))?;
        }
        Ok(())
    }

    fn draw_table(
        &mut self,
        header: &[&str; COLUMNS],
        rows: &[TableRow],
        footer: &str,
    ) -> Result<(), RenderError> {
        let (_, x) = self.split();
        let width = usize::from(self.width).saturating_sub(x);
        if width == 0 {
            return Ok(());
        }
        let lines = table_lines(header, rows, footer, width, usize::from(self.height));
        for (y, line) in lines.into_iter().enumerate() {
            queue!(self.out, cursor::MoveTo(x as u16, y as u16), Print(line))?;
        }
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.out.flush()?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RenderError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        let leave = execute!(self.out, LeaveAlternateScreen, cursor::Show);
        let raw = terminal::disable_raw_mode();
        leave?;
        raw?;
        debug!("Terminal restored");
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        if self.active {
            let _ = execute!(self.out, LeaveAlternateScreen, cursor::Show);
            let _ = terminal::disable_raw_mode();
        }
    }
}

/// Plain-text surface of a fixed size. Each presented frame is kept as one
/// string: the stats panel, a blank line, then the table.
#[derive(Debug, Default)]
pub struct TextSurface {
    width: u16,
    height: u16,
    current: Vec<String>,
    frames: Vec<String>,
    stopped: bool,
}

impl TextSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    #[cfg(test)]
    pub fn last_frame(&self) -> Option<&str> {
        self.frames.last().map(String::as_str)
    }

    pub fn take_frames(&mut self) -> Vec<String> {
        std::mem::take(&mut self.frames)
    }

    #[cfg(test)]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl DisplaySurface for TextSurface {
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        self.current.clear();
        Ok(())
    }

    fn draw_panel(&mut self, text: &str) -> Result<(), RenderError> {
        let width = usize::from(self.width);
        self.current
            .extend(text.lines().map(|line| fit(line, width).trim_end().to_string()));
        Ok(())
    }

    fn draw_table(
        &mut self,
        header: &[&str; COLUMNS],
        rows: &[TableRow],
        footer: &str,
    ) -> Result<(), RenderError> {
        let width = usize::from(self.width);
        self.current.push(String::new());
        self.current.extend(
            table_lines(header, rows, footer, width, usize::from(self.height))
                .into_iter()
                .map(|line| line.trim_end().to_string()),
        );
        Ok(())
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.frames.push(self.current.join("\n"));
        self.current.clear();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RenderError> {
        self.stopped = true;
        Ok(())
    }
}
