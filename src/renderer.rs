//! Terminal setup and the status bar drawn below the preview area.
//!
//! The preview itself belongs to the external renderer. This module only
//! owns terminal modes and the bottom row.

use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{self, Attribute, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io::{self, Write};

pub struct Renderer;

impl Renderer {
    /// Raw mode, alternate screen and all-motion mouse reporting.
    pub fn init() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
        )?;
        Ok(())
    }

    /// Restore the terminal to its original state.
    pub fn cleanup() -> io::Result<()> {
        execute!(
            io::stdout(),
            DisableMouseCapture,
            style::ResetColor,
            cursor::Show,
            LeaveAlternateScreen,
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

/// What the status bar shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub magnification: u32,
    pub panning: bool,
    pub grab: (i32, i32),
    /// Overrides the zoom summary when non-empty.
    pub notice: String,
}

impl Status {
    pub fn text(&self) -> String {
        if !self.notice.is_empty() {
            return self.notice.clone();
        }
        let mode = if self.panning { " PAN" } else { "" };
        format!(
            "termzoom: x{}{} at {},{}  (Ctrl-^ for commands)",
            self.magnification, mode, self.grab.0, self.grab.1
        )
    }
}

/// Single-line bar at the bottom of the terminal.
pub struct StatusBar {
    last: Option<(String, u16, u16)>,
}

impl StatusBar {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Redraw if the text or the terminal size changed.
    pub fn draw(&mut self, status: &Status) -> io::Result<()> {
        let (width, height) = terminal::size()?;
        let text = status.text();
        let key = (text, width, height);
        if self.last.as_ref() == Some(&key) || height == 0 {
            return Ok(());
        }

        let mut stdout = io::stdout();
        queue!(
            stdout,
            cursor::MoveTo(0, height - 1),
            SetBackgroundColor(style::Color::DarkBlue),
            SetForegroundColor(style::Color::White),
            SetAttribute(Attribute::Bold),
        )?;
        queue!(stdout, style::Print(fit_to_width(&key.0, width as usize)))?;
        queue!(stdout, style::ResetColor, SetAttribute(Attribute::Reset))?;
        stdout.flush()?;

        self.last = Some(key);
        Ok(())
    }
}

/// Truncate or pad to exactly `width` characters.
fn fit_to_width(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let used = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}
