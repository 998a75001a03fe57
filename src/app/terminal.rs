//! Crossterm/ratatui backend for the interactive dashboard.
//!
//! The model renders an ANSI string; it is converted to styled ratatui text
//! and drawn as one paragraph so ratatui can diff cells between frames.

use std::io::{self, Stdout};

use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::Paragraph;
use tracing::error;

use crate::error::{Error, Result};
use crate::text::sgr::to_text;

/// Something frames can be drawn on.
pub trait Screen {
    /// `(width, height)` in cells.
    fn size(&self) -> Result<(usize, usize)>;

    fn draw(&mut self, frame: &str) -> Result<()>;
}

/// Raw-mode alternate screen, restored on drop.
pub struct Terminal {
    inner: ratatui::Terminal<CrosstermBackend<Stdout>>,
}

impl Terminal {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let inner = ratatui::Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { inner })
    }
}

impl Screen for Terminal {
    fn size(&self) -> Result<(usize, usize)> {
        let size = self
            .inner
            .size()
            .map_err(|e| Error::Fatal(format!("terminal size: {e}")))?;
        Ok((usize::from(size.width), usize::from(size.height)))
    }

    fn draw(&mut self, frame: &str) -> Result<()> {
        let text = to_text(frame);
        self.inner
            .draw(|f| {
                let area = f.area();
                f.render_widget(Paragraph::new(text), area);
            })
            .map_err(|e| Error::Fatal(format!("draw: {e}")))?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.inner.backend_mut(), LeaveAlternateScreen, Show);
        let _ = self.inner.show_cursor();
    }
}

/// Routes panic messages to the log instead of the screen being drawn.
///
/// Widget panics are caught and contained; printing them would corrupt the
/// frame.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!(%info, "panic");
    }));
}
