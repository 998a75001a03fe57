//! Static text widget, used for the banner logo and as a stand-in.

use crate::app::{Cmd, Msg};
use crate::error::Result;
use crate::text::{ellipsize, pad_center, paint, visible_width};
use crate::theme::Theme;

use super::Widget;

#[derive(Debug, Clone)]
pub struct Placeholder {
    id: String,
    title: String,
    body: Vec<String>,
    min_size: (usize, usize),
    theme: Theme,
}

impl Placeholder {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: Vec::new(),
            min_size: (20, 5),
            theme: Theme::default(),
        }
    }

    /// Lines drawn centered in the box.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.lines().map(str::to_string).collect();
        self
    }

    pub fn with_min_size(mut self, width: usize, height: usize) -> Self {
        self.min_size = (width.max(1), height.max(1));
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

impl Widget for Placeholder {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn min_size(&self) -> (usize, usize) {
        self.min_size
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
        }
        Cmd::None
    }

    fn render(&self, width: usize, height: usize) -> Result<String> {
        let lines: Vec<String> = if self.body.is_empty() {
            vec![paint(&self.title, self.theme.dim)]
        } else {
            self.body
                .iter()
                .map(|l| paint(l, self.theme.accent))
                .collect()
        };
        let shown = lines.len().min(height);
        let top = (height - shown) / 2;
        let mut out = vec![String::new(); top];
        for line in lines.iter().take(shown) {
            let line = if visible_width(line) > width {
                ellipsize(line, width)
            } else {
                line.clone()
            };
            out.push(pad_center(&line, width));
        }
        Ok(out.join("\n"))
    }

    fn summary(&self) -> Option<String> {
        Some(self.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip;

    #[test]
    fn body_is_centered() {
        let p = Placeholder::new("banner:logo", "Logo").with_body("ab\ncd");
        let out = strip(&p.view(6, 4));
        assert_eq!(out, "      \n  ab  \n  cd  \n      ");
    }

    #[test]
    fn empty_body_shows_title() {
        let p = Placeholder::new("cpu", "CPU");
        let out = strip(&p.view(5, 1));
        assert_eq!(out, " CPU ");
    }

    #[test]
    fn theme_change_is_kept() {
        let mut p = Placeholder::new("x", "X");
        p.update(&Msg::ThemeChange(Theme::mono()));
        assert_eq!(p.theme.name, "mono");
    }
}
