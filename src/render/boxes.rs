//! Bordered, padded boxes of fixed outer dimensions.

use crate::text::ansi::{BOLD, RESET};
use crate::text::{self, ellipsize, fit, paint_on, visible_width};

/// Border glyph family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderKind {
    /// No frame; the whole area is interior.
    None,
    /// Single line: ┌─┐│└─┘
    #[default]
    Single,
    /// Double line: ╔═╗║╚═╝
    Double,
    /// Rounded corners: ╭─╮│╰─╯
    Rounded,
    /// Heavy/thick: ┏━┓┃┗━┛
    Heavy,
    /// Dashed: ┌╌┐╎└╌┘
    Dashed,
}

/// The eight glyphs of a border family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
    /// Left end of a horizontal divider (`├`).
    pub tee_left: char,
    /// Right end of a horizontal divider (`┤`).
    pub tee_right: char,
}

impl BorderKind {
    pub const fn glyphs(&self) -> Glyphs {
        let (top_left, horizontal, top_right, vertical, bottom_left, bottom_right, tee_left, tee_right) =
            match self {
                Self::None => (' ', ' ', ' ', ' ', ' ', ' ', ' ', ' '),
                Self::Single => ('┌', '─', '┐', '│', '└', '┘', '├', '┤'),
                Self::Double => ('╔', '═', '╗', '║', '╚', '╝', '╠', '╣'),
                Self::Rounded => ('╭', '─', '╮', '│', '╰', '╯', '├', '┤'),
                Self::Heavy => ('┏', '━', '┓', '┃', '┗', '┛', '┣', '┫'),
                Self::Dashed => ('┌', '╌', '┐', '╎', '└', '┘', '├', '┤'),
            };
        Glyphs {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
            horizontal,
            vertical,
            tee_left,
            tee_right,
        }
    }

    pub fn has_frame(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Parses a lowercase kind name as used in config files.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "none" => Self::None,
            "single" => Self::Single,
            "double" => Self::Double,
            "rounded" => Self::Rounded,
            "heavy" => Self::Heavy,
            "dashed" => Self::Dashed,
            _ => return None,
        })
    }
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Inner padding in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl Padding {
    pub const fn uniform(n: usize) -> Self {
        Self {
            top: n,
            right: n,
            bottom: n,
            left: n,
        }
    }

    /// One cell on the left and right only.
    pub const fn horizontal(n: usize) -> Self {
        Self {
            top: 0,
            right: n,
            bottom: 0,
            left: n,
        }
    }
}

/// Visual configuration of a box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxStyle {
    pub border: BorderKind,
    pub title: Option<String>,
    pub title_align: Align,
    pub padding: Padding,
    /// Border foreground as `#RRGGBB`.
    pub fg: Option<String>,
    /// Border background as `#RRGGBB`.
    pub bg: Option<String>,
}

impl BoxStyle {
    pub fn new(border: BorderKind) -> Self {
        Self {
            border,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = if title.is_empty() { None } else { Some(title) };
        self
    }

    pub fn with_title_align(mut self, align: Align) -> Self {
        self.title_align = align;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_fg(mut self, hex: impl Into<String>) -> Self {
        self.fg = Some(hex.into());
        self
    }

    pub fn with_bg(mut self, hex: impl Into<String>) -> Self {
        self.bg = Some(hex.into());
        self
    }

    /// Interior `(width, height)` for a box of the given outer size.
    pub fn inner_size(&self, outer_w: usize, outer_h: usize) -> (usize, usize) {
        let frame = if self.border.has_frame() { 2 } else { 0 };
        let w = outer_w
            .saturating_sub(frame)
            .saturating_sub(self.padding.left + self.padding.right);
        let h = outer_h
            .saturating_sub(frame)
            .saturating_sub(self.padding.top + self.padding.bottom);
        (w, h)
    }

    fn paint(&self, glyphs: &str) -> String {
        paint_on(glyphs, self.fg.as_deref(), self.bg.as_deref())
    }

    /// The border color escapes, re-applied after an inner reset.
    fn prefix(&self) -> String {
        let mut p = String::new();
        if let Some(h) = &self.fg {
            p.push_str(&text::fg(h));
        }
        if let Some(h) = &self.bg {
            p.push_str(&text::bg(h));
        }
        p
    }
}

/// Builds the top border, embedding `" TITLE "` when it fits.
fn top_border(style: &BoxStyle, glyphs: &Glyphs, inner: usize) -> String {
    let h = glyphs.horizontal;
    let run = |n: usize| std::iter::repeat_n(h, n).collect::<String>();

    let title = style.title.as_deref().and_then(|t| {
        // One glyph on each side plus two padding spaces.
        let room = inner.checked_sub(4)?;
        if room == 0 {
            return None;
        }
        let t = if visible_width(t) > room {
            ellipsize(&text::strip(t), room)
        } else {
            t.to_string()
        };
        Some(t)
    });

    let Some(title) = title else {
        return style.paint(&format!("{}{}{}", glyphs.top_left, run(inner), glyphs.top_right));
    };

    let seg_w = visible_width(&title) + 2;
    let rest = inner - seg_w;
    let (before, after) = match style.title_align {
        Align::Left => (1, rest - 1),
        Align::Right => (rest - 1, 1),
        Align::Center => (rest / 2, rest - rest / 2),
    };
    format!(
        "{}{}{}",
        style.paint(&format!("{}{}", glyphs.top_left, run(before))),
        style.paint(&format!(" {BOLD}{title}{RESET}{} ", style.prefix())),
        style.paint(&format!("{}{}", run(after), glyphs.top_right)),
    )
}

/// Renders `content` inside a box of exactly `outer_w`×`outer_h` cells.
///
/// Returns an empty string when the box cannot be drawn: zero dimensions, or a
/// framed box smaller than 2×2. Content lines are truncated/padded to the
/// interior; missing lines become blank rows.
pub fn render_box(content: &str, outer_w: usize, outer_h: usize, style: &BoxStyle) -> String {
    if outer_w == 0 || outer_h == 0 {
        return String::new();
    }
    let framed = style.border.has_frame();
    if framed && (outer_w < 2 || outer_h < 2) {
        return String::new();
    }
    let glyphs = style.border.glyphs();
    let frame = if framed { 2 } else { 0 };
    let inner_w = outer_w - frame;
    let inner_h = outer_h - frame;

    let pad_l = style.padding.left.min(inner_w);
    let content_w = inner_w - pad_l - style.padding.right.min(inner_w - pad_l);
    let pad_r = inner_w - pad_l - content_w;
    let pad_t = style.padding.top.min(inner_h);
    let content_h = inner_h - pad_t - style.padding.bottom.min(inner_h - pad_t);

    let side = if framed {
        style.paint(&glyphs.vertical.to_string())
    } else {
        String::new()
    };
    let blank = " ".repeat(inner_w);
    let mut content_lines = content.split('\n');

    let mut out: Vec<String> = Vec::with_capacity(outer_h);
    if framed {
        out.push(top_border(style, &glyphs, inner_w));
    }
    for row in 0..inner_h {
        let body = if row >= pad_t && row < pad_t + content_h {
            let line = content_lines.next().unwrap_or("");
            format!(
                "{}{}{}",
                " ".repeat(pad_l),
                fit(line, content_w),
                " ".repeat(pad_r)
            )
        } else {
            blank.clone()
        };
        out.push(format!("{side}{body}{side}"));
    }
    if framed {
        let bottom: String = std::iter::once(glyphs.bottom_left)
            .chain(std::iter::repeat_n(glyphs.horizontal, inner_w))
            .chain(std::iter::once(glyphs.bottom_right))
            .collect();
        out.push(style.paint(&bottom));
    }
    out.join("\n")
}

/// A full-width divider row using the kind's tee glyphs: `├────┤`.
pub fn divider(width: usize, style: &BoxStyle) -> String {
    if width < 2 {
        return String::new();
    }
    let g = style.border.glyphs();
    let line: String = std::iter::once(g.tee_left)
        .chain(std::iter::repeat_n(g.horizontal, width - 2))
        .chain(std::iter::once(g.tee_right))
        .collect();
    style.paint(&line)
}
