//! Conversion of ANSI-decorated frames into ratatui text.
//!
//! The renderers produce plain strings with SGR escapes; the interactive
//! runtime hands them to ratatui so it can diff cells between frames.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use super::ansi::{Token, tokens};

/// Applies one SGR parameter list (the part between `ESC [` and `m`) to `style`.
pub fn apply_sgr(style: Style, params: &str) -> Style {
    if params.is_empty() {
        return Style::default();
    }
    let parts: Vec<u16> = params
        .split(';')
        .map(|p| p.parse::<u16>().unwrap_or(0))
        .collect();
    let mut style = style;
    let mut i = 0;
    while i < parts.len() {
        match parts[i] {
            0 => style = Style::default(),
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            7 => style = style.add_modifier(Modifier::REVERSED),
            9 => style = style.add_modifier(Modifier::CROSSED_OUT),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            27 => style = style.remove_modifier(Modifier::REVERSED),
            n @ 30..=37 => style = style.fg(Color::Indexed((n - 30) as u8)),
            n @ 90..=97 => style = style.fg(Color::Indexed((n - 90 + 8) as u8)),
            n @ 40..=47 => style = style.bg(Color::Indexed((n - 40) as u8)),
            n @ 100..=107 => style = style.bg(Color::Indexed((n - 100 + 8) as u8)),
            39 => style = style.fg(Color::Reset),
            49 => style = style.bg(Color::Reset),
            n @ (38 | 48) => {
                let (color, used) = match parts.get(i + 1).copied() {
                    Some(2) if i + 4 < parts.len() => (
                        Some(Color::Rgb(
                            parts[i + 2] as u8,
                            parts[i + 3] as u8,
                            parts[i + 4] as u8,
                        )),
                        5,
                    ),
                    Some(5) if i + 2 < parts.len() => (Some(Color::Indexed(parts[i + 2] as u8)), 3),
                    _ => (None, 1),
                };
                if let Some(color) = color {
                    style = if n == 38 { style.fg(color) } else { style.bg(color) };
                }
                i += used;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    style
}

/// Parses an ANSI frame into ratatui [`Text`], one [`Line`] per newline.
///
/// Non-SGR escapes are dropped. Style carries across lines the way a
/// terminal would apply it.
pub fn to_text(frame: &str) -> Text<'static> {
    let mut lines = Vec::new();
    let mut style = Style::default();
    for raw in frame.split('\n') {
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut buf = String::new();
        for token in tokens(raw) {
            match token {
                Token::Char(c) => buf.push(c),
                Token::Escape(seq) => {
                    let Some(params) = seq.strip_prefix("\x1b[").and_then(|p| p.strip_suffix('m'))
                    else {
                        continue;
                    };
                    if !buf.is_empty() {
                        spans.push(Span::styled(std::mem::take(&mut buf), style));
                    }
                    style = apply_sgr(style, params);
                }
            }
        }
        if !buf.is_empty() {
            spans.push(Span::styled(buf, style));
        }
        lines.push(Line::from(spans));
    }
    Text::from(lines)
}
