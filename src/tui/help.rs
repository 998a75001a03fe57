//! Help overlay: a centered panel listing the key bindings.

use crate::app::{Action, KeyMap};
use crate::render::{BorderKind, BoxStyle, Padding, render_box};
use crate::text::{pad_right, paint, visible_width};
use crate::theme::Theme;

/// Keys handled by the focused widget rather than the model.
const WIDGET_KEYS: [(&str, &str); 5] = [
    ("e", "compact / expanded view"),
    ("c", "per-core CPU (system)"),
    ("p", "next provider (billing)"),
    ("m", "next account (claude)"),
    ("↑ ↓ PgUp PgDn", "scroll"),
];

const KEY_COLUMN: usize = 14;

fn row(key: &str, what: &str, theme: &Theme) -> String {
    format!("{} {what}", paint(&pad_right(key, KEY_COLUMN), theme.accent))
}

/// Panel body, one binding per line.
pub fn help_lines(keys: &KeyMap, theme: &Theme) -> Vec<String> {
    let mut lines: Vec<String> = Action::ALL
        .iter()
        .map(|a| row(&keys.label(*a), a.description(), theme))
        .collect();
    lines.push(row("Ctrl-C", "quit immediately", theme));
    lines.push(String::new());
    lines.extend(WIDGET_KEYS.iter().map(|(k, what)| row(k, what, theme)));
    lines
}

/// The framed panel and its top-left corner inside a `width × height` area,
/// or `None` when the area cannot hold it.
pub fn help_overlay(
    keys: &KeyMap,
    theme: &Theme,
    width: usize,
    height: usize,
) -> Option<(usize, usize, String)> {
    let lines = help_lines(keys, theme);
    let content_w = lines.iter().map(|l| visible_width(l)).max().unwrap_or(0);
    let panel_w = (content_w + 4).min(width);
    let panel_h = (lines.len() + 2).min(height);
    if panel_w < 10 || panel_h < 3 {
        return None;
    }
    let style = BoxStyle::new(BorderKind::Rounded)
        .with_title("Help")
        .with_fg(theme.accent)
        .with_padding(Padding::horizontal(1));
    let block = render_box(&lines.join("\n"), panel_w, panel_h, &style);
    Some(((width - panel_w) / 2, (height - panel_h) / 2, block))
}
