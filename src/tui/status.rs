//! Bottom status line.

use crate::app::{Action, KeyMap};
use crate::compositor::Preset;
use crate::text::{dim, fit, pad_left, paint, visible_width};
use crate::theme::Theme;

/// Model state shown on the right of the status line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusInfo<'a> {
    pub focused: Option<&'a str>,
    pub expanded: bool,
    pub filter: &'a str,
    /// Sources whose last fetch failed.
    pub stale: usize,
    pub layout: Option<Preset>,
}

/// Narrower than this, the key hints are dropped.
const MIN_HINTS_WIDTH: usize = 8;

const HINTS: [(Action, &str); 5] = [
    (Action::FocusNext, "focus"),
    (Action::Expand, "expand"),
    (Action::Search, "search"),
    (Action::Help, "help"),
    (Action::Quit, "quit"),
];

/// Key hints on the left, state on the right; exactly `width` cells.
pub fn status_bar(width: usize, keys: &KeyMap, info: &StatusInfo<'_>, theme: &Theme) -> String {
    if width == 0 {
        return String::new();
    }
    let hints = HINTS
        .iter()
        .map(|(action, what)| {
            let what = if *action == Action::Expand && info.expanded {
                "collapse"
            } else {
                what
            };
            format!("{} {what}", keys.label(*action))
        })
        .collect::<Vec<_>>()
        .join(" · ");

    let mut right = Vec::new();
    if !info.filter.is_empty() {
        right.push(format!("filter /{}", info.filter));
    }
    if let Some(p) = info.layout {
        right.push(p.name().to_string());
    }
    if let Some(id) = info.focused {
        right.push(id.to_string());
    }
    let mut right = dim(&right.join("  "));
    if info.stale > 0 {
        let stale = paint(&format!("{} stale", info.stale), theme.warn);
        right = if visible_width(&right) == 0 {
            stale
        } else {
            format!("{right}  {stale}")
        };
    }

    let right_w = visible_width(&right);
    if right_w >= width {
        return fit(&right, width);
    }
    let room = width - right_w - 1;
    if room < MIN_HINTS_WIDTH {
        return pad_left(&right, width);
    }
    let left = fit(&dim(&hints), room);
    format!("{left} {right}")
}

/// Search prompt replacing the status line: `/query_`.
pub fn search_bar(query: &str, width: usize) -> String {
    fit(&format!("/{query}_"), width)
}
