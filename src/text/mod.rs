//! ANSI-aware text primitives.
//!
//! Every function here measures strings in terminal cells: escape sequences
//! occupy no cells, East-Asian wide and emoji characters occupy two, and
//! combining marks occupy none. Escape sequences are never split.

pub mod ansi;
pub mod sgr;

use unicode_width::UnicodeWidthChar;

use ansi::{RESET, Token, tokens};

pub use ansi::{ColorDepth, bg, bold, dim, downgrade, fg, paint, paint_on, parse_hex, strip};

/// Ellipsis appended by truncating renderers.
pub const ELLIPSIS: &str = "…";

/// Cell width of a single character (control characters count as zero).
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Number of terminal cells `s` occupies once escapes are removed.
pub fn visible_width(s: &str) -> usize {
    tokens(s)
        .map(|t| match t {
            Token::Char(c) => char_width(c),
            Token::Escape(_) => 0,
        })
        .sum()
}

/// Truncates `s` to at most `max` visible cells.
///
/// When truncation happens and `tail` is non-empty, the tail is appended and
/// counts toward the budget. Escapes before the cut are kept verbatim and a
/// reset is appended if any were kept, so no color leaks past the cut.
pub fn truncate_with(s: &str, max: usize, tail: &str) -> String {
    if max == 0 {
        return String::new();
    }
    if visible_width(s) <= max {
        return s.to_string();
    }
    let tail_w = visible_width(tail);
    let (budget, tail) = if tail_w <= max {
        (max - tail_w, tail)
    } else {
        (max, "")
    };

    let mut out = String::with_capacity(s.len().min(max * 4 + 16));
    let mut used = 0;
    let mut saw_escape = false;
    let mut cut = false;
    for token in tokens(s) {
        match token {
            Token::Escape(seq) => {
                if !cut {
                    out.push_str(seq);
                    saw_escape = true;
                }
            }
            Token::Char(c) => {
                let w = char_width(c);
                if cut {
                    continue;
                }
                if w == 0 {
                    // Combining marks stay attached to the preceding character.
                    if used > 0 {
                        out.push(c);
                    }
                    continue;
                }
                if used + w > budget {
                    cut = true;
                    continue;
                }
                used += w;
                out.push(c);
            }
        }
    }
    if saw_escape {
        out.push_str(RESET);
    }
    out.push_str(tail);
    out
}

/// Truncates without a tail.
pub fn truncate(s: &str, max: usize) -> String {
    truncate_with(s, max, "")
}

/// Truncates with a trailing `…`.
pub fn ellipsize(s: &str, max: usize) -> String {
    truncate_with(s, max, ELLIPSIS)
}

/// Appends spaces until `s` is `width` cells wide.
pub fn pad_right(s: &str, width: usize) -> String {
    let w = visible_width(s);
    if w >= width {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + width - w);
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', width - w));
    out
}

/// Prepends spaces until `s` is `width` cells wide.
pub fn pad_left(s: &str, width: usize) -> String {
    let w = visible_width(s);
    if w >= width {
        return s.to_string();
    }
    let mut out = " ".repeat(width - w);
    out.push_str(s);
    out
}

/// Centers `s` in `width` cells; an odd extra cell goes to the right.
pub fn pad_center(s: &str, width: usize) -> String {
    let w = visible_width(s);
    if w >= width {
        return s.to_string();
    }
    let extra = width - w;
    let left = extra / 2;
    let right = extra - left;
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(right))
}

/// Truncates then right-pads so the result is exactly `width` cells.
///
/// A wide character that would straddle the edge is replaced by padding.
pub fn fit(s: &str, width: usize) -> String {
    pad_right(&truncate(s, width), width)
}

/// Like [`fit`] but marks truncation with `…`.
pub fn fit_ellipsis(s: &str, width: usize) -> String {
    pad_right(&ellipsize(s, width), width)
}

/// Normalises a block of text to exactly `height` lines of exactly `width` cells.
///
/// Returns an empty string when either dimension is zero.
pub fn fit_block(s: &str, width: usize, height: usize) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let mut lines: Vec<String> = s.split('\n').take(height).map(|l| fit(l, width)).collect();
    while lines.len() < height {
        lines.push(" ".repeat(width));
    }
    lines.join("\n")
}

/// Centers a single message inside a `width`×`height` block.
pub fn center_block(msg: &str, width: usize, height: usize) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let mid = (height - 1) / 2;
    (0..height)
        .map(|row| {
            if row == mid {
                pad_center(&ellipsize(msg, width), width)
            } else {
                " ".repeat(width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A word or the whitespace after it, with its measured width.
struct Piece {
    text: String,
    width: usize,
    space: bool,
}

/// Splits one logical line into words, breaking after spaces and hyphens.
fn pieces(line: &str) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    let mut cur = String::new();
    let mut cur_w = 0;
    let flush = |out: &mut Vec<Piece>, cur: &mut String, cur_w: &mut usize| {
        if !cur.is_empty() {
            out.push(Piece {
                text: std::mem::take(cur),
                width: *cur_w,
                space: false,
            });
            *cur_w = 0;
        }
    };
    for token in tokens(line) {
        match token {
            Token::Escape(seq) => cur.push_str(seq),
            Token::Char(' ') => {
                flush(&mut out, &mut cur, &mut cur_w);
                out.push(Piece {
                    text: " ".to_string(),
                    width: 1,
                    space: true,
                });
            }
            Token::Char(c) => {
                cur.push(c);
                cur_w += char_width(c);
                if c == '-' {
                    flush(&mut out, &mut cur, &mut cur_w);
                }
            }
        }
    }
    flush(&mut out, &mut cur, &mut cur_w);
    out
}

/// Splits an over-long word into chunks of at most `width` cells.
fn hard_split(word: &str, width: usize) -> Vec<(String, usize)> {
    let mut chunks = Vec::new();
    let mut cur = String::new();
    let mut cur_w = 0;
    for token in tokens(word) {
        match token {
            Token::Escape(seq) => cur.push_str(seq),
            Token::Char(c) => {
                let w = char_width(c);
                if cur_w + w > width && cur_w > 0 {
                    chunks.push((std::mem::take(&mut cur), cur_w));
                    cur_w = 0;
                }
                cur.push(c);
                cur_w += w;
            }
        }
    }
    if !cur.is_empty() {
        chunks.push((cur, cur_w));
    }
    chunks
}

/// Word-wraps `s` to `width` cells per line.
///
/// Breaks at spaces and after hyphens; words longer than `width` are split.
/// Embedded newlines start new lines. `width == 0` returns the input as one line.
pub fn wrap(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for logical in s.split('\n') {
        let mut line = String::new();
        let mut line_w = 0;
        for piece in pieces(logical) {
            if piece.space {
                if line_w == 0 {
                    continue;
                }
                if line_w < width {
                    line.push(' ');
                    line_w += 1;
                }
                continue;
            }
            if line_w + piece.width <= width {
                line.push_str(&piece.text);
                line_w += piece.width;
                continue;
            }
            if line_w > 0 {
                lines.push(line.trim_end().to_string());
                line = String::new();
                line_w = 0;
            }
            if piece.width <= width {
                line.push_str(&piece.text);
                line_w = piece.width;
            } else {
                let mut chunks = hard_split(&piece.text, width);
                let last = chunks.pop();
                lines.extend(chunks.into_iter().map(|(c, _)| c));
                if let Some((c, w)) = last {
                    line = c;
                    line_w = w;
                }
            }
        }
        lines.push(line.trim_end().to_string());
    }
    lines
}
