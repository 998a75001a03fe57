//! ANSI escape scanning and 24-bit color helpers.

use std::env;

/// Resets every SGR attribute.
pub const RESET: &str = "\x1b[0m";
/// Bold on.
pub const BOLD: &str = "\x1b[1m";
/// Dim/faint on.
pub const DIM: &str = "\x1b[2m";
/// Reverse video on.
pub const REVERSE: &str = "\x1b[7m";

/// One lexical piece of an ANSI-decorated string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A complete escape sequence, including the leading ESC.
    Escape(&'a str),
    /// A single printable (or zero-width) character.
    Char(char),
}

/// Splits a string into escape sequences and characters.
///
/// Recognised sequences: CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL` or
/// `ESC ] ... ESC \`) and two-byte escapes. An unterminated sequence at the
/// end of the input is returned as a single escape token so callers never
/// split it.
pub fn tokens(s: &str) -> Tokens<'_> {
    Tokens { s, pos: 0 }
}

/// Iterator returned by [`tokens`].
pub struct Tokens<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.s[self.pos..];
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;
        if first != '\x1b' {
            self.pos += first.len_utf8();
            return Some(Token::Char(first));
        }

        let end = match chars.next() {
            Some((i, '[')) => {
                // CSI: parameters and intermediates, then a final byte in 0x40..=0x7E.
                let mut end = rest.len();
                for (j, c) in rest[i + 1..].char_indices() {
                    if ('\x40'..='\x7e').contains(&c) {
                        end = i + 1 + j + c.len_utf8();
                        break;
                    }
                }
                end
            }
            Some((i, ']')) => {
                let body = &rest[i + 1..];
                match (body.find('\x07'), body.find("\x1b\\")) {
                    (Some(bel), Some(st)) if st < bel => i + 1 + st + 2,
                    (Some(bel), _) => i + 1 + bel + 1,
                    (None, Some(st)) => i + 1 + st + 2,
                    (None, None) => rest.len(),
                }
            }
            Some((i, c)) => i + c.len_utf8(),
            None => rest.len(),
        };
        self.pos += end;
        Some(Token::Escape(&rest[..end]))
    }
}

/// Removes every escape sequence from `s`.
pub fn strip(s: &str) -> String {
    tokens(s)
        .filter_map(|t| match t {
            Token::Char(c) => Some(c),
            Token::Escape(_) => None,
        })
        .collect()
}

/// Returns true when `s` contains at least one escape sequence.
pub fn has_escapes(s: &str) -> bool {
    s.contains('\x1b')
}

/// Parses `#RRGGBB` (leading `#` optional) into its components.
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.trim().strip_prefix('#').unwrap_or(hex.trim());
    if h.len() != 6 || !h.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Foreground escape for a hex color; empty when the color is invalid.
pub fn fg(hex: &str) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m"),
        None => String::new(),
    }
}

/// Background escape for a hex color; empty when the color is invalid.
pub fn bg(hex: &str) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => format!("\x1b[48;2;{r};{g};{b}m"),
        None => String::new(),
    }
}

/// Wraps `text` in a foreground color. Returns `text` unchanged for invalid colors.
pub fn paint(text: &str, hex: &str) -> String {
    let esc = fg(hex);
    if esc.is_empty() || text.is_empty() {
        text.to_string()
    } else {
        format!("{esc}{text}{RESET}")
    }
}

/// Wraps `text` with optional fg/bg colors and a trailing reset.
pub fn paint_on(text: &str, fg_hex: Option<&str>, bg_hex: Option<&str>) -> String {
    let mut prefix = String::new();
    if let Some(h) = fg_hex {
        prefix.push_str(&fg(h));
    }
    if let Some(h) = bg_hex {
        prefix.push_str(&bg(h));
    }
    if prefix.is_empty() || text.is_empty() {
        text.to_string()
    } else {
        format!("{prefix}{text}{RESET}")
    }
}

/// Bold text with a trailing reset.
pub fn bold(text: &str) -> String {
    format!("{BOLD}{text}{RESET}")
}

/// Dimmed text with a trailing reset.
pub fn dim(text: &str) -> String {
    format!("{DIM}{text}{RESET}")
}

/// Color capability of the output terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorDepth {
    #[default]
    TrueColor,
    Ansi256,
    Mono,
}

impl ColorDepth {
    /// Reads `NO_COLOR`, `COLORTERM` and `TERM`.
    pub fn detect() -> Self {
        Self::from_env_values(
            env::var_os("NO_COLOR").is_some(),
            env::var("COLORTERM").ok().as_deref(),
            env::var("TERM").ok().as_deref(),
        )
    }

    fn from_env_values(no_color: bool, colorterm: Option<&str>, term: Option<&str>) -> Self {
        if no_color {
            return Self::Mono;
        }
        if let Some(ct) = colorterm {
            let ct = ct.to_ascii_lowercase();
            if ct.contains("truecolor") || ct.contains("24bit") {
                return Self::TrueColor;
            }
        }
        match term {
            Some("dumb") => Self::Mono,
            Some(_) => Self::Ansi256,
            None => Self::Mono,
        }
    }
}

/// Nearest xterm-256 palette index for an RGB triple.
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        return 232 + ((r as u16 - 8) * 24 / 247) as u8;
    }
    let q = |v: u8| ((v as u16 * 5 + 127) / 255) as u8;
    16 + 36 * q(r) + 6 * q(g) + q(b)
}

/// Rewrites 24-bit SGR sequences for a terminal with less color support.
///
/// `Ansi256` maps `38;2`/`48;2` to the nearest `38;5`/`48;5`; `Mono` drops every
/// color parameter but keeps attributes such as bold and reverse.
pub fn downgrade(s: &str, depth: ColorDepth) -> String {
    if depth == ColorDepth::TrueColor || !has_escapes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for token in tokens(s) {
        match token {
            Token::Char(c) => out.push(c),
            Token::Escape(seq) => {
                if let Some(params) = seq.strip_prefix("\x1b[").and_then(|p| p.strip_suffix('m')) {
                    let rewritten = rewrite_sgr(params, depth);
                    if !rewritten.is_empty() || params.is_empty() {
                        out.push_str("\x1b[");
                        out.push_str(&rewritten);
                        out.push('m');
                    }
                } else {
                    out.push_str(seq);
                }
            }
        }
    }
    out
}

fn rewrite_sgr(params: &str, depth: ColorDepth) -> String {
    let parts: Vec<&str> = params.split(';').collect();
    let mut kept: Vec<String> = Vec::new();
    let mut i = 0;
    while i < parts.len() {
        let p = parts[i];
        match p {
            "38" | "48" if parts.get(i + 1) == Some(&"2") && i + 4 < parts.len() => {
                let rgb: Vec<u8> = parts[i + 2..i + 5]
                    .iter()
                    .filter_map(|v| v.parse().ok())
                    .collect();
                if depth == ColorDepth::Ansi256 && rgb.len() == 3 {
                    kept.push(format!("{p};5;{}", rgb_to_256(rgb[0], rgb[1], rgb[2])));
                }
                i += 5;
            }
            "38" | "48" if parts.get(i + 1) == Some(&"5") => {
                if depth == ColorDepth::Ansi256 {
                    if let Some(idx) = parts.get(i + 2) {
                        kept.push(format!("{p};5;{idx}"));
                    }
                }
                i += 3;
            }
            _ => {
                let is_color = p
                    .parse::<u8>()
                    .map(|n| matches!(n, 30..=37 | 39 | 40..=47 | 49 | 90..=97 | 100..=107))
                    .unwrap_or(false);
                if !(is_color && depth == ColorDepth::Mono) {
                    kept.push(p.to_string());
                }
                i += 1;
            }
        }
    }
    kept.join(";")
}
