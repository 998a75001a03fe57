//! Fixed-size character grid that pre-rendered blocks are stamped onto.

use crate::text::ansi::{RESET, Token, tokens};
use crate::text::char_width;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    /// Base character plus any combining marks.
    text: String,
    /// Accumulated SGR sequences active for this cell.
    style: String,
    /// Occupies this cell and the next.
    wide: bool,
    /// Right half of a wide character.
    cont: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            text: " ".to_string(),
            style: String::new(),
            wide: false,
            cont: false,
        }
    }
}

/// A `width`×`height` grid of styled cells, initialised to spaces.
///
/// Blits are clipped to the grid and later blits overwrite earlier ones.
/// [`Grid::render`] always yields exactly `height` lines of exactly `width`
/// visible cells.
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

fn is_sgr(seq: &str) -> bool {
    seq.starts_with("\x1b[") && seq.ends_with('m')
}

fn is_reset(seq: &str) -> bool {
    seq == RESET || seq == "\x1b[m"
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Blanks the other half of a wide character that `x` is part of.
    fn break_wide(&mut self, x: usize, y: usize) {
        let i = self.idx(x, y);
        if self.cells[i].cont && x > 0 {
            self.cells[i - 1] = Cell::default();
        }
        if self.cells[i].wide && x + 1 < self.width {
            self.cells[i + 1] = Cell::default();
        }
    }

    fn put(&mut self, x: usize, y: usize, text: String, style: &str, wide: bool) {
        self.break_wide(x, y);
        if wide {
            self.break_wide(x + 1, y);
        }
        let i = self.idx(x, y);
        self.cells[i] = Cell {
            text,
            style: style.to_string(),
            wide,
            cont: false,
        };
        if wide {
            self.cells[i + 1] = Cell {
                text: String::new(),
                style: style.to_string(),
                wide: false,
                cont: true,
            };
        }
    }

    /// Stamps a newline-separated block with its top-left corner at `(x, y)`.
    ///
    /// SGR state is tracked per line so each cell keeps the colors it was
    /// drawn with. Other escape sequences are dropped. A wide character that
    /// would straddle the right edge becomes a space.
    pub fn blit(&mut self, x: usize, y: usize, block: &str) {
        for (row, line) in block.split('\n').enumerate() {
            let gy = y + row;
            if gy >= self.height {
                break;
            }
            let mut style = String::new();
            let mut col = x;
            let mut last: Option<usize> = None;
            for token in tokens(line) {
                match token {
                    Token::Escape(seq) => {
                        if is_reset(seq) {
                            style.clear();
                        } else if is_sgr(seq) {
                            style.push_str(seq);
                        }
                    }
                    Token::Char(c) => {
                        let w = char_width(c);
                        if w == 0 {
                            if let Some(i) = last.filter(|_| !c.is_control()) {
                                self.cells[i].text.push(c);
                            }
                            continue;
                        }
                        if col >= self.width {
                            last = None;
                            col += w;
                            continue;
                        }
                        if w == 2 && col + 1 >= self.width {
                            self.put(col, gy, " ".to_string(), &style, false);
                            last = None;
                        } else {
                            self.put(col, gy, c.to_string(), &style, w == 2);
                            last = Some(self.idx(col, gy));
                        }
                        col += w;
                    }
                }
            }
        }
    }

    /// Serialises the grid, emitting SGR only where the style changes.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.width * self.height + self.height);
        for y in 0..self.height {
            if y > 0 {
                out.push('\n');
            }
            let mut current = "";
            for x in 0..self.width {
                let cell = &self.cells[self.idx(x, y)];
                if cell.cont {
                    continue;
                }
                if cell.style != current {
                    if !current.is_empty() {
                        out.push_str(RESET);
                    }
                    out.push_str(&cell.style);
                    current = &cell.style;
                }
                out.push_str(&cell.text);
            }
            if !current.is_empty() {
                out.push_str(RESET);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{paint, strip, visible_width};
    use proptest::prelude::*;

    fn plain(g: &Grid) -> Vec<String> {
        strip(&g.render()).split('\n').map(str::to_string).collect()
    }

    #[test]
    fn empty_grid_is_spaces() {
        let g = Grid::new(4, 2);
        assert_eq!(g.render(), "    \n    ");
    }

    #[test]
    fn blit_clips_right_and_bottom() {
        let mut g = Grid::new(5, 2);
        g.blit(3, 1, "abcdef\nzzz");
        assert_eq!(plain(&g), vec!["     ", "   ab"]);
    }

    #[test]
    fn later_blits_win() {
        let mut g = Grid::new(6, 1);
        g.blit(0, 0, "aaaaaa");
        g.blit(2, 0, "bb");
        assert_eq!(plain(&g), vec!["aabbaa"]);
    }

    #[test]
    fn styles_survive_and_reset_at_line_end() {
        let mut g = Grid::new(4, 1);
        g.blit(1, 0, &paint("ab", "#ff0000"));
        let out = g.render();
        assert!(out.starts_with(' '));
        assert!(out.contains("\x1b[38;2;255;0;0mab"));
        assert!(out.ends_with(&format!("{RESET} ")));
        assert_eq!(visible_width(&out), 4);
    }

    #[test]
    fn wide_char_at_edge_becomes_space() {
        let mut g = Grid::new(3, 1);
        g.blit(2, 0, "中");
        assert_eq!(plain(&g), vec!["   "]);
        g.blit(0, 0, "中");
        assert_eq!(plain(&g), vec!["中 "]);
    }

    #[test]
    fn overwriting_half_a_wide_char_blanks_the_other_half() {
        let mut g = Grid::new(4, 1);
        g.blit(0, 0, "中中");
        g.blit(1, 0, "x");
        assert_eq!(plain(&g), vec![" x中"]);
        assert_eq!(visible_width(&g.render()), 4);
    }

    #[test]
    fn combining_marks_attach_to_previous_cell() {
        let mut g = Grid::new(3, 1);
        g.blit(0, 0, "e\u{301}x");
        assert_eq!(plain(&g), vec!["e\u{301}x "]);
    }

    #[test]
    fn non_sgr_escapes_are_dropped() {
        let mut g = Grid::new(3, 1);
        g.blit(0, 0, "\x1b[2Kab");
        assert_eq!(g.render(), "ab ");
    }

    proptest! {
        #[test]
        fn render_is_exact(w in 1usize..40, h in 1usize..10,
                           blits in proptest::collection::vec((0usize..50, 0usize..12, "[a-z中 ]{0,30}"), 0..6)) {
            let mut g = Grid::new(w, h);
            for (x, y, s) in &blits {
                g.blit(*x, *y, s);
            }
            let out = g.render();
            let lines: Vec<&str> = out.split('\n').collect();
            prop_assert_eq!(lines.len(), h);
            for line in lines {
                prop_assert_eq!(visible_width(line), w);
            }
        }
    }
}
