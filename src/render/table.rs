//! Scrollable, filterable, selectable data table.
//!
//! State lives behind a mutex so handlers holding `&DataTable` can scroll,
//! select and replace rows. Column widths are resolved on every render from
//! the column specs and the target width.

use parking_lot::Mutex;

use super::boxes::Align;
use crate::text::ansi::{BOLD, RESET};
use crate::text::{bg, center_block, fg, fit, fit_ellipsis, pad_center, pad_left, paint, visible_width};

/// Width below which column separators are suppressed.
pub const SEPARATOR_MIN_WIDTH: usize = 20;

/// How a column claims horizontal space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    /// Exactly `n` cells (clamped by what is left).
    Fixed(usize),
    /// `p` percent of the available width.
    Percent(u16),
    /// An equal share of the remainder.
    Fill,
}

/// Column specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub width: ColumnWidth,
    pub min_width: usize,
    pub align: Align,
}

impl Column {
    pub fn new(title: impl Into<String>, width: ColumnWidth) -> Self {
        Self {
            title: title.into(),
            width,
            min_width: 0,
            align: Align::Left,
        }
    }

    pub fn min(mut self, min_width: usize) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Colors and chrome of a table, all `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStyle {
    pub show_borders: bool,
    pub header_fg: String,
    pub separator_fg: String,
    pub indicator_fg: String,
    pub even_bg: Option<String>,
    pub odd_bg: Option<String>,
    pub selected_bg: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            show_borders: true,
            header_fg: "#87afff".to_string(),
            separator_fg: "#585858".to_string(),
            indicator_fg: "#808080".to_string(),
            even_bg: None,
            odd_bg: Some("#1c1c1c".to_string()),
            selected_bg: "#3a3a5f".to_string(),
        }
    }
}

/// Row filter predicate over a row's cells.
pub type RowFilter = Box<dyn Fn(&[String]) -> bool + Send>;

#[derive(Default)]
struct TableState {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    scroll_offset: usize,
    /// Index into the filtered rows.
    selected: Option<usize>,
    filter: Option<RowFilter>,
    frozen: bool,
    /// Data rows shown by the last render; drives page sizes.
    last_visible: usize,
}

impl TableState {
    fn visible_rows(&self) -> Vec<&Vec<String>> {
        match &self.filter {
            Some(f) => self.rows.iter().filter(|r| f(r)).collect(),
            None => self.rows.iter().collect(),
        }
    }

    fn visible_count(&self) -> usize {
        match &self.filter {
            Some(f) => self.rows.iter().filter(|r| f(r)).count(),
            None => self.rows.len(),
        }
    }

    /// Keeps selection and offset inside the current row set.
    fn clamp(&mut self) {
        let count = self.visible_count();
        self.selected = match self.selected {
            Some(_) if count == 0 => None,
            Some(s) => Some(s.min(count - 1)),
            None => None,
        };
        let page = self.last_visible.max(1);
        self.scroll_offset = self.scroll_offset.min(count.saturating_sub(page));
    }
}

/// Resolves column widths for `total` cells.
///
/// Passes: separator overhead, fixed, percent, fill (leftover to the leftmost
/// fill), then minimum widths stolen from the rightmost fill with slack. The
/// sum never exceeds the available width.
pub fn resolve_widths(columns: &[Column], total: usize, show_borders: bool) -> Vec<usize> {
    let n = columns.len();
    if n == 0 {
        return Vec::new();
    }
    let mut available = total;
    if show_borders && total >= SEPARATOR_MIN_WIDTH {
        available = available.saturating_sub(n - 1);
    }

    let mut widths = vec![0usize; n];
    let mut remaining = available;
    for (i, col) in columns.iter().enumerate() {
        if let ColumnWidth::Fixed(w) = col.width {
            widths[i] = w.min(remaining);
            remaining -= widths[i];
        }
    }
    for (i, col) in columns.iter().enumerate() {
        if let ColumnWidth::Percent(p) = col.width {
            let w = (p as usize * available / 100).min(remaining);
            widths[i] = w;
            remaining -= w;
        }
    }
    let fills: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.width == ColumnWidth::Fill)
        .map(|(i, _)| i)
        .collect();
    if !fills.is_empty() {
        let share = remaining / fills.len();
        let leftover = remaining % fills.len();
        for (k, &i) in fills.iter().enumerate() {
            widths[i] = share + if k == 0 { leftover } else { 0 };
        }
    }

    for i in 0..n {
        let min = columns[i].min_width;
        if widths[i] >= min {
            continue;
        }
        let mut deficit = min - widths[i];
        for &j in fills.iter().rev() {
            if j == i || deficit == 0 {
                continue;
            }
            let slack = widths[j].saturating_sub(columns[j].min_width);
            let take = slack.min(deficit);
            widths[j] -= take;
            widths[i] += take;
            deficit -= take;
        }
    }

    let mut sum: usize = widths.iter().sum();
    let shrink_order = fills.iter().rev().copied().chain((0..n).rev());
    for j in shrink_order {
        if sum <= available {
            break;
        }
        let take = widths[j].min(sum - available);
        widths[j] -= take;
        sum -= take;
    }
    widths
}

fn align_cell(cell: &str, width: usize, align: Align) -> String {
    if visible_width(cell) > width {
        return fit_ellipsis(cell, width);
    }
    match align {
        Align::Left => fit(cell, width),
        Align::Right => pad_left(cell, width),
        Align::Center => pad_center(cell, width),
    }
}

/// A table of string cells.
pub struct DataTable {
    state: Mutex<TableState>,
    style: TableStyle,
    selectable: bool,
}

impl DataTable {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            state: Mutex::new(TableState {
                columns,
                ..TableState::default()
            }),
            style: TableStyle::default(),
            selectable: false,
        }
    }

    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    pub fn set_style(&mut self, style: TableStyle) {
        self.style = style;
    }

    pub fn set_columns(&self, columns: Vec<Column>) {
        self.state.lock().columns = columns;
    }

    /// Replaces all rows. No-op while frozen.
    pub fn set_rows(&self, rows: Vec<Vec<String>>) {
        let mut st = self.state.lock();
        if st.frozen {
            return;
        }
        st.rows = rows;
        st.clamp();
    }

    /// Appends one row. No-op while frozen.
    pub fn append_row(&self, row: Vec<String>) {
        let mut st = self.state.lock();
        if st.frozen {
            return;
        }
        st.rows.push(row);
    }

    /// Removes all rows. No-op while frozen.
    pub fn clear_rows(&self) {
        let mut st = self.state.lock();
        if st.frozen {
            return;
        }
        st.rows.clear();
        st.clamp();
    }

    pub fn freeze(&self) {
        self.state.lock().frozen = true;
    }

    pub fn unfreeze(&self) {
        self.state.lock().frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.state.lock().frozen
    }

    pub fn set_filter(&self, filter: RowFilter) {
        let mut st = self.state.lock();
        st.filter = Some(filter);
        st.scroll_offset = 0;
        st.clamp();
    }

    pub fn clear_filter(&self) {
        let mut st = self.state.lock();
        st.filter = None;
        st.clamp();
    }

    /// Total rows, ignoring the filter.
    pub fn row_count(&self) -> usize {
        self.state.lock().rows.len()
    }

    /// Rows passing the filter.
    pub fn visible_count(&self) -> usize {
        self.state.lock().visible_count()
    }

    pub fn scroll_offset(&self) -> usize {
        self.state.lock().scroll_offset
    }

    pub fn scroll_down(&self, n: usize) {
        let mut st = self.state.lock();
        st.scroll_offset = st.scroll_offset.saturating_add(n);
        st.clamp();
    }

    pub fn scroll_up(&self, n: usize) {
        let mut st = self.state.lock();
        st.scroll_offset = st.scroll_offset.saturating_sub(n);
    }

    /// Selected index into the filtered rows.
    pub fn selected(&self) -> Option<usize> {
        self.state.lock().selected
    }

    /// Cells of the selected row.
    pub fn selected_row(&self) -> Option<Vec<String>> {
        let st = self.state.lock();
        let idx = st.selected?;
        st.visible_rows().get(idx).map(|r| (*r).clone())
    }

    /// Moves the selection down, or scrolls when rows are not selectable.
    pub fn select_next(&self) {
        if !self.selectable {
            self.scroll_down(1);
            return;
        }
        let mut st = self.state.lock();
        let count = st.visible_count();
        if count == 0 {
            return;
        }
        st.selected = Some(match st.selected {
            Some(s) => (s + 1).min(count - 1),
            None => 0,
        });
    }

    /// Moves the selection up, or scrolls when rows are not selectable.
    pub fn select_prev(&self) {
        if !self.selectable {
            self.scroll_up(1);
            return;
        }
        let mut st = self.state.lock();
        if st.visible_count() == 0 {
            return;
        }
        st.selected = Some(st.selected.map_or(0, |s| s.saturating_sub(1)));
    }

    pub fn page_down(&self) {
        let page = self.state.lock().last_visible.max(1);
        for _ in 0..page {
            self.select_next();
        }
    }

    pub fn page_up(&self) {
        let page = self.state.lock().last_visible.max(1);
        for _ in 0..page {
            self.select_prev();
        }
    }

    pub fn clear_selection(&self) {
        self.state.lock().selected = None;
    }

    /// Selects the `idx`-th visible row, clamped to the last one.
    pub fn select(&self, idx: usize) {
        if !self.selectable {
            return;
        }
        let mut st = self.state.lock();
        let count = st.visible_count();
        st.selected = if count == 0 { None } else { Some(idx.min(count - 1)) };
    }

    fn join_cells(&self, cells: Vec<String>, separators: bool) -> String {
        if separators {
            cells.join(&paint("│", &self.style.separator_fg))
        } else {
            cells.concat()
        }
    }

    fn with_row_bg(row: String, bg_hex: Option<&str>) -> String {
        let Some(hex) = bg_hex else {
            return row;
        };
        let esc = bg(hex);
        if esc.is_empty() {
            return row;
        }
        let row = row.replace(RESET, &format!("{RESET}{esc}"));
        format!("{esc}{row}{RESET}")
    }

    fn indicator(&self, msg: &str, width: usize) -> String {
        paint(&fit(&pad_center(msg, width), width), &self.style.indicator_fg)
    }

    /// Renders exactly `height` lines of exactly `width` cells.
    ///
    /// Clamps the scroll offset as a side effect and scrolls a selected row
    /// into view.
    pub fn render(&self, width: usize, height: usize) -> String {
        if width == 0 || height == 0 {
            return String::new();
        }
        let mut st = self.state.lock();
        let separators = self.style.show_borders && width >= SEPARATOR_MIN_WIDTH;
        let widths = resolve_widths(&st.columns, width, self.style.show_borders);
        let mut lines: Vec<String> = Vec::with_capacity(height);

        let header: Vec<String> = st
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| align_cell(&c.title, w, c.align))
            .collect();
        let header = fit(&self.join_cells(header, separators), width);
        lines.push(format!("{}{BOLD}{header}{RESET}", fg(&self.style.header_fg)));

        if height >= 2 {
            let rule: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
            let rule = if separators {
                rule.join("┼")
            } else {
                rule.concat()
            };
            lines.push(paint(&fit(&rule, width), &self.style.separator_fg));
        }

        let area = height - lines.len();
        let count = st.visible_count();
        if count == 0 {
            st.scroll_offset = 0;
            st.last_visible = area;
            if area > 0 {
                lines.extend(center_block("(no data)", width, area).split('\n').map(String::from));
            }
            return lines.join("\n");
        }
        if area == 0 {
            st.last_visible = 0;
            return lines.join("\n");
        }

        if self.selectable {
            if let Some(sel) = st.selected {
                // Assume both indicators are shown so the row stays visible.
                let page = if area > 2 { area - 2 } else { area };
                if sel < st.scroll_offset {
                    st.scroll_offset = sel;
                } else if sel >= st.scroll_offset + page {
                    st.scroll_offset = sel + 1 - page;
                }
            }
        }

        let mut offset = st.scroll_offset;
        let (mut top, mut bottom, mut visible) = (false, false, area);
        for _ in 0..2 {
            top = offset > 0;
            visible = area - usize::from(top);
            bottom = offset + visible < count;
            if bottom && visible > 0 {
                visible -= 1;
            }
            if visible == 0 {
                top = false;
                bottom = false;
                visible = area;
            }
            offset = offset.min(count.saturating_sub(visible));
        }
        st.scroll_offset = offset;
        st.last_visible = visible;

        if top {
            lines.push(self.indicator(&format!("▲ {offset} more"), width));
        }
        let rows = st.visible_rows();
        for (idx, row) in rows.iter().enumerate().skip(offset).take(visible) {
            let cells: Vec<String> = st
                .columns
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (c, &w))| {
                    align_cell(row.get(i).map(String::as_str).unwrap_or(""), w, c.align)
                })
                .collect();
            let line = fit(&self.join_cells(cells, separators), width);
            let bg_hex = if self.selectable && st.selected == Some(idx) {
                Some(self.style.selected_bg.as_str())
            } else if idx % 2 == 0 {
                self.style.even_bg.as_deref()
            } else {
                self.style.odd_bg.as_deref()
            };
            lines.push(Self::with_row_bg(line, bg_hex));
        }
        if bottom {
            let below = count.saturating_sub(offset + visible);
            lines.push(self.indicator(&format!("▼ {below} more"), width));
        }
        while lines.len() < height {
            lines.push(" ".repeat(width));
        }
        lines.truncate(height);
        lines.join("\n")
    }
}

impl std::fmt::Debug for DataTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state.lock();
        f.debug_struct("DataTable")
            .field("columns", &st.columns.len())
            .field("rows", &st.rows.len())
            .field("scroll_offset", &st.scroll_offset)
            .field("selected", &st.selected)
            .field("frozen", &st.frozen)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip;
    use proptest::prelude::*;

    fn table(n: usize) -> DataTable {
        let t = DataTable::new(vec![
            Column::new("name", ColumnWidth::Fill),
            Column::new("value", ColumnWidth::Fixed(6)).align(Align::Right),
        ]);
        t.set_rows(
            (0..n)
                .map(|i| vec![format!("row{i}"), i.to_string()])
                .collect(),
        );
        t
    }

    fn plain_lines(s: &str) -> Vec<String> {
        s.split('\n').map(strip).collect()
    }

    #[test]
    fn widths_fixed_percent_fill() {
        let cols = vec![
            Column::new("a", ColumnWidth::Fixed(5)),
            Column::new("b", ColumnWidth::Percent(50)),
            Column::new("c", ColumnWidth::Fill),
            Column::new("d", ColumnWidth::Fill),
        ];
        // 43 - 3 separators = 40: a=5, b=20, c/d split 15 -> 8/7.
        assert_eq!(resolve_widths(&cols, 43, true), vec![5, 20, 8, 7]);
        // Under 20 cells no separator overhead is reserved.
        assert_eq!(resolve_widths(&cols, 18, true), vec![5, 9, 2, 2]);
    }

    #[test]
    fn min_width_steals_from_rightmost_fill() {
        let cols = vec![
            Column::new("a", ColumnWidth::Fixed(2)).min(6),
            Column::new("b", ColumnWidth::Fill),
            Column::new("c", ColumnWidth::Fill).min(3),
        ];
        let w = resolve_widths(&cols, 22, true);
        // 20 available: a=2, fills 9/9; a takes 4 from c (slack 6).
        assert_eq!(w, vec![6, 9, 5]);
        assert!(w.iter().sum::<usize>() <= 20);
    }

    #[test]
    fn render_exact_dimensions_with_indicators() {
        let t = table(10);
        t.scroll_down(3);
        let out = t.render(30, 7);
        let lines = plain_lines(&out);
        assert_eq!(lines.len(), 7);
        assert!(out.split('\n').all(|l| visible_width(l) == 30));
        assert!(lines[2].contains("▲ 3 more"));
        assert!(lines[3].starts_with("row3"));
        assert!(lines[6].contains("▼ 4 more"));
    }

    #[test]
    fn offset_clamped_to_last_page() {
        let t = table(5);
        t.scroll_down(100);
        t.render(30, 5);
        assert_eq!(t.scroll_offset(), 3);
        let lines = plain_lines(&t.render(30, 5));
        assert!(lines.last().is_some_and(|l| l.starts_with("row4")));
    }

    #[test]
    fn indicators_suppressed_without_room() {
        let t = table(4);
        t.scroll_down(1);
        let lines = plain_lines(&t.render(30, 3));
        assert_eq!(lines.len(), 3);
        assert!(!lines[2].contains("more"));
        assert!(lines[2].starts_with("row1"));
    }

    #[test]
    fn empty_table_shows_placeholder() {
        let t = table(0);
        let lines = plain_lines(&t.render(24, 5));
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().any(|l| l.trim() == "(no data)"));
    }

    #[test]
    fn select_clamps_and_respects_selectable() {
        let t = table(3);
        t.select(1);
        assert_eq!(t.selected(), None);
        let t = table(3).selectable(true);
        t.select(10);
        assert_eq!(t.selected(), Some(2));
        assert_eq!(t.selected_row(), Some(vec!["row2".to_string(), "2".to_string()]));
    }

    #[test]
    fn narrow_table_has_no_separators() {
        let t = table(2);
        let out = strip(&t.render(15, 4));
        assert!(!out.contains('│'));
        assert!(!out.contains('┼'));
        let wide = strip(&t.render(30, 4));
        assert!(wide.contains('┼'));
    }

    #[test]
    fn frozen_table_ignores_row_mutations() {
        let t = table(3);
        t.freeze();
        t.set_rows(Vec::new());
        t.append_row(vec!["x".into(), "1".into()]);
        t.clear_rows();
        assert_eq!(t.row_count(), 3);
        t.unfreeze();
        t.clear_rows();
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn filter_and_selection() {
        let t = table(6).selectable(true);
        t.set_filter(Box::new(|row: &[String]| {
            row[0].ends_with('1') || row[0].ends_with('4')
        }));
        assert_eq!(t.visible_count(), 2);
        t.select_next();
        t.select_next();
        t.select_next();
        assert_eq!(t.selected(), Some(1));
        assert_eq!(
            t.selected_row(),
            Some(vec!["row4".to_string(), "4".to_string()])
        );
        t.clear_filter();
        assert_eq!(t.visible_count(), 6);
    }

    #[test]
    fn selected_row_scrolls_into_view() {
        let t = table(20).selectable(true);
        t.render(30, 6);
        for _ in 0..10 {
            t.select_next();
        }
        let lines = plain_lines(&t.render(30, 6));
        assert!(lines.iter().any(|l| l.starts_with("row9")));
    }

    #[test]
    fn long_cells_get_ellipsis() {
        let t = DataTable::new(vec![Column::new("n", ColumnWidth::Fixed(5))]);
        t.set_rows(vec![vec!["abcdefgh".into()]]);
        let lines = plain_lines(&t.render(5, 3));
        assert_eq!(lines[2], "abcd…");
    }

    proptest! {
        #[test]
        fn render_dimensions_and_clamp(
            rows in 0usize..40,
            scroll in 0usize..60,
            w in 1usize..60,
            h in 1usize..20,
        ) {
            let t = table(rows);
            t.scroll_down(scroll);
            let out = t.render(w, h);
            let lines: Vec<&str> = out.split('\n').collect();
            prop_assert_eq!(lines.len(), h);
            for l in &lines {
                prop_assert_eq!(visible_width(l), w);
            }
            let shown = lines.iter().filter(|l| strip(l).starts_with("row")).count();
            if rows > 0 && h >= 3 && w >= 11 {
                prop_assert!(shown >= 1);
                prop_assert!(t.scroll_offset() + shown <= rows);
            }
            prop_assert!(t.scroll_offset() <= rows.saturating_sub(1));
        }
    }
}
