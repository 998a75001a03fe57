//! Braille-dot time-series plots.
//!
//! Each cell holds 2×4 dots. Chrome (legend, axes) is dropped as the area
//! shrinks, and areas below 10×2 show a short notice instead of a plot.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::fmt::{FmtStyle, format_duration, format_si};
use crate::text::ansi::RESET;
use crate::text::{center_block, fg, fit, pad_left, paint, truncate, visible_width};

/// Default time window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(300);

const MIN_WIDTH: usize = 10;
const MIN_HEIGHT: usize = 2;
const LEGEND_MIN_HEIGHT: usize = 3;
const X_AXIS_MIN_HEIGHT: usize = 5;
const Y_AXIS_MIN_WIDTH: usize = 20;
/// Label plus tick glyph.
const Y_AXIS_WIDTH: usize = 6;
const AXIS_COLOR: &str = "#808080";

const BRAILLE_BASE: u32 = 0x2800;
/// Dot bits indexed by `[dot row][dot column]`.
const DOT_BITS: [[u8; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

/// One named, colored series of `(time, value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            points: Vec::new(),
        }
    }

    pub fn with_points(mut self, points: Vec<(DateTime<Utc>, f64)>) -> Self {
        self.points = points;
        self
    }

    pub fn push(&mut self, t: DateTime<Utc>, v: f64) {
        self.points.push((t, v));
    }
}

/// Which pieces of chrome fit in a given area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub legend: bool,
    pub x_axis: bool,
    pub y_axis: bool,
}

impl Chrome {
    pub fn for_size(width: usize, height: usize) -> Self {
        Self {
            legend: height >= LEGEND_MIN_HEIGHT,
            x_axis: height >= X_AXIS_MIN_HEIGHT,
            y_axis: width >= Y_AXIS_MIN_WIDTH,
        }
    }
}

/// A multi-series time graph.
#[derive(Debug, Clone)]
pub struct TimeGraph {
    series: Vec<Series>,
    window: Duration,
    y_min: Option<f64>,
    y_max: Option<f64>,
    now: Option<DateTime<Utc>>,
}

impl Default for TimeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeGraph {
    pub fn new() -> Self {
        Self {
            series: Vec::new(),
            window: DEFAULT_WINDOW,
            y_min: None,
            y_max: None,
            now: None,
        }
    }

    pub fn with_series(mut self, series: Series) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        if !window.is_zero() {
            self.window = window;
        }
        self
    }

    /// Fixes the Y bounds; unset bounds are derived from the data.
    pub fn with_y_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.y_min = min;
        self.y_max = max;
        self
    }

    /// Anchors the right edge of the window. Defaults to the newest point.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn anchor(&self) -> DateTime<Utc> {
        self.now
            .or_else(|| {
                self.series
                    .iter()
                    .flat_map(|s| s.points.iter().map(|(t, _)| *t))
                    .max()
            })
            .unwrap_or_else(Utc::now)
    }

    fn window_secs(&self) -> f64 {
        self.window.as_secs_f64()
    }

    fn in_window(&self, t: DateTime<Utc>, now: DateTime<Utc>) -> Option<f64> {
        let age = (now - t).num_milliseconds() as f64 / 1000.0;
        let span = self.window_secs();
        if age < 0.0 || age > span {
            return None;
        }
        Some((span - age) / span)
    }

    /// Y range: explicit bounds win, otherwise the data span padded by 10%.
    pub fn y_range(&self, now: DateTime<Utc>) -> (f64, f64) {
        let values: Vec<f64> = self
            .series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(t, v)| v.is_finite() && self.in_window(*t, now).is_some())
            .map(|(_, v)| *v)
            .collect();
        let (lo, hi) = if values.is_empty() {
            (0.0, 1.0)
        } else {
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let span = hi - lo;
            if span <= f64::EPSILON {
                let pad = (lo.abs() * 0.1).max(1.0);
                (lo - pad, hi + pad)
            } else {
                (lo - span * 0.1, hi + span * 0.1)
            }
        };
        let lo = self.y_min.unwrap_or(lo);
        let hi = self.y_max.unwrap_or(hi);
        if hi > lo { (lo, hi) } else { (lo, lo + 1.0) }
    }

    /// Plots the dots into a `cols`×`rows` cell grid of `(mask, series index)`.
    fn plot(&self, cols: usize, rows: usize, now: DateTime<Utc>) -> Vec<Vec<(u8, Option<usize>)>> {
        let mut grid = vec![vec![(0u8, None); cols]; rows];
        if cols == 0 || rows == 0 {
            return grid;
        }
        let (y_lo, y_hi) = self.y_range(now);
        let dots_x = (cols * 2 - 1) as f64;
        let dots_y = (rows * 4 - 1) as f64;
        for (si, series) in self.series.iter().enumerate() {
            for (t, v) in &series.points {
                let Some(xf) = self.in_window(*t, now) else {
                    continue;
                };
                if !v.is_finite() {
                    continue;
                }
                let yf = ((v - y_lo) / (y_hi - y_lo)).clamp(0.0, 1.0);
                let x = ((xf * dots_x).floor() as usize).min(cols * 2 - 1);
                let y = (((1.0 - yf) * dots_y).floor() as usize).min(rows * 4 - 1);
                let cell = &mut grid[y / 4][x / 2];
                cell.0 |= DOT_BITS[y % 4][x % 2];
                cell.1 = Some(si);
            }
        }
        grid
    }

    fn legend(&self, width: usize) -> String {
        let items: Vec<String> = self
            .series
            .iter()
            .map(|s| format!("{} {}", paint("■", &s.color), s.name))
            .collect();
        fit(&items.join("  "), width)
    }

    fn x_axis(&self, width: usize) -> String {
        let mut buf: Vec<char> = vec![' '; width];
        let place = |label: &str, center: usize, buf: &mut Vec<char>, taken: &mut Vec<(usize, usize)>| {
            let len = label.chars().count();
            if len > width {
                return;
            }
            let start = center.saturating_sub(len / 2).min(width - len);
            let end = start + len;
            if taken.iter().any(|&(s, e)| start < e + 1 && s < end + 1) {
                return;
            }
            for (i, c) in label.chars().enumerate() {
                buf[start + i] = c;
            }
            taken.push((start, end));
        };
        let secs = self.window.as_secs() as i64;
        let mut taken = Vec::new();
        place(&format!("-{}", format_duration(secs, FmtStyle::Compact)), 0, &mut buf, &mut taken);
        place("now", width.saturating_sub(1), &mut buf, &mut taken);
        for q in 1..4 {
            let remaining = secs * (4 - q) / 4;
            let label = format!("-{}", format_duration(remaining, FmtStyle::Compact));
            place(&label, width * q as usize / 4, &mut buf, &mut taken);
        }
        paint(&buf.into_iter().collect::<String>(), AXIS_COLOR)
    }

    fn y_label(value: f64, tick: bool) -> String {
        let label = pad_left(&truncate(&format_si(value), Y_AXIS_WIDTH - 1), Y_AXIS_WIDTH - 1);
        let glyph = if tick { '┤' } else { '│' };
        paint(&format!("{label}{glyph}"), AXIS_COLOR)
    }

    /// Renders exactly `height` lines of exactly `width` cells.
    pub fn render(&self, width: usize, height: usize) -> String {
        if width == 0 || height == 0 {
            return String::new();
        }
        if width < MIN_WIDTH || height < MIN_HEIGHT {
            return center_block("too small", width, height);
        }
        let chrome = Chrome::for_size(width, height);
        let now = self.anchor();
        let plot_w = width - if chrome.y_axis { Y_AXIS_WIDTH } else { 0 };
        let plot_h = height - usize::from(chrome.legend) - usize::from(chrome.x_axis);

        let mut lines = Vec::with_capacity(height);
        if chrome.legend {
            lines.push(self.legend(width));
        }

        let grid = self.plot(plot_w, plot_h, now);
        let (y_lo, y_hi) = self.y_range(now);
        let mid_row = plot_h / 2;
        for (r, row) in grid.iter().enumerate() {
            let mut line = String::new();
            if chrome.y_axis {
                let label = if r == 0 {
                    Some(y_hi)
                } else if r + 1 == plot_h {
                    Some(y_lo)
                } else if plot_h >= 5 && r == mid_row {
                    Some((y_lo + y_hi) / 2.0)
                } else {
                    None
                };
                line.push_str(&match label {
                    Some(v) => Self::y_label(v, true),
                    None => paint(&format!("{}│", " ".repeat(Y_AXIS_WIDTH - 1)), AXIS_COLOR),
                });
            }
            let mut current: Option<usize> = None;
            for &(mask, series) in row {
                if mask == 0 {
                    if current.take().is_some() {
                        line.push_str(RESET);
                    }
                    line.push(' ');
                    continue;
                }
                if series != current {
                    if let Some(si) = series {
                        line.push_str(&fg(&self.series[si].color));
                    }
                    current = series;
                }
                line.push(char::from_u32(BRAILLE_BASE + mask as u32).unwrap_or(' '));
            }
            if current.is_some() {
                line.push_str(RESET);
            }
            lines.push(line);
        }

        if chrome.x_axis {
            let prefix = if chrome.y_axis {
                " ".repeat(Y_AXIS_WIDTH)
            } else {
                String::new()
            };
            lines.push(format!("{prefix}{}", self.x_axis(plot_w)));
        }
        debug_assert!(lines.iter().all(|l| visible_width(l) == width));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ramp(n: i64) -> Series {
        let points = (0..n)
            .map(|i| (now() - chrono::Duration::seconds((n - 1 - i) * 10), i as f64))
            .collect();
        Series::new("cpu", "#00ffff").with_points(points)
    }

    #[test]
    fn too_small_banner() {
        let out = TimeGraph::new().render(9, 3);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| visible_width(l) == 9));
        assert!(out.contains("too small"));
        assert_eq!(TimeGraph::new().render(0, 3), "");
    }

    #[test]
    fn dot_placement_corners() {
        let series = Series::new("s", "#ffffff").with_points(vec![
            (now() - chrono::Duration::seconds(300), 10.0),
            (now(), 0.0),
        ]);
        let out = TimeGraph::new()
            .with_series(series)
            .with_y_bounds(Some(0.0), Some(10.0))
            .with_now(now())
            .render(10, 2);
        let lines: Vec<String> = out.split('\n').map(strip).collect();
        assert_eq!(lines.len(), 2);
        // Oldest point at the top-left dot, newest at the bottom-right dot.
        assert_eq!(lines[0].chars().next(), Some('\u{2801}'));
        assert_eq!(lines[1].chars().last(), Some('\u{2880}'));
    }

    #[test]
    fn chrome_degrades_with_size() {
        assert_eq!(
            Chrome::for_size(30, 4),
            Chrome {
                legend: true,
                x_axis: false,
                y_axis: true
            }
        );
        assert_eq!(
            Chrome::for_size(15, 2),
            Chrome {
                legend: false,
                x_axis: false,
                y_axis: false
            }
        );
    }

    #[test]
    fn full_chrome_layout() {
        let g = TimeGraph::new().with_series(ramp(30)).with_now(now());
        let out = g.render(40, 8);
        let lines: Vec<String> = out.split('\n').map(strip).collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[0].contains("■ cpu"));
        assert!(lines[1].contains('┤'));
        let axis = lines.last().map(String::as_str).unwrap_or("");
        assert!(axis.trim_start().starts_with("-5m"));
        assert!(axis.ends_with("now"));
    }

    #[test]
    fn y_range_defaults() {
        let g = TimeGraph::new();
        assert_eq!(g.y_range(now()), (0.0, 1.0));
        let single = TimeGraph::new()
            .with_series(Series::new("x", "#fff000").with_points(vec![(now(), 50.0)]));
        assert_eq!(single.y_range(now()), (45.0, 55.0));
        let small = TimeGraph::new()
            .with_series(Series::new("x", "#fff000").with_points(vec![(now(), 2.0)]));
        assert_eq!(small.y_range(now()), (1.0, 3.0));
        let spread = TimeGraph::new().with_series(
            Series::new("x", "#fff000").with_points(vec![(now(), 0.0), (now(), 10.0)]),
        );
        assert_eq!(spread.y_range(now()), (-1.0, 11.0));
    }

    #[test]
    fn last_series_colors_shared_cell() {
        let a = Series::new("a", "#ff0000").with_points(vec![(now(), 5.0)]);
        let b = Series::new("b", "#0000ff").with_points(vec![(now(), 5.0)]);
        let out = TimeGraph::new()
            .with_series(a)
            .with_series(b)
            .with_now(now())
            .render(10, 2);
        assert!(out.contains(&fg("#0000ff")));
        assert!(!out.contains(&fg("#ff0000")));
    }

    #[test]
    fn points_outside_window_are_ignored() {
        let old = Series::new("old", "#ffffff")
            .with_points(vec![(now() - chrono::Duration::seconds(600), 1.0)]);
        let out = TimeGraph::new().with_series(old).with_now(now()).render(10, 2);
        assert!(strip(&out).chars().all(|c| c == ' ' || c == '\n'));
    }

    proptest! {
        #[test]
        fn exact_dimensions(w in 1usize..80, h in 1usize..20, n in 0i64..60) {
            let out = TimeGraph::new().with_series(ramp(n)).with_now(now()).render(w, h);
            let lines: Vec<&str> = out.split('\n').collect();
            prop_assert_eq!(lines.len(), h);
            for l in lines {
                prop_assert_eq!(visible_width(l), w);
            }
        }
    }
}
