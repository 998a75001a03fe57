//! One-line block-character charts.

use crate::fmt::format_si;
use crate::text::{fit, paint, visible_width};

/// Block characters for sparkline rendering (8 levels).
pub const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Level used when every sample in the window is equal.
const FLAT_LEVEL: usize = 3;

/// Direction of the last change in a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Flat,
}

impl TrendDirection {
    pub const fn arrow(&self) -> char {
        match self {
            Self::Up => '↑',
            Self::Down => '↓',
            Self::Flat => '→',
        }
    }
}

/// Compares the last two samples: direction and percent change relative to `|prev|`.
///
/// A change away from zero reports 100%.
pub fn trend(data: &[f64]) -> Option<(TrendDirection, f64)> {
    let [.., prev, curr] = data else {
        return None;
    };
    let (prev, curr) = (*prev, *curr);
    let dir = if curr > prev {
        TrendDirection::Up
    } else if curr < prev {
        TrendDirection::Down
    } else {
        TrendDirection::Flat
    };
    let pct = if prev == 0.0 {
        if curr == 0.0 { 0.0 } else { 100.0 }
    } else {
        ((curr - prev) / prev.abs()).abs() * 100.0
    };
    Some((dir, pct))
}

/// Maps each sample of `window` to a level in `0..=7`.
pub fn levels(window: &[f64], min_y: Option<f64>, max_y: Option<f64>) -> Vec<usize> {
    let finite = window.iter().copied().filter(|v| v.is_finite());
    let lo = min_y.unwrap_or_else(|| finite.clone().fold(f64::INFINITY, f64::min));
    let hi = max_y.unwrap_or_else(|| finite.fold(f64::NEG_INFINITY, f64::max));
    let span = hi - lo;
    window
        .iter()
        .map(|&v| {
            if !span.is_finite() || span <= 0.0 {
                return FLAT_LEVEL;
            }
            if !v.is_finite() {
                return 0;
            }
            let norm = ((v - lo) / span).clamp(0.0, 1.0);
            ((norm * 7.0).round() as usize).min(7)
        })
        .collect()
}

/// A sparkline over a borrowed series.
#[derive(Debug, Clone)]
pub struct Sparkline<'a> {
    data: &'a [f64],
    min_y: Option<f64>,
    max_y: Option<f64>,
    color: Option<String>,
    label: Option<String>,
    show_bounds: bool,
    show_trend: bool,
}

impl<'a> Sparkline<'a> {
    pub fn new(data: &'a [f64]) -> Self {
        Self {
            data,
            min_y: None,
            max_y: None,
            color: None,
            label: None,
            show_bounds: false,
            show_trend: false,
        }
    }

    /// Fixes the Y range instead of using the window's min/max.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_y = Some(min);
        self.max_y = Some(max);
        self
    }

    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color = Some(hex.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Flanks the chart with the window's min and max.
    pub fn with_bounds(mut self, show: bool) -> Self {
        self.show_bounds = show;
        self
    }

    /// Appends `↑/↓/→ P%` for the last change.
    pub fn with_trend(mut self, show: bool) -> Self {
        self.show_trend = show;
        self
    }

    /// Only the chart glyphs: exactly `width` cells, newest sample on the right.
    pub fn chart(&self, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let start = self.data.len().saturating_sub(width);
        let window = &self.data[start..];
        let glyphs: String = levels(window, self.min_y, self.max_y)
            .into_iter()
            .map(|l| SPARK_CHARS[l])
            .collect();
        let pad = " ".repeat(width - window.len());
        match &self.color {
            Some(c) => format!("{pad}{}", paint(&glyphs, c)),
            None => format!("{pad}{glyphs}"),
        }
    }

    /// Chart plus optional affixes, exactly `width` cells.
    pub fn render(&self, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let mut prefix = String::new();
        if let Some(l) = &self.label {
            prefix.push_str(l);
            prefix.push(' ');
        }
        let mut suffix = String::new();
        let start = self.data.len().saturating_sub(width);
        let window = &self.data[start..];
        if self.show_bounds && !window.is_empty() {
            let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prefix.push_str(&format_si(lo));
            prefix.push(' ');
            suffix.push(' ');
            suffix.push_str(&format_si(hi));
        }
        if self.show_trend {
            if let Some((dir, pct)) = trend(self.data) {
                suffix.push_str(&format!(" {} {:.0}%", dir.arrow(), pct));
            }
        }
        let affixes = visible_width(&prefix) + visible_width(&suffix);
        if affixes >= width {
            return fit(&format!("{prefix}{suffix}"), width);
        }
        format!("{prefix}{}{suffix}", self.chart(width - affixes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::strip;

    #[test]
    fn ramp_is_monotone() {
        let data: Vec<f64> = (0..8).map(f64::from).collect();
        let out: Vec<char> = Sparkline::new(&data).chart(8).chars().collect();
        assert_eq!(out.len(), 8);
        assert_eq!(out.first(), Some(&'▁'));
        assert_eq!(out.last(), Some(&'█'));
        for pair in out.windows(2) {
            let a = SPARK_CHARS.iter().position(|c| *c == pair[0]);
            let b = SPARK_CHARS.iter().position(|c| *c == pair[1]);
            assert!(b >= a);
        }
    }

    #[test]
    fn flat_series_renders_mid_level() {
        let data = [5.0; 4];
        assert_eq!(Sparkline::new(&data).chart(4), "▄▄▄▄");
    }

    #[test]
    fn short_series_left_padded() {
        let data = [1.0, 2.0];
        assert_eq!(Sparkline::new(&data).chart(4), "  ▁█");
    }

    #[test]
    fn keeps_last_width_samples() {
        let data = [100.0, 0.0, 1.0];
        assert_eq!(Sparkline::new(&data).chart(2), "▁█");
    }

    #[test]
    fn explicit_range_is_respected() {
        let data = [50.0];
        assert_eq!(Sparkline::new(&data).with_range(0.0, 100.0).chart(1), "▅");
    }

    #[test]
    fn trend_percentages() {
        assert_eq!(trend(&[10.0, 12.0]), Some((TrendDirection::Up, 20.0)));
        assert_eq!(trend(&[-10.0, -15.0]), Some((TrendDirection::Down, 50.0)));
        assert_eq!(trend(&[0.0, 3.0]), Some((TrendDirection::Up, 100.0)));
        assert_eq!(trend(&[4.0, 4.0]), Some((TrendDirection::Flat, 0.0)));
        assert_eq!(trend(&[1.0]), None);
    }

    #[test]
    fn render_with_affixes_has_exact_width() {
        let data = [1.0, 5.0, 3.0, 8.0];
        let out = Sparkline::new(&data)
            .with_label("rx")
            .with_bounds(true)
            .with_trend(true)
            .with_color("#00ffff")
            .render(24);
        assert_eq!(visible_width(&out), 24);
        let plain = strip(&out);
        assert!(plain.starts_with("rx 1 "));
        assert!(plain.ends_with(" 8 ↑ 167%"));
    }
}
