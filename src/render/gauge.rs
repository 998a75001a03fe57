//! Horizontal bar gauges with 1/8-cell precision.

use crate::text::ansi::RESET;
use crate::text::{bg, fg, fit, pad_left, pad_right, visible_width};

/// Partial-cell glyphs indexed by eighths filled (index 0 is unused).
pub const PARTIAL_BLOCKS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];
/// A completely filled cell.
pub const FULL_BLOCK: char = '█';

const EPSILON: f64 = 1e-9;

/// Colors used by a gauge, all `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeColors {
    pub fill: String,
    pub warning: String,
    pub critical: String,
    /// Background of the unfilled part of the bar.
    pub empty: String,
}

impl Default for GaugeColors {
    fn default() -> Self {
        Self {
            fill: "#5fd787".to_string(),
            warning: "#ffd75f".to_string(),
            critical: "#ff5f5f".to_string(),
            empty: "#303030".to_string(),
        }
    }
}

/// Splits `ratio × width` into `(full cells, partial level 0..=7)`.
///
/// A nonzero fractional part always yields a partial level of at least 1.
pub fn cell_split(ratio: f64, width: usize) -> (usize, usize) {
    let cells = ratio.clamp(0.0, 1.0) * width as f64;
    let full = (cells + EPSILON).floor();
    let frac = cells - full;
    let full = (full as usize).min(width);
    if frac <= EPSILON || full >= width {
        return (full, 0);
    }
    let level = ((frac * 8.0 + EPSILON).floor() as usize).clamp(1, 7);
    (full, level)
}

/// A single horizontal gauge.
#[derive(Debug, Clone)]
pub struct Gauge {
    value: f64,
    max: f64,
    warn_threshold: f64,
    crit_threshold: f64,
    colors: GaugeColors,
    label: Option<String>,
    label_width: usize,
    show_percent: bool,
    show_value: bool,
}

impl Gauge {
    pub fn new(value: f64, max: f64) -> Self {
        Self {
            value,
            max,
            warn_threshold: 0.75,
            crit_threshold: 0.9,
            colors: GaugeColors::default(),
            label: None,
            label_width: 0,
            show_percent: false,
            show_value: false,
        }
    }

    /// Gauge over `0..=100`.
    pub fn percent(pct: f64) -> Self {
        Self::new(pct, 100.0)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label_width = self.label_width.max(visible_width(&label));
        self.label = Some(label);
        self
    }

    /// Pads the label to `width` cells (used to align stacked gauges).
    pub fn with_label_width(mut self, width: usize) -> Self {
        self.label_width = width;
        self
    }

    pub fn with_thresholds(mut self, warn: f64, crit: f64) -> Self {
        self.warn_threshold = warn.clamp(0.0, 1.0);
        self.crit_threshold = crit.clamp(0.0, 1.0);
        self
    }

    pub fn with_colors(mut self, colors: GaugeColors) -> Self {
        self.colors = colors;
        self
    }

    pub fn with_percent(mut self, show: bool) -> Self {
        self.show_percent = show;
        self
    }

    pub fn with_value(mut self, show: bool) -> Self {
        self.show_value = show;
        self
    }

    /// Fill ratio clamped into `[0, 1]`; zero for a non-positive max.
    pub fn ratio(&self) -> f64 {
        if self.max <= 0.0 || !self.value.is_finite() || !self.max.is_finite() {
            return 0.0;
        }
        (self.value / self.max).clamp(0.0, 1.0)
    }

    /// Fill color chosen by threshold.
    pub fn color(&self) -> &str {
        let r = self.ratio();
        if r >= self.crit_threshold {
            &self.colors.critical
        } else if r >= self.warn_threshold {
            &self.colors.warning
        } else {
            &self.colors.fill
        }
    }

    /// Renders only the bar, exactly `width` cells.
    pub fn bar(&self, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let (full, level) = cell_split(self.ratio(), width);
        let partial = usize::from(level > 0);
        let empty = width - full - partial;

        let fill_fg = fg(self.color());
        let empty_bg = bg(&self.colors.empty);
        let mut out = String::new();
        if full > 0 {
            out.push_str(&fill_fg);
            out.extend(std::iter::repeat_n(FULL_BLOCK, full));
            out.push_str(RESET);
        }
        if partial > 0 {
            out.push_str(&fill_fg);
            out.push_str(&empty_bg);
            out.push(PARTIAL_BLOCKS[level]);
            out.push_str(RESET);
        }
        if empty > 0 {
            out.push_str(&empty_bg);
            out.extend(std::iter::repeat_n(' ', empty));
            out.push_str(RESET);
        }
        out
    }

    fn suffix(&self) -> String {
        let mut parts = Vec::new();
        if self.show_percent {
            parts.push(pad_left(&format!("{:.0}%", self.ratio() * 100.0), 4));
        }
        if self.show_value {
            parts.push(format!("{:.1}/{:.1}", self.value, self.max));
        }
        parts.join(" ")
    }

    /// Renders label, bar and suffix into exactly `width` cells.
    ///
    /// The bar absorbs whatever the affixes leave; when nothing is left the
    /// affixes alone are truncated to `width`.
    pub fn render(&self, width: usize) -> String {
        if width == 0 {
            return String::new();
        }
        let prefix = match &self.label {
            Some(l) => format!("{} ", pad_right(l, self.label_width)),
            None => String::new(),
        };
        let suffix = self.suffix();
        let suffix = if suffix.is_empty() {
            suffix
        } else {
            format!(" {suffix}")
        };
        let affixes = visible_width(&prefix) + visible_width(&suffix);
        if affixes >= width {
            return fit(&format!("{prefix}{suffix}"), width);
        }
        format!("{prefix}{}{suffix}", self.bar(width - affixes))
    }
}

/// A vertical stack of gauges whose labels are right-aligned to a common width.
#[derive(Debug, Clone, Default)]
pub struct MultiGauge {
    rows: Vec<(String, Gauge)>,
}

impl MultiGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: impl Into<String>, gauge: Gauge) {
        self.rows.push((label.into(), gauge));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One line per gauge, each exactly `width` cells.
    pub fn render(&self, width: usize) -> Vec<String> {
        let label_w = self
            .rows
            .iter()
            .map(|(l, _)| visible_width(l))
            .max()
            .unwrap_or(0);
        self.rows
            .iter()
            .map(|(label, gauge)| {
                let label = pad_left(label, label_w);
                gauge.clone().with_label(label).render(width)
            })
            .collect()
    }
}
