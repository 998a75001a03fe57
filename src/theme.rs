//! Color palettes.

use crate::render::{BorderKind, BoxStyle, GaugeColors, TableStyle};

/// A named palette of `#RRGGBB` colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    /// Focused border, expanded box, highlights.
    pub accent: &'static str,
    /// Unfocused border.
    pub border: &'static str,
    pub text: &'static str,
    pub dim: &'static str,
    pub ok: &'static str,
    pub warn: &'static str,
    pub crit: &'static str,
    pub gauge_empty: &'static str,
    pub header: &'static str,
    pub zebra: &'static str,
    pub selection: &'static str,
    /// Series colors for graphs, cycled.
    pub series: [&'static str; 4],
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "default",
            accent: "#5fafff",
            border: "#585858",
            text: "#d0d0d0",
            dim: "#808080",
            ok: "#5fd787",
            warn: "#ffd75f",
            crit: "#ff5f5f",
            gauge_empty: "#303030",
            header: "#87afff",
            zebra: "#1c1c1c",
            selection: "#3a3a5f",
            series: ["#5fd7ff", "#d787ff", "#ffaf5f", "#87d787"],
        }
    }
}

impl Theme {
    pub const NAMES: [&'static str; 3] = ["default", "mono", "solarized"];

    /// Grayscale palette.
    pub fn mono() -> Self {
        Self {
            name: "mono",
            accent: "#ffffff",
            border: "#6c6c6c",
            text: "#d0d0d0",
            dim: "#808080",
            ok: "#bcbcbc",
            warn: "#e4e4e4",
            crit: "#ffffff",
            gauge_empty: "#303030",
            header: "#eeeeee",
            zebra: "#1c1c1c",
            selection: "#444444",
            series: ["#eeeeee", "#bcbcbc", "#8a8a8a", "#626262"],
        }
    }

    pub fn solarized() -> Self {
        Self {
            name: "solarized",
            accent: "#268bd2",
            border: "#586e75",
            text: "#93a1a1",
            dim: "#657b83",
            ok: "#859900",
            warn: "#b58900",
            crit: "#dc322f",
            gauge_empty: "#073642",
            header: "#2aa198",
            zebra: "#002b36",
            selection: "#073642",
            series: ["#2aa198", "#d33682", "#cb4b16", "#6c71c4"],
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "mono" => Some(Self::mono()),
            "solarized" => Some(Self::solarized()),
            _ => None,
        }
    }

    /// The theme after this one in [`Theme::NAMES`], wrapping.
    pub fn next(&self) -> Self {
        let idx = Self::NAMES.iter().position(|n| *n == self.name).unwrap_or(0);
        let next = Self::NAMES[(idx + 1) % Self::NAMES.len()];
        Self::by_name(next).unwrap_or_default()
    }

    pub fn series_color(&self, i: usize) -> &'static str {
        self.series[i % self.series.len()]
    }

    /// Color for a percentage against the usual 75/90 thresholds.
    pub fn level_color(&self, pct: f64) -> &'static str {
        if pct >= 90.0 {
            self.crit
        } else if pct >= 75.0 {
            self.warn
        } else {
            self.ok
        }
    }

    pub fn gauge_colors(&self) -> GaugeColors {
        GaugeColors {
            fill: self.ok.to_string(),
            warning: self.warn.to_string(),
            critical: self.crit.to_string(),
            empty: self.gauge_empty.to_string(),
        }
    }

    pub fn table_style(&self) -> TableStyle {
        TableStyle {
            show_borders: true,
            header_fg: self.header.to_string(),
            separator_fg: self.border.to_string(),
            indicator_fg: self.dim.to_string(),
            even_bg: None,
            odd_bg: Some(self.zebra.to_string()),
            selected_bg: self.selection.to_string(),
        }
    }

    /// Widget frame: accent when focused, border color otherwise.
    pub fn frame(&self, title: &str, focused: bool) -> BoxStyle {
        BoxStyle::new(BorderKind::Rounded)
            .with_title(title)
            .with_fg(if focused { self.accent } else { self.border })
    }
}
