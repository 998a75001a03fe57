//! Named frame sizes and their column layouts.

use std::fmt;

/// A named `(width, height)` frame.
///
/// Ordered by size: `Compact < Standard < Wide < UltraWide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Preset {
    #[default]
    Compact,
    Standard,
    Wide,
    UltraWide,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Compact,
        Preset::Standard,
        Preset::Wide,
        Preset::UltraWide,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Wide => "wide",
            Self::UltraWide => "ultrawide",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub const fn width(&self) -> usize {
        match self {
            Self::Compact => 80,
            Self::Standard => 120,
            Self::Wide => 160,
            Self::UltraWide => 200,
        }
    }

    pub const fn height(&self) -> usize {
        match self {
            Self::Compact => 24,
            Self::Standard => 35,
            Self::Wide => 45,
            Self::UltraWide => 50,
        }
    }

    /// Largest preset that fits the terminal in both dimensions, else `Compact`.
    pub fn select(term_w: usize, term_h: usize) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|p| p.width() <= term_w && p.height() <= term_h)
            .unwrap_or(Self::Compact)
    }

    /// Column shares in percent, left to right.
    pub const fn column_percents(&self) -> &'static [usize] {
        match self {
            Self::Compact => &[100],
            Self::Standard => &[40, 60],
            Self::Wide => &[30, 35, 35],
            Self::UltraWide => &[35, 33, 32],
        }
    }

    /// Index of the dedicated banner column, if the layout has one.
    pub const fn banner_column(&self) -> Option<usize> {
        match self {
            Self::Standard => Some(0),
            _ => None,
        }
    }

    /// Column widths for `total` cells; the last column takes the rounding remainder.
    pub fn column_widths(&self, total: usize) -> Vec<usize> {
        let pcts = self.column_percents();
        let mut widths: Vec<usize> = pcts.iter().map(|p| p * total / 100).collect();
        let used: usize = widths[..widths.len() - 1].iter().sum();
        if let Some(last) = widths.last_mut() {
            *last = total.saturating_sub(used);
        }
        widths
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
