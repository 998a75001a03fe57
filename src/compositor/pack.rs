//! Greedy column packing.

use super::preset::Preset;

/// ID prefix that marks a widget for the dedicated banner column.
pub const BANNER_TAG: &str = "banner";

/// Which column family a widget asks to be packed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PreferredColumn {
    Banner,
    #[default]
    Data,
}

impl PreferredColumn {
    /// Default by ID convention: `banner*` goes to the banner column.
    pub fn for_id(id: &str) -> Self {
        if id.starts_with(BANNER_TAG) {
            Self::Banner
        } else {
            Self::Data
        }
    }
}

/// A pre-rendered widget handed to the compositor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WidgetSpec {
    pub id: String,
    pub title: String,
    /// Box interior, already rendered.
    pub content: String,
    pub min_w: usize,
    pub min_h: usize,
    pub preferred: PreferredColumn,
}

impl WidgetSpec {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        min_w: usize,
        min_h: usize,
    ) -> Self {
        let id = id.into();
        let preferred = PreferredColumn::for_id(&id);
        Self {
            id,
            title: title.into(),
            content: content.into(),
            min_w,
            min_h,
            preferred,
        }
    }

    pub fn with_preferred(mut self, preferred: PreferredColumn) -> Self {
        self.preferred = preferred;
        self
    }
}

/// Where one spec lands on the grid. `index` points into the packed slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

struct Col {
    x: usize,
    w: usize,
    cursor: usize,
}

impl Col {
    /// Claims up to `want` rows; `None` when nothing is left.
    fn claim(&mut self, index: usize, want: usize, height: usize) -> Option<Placement> {
        let h = want.min(height.saturating_sub(self.cursor));
        if h == 0 || self.w == 0 {
            return None;
        }
        let p = Placement {
            index,
            x: self.x,
            y: self.cursor,
            w: self.w,
            h,
        };
        self.cursor += h;
        Some(p)
    }
}

/// Packs `specs` into the columns of `preset`.
///
/// Banner widgets stack top to bottom in the banner column when the preset
/// has one and at least one banner widget exists; otherwise they are treated
/// as data. Each data widget goes to the data column with the lowest cursor,
/// leftmost on ties. Widgets that get no rows are dropped.
pub fn pack(specs: &[WidgetSpec], preset: Preset) -> Vec<Placement> {
    pack_into(specs, preset, preset.width(), preset.height())
}

/// [`pack`] with the column percentages of `preset` applied to an arbitrary
/// `width × height` area.
pub fn pack_into(
    specs: &[WidgetSpec],
    preset: Preset,
    width: usize,
    height: usize,
) -> Vec<Placement> {
    let mut x = 0;
    let mut cols: Vec<Col> = preset
        .column_widths(width)
        .into_iter()
        .map(|w| {
            let col = Col { x, w, cursor: 0 };
            x += w;
            col
        })
        .collect();

    let has_banner = specs.iter().any(|s| s.preferred == PreferredColumn::Banner);
    let banner_col = preset.banner_column().filter(|_| has_banner);

    let mut out = Vec::with_capacity(specs.len());
    if let Some(bc) = banner_col {
        for (i, spec) in specs.iter().enumerate() {
            if spec.preferred == PreferredColumn::Banner
                && let Some(p) = cols[bc].claim(i, spec.min_h, height)
            {
                out.push(p);
            }
        }
    }

    for (i, spec) in specs.iter().enumerate() {
        if banner_col.is_some() && spec.preferred == PreferredColumn::Banner {
            continue;
        }
        let target = cols
            .iter()
            .enumerate()
            .filter(|(ci, _)| Some(*ci) != banner_col)
            .min_by_key(|(ci, c)| (c.cursor, *ci))
            .map(|(ci, _)| ci);
        if let Some(ci) = target
            && let Some(p) = cols[ci].claim(i, spec.min_h, height)
        {
            out.push(p);
        }
    }
    out
}
