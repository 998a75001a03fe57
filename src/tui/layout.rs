//! Widget rectangles for the dashboard body.
//!
//! Two modes: a near-square grid sized from the widget count, and the
//! compositor's preset columns applied to the real terminal size.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::compositor::{Preset, PreferredColumn, WidgetSpec, pack_into};

/// Rows below which a grid cell cannot hold a framed widget.
const MIN_CELL_HEIGHT: usize = 3;

/// Layouts kept before the cache starts over.
const MAX_CACHED_LAYOUTS: usize = 32;

/// A cell-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub const fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    /// Interior size inside a one-cell border.
    pub const fn inner(&self) -> (usize, usize) {
        (self.w.saturating_sub(2), self.h.saturating_sub(2))
    }
}

/// What a layout needs to know about one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeHint {
    pub min_w: usize,
    pub min_h: usize,
    pub preferred: PreferredColumn,
}

fn ceil_sqrt(n: usize) -> usize {
    let mut c = 1;
    while c * c < n {
        c += 1;
    }
    c
}

/// Near-square grid: `cols = ⌈√n⌉`, narrowed while cells are thinner than the
/// widest minimum, then `rows = ⌈n / cols⌉`. When cells would be shorter than
/// three rows the trailing widgets are dropped.
///
/// Returns `(index, rect)` pairs in widget order.
pub fn grid(hints: &[SizeHint], width: usize, height: usize) -> Vec<(usize, Rect)> {
    let n = hints.len();
    if n == 0 || width == 0 || height == 0 {
        return Vec::new();
    }
    let min_w = hints.iter().map(|h| h.min_w).max().unwrap_or(1).max(1);
    let mut cols = ceil_sqrt(n);
    while cols > 1 && width / cols < min_w {
        cols -= 1;
    }
    let mut rows = n.div_ceil(cols);
    if height / rows < MIN_CELL_HEIGHT {
        rows = (height / MIN_CELL_HEIGHT).max(1);
    }
    let shown = n.min(rows * cols);
    let (cell_w, cell_h) = (width / cols, height / rows);

    (0..shown)
        .map(|i| {
            let (col, row) = (i % cols, i / cols);
            (i, Rect::new(col * cell_w, row * cell_h, cell_w, cell_h))
        })
        .collect()
}

/// Preset columns scaled to `width × height`, packed greedily.
pub fn preset(hints: &[SizeHint], preset: Preset, width: usize, height: usize) -> Vec<(usize, Rect)> {
    let specs: Vec<WidgetSpec> = hints
        .iter()
        .enumerate()
        .map(|(i, h)| {
            WidgetSpec::new(i.to_string(), "", "", h.min_w, h.min_h).with_preferred(h.preferred)
        })
        .collect();
    pack_into(&specs, preset, width, height)
        .into_iter()
        .map(|p| (p.index, Rect::new(p.x, p.y, p.w, p.h)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LayoutKey {
    mode: Option<Preset>,
    width: usize,
    height: usize,
    hints: Vec<SizeHint>,
}

/// Memoised layouts, cleared on resize and when full.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: Mutex<HashMap<LayoutKey, Vec<(usize, Rect)>>>,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles for `hints` in `mode` (`None` = grid).
    pub fn layout(
        &self,
        mode: Option<Preset>,
        hints: &[SizeHint],
        width: usize,
        height: usize,
    ) -> Vec<(usize, Rect)> {
        let key = LayoutKey {
            mode,
            width,
            height,
            hints: hints.to_vec(),
        };
        let mut entries = self.entries.lock();
        if let Some(hit) = entries.get(&key) {
            return hit.clone();
        }
        let rects = match mode {
            None => grid(hints, width, height),
            Some(p) => preset(hints, p, width, height),
        };
        debug!(
            mode = mode.map_or("grid", |p| p.name()),
            width,
            height,
            widgets = hints.len(),
            placed = rects.len(),
            "layout recomputed"
        );
        if entries.len() >= MAX_CACHED_LAYOUTS {
            entries.clear();
        }
        entries.insert(key, rects.clone());
        rects
    }

    pub fn invalidate(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
