//! Fixed-frame banner compositor.
//!
//! Widgets arrive pre-rendered as [`WidgetSpec`]s. [`pack`] assigns each a
//! rectangle in the columns of a [`Preset`], [`compose`] frames and stamps
//! them onto a [`Grid`], and [`BannerCache`] memoises the result on disk.

pub mod cache;
pub mod grid;
pub mod pack;
pub mod preset;

pub use cache::{BannerCache, FRESHNESS, PruneResult, cache_key};
pub use grid::Grid;
pub use pack::{BANNER_TAG, Placement, PreferredColumn, WidgetSpec, pack, pack_into};
pub use preset::Preset;

use crate::render::render_box;
use crate::theme::Theme;

/// Input to a banner render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BannerData {
    pub widgets: Vec<WidgetSpec>,
}

/// Frames each placed spec and stamps it onto a `width`×`height` grid.
///
/// Placements are drawn in order, so later ones win where they overlap.
/// Placements whose index is out of range are skipped.
pub fn compose(
    specs: &[WidgetSpec],
    placements: &[Placement],
    width: usize,
    height: usize,
    theme: &Theme,
) -> String {
    let mut grid = Grid::new(width, height);
    for p in placements {
        let Some(spec) = specs.get(p.index) else {
            continue;
        };
        let framed = render_box(&spec.content, p.w, p.h, &theme.frame(&spec.title, false));
        grid.blit(p.x, p.y, &framed);
    }
    grid.render()
}

/// Renders `data` into exactly `preset.height()` lines of `preset.width()` cells.
///
/// Deterministic: identical inputs produce identical bytes.
pub fn render_banner(data: &BannerData, preset: Preset, theme: &Theme) -> String {
    let placements = pack(&data.widgets, preset);
    compose(
        &data.widgets,
        &placements,
        preset.width(),
        preset.height(),
        theme,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{strip, visible_width};
    use proptest::prelude::*;

    #[test]
    fn compose_frames_each_placement() {
        let specs = vec![WidgetSpec::new("cpu", "CPU", "42%", 10, 3)];
        let placements = vec![Placement { index: 0, x: 1, y: 0, w: 10, h: 3 }];
        let out = strip(&compose(&specs, &placements, 12, 4, &Theme::default()));
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(" ╭─ CPU"));
        assert!(lines[1].starts_with(" │42%"));
        assert_eq!(lines[3], "            ");
    }

    #[test]
    fn overlapping_placements_last_wins() {
        let specs = vec![
            WidgetSpec::new("a", "A", "aaaa", 6, 3),
            WidgetSpec::new("b", "B", "bbbb", 6, 3),
        ];
        let placements = vec![
            Placement { index: 0, x: 0, y: 0, w: 6, h: 3 },
            Placement { index: 1, x: 2, y: 0, w: 6, h: 3 },
            Placement { index: 9, x: 0, y: 0, w: 6, h: 3 },
        ];
        let out = strip(&compose(&specs, &placements, 8, 3, &Theme::default()));
        let mid = out.split('\n').nth(1).unwrap().to_string();
        assert_eq!(mid, "│a│bbbb│");
    }

    #[test]
    fn banner_is_deterministic() {
        let data = BannerData {
            widgets: vec![
                WidgetSpec::new("banner:logo", "dashline", "~", 30, 10),
                WidgetSpec::new("cpu", "CPU", "▁▂▃▄▅▆▇█", 30, 6),
            ],
        };
        let theme = Theme::default();
        let a = render_banner(&data, Preset::Standard, &theme);
        let b = render_banner(&data, Preset::Standard, &theme);
        assert_eq!(a, b);
    }

    fn arb_spec() -> impl Strategy<Value = WidgetSpec> {
        ("(banner)?[a-z]{1,6}", "[A-Za-z ]{0,12}", "[a-z中\n ]{0,60}", 1usize..60, 0usize..30)
            .prop_map(|(id, title, content, w, h)| WidgetSpec::new(id, title, content, w, h))
    }

    proptest! {
        #[test]
        fn banner_has_exact_dimensions(specs in proptest::collection::vec(arb_spec(), 0..8)) {
            let data = BannerData { widgets: specs };
            for preset in Preset::ALL {
                let out = render_banner(&data, preset, &Theme::default());
                let lines: Vec<&str> = out.split('\n').collect();
                prop_assert_eq!(lines.len(), preset.height());
                for line in lines {
                    prop_assert_eq!(visible_width(line), preset.width());
                }
            }
        }
    }
}
