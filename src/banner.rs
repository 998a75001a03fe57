//! One-shot banner: every widget rendered once and packed by preset.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::{DataUpdate, Msg};
use crate::compositor::{BannerCache, BannerData, Preset, render_banner};
use crate::payload::{Payload, SourceKind};
use crate::text::{ColorDepth, downgrade};
use crate::theme::Theme;
use crate::widgets::{Placeholder, Widget, default_widgets, safe_update, to_spec};

/// ID of the logo tile; the `banner` prefix routes it to the banner column.
pub const LOGO_ID: &str = "banner:logo";

const LOGO: &str = "╺┳┓┏━┓┏━┓╻ ╻╻  ╻┏┓╻┏━╸\n \
                    ┃┃┣━┫┗━┓┣━┫┃  ┃┃┗┫┣╸ \n\
                    ╺┻┛╹ ╹┗━┛╹ ╹┗━╸╹╹ ╹┗━╸";

fn logo(theme: Theme) -> Placeholder {
    Placeholder::new(LOGO_ID, "dashline")
        .with_body(LOGO)
        .with_min_size(26, 7)
        .with_theme(theme)
}

/// The logo plus one widget per enabled source, fed with `payloads`.
pub fn build_widgets(
    theme: Theme,
    enabled: &[SourceKind],
    payloads: &BTreeMap<SourceKind, Payload>,
    now: DateTime<Utc>,
) -> Vec<Box<dyn Widget>> {
    let mut widgets: Vec<Box<dyn Widget>> = vec![Box::new(logo(theme))];
    widgets.extend(default_widgets(theme, enabled));
    for payload in payloads.values() {
        let msg = Msg::DataUpdate(DataUpdate::ok(payload.clone(), now));
        for w in &mut widgets {
            safe_update(w.as_mut(), &msg);
        }
    }
    widgets
}

/// Each widget rendered at its minimum size.
pub fn banner_data(widgets: &[Box<dyn Widget>]) -> BannerData {
    BannerData {
        widgets: widgets.iter().map(|w| to_spec(w.as_ref())).collect(),
    }
}

/// Composes the banner, through `cache` when given, then adapts colors to
/// `depth`.
pub fn render(
    data: &BannerData,
    preset: Preset,
    theme: &Theme,
    cache: Option<&BannerCache>,
    depth: ColorDepth,
) -> String {
    debug!(%preset, widgets = data.widgets.len(), cached = cache.is_some(), "rendering banner");
    let out = match cache {
        Some(cache) => cache.render(data, preset, theme),
        None => render_banner(data, preset, theme),
    };
    downgrade(&out, depth)
}
