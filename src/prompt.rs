//! Shell prompt fragments: one widget summary on one line.

use chrono::{DateTime, Utc};

use crate::app::{DataUpdate, Msg};
use crate::payload::{Payload, SourceKind};
use crate::text::{ColorDepth, downgrade, truncate};
use crate::theme::Theme;
use crate::widgets::{safe_update, widget_for};

/// Summary of `kind` fed with `payload`, at most `width` cells.
///
/// Empty when there is no payload or the widget has nothing to say, so a
/// prompt stays clean while data is missing.
pub fn prompt_line(
    kind: SourceKind,
    payload: Option<&Payload>,
    theme: Theme,
    width: usize,
    depth: ColorDepth,
    now: DateTime<Utc>,
) -> String {
    let Some(payload) = payload else {
        return String::new();
    };
    let mut widget = widget_for(kind, theme);
    safe_update(
        widget.as_mut(),
        &Msg::DataUpdate(DataUpdate::ok(payload.clone(), now)),
    );
    let line = widget.summary().unwrap_or_default();
    downgrade(&truncate(&line, width), depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{Cluster, ClusterSummary};
    use crate::text::{strip, visible_width};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn k8s() -> Payload {
        Payload::K8s(ClusterSummary {
            clusters: vec![Cluster {
                name: "prod".into(),
                nodes_ready: 3,
                nodes_total: 3,
                ..Cluster::default()
            }],
        })
    }

    #[test]
    fn summary_for_source() {
        let out = prompt_line(
            SourceKind::K8s,
            Some(&k8s()),
            Theme::default(),
            40,
            ColorDepth::TrueColor,
            now(),
        );
        assert_eq!(strip(&out), "⎈ 1/1 ✓");
    }

    #[test]
    fn truncated_and_uncolored() {
        let out = prompt_line(
            SourceKind::K8s,
            Some(&k8s()),
            Theme::default(),
            3,
            ColorDepth::Mono,
            now(),
        );
        assert!(visible_width(&out) <= 3);
        assert!(!out.contains("\x1b[38"));
    }

    #[test]
    fn missing_payload_is_empty() {
        let out = prompt_line(
            SourceKind::Claude,
            None,
            Theme::default(),
            40,
            ColorDepth::TrueColor,
            now(),
        );
        assert!(out.is_empty());
    }
}
