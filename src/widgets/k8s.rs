//! Kubernetes cluster health.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{Cmd, Msg};
use crate::error::{Error, Result};
use crate::fmt::format_pct;
use crate::payload::{Cluster, ClusterSummary, Payload, SourceKind};
use crate::render::{Align, Column, ColumnWidth, DataTable, Sparkline};
use crate::text::{bold, center_block, dim, paint};
use crate::theme::Theme;

use super::{History, Widget, is_mode_toggle, is_scroll_key, payload_for};

pub struct K8sWidget {
    theme: Theme,
    expanded: bool,
    summary: Option<ClusterSummary>,
    /// Running pods across clusters.
    running: History,
    /// First cluster shown in compact mode.
    offset: usize,
    table: DataTable,
}

fn columns() -> Vec<Column> {
    vec![
        Column::new("Cluster", ColumnWidth::Fill).min(8),
        Column::new("Context", ColumnWidth::Percent(20)),
        Column::new("Nodes", ColumnWidth::Fixed(5)).align(Align::Right),
        Column::new("Run", ColumnWidth::Fixed(5)).align(Align::Right),
        Column::new("Pend", ColumnWidth::Fixed(4)).align(Align::Right),
        Column::new("Fail", ColumnWidth::Fixed(4)).align(Align::Right),
        Column::new("CPU", ColumnWidth::Fixed(4)).align(Align::Right),
        Column::new("Mem", ColumnWidth::Fixed(4)).align(Align::Right),
    ]
}

fn cluster_rows(summary: &ClusterSummary) -> Vec<Vec<String>> {
    summary
        .clusters
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.context.clone(),
                format!("{}/{}", c.nodes_ready, c.nodes_total),
                c.pods_running.to_string(),
                c.pods_pending.to_string(),
                c.pods_failed.to_string(),
                format_pct(c.cpu_pct),
                format_pct(c.mem_pct),
            ]
        })
        .collect()
}

impl K8sWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            expanded: false,
            summary: None,
            running: History::default(),
            offset: 0,
            table: DataTable::new(columns())
                .with_style(theme.table_style())
                .selectable(true),
        }
    }

    fn clusters(&self) -> &[Cluster] {
        match &self.summary {
            Some(s) => &s.clusters,
            None => &[],
        }
    }

    fn healthy_count(&self) -> usize {
        self.clusters().iter().filter(|c| c.healthy()).count()
    }

    fn apply(&mut self, summary: &ClusterSummary, at: DateTime<Utc>) {
        self.table.set_rows(cluster_rows(summary));
        let running: u32 = summary.clusters.iter().map(|c| c.pods_running).sum();
        self.running.push(at, f64::from(running));
        self.offset = self.offset.min(summary.clusters.len().saturating_sub(1));
        self.summary = Some(summary.clone());
    }

    /// Unfreezes the table and catches it up with the latest summary.
    fn release_table(&mut self) {
        if !self.table.is_frozen() {
            return;
        }
        self.table.unfreeze();
        if let Some(summary) = &self.summary {
            self.table.set_rows(cluster_rows(summary));
        }
    }

    fn dot(&self, healthy: bool) -> String {
        paint("●", if healthy { self.theme.ok } else { self.theme.crit })
    }

    fn cluster_line(&self, c: &Cluster) -> String {
        let mut line = format!(
            "{} {}  nodes {}/{}  pods {}",
            self.dot(c.healthy()),
            bold(&c.name),
            c.nodes_ready,
            c.nodes_total,
            c.pods_running
        );
        if c.pods_pending > 0 {
            line.push_str(&paint(
                &format!(" +{} pending", c.pods_pending),
                self.theme.warn,
            ));
        }
        if c.pods_failed > 0 {
            line.push_str(&paint(
                &format!(" {} failed", c.pods_failed),
                self.theme.crit,
            ));
        }
        line
    }

    fn render_compact(&self, width: usize, height: usize) -> Vec<String> {
        let clusters = self.clusters();
        let healthy = self.healthy_count();
        let mut lines = vec![format!(
            "{} {healthy}/{} healthy",
            self.dot(healthy == clusters.len()),
            clusters.len()
        )];

        let room = height.saturating_sub(2);
        let rest = &clusters[self.offset.min(clusters.len())..];
        let shown = if rest.len() > room + 1 { room } else { rest.len() };
        lines.extend(rest.iter().take(shown).map(|c| self.cluster_line(c)));
        if shown < rest.len() {
            lines.push(dim(&format!("+{} more (↓)", rest.len() - shown)));
        } else if height > lines.len() + 1 {
            let values = self.running.values();
            lines.push(
                Sparkline::new(&values)
                    .with_color(self.theme.series_color(0))
                    .with_label("pods")
                    .with_trend(true)
                    .render(width),
            );
        }
        lines
    }
}

impl Widget for K8sWidget {
    fn id(&self) -> &str {
        SourceKind::K8s.as_str()
    }

    fn title(&self) -> &str {
        "Kubernetes"
    }

    fn min_size(&self) -> (usize, usize) {
        (40, 7)
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
            self.table.set_style(theme.table_style());
        } else if let Some((Payload::K8s(summary), update)) = payload_for(msg, SourceKind::K8s) {
            self.apply(summary, update.timestamp);
        }
        Cmd::None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        if is_mode_toggle(&key) {
            self.expanded = !self.expanded;
            if !self.expanded {
                self.release_table();
            }
            return Cmd::None;
        }
        let count = self.clusters().len();
        if self.expanded && is_scroll_key(&key) {
            self.table.freeze();
        }
        match (self.expanded, key.code) {
            (true, KeyCode::Down) => self.table.select_next(),
            (true, KeyCode::Up) => self.table.select_prev(),
            (true, KeyCode::PageDown) => self.table.page_down(),
            (true, KeyCode::PageUp) => self.table.page_up(),
            (false, KeyCode::Down) => self.offset = (self.offset + 1).min(count.saturating_sub(1)),
            (false, KeyCode::Up) => self.offset = self.offset.saturating_sub(1),
            _ => {}
        }
        Cmd::None
    }

    fn blur(&mut self) {
        self.release_table();
    }

    fn render(&self, width: usize, height: usize) -> Result<String> {
        if self.summary.is_none() {
            return Err(Error::DataMissing {
                source_name: SourceKind::K8s.to_string(),
            });
        }
        if self.clusters().is_empty() {
            return Ok(center_block("no clusters", width, height));
        }
        if self.expanded {
            return Ok(self.table.render(width, height));
        }
        Ok(self.render_compact(width, height).join("\n"))
    }

    fn summary(&self) -> Option<String> {
        let total = self.clusters().len();
        if total == 0 {
            return None;
        }
        let healthy = self.healthy_count();
        let mark = if healthy == total {
            paint("✓", self.theme.ok)
        } else {
            paint("✗", self.theme.crit)
        };
        Some(format!("⎈ {healthy}/{total} {mark}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::DataUpdate;
    use crate::text::{strip, visible_width};
    use chrono::TimeZone;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn cluster(name: &str, ready: u32, failed: u32) -> Cluster {
        Cluster {
            name: name.into(),
            context: format!("ctx-{name}"),
            nodes_ready: ready,
            nodes_total: 3,
            pods_running: 10,
            pods_failed: failed,
            ..Cluster::default()
        }
    }

    fn with(clusters: Vec<Cluster>) -> K8sWidget {
        let mut w = K8sWidget::new(Theme::default());
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let payload = Payload::K8s(ClusterSummary { clusters });
        w.update(&Msg::DataUpdate(DataUpdate::ok(payload, at)));
        w
    }

    #[test]
    fn header_counts_healthy() {
        let w = with(vec![cluster("prod", 3, 0), cluster("dev", 2, 1)]);
        let out = strip(&w.view(50, 6));
        let lines: Vec<&str> = out.split('\n').collect();
        assert!(lines[0].starts_with("● 1/2 healthy"));
        assert!(lines[1].contains("prod  nodes 3/3  pods 10"));
        assert!(lines[2].contains("1 failed"));
        assert_eq!(strip(&w.summary().unwrap()), "⎈ 1/2 ✗");
    }

    #[test]
    fn overflow_shows_more_and_scrolls() {
        let clusters = (0..6).map(|i| cluster(&format!("c{i}"), 3, 0)).collect();
        let mut w = with(clusters);
        let out = strip(&w.view(50, 4));
        assert!(out.contains("+4 more"));
        w.handle_key(key(KeyCode::Down));
        let out = strip(&w.view(50, 4));
        assert!(out.split('\n').nth(1).unwrap().contains("c1"));
    }

    #[test]
    fn expanded_is_a_table() {
        let mut w = with(vec![cluster("prod", 3, 0)]);
        w.handle_key(key(KeyCode::Char('e')));
        let out = w.view(60, 5);
        assert!(out.split('\n').all(|l| visible_width(l) == 60));
        assert!(strip(&out).contains("ctx-prod"));
    }

    fn feed(w: &mut K8sWidget, names: &[&str]) {
        let at = Utc.timestamp_opt(1_700_000_060, 0).unwrap();
        let clusters = names.iter().map(|n| cluster(n, 3, 0)).collect();
        let payload = Payload::K8s(ClusterSummary { clusters });
        w.update(&Msg::DataUpdate(DataUpdate::ok(payload, at)));
    }

    fn selected_name(w: &K8sWidget) -> Option<String> {
        w.table.selected_row().map(|r| r[0].clone())
    }

    #[test]
    fn scrolling_freezes_rows_until_collapse() {
        let mut w = with(vec![
            cluster("alpha", 3, 0),
            cluster("beta", 3, 0),
            cluster("gamma", 3, 0),
        ]);
        w.handle_key(key(KeyCode::Char('e')));
        assert!(!w.table.is_frozen());
        w.handle_key(key(KeyCode::Down));
        w.handle_key(key(KeyCode::Down));
        assert!(w.table.is_frozen());
        assert_eq!(selected_name(&w).as_deref(), Some("beta"));

        feed(&mut w, &["zeta", "eta"]);
        assert_eq!(selected_name(&w).as_deref(), Some("beta"));
        assert_eq!(w.table.row_count(), 3);
        // compact data still follows the latest payload
        assert_eq!(w.clusters().len(), 2);

        w.handle_key(key(KeyCode::Char('e')));
        assert!(!w.table.is_frozen());
        assert_eq!(w.table.row_count(), 2);
        assert_eq!(selected_name(&w).as_deref(), Some("eta"));
    }

    #[test]
    fn blur_releases_frozen_table() {
        let mut w = with(vec![cluster("alpha", 3, 0), cluster("beta", 3, 0)]);
        w.handle_key(key(KeyCode::Char('e')));
        w.handle_key(key(KeyCode::PageDown));
        feed(&mut w, &["zeta"]);
        assert_eq!(w.table.row_count(), 2);

        w.blur();
        assert!(!w.table.is_frozen());
        assert_eq!(w.table.row_count(), 1);
        assert_eq!(selected_name(&w).as_deref(), Some("zeta"));
    }

    #[test]
    fn compact_scroll_does_not_freeze() {
        let mut w = with(vec![cluster("alpha", 3, 0), cluster("beta", 3, 0)]);
        w.handle_key(key(KeyCode::Down));
        assert!(!w.table.is_frozen());
        feed(&mut w, &["zeta"]);
        assert_eq!(w.table.row_count(), 1);
    }

    #[test]
    fn empty_summary() {
        let w = with(Vec::new());
        assert!(strip(&w.view(30, 3)).contains("no clusters"));
        assert!(w.summary().is_none());
    }
}
