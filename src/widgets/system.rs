//! Host metrics: CPU, memory, disk, load and network.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{Cmd, Msg};
use crate::error::{Error, Result};
use crate::fmt::{FmtStyle, format_bytes, format_bytes_rate, format_duration, format_pct};
use crate::payload::{Payload, SourceKind, SystemMetrics};
use crate::render::{Gauge, MultiGauge, Series, Sparkline, TimeGraph};
use crate::text::{dim, paint};
use crate::theme::Theme;

use super::{History, Widget, is_mode_toggle, payload_for};

/// Per-core gauges shown before the list is cut.
const MAX_CORES: usize = 16;

pub struct SystemWidget {
    theme: Theme,
    expanded: bool,
    per_core: bool,
    metrics: Option<SystemMetrics>,
    updated_at: Option<DateTime<Utc>>,
    cpu: History,
    mem: History,
    /// Combined rx+tx rate.
    net: History,
}

impl SystemWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            expanded: false,
            per_core: false,
            metrics: None,
            updated_at: None,
            cpu: History::default(),
            mem: History::default(),
            net: History::default(),
        }
    }

    fn apply(&mut self, m: &SystemMetrics, at: DateTime<Utc>) {
        self.cpu.push(at, m.cpu_pct);
        self.mem.push(at, m.mem_pct());
        self.net.push(at, m.net_rx_bps + m.net_tx_bps);
        self.metrics = Some(m.clone());
        self.updated_at = Some(at);
    }

    fn gauge(&self, pct: f64) -> Gauge {
        Gauge::percent(pct)
            .with_colors(self.theme.gauge_colors())
            .with_percent(true)
    }

    fn gauges(&self, m: &SystemMetrics) -> MultiGauge {
        let mut gauges = MultiGauge::new();
        if self.per_core && !m.per_core.is_empty() {
            for (i, pct) in m.per_core.iter().take(MAX_CORES).enumerate() {
                gauges.push(format!("cpu{i}"), self.gauge(*pct));
            }
        } else {
            gauges.push("cpu", self.gauge(m.cpu_pct));
        }
        gauges.push("mem", self.gauge(m.mem_pct()));
        if m.swap_total > 0 {
            gauges.push(
                "swap",
                self.gauge(m.swap_used as f64 / m.swap_total as f64 * 100.0),
            );
        }
        if m.disk_total > 0 {
            gauges.push("disk", self.gauge(m.disk_pct()));
        }
        gauges
    }

    fn load_line(m: &SystemMetrics) -> String {
        let [l1, l5, l15] = m.load;
        format!(
            "load {l1:.2} {l5:.2} {l15:.2}  up {}",
            format_duration(m.uptime_secs as i64, FmtStyle::Compact)
        )
    }

    fn net_line(m: &SystemMetrics) -> String {
        format!(
            "net ↓{} ↑{}",
            format_bytes_rate(m.net_rx_bps, FmtStyle::Compact),
            format_bytes_rate(m.net_tx_bps, FmtStyle::Compact)
        )
    }

    fn render_compact(&self, m: &SystemMetrics, width: usize, height: usize) -> Vec<String> {
        let mut lines = self.gauges(m).render(width);
        lines.push(Self::load_line(m));
        lines.push(Self::net_line(m));
        if m.mem_total > 0 {
            lines.push(dim(&format!(
                "mem {} / {}",
                format_bytes(m.mem_used, FmtStyle::Compact),
                format_bytes(m.mem_total, FmtStyle::Compact)
            )));
        }
        if height > lines.len() {
            let values = self.cpu.values();
            lines.push(
                Sparkline::new(&values)
                    .with_range(0.0, 100.0)
                    .with_color(self.theme.series_color(0))
                    .with_label("cpu")
                    .with_trend(true)
                    .render(width),
            );
        }
        lines
    }

    fn render_expanded(&self, m: &SystemMetrics, width: usize, height: usize) -> Vec<String> {
        let footer = match height {
            0..=6 => 0,
            7..=9 => 2,
            _ => 3,
        };
        let mut graph = TimeGraph::new()
            .with_y_bounds(Some(0.0), Some(100.0))
            .with_series(
                Series::new("cpu", self.theme.series_color(0)).with_points(self.cpu.points()),
            )
            .with_series(
                Series::new("mem", self.theme.series_color(1)).with_points(self.mem.points()),
            );
        if let Some(at) = self.updated_at {
            graph = graph.with_now(at);
        }
        let mut lines: Vec<String> = graph
            .render(width, height - footer)
            .split('\n')
            .map(str::to_string)
            .collect();
        if footer > 0 {
            lines.push(Self::load_line(m));
            lines.push(Self::net_line(m));
        }
        if footer > 2 {
            let values = self.net.values();
            lines.push(
                Sparkline::new(&values)
                    .with_color(self.theme.series_color(2))
                    .with_label("net")
                    .with_bounds(true)
                    .render(width),
            );
        }
        lines
    }
}

impl Widget for SystemWidget {
    fn id(&self) -> &str {
        SourceKind::System.as_str()
    }

    fn title(&self) -> &str {
        "System"
    }

    fn min_size(&self) -> (usize, usize) {
        (36, 8)
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
        } else if let Some((Payload::System(metrics), update)) =
            payload_for(msg, SourceKind::System)
        {
            self.apply(metrics, update.timestamp);
        }
        Cmd::None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        if is_mode_toggle(&key) {
            self.expanded = !self.expanded;
        } else if key.code == KeyCode::Char('c') {
            self.per_core = !self.per_core;
        }
        Cmd::None
    }

    fn render(&self, width: usize, height: usize) -> Result<String> {
        let Some(m) = &self.metrics else {
            return Err(Error::DataMissing {
                source_name: SourceKind::System.to_string(),
            });
        };
        let lines = if self.expanded && height >= 3 {
            self.render_expanded(m, width, height)
        } else {
            self.render_compact(m, width, height)
        };
        Ok(lines.join("\n"))
    }

    fn summary(&self) -> Option<String> {
        let m = self.metrics.as_ref()?;
        let values = self.cpu.values();
        let spark = Sparkline::new(&values)
            .with_range(0.0, 100.0)
            .chart(values.len().min(6));
        let cpu = paint(&format_pct(m.cpu_pct), self.theme.level_color(m.cpu_pct));
        Some(format!("cpu {cpu} {spark} mem {}", format_pct(m.mem_pct())))
    }
}
