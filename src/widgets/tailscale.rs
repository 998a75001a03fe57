//! Tailscale mesh peers.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{Cmd, Msg};
use crate::error::{Error, Result};
use crate::fmt::{FmtStyle, format_age, format_bytes};
use crate::payload::{Payload, Peer, SourceKind, TailnetStatus};
use crate::render::{Align, Column, ColumnWidth, DataTable, Sparkline};
use crate::text::{bold, dim, paint};
use crate::theme::Theme;

use super::{History, Widget, is_mode_toggle, is_scroll_key, payload_for};

pub struct TailscaleWidget {
    theme: Theme,
    expanded: bool,
    status: Option<TailnetStatus>,
    updated_at: Option<DateTime<Utc>>,
    online: History,
    offset: usize,
    table: DataTable,
}

fn columns() -> Vec<Column> {
    vec![
        Column::new("Peer", ColumnWidth::Fill).min(8),
        Column::new("IP", ColumnWidth::Fixed(15)),
        Column::new("OS", ColumnWidth::Fixed(7)),
        Column::new("Seen", ColumnWidth::Fixed(6)).align(Align::Right),
        Column::new("RX", ColumnWidth::Fixed(7)).align(Align::Right),
        Column::new("TX", ColumnWidth::Fixed(7)).align(Align::Right),
    ]
}

fn is_up(status: &str) -> bool {
    matches!(
        status.to_ascii_lowercase().as_str(),
        "ok" | "running" | "up" | "connected"
    )
}

/// Online peers first, then by name.
fn sorted(peers: &[Peer]) -> Vec<&Peer> {
    let mut out: Vec<&Peer> = peers.iter().collect();
    out.sort_by(|a, b| b.online.cmp(&a.online).then_with(|| a.name.cmp(&b.name)));
    out
}

impl TailscaleWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            expanded: false,
            status: None,
            updated_at: None,
            online: History::default(),
            offset: 0,
            table: DataTable::new(columns()).with_style(theme.table_style()),
        }
    }

    fn seen(&self, peer: &Peer) -> String {
        if peer.online {
            "now".to_string()
        } else {
            format_age(peer.last_seen, self.updated_at.unwrap_or_else(Utc::now))
        }
    }

    fn peer_rows(&self, status: &TailnetStatus) -> Vec<Vec<String>> {
        sorted(&status.peers)
            .into_iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.ip.clone(),
                    p.os.clone(),
                    self.seen(p),
                    format_bytes(p.rx_bytes, FmtStyle::Compact),
                    format_bytes(p.tx_bytes, FmtStyle::Compact),
                ]
            })
            .collect()
    }

    /// Unfreezes the table and catches it up with the latest status.
    fn release_table(&mut self) {
        if !self.table.is_frozen() {
            return;
        }
        self.table.unfreeze();
        if let Some(status) = &self.status {
            self.table.set_rows(self.peer_rows(status));
        }
    }

    fn apply(&mut self, status: &TailnetStatus, at: DateTime<Utc>) {
        self.updated_at = Some(at);
        self.table.set_rows(self.peer_rows(status));
        self.online.push(at, status.online_count() as f64);
        self.offset = self.offset.min(status.peers.len().saturating_sub(1));
        self.status = Some(status.clone());
    }

    fn peer_line(&self, p: &Peer) -> String {
        let dot = if p.online {
            paint("●", self.theme.ok)
        } else {
            paint("○", self.theme.dim)
        };
        let mut line = format!("{dot} {}", p.name);
        if !p.ip.is_empty() {
            line.push_str(&dim(&format!("  {}", p.ip)));
        }
        if !p.online {
            line.push_str(&dim(&format!("  {}", self.seen(p))));
        }
        line
    }

    fn render_compact(&self, status: &TailnetStatus, width: usize, height: usize) -> Vec<String> {
        let state = if status.status.is_empty() {
            "unknown"
        } else {
            status.status.as_str()
        };
        let color = if is_up(state) {
            self.theme.ok
        } else {
            self.theme.warn
        };
        let mut header = format!("{} {}", paint("●", color), bold(state));
        if !status.self_name.is_empty() {
            header.push_str(&format!("  {}", status.self_name));
        }
        header.push_str(&dim(&format!(
            "  {}/{} online",
            status.online_count(),
            status.peers.len()
        )));
        let mut lines = vec![header];

        let peers = sorted(&status.peers);
        let rest = &peers[self.offset.min(peers.len())..];
        let room = height.saturating_sub(2);
        let shown = if rest.len() > room + 1 { room } else { rest.len() };
        lines.extend(rest.iter().take(shown).map(|p| self.peer_line(p)));
        if shown < rest.len() {
            lines.push(dim(&format!("+{} more (↓)", rest.len() - shown)));
        } else if height > lines.len() + 1 && self.online.len() > 1 {
            let values = self.online.values();
            lines.push(
                Sparkline::new(&values)
                    .with_color(self.theme.series_color(2))
                    .with_label("online")
                    .render(width),
            );
        }
        lines
    }
}

impl Widget for TailscaleWidget {
    fn id(&self) -> &str {
        SourceKind::Tailscale.as_str()
    }

    fn title(&self) -> &str {
        "Tailscale"
    }

    fn min_size(&self) -> (usize, usize) {
        (36, 7)
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
            self.table.set_style(theme.table_style());
        } else if let Some((Payload::Tailscale(status), update)) =
            payload_for(msg, SourceKind::Tailscale)
        {
            self.apply(status, update.timestamp);
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
        let count = self.status.as_ref().map_or(0, |s| s.peers.len());
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
        let Some(status) = &self.status else {
            return Err(Error::DataMissing {
                source_name: SourceKind::Tailscale.to_string(),
            });
        };
        if self.expanded {
            return Ok(self.table.render(width, height));
        }
        Ok(self.render_compact(status, width, height).join("\n"))
    }

    fn summary(&self) -> Option<String> {
        let status = self.status.as_ref()?;
        let color = if is_up(&status.status) {
            self.theme.ok
        } else {
            self.theme.warn
        };
        Some(format!(
            "{} {}/{}",
            paint("⬡", color),
            status.online_count(),
            status.peers.len()
        ))
    }
}
