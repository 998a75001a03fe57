//! Claude account usage: session and weekly allowance per account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{Cmd, Msg};
use crate::error::{Error, Result};
use crate::fmt::{format_count, format_money, format_pct, format_until};
use crate::payload::{ClaudeAccount, ClaudeUsage, Payload, SourceKind};
use crate::render::{Align, Column, ColumnWidth, DataTable, Gauge, MultiGauge, Sparkline};
use crate::text::{bold, center_block, dim, fit, paint};
use crate::theme::Theme;

use super::{History, Widget, is_mode_toggle, is_scroll_key, payload_for};

pub struct ClaudeWidget {
    theme: Theme,
    expanded: bool,
    /// Index into `usage.accounts`.
    selected: usize,
    usage: Option<ClaudeUsage>,
    updated_at: Option<DateTime<Utc>>,
    /// Session usage per account name.
    history: BTreeMap<String, History>,
    table: DataTable,
}

fn columns() -> Vec<Column> {
    vec![
        Column::new("Account", ColumnWidth::Fill).min(8),
        Column::new("Plan", ColumnWidth::Fixed(6)),
        Column::new("Session", ColumnWidth::Fixed(7)).align(Align::Right),
        Column::new("Weekly", ColumnWidth::Fixed(6)).align(Align::Right),
        Column::new("Resets", ColumnWidth::Fixed(9)),
        Column::new("Tokens", ColumnWidth::Fixed(6)).align(Align::Right),
        Column::new("Cost", ColumnWidth::Fixed(8)).align(Align::Right),
    ]
}

fn account_rows(usage: &ClaudeUsage, at: DateTime<Utc>) -> Vec<Vec<String>> {
    usage
        .accounts
        .iter()
        .map(|a| {
            vec![
                a.name.clone(),
                a.plan.clone(),
                format_pct(a.session_pct),
                format_pct(a.weekly_pct),
                format_until(a.session_resets_at, at),
                format_count(a.tokens_today),
                format_money(a.cost_today, "USD"),
            ]
        })
        .collect()
}

impl ClaudeWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            expanded: false,
            selected: 0,
            usage: None,
            updated_at: None,
            history: BTreeMap::new(),
            table: DataTable::new(columns())
                .with_style(theme.table_style())
                .selectable(true),
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn accounts(&self) -> &[ClaudeAccount] {
        match &self.usage {
            Some(u) => &u.accounts,
            None => &[],
        }
    }

    fn current(&self) -> Option<&ClaudeAccount> {
        self.accounts().get(self.selected)
    }

    /// Unfreezes the table and catches it up with the latest usage.
    fn release_table(&mut self) {
        if !self.table.is_frozen() {
            return;
        }
        self.table.unfreeze();
        if let (Some(usage), Some(at)) = (&self.usage, self.updated_at) {
            self.table.set_rows(account_rows(usage, at));
            self.table.select(self.selected);
        }
    }

    fn apply(&mut self, usage: &ClaudeUsage, at: DateTime<Utc>) {
        for account in &usage.accounts {
            self.history
                .entry(account.name.clone())
                .or_default()
                .push(at, account.session_pct);
        }
        self.table.set_rows(account_rows(usage, at));
        self.selected = self.selected.min(usage.accounts.len().saturating_sub(1));
        self.usage = Some(usage.clone());
        self.updated_at = Some(at);
    }

    fn session_values(&self, account: &ClaudeAccount) -> Vec<f64> {
        self.history
            .get(&account.name)
            .map(History::values)
            .unwrap_or_default()
    }

    fn render_compact(&self, account: &ClaudeAccount, width: usize, height: usize) -> Vec<String> {
        let now = self.updated_at.unwrap_or_else(Utc::now);
        let count = self.accounts().len();
        let mut lines = Vec::with_capacity(height);

        let mut header = bold(&account.name);
        if !account.plan.is_empty() {
            header.push_str(&dim(&format!(" · {}", account.plan)));
        }
        if count > 1 {
            header.push_str(&dim(&format!("  {}/{count} (m)", self.selected + 1)));
        }
        lines.push(header);

        let mut gauges = MultiGauge::new();
        for (label, pct) in [("session", account.session_pct), ("weekly", account.weekly_pct)] {
            gauges.push(
                label,
                Gauge::percent(pct)
                    .with_colors(self.theme.gauge_colors())
                    .with_percent(true),
            );
        }
        lines.extend(gauges.render(width));

        lines.push(dim(&format!(
            "resets {}",
            format_until(account.session_resets_at, now)
        )));

        let values = self.session_values(account);
        lines.push(
            Sparkline::new(&values)
                .with_range(0.0, 100.0)
                .with_color(self.theme.series_color(0))
                .with_label("trend")
                .with_trend(true)
                .render(width),
        );
        lines.push(format!(
            "tokens {}  cost {}",
            format_count(account.tokens_today),
            format_money(account.cost_today, "USD")
        ));
        lines
    }

    fn render_expanded(&self, width: usize, height: usize) -> Vec<String> {
        let spark_rows = if height > 6 { 1 } else { 0 };
        let mut lines: Vec<String> = self
            .table
            .render(width, height - spark_rows)
            .split('\n')
            .map(str::to_string)
            .collect();
        if spark_rows > 0
            && let Some(account) = self.current()
        {
            let values = self.session_values(account);
            lines.push(
                Sparkline::new(&values)
                    .with_range(0.0, 100.0)
                    .with_color(self.theme.series_color(0))
                    .with_label(fit(&account.name, 12))
                    .with_bounds(true)
                    .render(width),
            );
        }
        lines
    }
}

impl Widget for ClaudeWidget {
    fn id(&self) -> &str {
        SourceKind::Claude.as_str()
    }

    fn title(&self) -> &str {
        "Claude"
    }

    fn min_size(&self) -> (usize, usize) {
        (38, 9)
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
            self.table.set_style(theme.table_style());
        } else if let Some((Payload::Claude(usage), update)) = payload_for(msg, SourceKind::Claude)
        {
            self.apply(usage, update.timestamp);
        }
        Cmd::None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        let count = self.accounts().len();
        if is_mode_toggle(&key) {
            self.expanded = !self.expanded;
            if !self.expanded {
                self.release_table();
            }
        } else if key.code == KeyCode::Char('m') && count > 0 {
            self.selected = (self.selected + 1) % count;
            self.table.select(self.selected);
        } else if self.expanded {
            if is_scroll_key(&key) {
                self.table.freeze();
            }
            match key.code {
                KeyCode::Down => self.table.select_next(),
                KeyCode::Up => self.table.select_prev(),
                KeyCode::PageDown => self.table.page_down(),
                KeyCode::PageUp => self.table.page_up(),
                _ => return Cmd::None,
            }
            if let Some(s) = self.table.selected() {
                self.selected = s;
            }
        }
        Cmd::None
    }

    fn blur(&mut self) {
        self.release_table();
    }

    fn render(&self, width: usize, height: usize) -> Result<String> {
        if self.usage.is_none() {
            return Err(Error::DataMissing {
                source_name: SourceKind::Claude.to_string(),
            });
        }
        let Some(account) = self.current() else {
            return Ok(center_block("no accounts", width, height));
        };
        let lines = if self.expanded && height >= 3 {
            self.render_expanded(width, height)
        } else {
            self.render_compact(account, width, height)
        };
        Ok(lines.join("\n"))
    }

    fn summary(&self) -> Option<String> {
        let account = self.current()?;
        let values = self.session_values(account);
        let spark = Sparkline::new(&values).with_range(0.0, 100.0).chart(values.len().min(6));
        let pct = paint(
            &format_pct(account.session_pct),
            self.theme.level_color(account.session_pct),
        );
        Some(format!("◆ {pct} {spark}").trim_end().to_string())
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

    fn usage(pcts: &[(&str, f64)]) -> Payload {
        Payload::Claude(ClaudeUsage {
            accounts: pcts
                .iter()
                .map(|(name, pct)| ClaudeAccount {
                    name: name.to_string(),
                    plan: "max".into(),
                    session_pct: *pct,
                    weekly_pct: pct / 2.0,
                    ..ClaudeAccount::default()
                })
                .collect(),
        })
    }

    fn feed(w: &mut ClaudeWidget, payload: Payload, secs: i64) {
        let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        w.update(&Msg::DataUpdate(DataUpdate::ok(payload, at)));
    }

    #[test]
    fn table_frozen_while_scrolling_accounts() {
        let mut w = ClaudeWidget::new(Theme::default());
        feed(&mut w, usage(&[("work", 10.0), ("home", 20.0)]), 0);
        w.handle_key(key(KeyCode::Char('e')));
        w.handle_key(key(KeyCode::Down));
        assert!(w.table.is_frozen());

        feed(&mut w, usage(&[("solo", 5.0)]), 60);
        assert_eq!(w.table.row_count(), 2);

        w.handle_key(key(KeyCode::Char('e')));
        assert!(!w.table.is_frozen());
        assert_eq!(w.table.row_count(), 1);
        assert_eq!(w.table.selected_row().map(|r| r[0].clone()).as_deref(), Some("solo"));
    }

    #[test]
    fn no_data_until_update() {
        let w = ClaudeWidget::new(Theme::default());
        assert!(strip(&w.view(40, 9)).contains("No data"));
        assert!(w.summary().is_none());
    }

    #[test]
    fn compact_shows_gauges() {
        let mut w = ClaudeWidget::new(Theme::default());
        feed(&mut w, usage(&[("work", 42.0)]), 0);
        let out = strip(&w.view(40, 7));
        assert!(out.starts_with("work · max"));
        assert!(out.contains("session"));
        assert!(out.contains(" 42%"));
        assert!(out.contains(" 21%"));
    }

    #[test]
    fn m_cycles_accounts() {
        let mut w = ClaudeWidget::new(Theme::default());
        feed(&mut w, usage(&[("a", 10.0), ("b", 20.0)]), 0);
        assert_eq!(w.current().map(|a| a.name.as_str()), Some("a"));
        w.handle_key(key(KeyCode::Char('m')));
        assert_eq!(w.current().map(|a| a.name.as_str()), Some("b"));
        w.handle_key(key(KeyCode::Char('m')));
        assert_eq!(w.current().map(|a| a.name.as_str()), Some("a"));
    }

    #[test]
    fn history_per_account() {
        let mut w = ClaudeWidget::new(Theme::default());
        for i in 0..5 {
            feed(&mut w, usage(&[("a", i as f64 * 10.0)]), i);
        }
        assert_eq!(w.history["a"].len(), 5);
        let summary = strip(&w.summary().unwrap());
        assert!(summary.starts_with("◆ 40% "));
    }

    #[test]
    fn expanded_lists_all_accounts() {
        let mut w = ClaudeWidget::new(Theme::default());
        feed(&mut w, usage(&[("alpha", 10.0), ("beta", 95.0)]), 0);
        w.handle_key(key(KeyCode::Char('e')));
        assert!(w.is_expanded());
        let out = w.view(70, 10);
        assert!(out.split('\n').all(|l| visible_width(l) == 70));
        let plain = strip(&out);
        assert!(plain.contains("alpha"));
        assert!(plain.contains("beta"));
        assert!(plain.contains("95%"));
    }

    #[test]
    fn error_update_is_ignored() {
        let mut w = ClaudeWidget::new(Theme::default());
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        w.update(&Msg::DataUpdate(DataUpdate::failed(
            "claude",
            crate::source::FetchError::Timeout,
            at,
        )));
        assert!(w.usage.is_none());
    }
}
