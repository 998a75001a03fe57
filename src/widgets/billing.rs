//! Cloud spend per billing provider.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{Cmd, Msg};
use crate::error::{Error, Result};
use crate::fmt::{format_money, format_pct};
use crate::payload::{BillingProvider, BillingSummary, Payload, SourceKind};
use crate::render::{Align, Column, ColumnWidth, DataTable, Gauge, Sparkline};
use crate::text::{bold, center_block, dim, paint};
use crate::theme::Theme;

use super::{History, Widget, is_mode_toggle, is_scroll_key, payload_for};

pub struct BillingWidget {
    theme: Theme,
    expanded: bool,
    selected: usize,
    summary: Option<BillingSummary>,
    /// Month-to-date total across providers.
    totals: History,
    table: DataTable,
}

fn columns() -> Vec<Column> {
    vec![
        Column::new("Provider", ColumnWidth::Fill).min(8),
        Column::new("MTD", ColumnWidth::Fixed(10)).align(Align::Right),
        Column::new("Forecast", ColumnWidth::Fixed(10)).align(Align::Right),
        Column::new("Budget", ColumnWidth::Fixed(10)).align(Align::Right),
        Column::new("Used", ColumnWidth::Fixed(5)).align(Align::Right),
    ]
}

fn used_pct(p: &BillingProvider) -> Option<f64> {
    (p.budget > 0.0).then(|| p.month_to_date / p.budget * 100.0)
}

fn provider_rows(summary: &BillingSummary) -> Vec<Vec<String>> {
    summary
        .providers
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                format_money(p.month_to_date, &p.currency),
                format_money(p.forecast, &p.currency),
                if p.budget > 0.0 {
                    format_money(p.budget, &p.currency)
                } else {
                    "-".to_string()
                },
                used_pct(p).map_or_else(|| "-".to_string(), format_pct),
            ]
        })
        .collect()
}

impl BillingWidget {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            expanded: false,
            selected: 0,
            summary: None,
            totals: History::default(),
            table: DataTable::new(columns())
                .with_style(theme.table_style())
                .selectable(true),
        }
    }

    fn providers(&self) -> &[BillingProvider] {
        match &self.summary {
            Some(s) => &s.providers,
            None => &[],
        }
    }

    fn current(&self) -> Option<&BillingProvider> {
        self.providers().get(self.selected)
    }

    /// Sum of month-to-date spend. Mixed currencies are summed as-is.
    fn total(&self) -> f64 {
        self.providers().iter().map(|p| p.month_to_date).sum()
    }

    fn currency(&self) -> &str {
        self.providers()
            .first()
            .map_or("USD", |p| p.currency.as_str())
    }

    /// Unfreezes the table and catches it up with the latest summary.
    fn release_table(&mut self) {
        if !self.table.is_frozen() {
            return;
        }
        self.table.unfreeze();
        if let Some(summary) = &self.summary {
            self.table.set_rows(provider_rows(summary));
            self.table.select(self.selected);
        }
    }

    fn apply(&mut self, summary: &BillingSummary, at: DateTime<Utc>) {
        self.table.set_rows(provider_rows(summary));
        self.selected = self
            .selected
            .min(summary.providers.len().saturating_sub(1));
        self.summary = Some(summary.clone());
        self.totals.push(at, self.total());
    }

    fn render_compact(&self, p: &BillingProvider, width: usize) -> Vec<String> {
        let count = self.providers().len();
        let mut lines = Vec::new();

        let mut header = bold(&p.name);
        if count > 1 {
            header.push_str(&dim(&format!("  {}/{count} (p)", self.selected + 1)));
        }
        lines.push(header);
        lines.push(format!(
            "month-to-date {}",
            bold(&format_money(p.month_to_date, &p.currency))
        ));

        match used_pct(p) {
            Some(pct) => lines.push(
                Gauge::percent(pct)
                    .with_label("budget")
                    .with_colors(self.theme.gauge_colors())
                    .with_percent(true)
                    .render(width),
            ),
            None => lines.push(dim("budget   -")),
        }

        let over = p.budget > 0.0 && p.forecast > p.budget;
        let forecast = format_money(p.forecast, &p.currency);
        lines.push(format!(
            "forecast {}",
            if over {
                paint(&forecast, self.theme.crit)
            } else {
                forecast
            }
        ));

        lines.push(
            Sparkline::new(&p.daily)
                .with_color(self.theme.series_color(1))
                .with_label("daily")
                .with_bounds(true)
                .render(width),
        );
        if count > 1 {
            lines.push(dim(&format!(
                "total {} across {count} providers",
                format_money(self.total(), self.currency())
            )));
        }
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
        if spark_rows > 0 {
            let values = self.totals.values();
            lines.push(
                Sparkline::new(&values)
                    .with_color(self.theme.series_color(1))
                    .with_label("total")
                    .with_trend(true)
                    .render(width),
            );
        }
        lines
    }
}

impl Widget for BillingWidget {
    fn id(&self) -> &str {
        SourceKind::Billing.as_str()
    }

    fn title(&self) -> &str {
        "Billing"
    }

    fn min_size(&self) -> (usize, usize) {
        (38, 9)
    }

    fn update(&mut self, msg: &Msg) -> Cmd {
        if let Msg::ThemeChange(theme) = msg {
            self.theme = *theme;
            self.table.set_style(theme.table_style());
        } else if let Some((Payload::Billing(summary), update)) =
            payload_for(msg, SourceKind::Billing)
        {
            self.apply(summary, update.timestamp);
        }
        Cmd::None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        let count = self.providers().len();
        if is_mode_toggle(&key) {
            self.expanded = !self.expanded;
            if !self.expanded {
                self.release_table();
            }
        } else if key.code == KeyCode::Char('p') && count > 0 {
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
        if self.summary.is_none() {
            return Err(Error::DataMissing {
                source_name: SourceKind::Billing.to_string(),
            });
        }
        let Some(p) = self.current() else {
            return Ok(center_block("no providers", width, height));
        };
        let lines = if self.expanded && height >= 3 {
            self.render_expanded(width, height)
        } else {
            self.render_compact(p, width)
        };
        Ok(lines.join("\n"))
    }

    fn summary(&self) -> Option<String> {
        let p = self.current()?;
        let total = format_money(self.total(), self.currency());
        let spark = Sparkline::new(&p.daily).chart(p.daily.len().min(6));
        Some(format!("$ {total} {spark}").trim_end().to_string())
    }
}
