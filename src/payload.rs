//! Typed payloads delivered by data sources.
//!
//! Each source has a fixed document shape. Every field defaults when absent,
//! so collectors can emit partial documents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::FetchError;

/// The data sources the widgets understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Claude,
    Billing,
    K8s,
    Tailscale,
    System,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Claude,
        SourceKind::Billing,
        SourceKind::K8s,
        SourceKind::Tailscale,
        SourceKind::System,
    ];

    /// Source tag carried by data updates.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Billing => "billing",
            Self::K8s => "k8s",
            Self::Tailscale => "tailscale",
            Self::System => "sysmetrics",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// claude
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeAccount {
    pub name: String,
    pub plan: String,
    /// Usage of the current 5-hour session window, percent.
    pub session_pct: f64,
    /// Usage of the weekly allowance, percent.
    pub weekly_pct: f64,
    pub session_resets_at: Option<DateTime<Utc>>,
    pub tokens_today: u64,
    pub cost_today: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaudeUsage {
    pub accounts: Vec<ClaudeAccount>,
}

// ---------------------------------------------------------------------------
// billing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingProvider {
    pub name: String,
    pub currency: String,
    pub month_to_date: f64,
    pub forecast: f64,
    pub budget: f64,
    /// Daily spend, oldest first.
    pub daily: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSummary {
    pub providers: Vec<BillingProvider>,
}

// ---------------------------------------------------------------------------
// k8s
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    pub name: String,
    pub context: String,
    pub nodes_ready: u32,
    pub nodes_total: u32,
    pub pods_running: u32,
    pub pods_pending: u32,
    pub pods_failed: u32,
    pub cpu_pct: f64,
    pub mem_pct: f64,
}

impl Cluster {
    /// All nodes ready and no failed pods.
    pub fn healthy(&self) -> bool {
        self.nodes_ready == self.nodes_total && self.pods_failed == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSummary {
    pub clusters: Vec<Cluster>,
}

// ---------------------------------------------------------------------------
// tailscale
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Peer {
    pub name: String,
    pub ip: String,
    pub os: String,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailnetStatus {
    pub status: String,
    pub self_name: String,
    pub peers: Vec<Peer>,
}

impl TailnetStatus {
    pub fn online_count(&self) -> usize {
        self.peers.iter().filter(|p| p.online).count()
    }
}

// ---------------------------------------------------------------------------
// sysmetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemMetrics {
    pub cpu_pct: f64,
    pub per_core: Vec<f64>,
    pub mem_used: u64,
    pub mem_total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
    pub disk_used: u64,
    pub disk_total: u64,
    pub load: [f64; 3],
    pub net_rx_bps: f64,
    pub net_tx_bps: f64,
    pub uptime_secs: u64,
}

impl SystemMetrics {
    pub fn mem_pct(&self) -> f64 {
        ratio_pct(self.mem_used, self.mem_total)
    }

    pub fn disk_pct(&self) -> f64 {
        ratio_pct(self.disk_used, self.disk_total)
    }
}

fn ratio_pct(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// tagged union
// ---------------------------------------------------------------------------

/// A payload from any source.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Claude(ClaudeUsage),
    Billing(BillingSummary),
    K8s(ClusterSummary),
    Tailscale(TailnetStatus),
    System(SystemMetrics),
}

impl Payload {
    /// Decodes a JSON document for `kind`.
    pub fn parse(kind: SourceKind, json: &str) -> Result<Self, FetchError> {
        let parse_err = |e: serde_json::Error| FetchError::Parse(format!("{kind}: {e}"));
        Ok(match kind {
            SourceKind::Claude => Self::Claude(serde_json::from_str(json).map_err(parse_err)?),
            SourceKind::Billing => Self::Billing(serde_json::from_str(json).map_err(parse_err)?),
            SourceKind::K8s => Self::K8s(serde_json::from_str(json).map_err(parse_err)?),
            SourceKind::Tailscale => {
                Self::Tailscale(serde_json::from_str(json).map_err(parse_err)?)
            }
            SourceKind::System => Self::System(serde_json::from_str(json).map_err(parse_err)?),
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Claude(_) => SourceKind::Claude,
            Self::Billing(_) => SourceKind::Billing,
            Self::K8s(_) => SourceKind::K8s,
            Self::Tailscale(_) => SourceKind::Tailscale,
            Self::System(_) => SourceKind::System,
        }
    }
}
