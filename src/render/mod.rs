//! Data-widget renderers.
//!
//! Every renderer produces a plain string with SGR escapes, sized in terminal
//! cells. None of them touch the terminal directly.

pub mod boxes;
pub mod gauge;
pub mod graph;
pub mod sparkline;
pub mod table;

pub use boxes::{Align, BorderKind, BoxStyle, Padding, divider, render_box};
pub use gauge::{Gauge, GaugeColors, MultiGauge};
pub use graph::{Series, TimeGraph};
pub use sparkline::{Sparkline, TrendDirection, trend};
pub use table::{Column, ColumnWidth, DataTable, TableStyle};
