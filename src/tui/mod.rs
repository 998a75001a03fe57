//! Dashboard shell pieces drawn around the widgets.
//!
//! [`layout`] places widgets in the body, [`status`] draws the bottom line
//! and [`help`] the key overlay. The model in [`crate::app`] composes them.

pub mod help;
pub mod layout;
pub mod status;

pub use help::help_overlay;
pub use layout::{LayoutCache, Rect, SizeHint};
pub use status::{StatusInfo, search_bar, status_bar};
