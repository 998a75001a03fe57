//! dashline - terminal dashboard, login banner and prompt fragments.
//!
//! This library provides the pieces shared by the three surfaces of the
//! `dashline` binary:
//! - `dashline tui` - interactive dashboard driven by [`app::Runtime`]
//! - `dashline banner` - one-shot composed banner with a disk cache
//! - `dashline prompt` - one-line widget summaries for shell prompts

pub mod app;
pub mod banner;
pub mod compositor;
pub mod config;
pub mod error;
pub mod fmt;
pub mod payload;
pub mod prompt;
pub mod render;
pub mod source;
pub mod text;
pub mod theme;
pub mod tui;
pub mod widgets;

pub use error::{Error, Result};
