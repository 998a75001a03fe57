//! Error types for dashline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::source::FetchError;

/// Errors surfaced by the rendering stack and the application shell.
///
/// Only `Fatal`, `Config` and `Io` stop the program; every other kind is
/// handled where it occurs and shows up as stale data or an empty region.
#[derive(Debug, Error)]
pub enum Error {
    /// Requested dimensions are below what a component can draw.
    #[error("area {w}x{h} is too small")]
    RenderTooSmall { w: usize, h: usize },

    /// A widget has not received a payload yet.
    #[error("no data from {source_name}")]
    DataMissing { source_name: String },

    /// An external producer failed.
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Reading or writing the banner cache failed.
    #[error("cache I/O on {}: {source}", path.display())]
    CacheIo { path: PathBuf, source: io::Error },

    /// A payload could not be decoded.
    #[error("cannot parse {source_name} payload: {message}")]
    Parse { source_name: String, message: String },

    /// The event loop cannot continue (terminal gone, input thread died).
    #[error("fatal: {0}")]
    Fatal(String),

    /// Invalid configuration file or flags.
    #[error("config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for kinds that must terminate the event loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_) | Self::Io(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
