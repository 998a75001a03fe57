//! Data-source seam.
//!
//! Acquisition happens outside this crate: collectors drop one JSON document
//! per source into a data directory. A [`DataSource`] turns that into a typed
//! [`Payload`]; the runtime calls it from worker threads.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, warn};

use crate::payload::{Payload, SourceKind};

/// Why a fetch produced no payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out")]
    Timeout,
    #[error("cancelled")]
    Cancelled,
    #[error("no data available")]
    NotFound,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
    /// A widget panicked while handling an event.
    #[error("widget fault: {0}")]
    WidgetFault(String),
}

/// Shared cancellation flag threaded through the runtime and every command.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled, for use with `?`.
    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Something that can produce the latest payload for one source.
pub trait DataSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Blocking fetch. Implementations return `Cancelled` as soon as they
    /// observe `cancel`.
    fn fetch(&self, cancel: &CancelToken) -> Result<Payload, FetchError>;
}

/// Reads `<data_dir>/<source>.json`.
#[derive(Debug, Clone)]
pub struct FileSource {
    kind: SourceKind,
    path: PathBuf,
}

impl FileSource {
    pub fn new(kind: SourceKind, data_dir: &Path) -> Self {
        Self {
            kind,
            path: data_dir.join(format!("{}.json", kind.as_str())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn fetch(&self, cancel: &CancelToken) -> Result<Payload, FetchError> {
        cancel.check()?;
        let raw = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound,
            _ => FetchError::Io(format!("{}: {e}", self.path.display())),
        })?;
        cancel.check()?;
        Payload::parse(self.kind, &raw)
    }
}

/// File sources for every enabled kind.
pub fn file_sources(data_dir: &Path, enabled: &[SourceKind]) -> Vec<Arc<dyn DataSource>> {
    enabled
        .iter()
        .map(|&kind| Arc::new(FileSource::new(kind, data_dir)) as Arc<dyn DataSource>)
        .collect()
}

/// Fetches every source synchronously, keeping the ones that succeed.
///
/// Used by the one-shot surfaces (banner, prompt) where there is no loop.
pub fn load_all(
    sources: &[Arc<dyn DataSource>],
    cancel: &CancelToken,
) -> BTreeMap<SourceKind, Payload> {
    let mut out = BTreeMap::new();
    for source in sources {
        match source.fetch(cancel) {
            Ok(payload) => {
                out.insert(source.kind(), payload);
            }
            Err(FetchError::NotFound) => debug!(source = %source.kind(), "no data file"),
            Err(e) => warn!(source = %source.kind(), error = %e, "fetch failed"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_source_reads_and_parses() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tailscale.json"), r#"{"status":"ok"}"#).unwrap();
        let src = FileSource::new(SourceKind::Tailscale, dir.path());
        let payload = src.fetch(&CancelToken::new()).unwrap();
        assert_eq!(payload.kind(), SourceKind::Tailscale);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let src = FileSource::new(SourceKind::K8s, dir.path());
        assert_eq!(src.fetch(&CancelToken::new()), Err(FetchError::NotFound));
    }

    #[test]
    fn bad_json_is_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("billing.json"), "[1,2").unwrap();
        let src = FileSource::new(SourceKind::Billing, dir.path());
        assert!(matches!(
            src.fetch(&CancelToken::new()),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("claude.json"), "{}").unwrap();
        let cancel = CancelToken::new();
        let clone = cancel.clone();
        clone.cancel();
        let src = FileSource::new(SourceKind::Claude, dir.path());
        assert_eq!(src.fetch(&cancel), Err(FetchError::Cancelled));
    }

    #[test]
    fn load_all_skips_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sysmetrics.json"), r#"{"cpu_pct":3}"#).unwrap();
        fs::write(dir.path().join("k8s.json"), "oops").unwrap();
        let sources = file_sources(dir.path(), &SourceKind::ALL);
        let loaded = load_all(&sources, &CancelToken::new());
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&SourceKind::System));
    }
}
