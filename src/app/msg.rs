//! Events consumed by the model.

use chrono::{DateTime, Utc};
use crossterm::event::KeyEvent;

use crate::compositor::Preset;
use crate::payload::Payload;
use crate::source::FetchError;
use crate::theme::Theme;

/// Result of one fetch, or a fault raised on behalf of a widget.
///
/// When `err` is set, `data` is ignored and nothing is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUpdate {
    /// Source tag (`claude`, `billing`, ...) or, for faults, the widget ID.
    pub source: String,
    pub data: Option<Payload>,
    pub err: Option<FetchError>,
    pub timestamp: DateTime<Utc>,
}

impl DataUpdate {
    pub fn ok(payload: Payload, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: payload.kind().as_str().to_string(),
            data: Some(payload),
            err: None,
            timestamp,
        }
    }

    pub fn failed(source: impl Into<String>, err: FetchError, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: source.into(),
            data: None,
            err: Some(err),
            timestamp,
        }
    }

    /// The payload, only when no error is attached.
    pub fn payload(&self) -> Option<&Payload> {
        match self.err {
            Some(_) => None,
            None => self.data.as_ref(),
        }
    }
}

/// Everything the update function reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    Key(KeyEvent),
    Resize { width: usize, height: usize },
    /// Scheduler heartbeat.
    Tick(DateTime<Utc>),
    DataUpdate(DataUpdate),
    /// Focus a widget by ID. Unknown IDs are ignored.
    FocusWidget(String),
    /// Expand a widget by ID, or collapse with `None`.
    ExpandWidget(Option<String>),
    ThemeChange(Theme),
    /// `None` selects the square grid, `Some` packs by preset columns.
    LayoutPreset(Option<Preset>),
    Quit,
}
