//! Dashboard widgets.
//!
//! Every widget implements [`Widget`]. The model owns them as trait objects
//! and never looks at their payloads: a widget picks the updates for its own
//! source out of the [`Msg`] stream and keeps whatever state it needs.

pub mod billing;
pub mod claude;
pub mod history;
pub mod k8s;
pub mod placeholder;
pub mod system;
pub mod tailscale;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crossterm::event::{KeyCode, KeyEvent};
use tracing::error;

use crate::app::{Cmd, DataUpdate, Msg};
use crate::compositor::{PreferredColumn, WidgetSpec};
use crate::error::{Error, Result};
use crate::payload::{Payload, SourceKind};
use crate::source::FetchError;
use crate::text::{center_block, fit_block};
use crate::theme::Theme;

pub use billing::BillingWidget;
pub use claude::ClaudeWidget;
pub use history::History;
pub use k8s::K8sWidget;
pub use placeholder::Placeholder;
pub use system::SystemWidget;
pub use tailscale::TailscaleWidget;

/// Shown in place of a widget that failed to render.
pub const ERROR_GLYPH: &str = "⚠";

/// An independently rendered dashboard cell.
pub trait Widget: Send {
    /// Stable, unique within a model.
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    /// Smallest useful `(width, height)` including the frame, both positive.
    fn min_size(&self) -> (usize, usize);

    fn preferred_column(&self) -> PreferredColumn {
        PreferredColumn::for_id(self.id())
    }

    /// Reacts to a broadcast message (data updates, theme changes).
    fn update(&mut self, msg: &Msg) -> Cmd;

    /// Keys not consumed by the model while this widget is focused.
    fn handle_key(&mut self, _key: KeyEvent) -> Cmd {
        Cmd::None
    }

    /// Focus or the dashboard expansion moved away from this widget.
    fn blur(&mut self) {}

    /// Draws the interior. May return fewer or shorter lines than asked;
    /// [`Widget::view`] normalises the result.
    fn render(&self, width: usize, height: usize) -> Result<String>;

    /// One-line status for prompts, e.g. `◆ 42% ▃▅▇`.
    fn summary(&self) -> Option<String> {
        None
    }

    /// Exactly `height` lines of at most `width` cells, or empty for a zero
    /// dimension. Render errors stay inside the rectangle.
    fn view(&self, width: usize, height: usize) -> String {
        if width == 0 || height == 0 {
            return String::new();
        }
        match self.render(width, height) {
            Ok(s) => fit_block(&s, width, height),
            Err(Error::DataMissing { .. }) => center_block("No data", width, height),
            Err(Error::RenderTooSmall { .. }) => center_block("too small", width, height),
            Err(e) => center_block(&format!("{ERROR_GLYPH} {e}"), width, height),
        }
    }
}

/// The payload carried by `msg` when it is a successful update for `kind`.
pub fn payload_for(msg: &Msg, kind: SourceKind) -> Option<(&Payload, &DataUpdate)> {
    match msg {
        Msg::DataUpdate(update) if update.source == kind.as_str() => {
            update.payload().map(|p| (p, update))
        }
        _ => None,
    }
}

/// True for the key that flips a widget between compact and expanded mode.
pub fn is_mode_toggle(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('e')
}

/// Keys that move a table selection; the table is frozen while they are used.
pub fn is_scroll_key(key: &KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown
    )
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Runs `f` against `widget`, turning a panic into a widget-fault update.
fn guarded(
    widget: &mut dyn Widget,
    what: &str,
    f: impl FnOnce(&mut dyn Widget) -> Cmd,
) -> std::result::Result<Cmd, DataUpdate> {
    let id = widget.id().to_string();
    catch_unwind(AssertUnwindSafe(|| f(widget))).map_err(|panic| {
        let message = panic_message(panic);
        error!(widget = %id, %message, "widget panicked in {what}");
        DataUpdate::failed(
            id,
            FetchError::WidgetFault(message),
            chrono::Utc::now(),
        )
    })
}

/// `widget.update(msg)` behind an error boundary.
pub fn safe_update(widget: &mut dyn Widget, msg: &Msg) -> Cmd {
    guarded(widget, "update", |w| w.update(msg))
        .unwrap_or_else(|fault| Cmd::Msg(Msg::DataUpdate(fault)))
}

/// `widget.handle_key(key)` behind an error boundary.
pub fn safe_handle_key(widget: &mut dyn Widget, key: KeyEvent) -> Cmd {
    guarded(widget, "handle_key", |w| w.handle_key(key))
        .unwrap_or_else(|fault| Cmd::Msg(Msg::DataUpdate(fault)))
}

/// `widget.view(w, h)`; a panic becomes an error placeholder of the same size.
pub fn safe_view(widget: &dyn Widget, width: usize, height: usize) -> String {
    match catch_unwind(AssertUnwindSafe(|| widget.view(width, height))) {
        Ok(s) => s,
        Err(panic) => {
            let message = panic_message(panic);
            error!(widget = %widget.id(), %message, "widget panicked in view");
            center_block(ERROR_GLYPH, width, height)
        }
    }
}

/// Renders `widget` at its minimum interior size for the compositor.
pub fn to_spec(widget: &dyn Widget) -> WidgetSpec {
    let (w, h) = widget.min_size();
    let content = safe_view(widget, w.saturating_sub(2), h.saturating_sub(2));
    WidgetSpec::new(widget.id(), widget.title(), content, w, h)
        .with_preferred(widget.preferred_column())
}

/// The five data widgets, in display order.
pub fn default_widgets(theme: Theme, enabled: &[SourceKind]) -> Vec<Box<dyn Widget>> {
    enabled
        .iter()
        .map(|kind| -> Box<dyn Widget> {
            match kind {
                SourceKind::Claude => Box::new(ClaudeWidget::new(theme)),
                SourceKind::Billing => Box::new(BillingWidget::new(theme)),
                SourceKind::K8s => Box::new(K8sWidget::new(theme)),
                SourceKind::Tailscale => Box::new(TailscaleWidget::new(theme)),
                SourceKind::System => Box::new(SystemWidget::new(theme)),
            }
        })
        .collect()
}

/// The widget for a single source.
pub fn widget_for(kind: SourceKind, theme: Theme) -> Box<dyn Widget> {
    default_widgets(theme, &[kind])
        .pop()
        .unwrap_or_else(|| Box::new(Placeholder::new(kind.as_str(), kind.as_str())))
}
