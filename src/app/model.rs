//! Dashboard state and the update/view functions.
//!
//! `Model::update` is pure with respect to I/O: it mutates state and returns
//! a [`Cmd`] describing follow-up work. The runtime executes commands and
//! feeds their results back as messages.

use std::collections::BTreeMap;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, warn};

use super::cmd::Cmd;
use super::keymap::{Action, KeyMap, is_interrupt};
use super::msg::{DataUpdate, Msg};
use crate::compositor::{Grid, Preset};
use crate::payload::{Payload, SourceKind};
use crate::render::{BorderKind, BoxStyle, render_box};
use crate::source::FetchError;
use crate::text::center_block;
use crate::theme::Theme;
use crate::tui::{LayoutCache, SizeHint, StatusInfo, help_overlay, search_bar, status_bar};
use crate::widgets::{Widget, safe_handle_key, safe_update, safe_view};

pub const DEFAULT_REFRESH: Duration = Duration::from_secs(5);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// `None → Compact → Standard → Wide → UltraWide → None`.
fn next_layout(current: Option<Preset>) -> Option<Preset> {
    match current {
        None => Some(Preset::ALL[0]),
        Some(p) => Preset::ALL
            .iter()
            .position(|q| *q == p)
            .and_then(|i| Preset::ALL.get(i + 1))
            .copied(),
    }
}

pub struct Model {
    widgets: Vec<Box<dyn Widget>>,
    keys: KeyMap,
    theme: Theme,
    sources: Vec<SourceKind>,
    refresh: Duration,
    fetch_timeout: Duration,

    width: usize,
    height: usize,
    sized: bool,
    focused: Option<String>,
    expanded: Option<String>,
    show_help: bool,
    search_mode: bool,
    search_query: String,
    layout: Option<Preset>,
    layout_cache: LayoutCache,

    /// Latest successful payload per source tag.
    store: BTreeMap<String, Payload>,
    /// Last failure per source tag (or widget ID for faults).
    errors: BTreeMap<String, FetchError>,
    quitting: bool,
}

impl Model {
    /// Focus starts on the first widget.
    pub fn new(widgets: Vec<Box<dyn Widget>>) -> Self {
        let focused = widgets.first().map(|w| w.id().to_string());
        Self {
            widgets,
            keys: KeyMap::default(),
            theme: Theme::default(),
            sources: Vec::new(),
            refresh: DEFAULT_REFRESH,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            width: 0,
            height: 0,
            sized: false,
            focused,
            expanded: None,
            show_help: false,
            search_mode: false,
            search_query: String::new(),
            layout: None,
            layout_cache: LayoutCache::new(),
            store: BTreeMap::new(),
            errors: BTreeMap::new(),
            quitting: false,
        }
    }

    pub fn with_keymap(mut self, keys: KeyMap) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the theme and hands it to every widget.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        let msg = Msg::ThemeChange(theme);
        for w in &mut self.widgets {
            safe_update(w.as_mut(), &msg);
        }
        self
    }

    /// Sources fetched at init and on every tick.
    pub fn with_sources(mut self, sources: Vec<SourceKind>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        if !refresh.is_zero() {
            self.refresh = refresh;
        }
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.fetch_timeout = timeout;
        }
        self
    }

    pub fn with_layout(mut self, layout: Option<Preset>) -> Self {
        self.layout = layout;
        self
    }

    // --- accessors -------------------------------------------------------

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn search_mode(&self) -> bool {
        self.search_mode
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn layout(&self) -> Option<Preset> {
        self.layout
    }

    pub fn size(&self) -> Option<(usize, usize)> {
        self.sized.then_some((self.width, self.height))
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    pub fn data(&self, source: &str) -> Option<&Payload> {
        self.store.get(source)
    }

    pub fn last_error(&self, source: &str) -> Option<&FetchError> {
        self.errors.get(source)
    }

    /// Sources (or widgets) whose last update failed.
    pub fn stale_count(&self) -> usize {
        self.errors.len()
    }

    pub fn widget_ids(&self) -> Vec<&str> {
        self.widgets.iter().map(|w| w.id()).collect()
    }

    /// IDs passing the search filter, in display order.
    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible()
            .into_iter()
            .map(|i| self.widgets[i].id())
            .collect()
    }

    // --- update ----------------------------------------------------------

    /// First tick after the refresh interval plus an immediate fetch of
    /// every source.
    pub fn init(&self) -> Cmd {
        Cmd::batch(std::iter::once(Cmd::Tick(self.refresh)).chain(self.fetch_all()))
    }

    fn fetch_all(&self) -> Vec<Cmd> {
        self.sources
            .iter()
            .map(|&source| Cmd::Fetch {
                source,
                deadline: self.fetch_timeout,
            })
            .collect()
    }

    pub fn update(&mut self, msg: Msg) -> Cmd {
        if self.quitting {
            return Cmd::None;
        }
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.sized = true;
                self.layout_cache.invalidate();
                Cmd::None
            }
            Msg::Tick(_) => {
                Cmd::batch(std::iter::once(Cmd::Tick(self.refresh)).chain(self.fetch_all()))
            }
            Msg::DataUpdate(update) => self.on_data(update),
            Msg::FocusWidget(id) => {
                if self.index_of(&id).is_some() {
                    self.set_focus(Some(id));
                }
                Cmd::None
            }
            Msg::ExpandWidget(None) => {
                self.set_expanded(None);
                Cmd::None
            }
            Msg::ExpandWidget(Some(id)) => {
                if self.index_of(&id).is_some() {
                    self.set_focus(Some(id.clone()));
                    self.set_expanded(Some(id));
                }
                Cmd::None
            }
            Msg::ThemeChange(theme) => {
                debug!(theme = theme.name, "theme changed");
                self.theme = theme;
                self.broadcast(&Msg::ThemeChange(theme))
            }
            Msg::LayoutPreset(layout) => {
                self.layout = layout;
                Cmd::None
            }
            Msg::Quit => self.quit(),
        }
    }

    fn quit(&mut self) -> Cmd {
        self.quitting = true;
        Cmd::Quit
    }

    fn broadcast(&mut self, msg: &Msg) -> Cmd {
        Cmd::batch(
            self.widgets
                .iter_mut()
                .map(|w| safe_update(w.as_mut(), msg))
                .collect::<Vec<_>>(),
        )
    }

    fn on_data(&mut self, update: DataUpdate) -> Cmd {
        if let Some(err) = &update.err {
            warn!(source = %update.source, error = %err, "update failed, keeping previous data");
            self.errors.insert(update.source.clone(), err.clone());
            return Cmd::None;
        }
        let Some(payload) = update.data.clone() else {
            return Cmd::None;
        };
        self.store.insert(update.source.clone(), payload);
        self.errors.remove(&update.source);
        self.broadcast(&Msg::DataUpdate(update))
    }

    fn handle_key(&mut self, key: KeyEvent) -> Cmd {
        if is_interrupt(&key) {
            return self.quit();
        }
        if key.kind == KeyEventKind::Release {
            return Cmd::None;
        }
        if self.search_mode {
            self.search_key(key);
            return Cmd::None;
        }
        match self.keys.action(&key) {
            Some(action) => self.apply(action),
            None => self.forward_key(key),
        }
    }

    fn search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.search_mode = false;
                self.refocus_visible();
            }
            KeyCode::Esc => {
                self.search_mode = false;
                self.clear_query();
            }
            KeyCode::Backspace => {
                if self.search_query.pop().is_some() {
                    self.layout_cache.invalidate();
                }
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.search_query.push(c);
                self.layout_cache.invalidate();
            }
            _ => {}
        }
    }

    /// The visible set changes with the query, so cached layouts go too.
    fn clear_query(&mut self) {
        if !self.search_query.is_empty() {
            self.search_query.clear();
            self.layout_cache.invalidate();
        }
    }

    fn apply(&mut self, action: Action) -> Cmd {
        match action {
            Action::FocusNext => self.cycle_focus(true),
            Action::FocusPrev => self.cycle_focus(false),
            Action::Expand => self.toggle_expand(),
            Action::Back => {
                if self.expanded.is_some() {
                    self.set_expanded(None);
                } else if self.show_help {
                    self.show_help = false;
                } else {
                    self.clear_query();
                }
            }
            Action::Help => self.show_help = !self.show_help,
            Action::Search => {
                self.search_mode = true;
                self.clear_query();
            }
            Action::Quit => return self.quit(),
            Action::NextTheme => return Cmd::Msg(Msg::ThemeChange(self.theme.next())),
            Action::NextLayout => return Cmd::Msg(Msg::LayoutPreset(next_layout(self.layout))),
        }
        Cmd::None
    }

    fn forward_key(&mut self, key: KeyEvent) -> Cmd {
        let Some(i) = self.focused.as_deref().and_then(|id| self.index_of(id)) else {
            return Cmd::None;
        };
        safe_handle_key(self.widgets[i].as_mut(), key)
    }

    fn toggle_expand(&mut self) {
        if self.expanded == self.focused {
            self.set_expanded(None);
        } else {
            self.set_expanded(self.focused.clone());
        }
    }

    /// Cycles over the visible widgets, or all of them when none match.
    fn cycle_focus(&mut self, forward: bool) {
        let mut order = self.visible();
        if order.is_empty() {
            order = (0..self.widgets.len()).collect();
        }
        let n = order.len();
        if n == 0 {
            return;
        }
        let current = self
            .focused
            .as_deref()
            .and_then(|id| order.iter().position(|&i| self.widgets[i].id() == id));
        let next = match (current, forward) {
            (Some(p), true) => (p + 1) % n,
            (Some(p), false) => (p + n - 1) % n,
            (None, true) => 0,
            (None, false) => n - 1,
        };
        let id = self.widgets[order[next]].id().to_string();
        self.set_focus(Some(id));
    }

    /// Moves focus onto the first visible widget if the filter hid it.
    fn refocus_visible(&mut self) {
        let visible = self.visible();
        let hidden = self
            .focused
            .as_deref()
            .is_none_or(|id| !visible.iter().any(|&i| self.widgets[i].id() == id));
        if hidden && let Some(&first) = visible.first() {
            let id = self.widgets[first].id().to_string();
            self.set_focus(Some(id));
        }
    }

    /// Blurs the widget behind `id` unless it is `next`.
    fn blur_unless(&mut self, id: Option<String>, next: Option<&str>) {
        if id.as_deref() == next {
            return;
        }
        if let Some(i) = id.and_then(|id| self.index_of(&id)) {
            self.widgets[i].blur();
        }
    }

    fn set_focus(&mut self, id: Option<String>) {
        let old = self.focused.take();
        self.blur_unless(old, id.as_deref());
        self.focused = id;
    }

    fn set_expanded(&mut self, id: Option<String>) {
        let old = self.expanded.take();
        self.blur_unless(old, id.as_deref());
        self.expanded = id;
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.id() == id)
    }

    fn visible(&self) -> Vec<usize> {
        let query = self.search_query.to_lowercase();
        self.widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| {
                query.is_empty()
                    || w.id().to_lowercase().contains(&query)
                    || w.title().to_lowercase().contains(&query)
            })
            .map(|(i, _)| i)
            .collect()
    }

    // --- view ------------------------------------------------------------

    /// The whole frame: body rows plus one status row, each exactly the
    /// terminal width.
    pub fn view(&self) -> String {
        if self.quitting {
            return String::new();
        }
        if !self.sized {
            return "Initializing...".to_string();
        }
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 {
            return String::new();
        }
        let status = self.status_line();
        let body_h = height - 1;
        if body_h == 0 {
            return status;
        }

        let mut grid = Grid::new(width, body_h);
        match self.expanded.as_deref().and_then(|id| self.index_of(id)) {
            Some(i) => self.draw_expanded(&mut grid, self.widgets[i].as_ref()),
            None => self.draw_grid(&mut grid),
        }
        if self.show_help
            && let Some((x, y, panel)) = help_overlay(&self.keys, &self.theme, width, body_h)
        {
            grid.blit(x, y, &panel);
        }
        format!("{}\n{status}", grid.render())
    }

    fn draw_expanded(&self, grid: &mut Grid, widget: &dyn Widget) {
        let style = BoxStyle::new(BorderKind::Rounded)
            .with_title(widget.title())
            .with_fg(self.theme.accent);
        let (w, h) = (grid.width(), grid.height());
        let (iw, ih) = style.inner_size(w, h);
        grid.blit(0, 0, &render_box(&safe_view(widget, iw, ih), w, h, &style));
    }

    fn draw_grid(&self, grid: &mut Grid) {
        let visible = self.visible();
        let (w, h) = (grid.width(), grid.height());
        if visible.is_empty() {
            let msg = if self.widgets.is_empty() {
                "no widgets"
            } else {
                "no widgets match the filter"
            };
            grid.blit(0, 0, &center_block(msg, w, h));
            return;
        }
        let hints: Vec<SizeHint> = visible
            .iter()
            .map(|&i| {
                let widget = &self.widgets[i];
                let (min_w, min_h) = widget.min_size();
                SizeHint {
                    min_w,
                    min_h,
                    preferred: widget.preferred_column(),
                }
            })
            .collect();
        for (slot, rect) in self.layout_cache.layout(self.layout, &hints, w, h) {
            let widget = self.widgets[visible[slot]].as_ref();
            let focused = self.focused.as_deref() == Some(widget.id());
            let style = self.theme.frame(widget.title(), focused);
            let (iw, ih) = style.inner_size(rect.w, rect.h);
            let content = safe_view(widget, iw, ih);
            grid.blit(rect.x, rect.y, &render_box(&content, rect.w, rect.h, &style));
        }
    }

    fn status_line(&self) -> String {
        if self.search_mode {
            return search_bar(&self.search_query, self.width);
        }
        let info = StatusInfo {
            focused: self.focused.as_deref(),
            expanded: self.expanded.is_some(),
            filter: &self.search_query,
            stale: self.stale_count(),
            layout: self.layout,
        };
        status_bar(self.width, &self.keys, &info, &self.theme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{strip, visible_width};
    use crate::widgets::Placeholder;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn model() -> Model {
        Model::new(vec![
            Box::new(Placeholder::new("cpu", "CPU")),
            Box::new(Placeholder::new("mem", "Memory")),
            Box::new(Placeholder::new("net", "Network")),
        ])
    }

    fn press(m: &mut Model, code: KeyCode) -> Cmd {
        m.update(Msg::Key(key(code)))
    }

    struct Exploding;

    impl Widget for Exploding {
        fn id(&self) -> &str {
            "boom"
        }
        fn title(&self) -> &str {
            "Boom"
        }
        fn min_size(&self) -> (usize, usize) {
            (10, 4)
        }
        fn update(&mut self, msg: &Msg) -> Cmd {
            if matches!(msg, Msg::DataUpdate(_)) {
                panic!("bad payload");
            }
            Cmd::None
        }
        fn render(&self, _w: usize, _h: usize) -> crate::error::Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn init_and_tick_schedule_fetches() {
        let m = model()
            .with_sources(vec![SourceKind::K8s, SourceKind::System])
            .with_refresh(Duration::from_secs(2));
        let fetch = |source| Cmd::Fetch {
            source,
            deadline: DEFAULT_FETCH_TIMEOUT,
        };
        let expected = Cmd::Batch(vec![
            Cmd::Tick(Duration::from_secs(2)),
            fetch(SourceKind::K8s),
            fetch(SourceKind::System),
        ]);
        assert_eq!(m.init(), expected);
        let mut m = m;
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(m.update(Msg::Tick(now)), expected);
    }

    #[test]
    fn tick_without_sources_only_reschedules() {
        let mut m = model();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(m.update(Msg::Tick(now)), Cmd::Tick(DEFAULT_REFRESH));
    }

    #[test]
    fn view_before_resize_and_after_quit() {
        let mut m = model();
        assert_eq!(m.view(), "Initializing...");
        m.update(Msg::Resize { width: 60, height: 20 });
        assert_eq!(press(&mut m, KeyCode::Char('q')), Cmd::Quit);
        assert_eq!(m.view(), "");
    }

    #[test]
    fn frame_is_exact_size() {
        let mut m = model();
        m.update(Msg::Resize { width: 70, height: 21 });
        let out = m.view();
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines.len(), 21);
        assert!(lines.iter().all(|l| visible_width(l) == 70));
        assert!(strip(lines[0]).contains("CPU"));
    }

    #[test]
    fn expanded_view_shows_one_widget() {
        let mut m = model();
        m.update(Msg::Resize { width: 50, height: 10 });
        press(&mut m, KeyCode::Tab);
        press(&mut m, KeyCode::Enter);
        assert_eq!(m.expanded(), Some("mem"));
        let plain = strip(&m.view());
        assert!(plain.contains("Memory"));
        assert!(!plain.contains("CPU"));
        assert_eq!(plain.split('\n').count(), 10);
    }

    #[test]
    fn esc_unwinds_expand_then_help_then_filter() {
        let mut m = model();
        press(&mut m, KeyCode::Char('/'));
        press(&mut m, KeyCode::Char('m'));
        press(&mut m, KeyCode::Enter);
        assert!(!m.search_mode());
        assert_eq!(m.search_query(), "m");
        assert_eq!(m.focused(), Some("mem"));
        press(&mut m, KeyCode::Char('?'));
        press(&mut m, KeyCode::Enter);
        assert!(m.show_help() && m.expanded() == Some("mem"));

        press(&mut m, KeyCode::Esc);
        assert!(m.expanded().is_none() && m.show_help());
        press(&mut m, KeyCode::Esc);
        assert!(!m.show_help());
        assert_eq!(m.search_query(), "m");
        press(&mut m, KeyCode::Esc);
        assert_eq!(m.search_query(), "");
    }

    #[test]
    fn filter_limits_focus_cycle() {
        let mut m = model();
        press(&mut m, KeyCode::Char('/'));
        for c in "ne".chars() {
            press(&mut m, KeyCode::Char(c));
        }
        press(&mut m, KeyCode::Backspace);
        press(&mut m, KeyCode::Char('e'));
        press(&mut m, KeyCode::Enter);
        assert_eq!(m.visible_ids(), vec!["net"]);
        assert_eq!(m.focused(), Some("net"));
        press(&mut m, KeyCode::Tab);
        assert_eq!(m.focused(), Some("net"));
    }

    #[test]
    fn ctrl_c_quits_even_in_search() {
        let mut m = model();
        press(&mut m, KeyCode::Char('/'));
        let cmd = m.update(Msg::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(cmd, Cmd::Quit);
        assert!(m.is_quitting());
        assert_eq!(m.update(Msg::Quit), Cmd::None);
    }

    #[test]
    fn focus_and_expand_messages() {
        let mut m = model();
        m.update(Msg::FocusWidget("nope".into()));
        assert_eq!(m.focused(), Some("cpu"));
        m.update(Msg::FocusWidget("net".into()));
        assert_eq!(m.focused(), Some("net"));
        m.update(Msg::ExpandWidget(Some("mem".into())));
        assert_eq!((m.focused(), m.expanded()), (Some("mem"), Some("mem")));
        m.update(Msg::ExpandWidget(None));
        assert!(m.expanded().is_none());
    }

    #[test]
    fn theme_and_layout_keys_emit_messages() {
        let mut m = model();
        let Cmd::Msg(msg) = press(&mut m, KeyCode::Char('t')) else {
            panic!("expected a message");
        };
        assert_eq!(msg, Msg::ThemeChange(Theme::mono()));
        m.update(msg);
        assert_eq!(m.theme().name, "mono");

        let mut seen = Vec::new();
        for _ in 0..5 {
            let Cmd::Msg(msg) = press(&mut m, KeyCode::Char('l')) else {
                panic!("expected a message");
            };
            m.update(msg);
            seen.push(m.layout());
        }
        assert_eq!(
            seen,
            vec![
                Some(Preset::Compact),
                Some(Preset::Standard),
                Some(Preset::Wide),
                Some(Preset::UltraWide),
                None
            ]
        );
    }

    #[test]
    fn widget_panic_becomes_fault_update() {
        let mut m = Model::new(vec![
            Box::new(Placeholder::new("cpu", "CPU")),
            Box::new(Exploding),
        ]);
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let payload = Payload::Tailscale(Default::default());
        let cmd = m.update(Msg::DataUpdate(DataUpdate::ok(payload, at)));
        let Cmd::Msg(fault) = cmd else {
            panic!("expected a fault message, got {cmd:?}");
        };
        m.update(fault);
        assert!(matches!(
            m.last_error("boom"),
            Some(FetchError::WidgetFault(msg)) if msg == "bad payload"
        ));
        assert!(m.data("tailscale").is_some());
        assert_eq!(m.stale_count(), 1);
    }

    #[test]
    fn success_clears_error() {
        let mut m = model();
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        m.update(Msg::DataUpdate(DataUpdate::failed(
            "k8s",
            FetchError::Timeout,
            at,
        )));
        assert_eq!(m.last_error("k8s"), Some(&FetchError::Timeout));
        m.update(Msg::DataUpdate(DataUpdate::ok(
            Payload::K8s(Default::default()),
            at,
        )));
        assert!(m.last_error("k8s").is_none());
    }

    #[test]
    fn unbound_keys_reach_focused_widget() {
        let mut m = Model::new(vec![Box::new(crate::widgets::SystemWidget::new(
            Theme::default(),
        ))]);
        assert_eq!(press(&mut m, KeyCode::Char('c')), Cmd::None);
        assert_eq!(m.focused(), Some("sysmetrics"));
    }

    struct Recorder {
        id: &'static str,
        blurs: Arc<AtomicUsize>,
    }

    impl Widget for Recorder {
        fn id(&self) -> &str {
            self.id
        }
        fn title(&self) -> &str {
            self.id
        }
        fn min_size(&self) -> (usize, usize) {
            (10, 4)
        }
        fn update(&mut self, _msg: &Msg) -> Cmd {
            Cmd::None
        }
        fn blur(&mut self) {
            self.blurs.fetch_add(1, Ordering::SeqCst);
        }
        fn render(&self, _w: usize, _h: usize) -> crate::error::Result<String> {
            Ok(String::new())
        }
    }

    fn recorders() -> (Model, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (a, b) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
        let m = Model::new(vec![
            Box::new(Recorder { id: "a", blurs: a.clone() }),
            Box::new(Recorder { id: "b", blurs: b.clone() }),
        ]);
        (m, a, b)
    }

    #[test]
    fn focus_change_blurs_previous_widget() {
        let (mut m, a, b) = recorders();
        press(&mut m, KeyCode::Tab);
        assert_eq!(m.focused(), Some("b"));
        assert_eq!((a.load(Ordering::SeqCst), b.load(Ordering::SeqCst)), (1, 0));

        m.update(Msg::FocusWidget("b".into()));
        assert_eq!(b.load(Ordering::SeqCst), 0);
        press(&mut m, KeyCode::Tab);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn collapse_blurs_expanded_widget() {
        let (mut m, a, _) = recorders();
        press(&mut m, KeyCode::Enter);
        assert_eq!(a.load(Ordering::SeqCst), 0);
        press(&mut m, KeyCode::Esc);
        assert_eq!(m.expanded(), None);
        assert_eq!(a.load(Ordering::SeqCst), 1);

        m.update(Msg::ExpandWidget(Some("a".into())));
        m.update(Msg::ExpandWidget(Some("b".into())));
        assert_eq!(a.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn tab_away_releases_frozen_table() {
        use crate::payload::{Cluster, ClusterSummary};
        use crate::widgets::K8sWidget;

        let summary = |names: &[&str]| {
            Payload::K8s(ClusterSummary {
                clusters: names
                    .iter()
                    .map(|n| Cluster {
                        name: n.to_string(),
                        ..Cluster::default()
                    })
                    .collect(),
            })
        };
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut m = Model::new(vec![
            Box::new(K8sWidget::new(Theme::default())),
            Box::new(Placeholder::new("cpu", "CPU")),
        ]);
        m.update(Msg::Resize { width: 100, height: 30 });
        m.update(Msg::DataUpdate(DataUpdate::ok(summary(&["alpha", "beta"]), at)));
        press(&mut m, KeyCode::Char('e'));
        press(&mut m, KeyCode::Down);
        m.update(Msg::DataUpdate(DataUpdate::ok(summary(&["gamma"]), at)));
        assert!(strip(&m.view()).contains("alpha"));

        press(&mut m, KeyCode::Tab);
        let frame = strip(&m.view());
        assert!(frame.contains("gamma"), "{frame}");
        assert!(!frame.contains("alpha"), "{frame}");
    }

    #[test]
    fn filter_edits_keep_layout_cache_small() {
        let mut m = model();
        m.update(Msg::Resize { width: 80, height: 24 });
        m.view();
        press(&mut m, KeyCode::Char('/'));
        for c in "memory".chars() {
            press(&mut m, KeyCode::Char(c));
            m.view();
            assert!(m.layout_cache.len() <= 1);
        }
        for _ in 0..3 {
            press(&mut m, KeyCode::Backspace);
            m.view();
            assert!(m.layout_cache.len() <= 1);
        }
        press(&mut m, KeyCode::Esc);
        assert!(m.layout_cache.is_empty());
    }

    #[test]
    fn tab_cycles_focus_and_backtab_wraps() {
        let mut m = model();
        assert_eq!(m.focused(), Some("cpu"));
        let mut seen = Vec::new();
        for _ in 0..3 {
            press(&mut m, KeyCode::Tab);
            seen.push(m.focused().map(str::to_string));
        }
        assert_eq!(
            seen,
            vec![Some("mem".into()), Some("net".into()), Some("cpu".into())]
        );
        m.update(Msg::Key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)));
        assert_eq!(m.focused(), Some("net"));
    }

    #[test]
    fn enter_expands_and_esc_collapses() {
        let mut m = model();
        press(&mut m, KeyCode::Enter);
        assert_eq!(m.expanded(), Some("cpu"));
        press(&mut m, KeyCode::Esc);
        assert_eq!(m.expanded(), None);
    }

    #[test]
    fn search_mode_absorbs_quit_key() {
        let mut m = model();
        press(&mut m, KeyCode::Char('/'));
        press(&mut m, KeyCode::Char('q'));
        assert!(!m.is_quitting());
        assert!(m.search_mode());
        assert_eq!(m.search_query(), "q");

        press(&mut m, KeyCode::Esc);
        assert!(!m.search_mode());
        assert_eq!(m.search_query(), "");
    }

    #[test]
    fn failed_update_stores_nothing() {
        let mut m = model();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        m.update(Msg::DataUpdate(DataUpdate::failed(
            "tailscale",
            FetchError::Timeout,
            now,
        )));
        assert!(m.data("tailscale").is_none());

        let ok = Payload::Tailscale(crate::payload::TailnetStatus {
            status: "ok".into(),
            ..Default::default()
        });
        m.update(Msg::DataUpdate(DataUpdate::ok(ok.clone(), now)));
        assert_eq!(m.data("tailscale"), Some(&ok));
    }
}
