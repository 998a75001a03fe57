//! Global key bindings.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::KeysConfig;
use crate::error::{Error, Result};

/// Model-level actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    FocusNext,
    FocusPrev,
    /// Toggle expand of the focused widget.
    Expand,
    /// Collapse, close help, or clear the search filter.
    Back,
    Help,
    Search,
    Quit,
    NextTheme,
    NextLayout,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::FocusNext,
        Action::FocusPrev,
        Action::Expand,
        Action::Back,
        Action::Help,
        Action::Search,
        Action::Quit,
        Action::NextTheme,
        Action::NextLayout,
    ];

    pub const fn description(&self) -> &'static str {
        match self {
            Self::FocusNext => "focus next widget",
            Self::FocusPrev => "focus previous widget",
            Self::Expand => "expand / collapse focused widget",
            Self::Back => "collapse, close help, clear filter",
            Self::Help => "toggle this help",
            Self::Search => "filter widgets",
            Self::Quit => "quit",
            Self::NextTheme => "next color theme",
            Self::NextLayout => "next layout",
        }
    }
}

/// A key with its modifiers, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Parses `"tab"`, `"shift-tab"`, `"ctrl-x"`, `"f1"`, `"?"` and friends.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || Error::Config(format!("invalid key binding {s:?}"));
        if s.is_empty() {
            return Err(bad());
        }
        let (mods, name) = match s.rsplit_once('-') {
            // A bare "-" is the minus key.
            Some((m, n)) if !n.is_empty() => (Some(m), n),
            _ => (None, s),
        };
        let mut modifiers = KeyModifiers::NONE;
        if let Some(mods) = mods {
            for m in mods.split('-') {
                match m.to_ascii_lowercase().as_str() {
                    "ctrl" | "c" => modifiers |= KeyModifiers::CONTROL,
                    "alt" | "a" | "m" => modifiers |= KeyModifiers::ALT,
                    "shift" | "s" => modifiers |= KeyModifiers::SHIFT,
                    _ => return Err(bad()),
                }
            }
        }
        let lower = name.to_ascii_lowercase();
        let code = match lower.as_str() {
            "tab" if modifiers.contains(KeyModifiers::SHIFT) => KeyCode::BackTab,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "enter" | "return" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            "backspace" => KeyCode::Backspace,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            f if f.len() >= 2 && f.starts_with('f') && f[1..].chars().all(|c| c.is_ascii_digit()) => {
                KeyCode::F(f[1..].parse().map_err(|_| bad())?)
            }
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return Err(bad()),
                }
            }
        };
        Ok(Self::new(code, modifiers).normalized())
    }

    /// Drops SHIFT where the key code already carries it.
    fn normalized(mut self) -> Self {
        if matches!(self.code, KeyCode::Char(_) | KeyCode::BackTab) {
            self.modifiers.remove(KeyModifiers::SHIFT);
        }
        self
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        *self == Self::new(key.code, key.modifiers).normalized()
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("Ctrl-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("Alt-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("Shift-")?;
        }
        match self.code {
            KeyCode::Tab => f.write_str("Tab"),
            KeyCode::BackTab => f.write_str("Shift-Tab"),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Esc => f.write_str("Esc"),
            KeyCode::Backspace => f.write_str("Backspace"),
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// True for Ctrl-C, which always quits and cannot be rebound.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Maps keys to [`Action`]s. One binding per action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: Vec<(Action, KeyBinding)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        use KeyCode::*;
        Self {
            bindings: vec![
                (Action::FocusNext, KeyBinding::plain(Tab)),
                (Action::FocusPrev, KeyBinding::plain(BackTab)),
                (Action::Expand, KeyBinding::plain(Enter)),
                (Action::Back, KeyBinding::plain(Esc)),
                (Action::Help, KeyBinding::plain(Char('?'))),
                (Action::Search, KeyBinding::plain(Char('/'))),
                (Action::Quit, KeyBinding::plain(Char('q'))),
                (Action::NextTheme, KeyBinding::plain(Char('t'))),
                (Action::NextLayout, KeyBinding::plain(Char('l'))),
            ],
        }
    }
}

impl KeyMap {
    /// Defaults with the configured overrides applied.
    pub fn from_config(keys: &KeysConfig) -> Result<Self> {
        let mut map = Self::default();
        let overrides = [
            (Action::FocusNext, &keys.focus_next),
            (Action::FocusPrev, &keys.focus_prev),
            (Action::Expand, &keys.expand),
            (Action::Back, &keys.back),
            (Action::Help, &keys.help),
            (Action::Search, &keys.search),
            (Action::Quit, &keys.quit),
            (Action::NextTheme, &keys.theme),
            (Action::NextLayout, &keys.layout),
        ];
        for (action, key) in overrides {
            if let Some(key) = key {
                map.bind(action, KeyBinding::parse(key)?)?;
            }
        }
        Ok(map)
    }

    /// Rebinds `action`. Ctrl-C is reserved.
    pub fn bind(&mut self, action: Action, binding: KeyBinding) -> Result<()> {
        if binding == KeyBinding::new(KeyCode::Char('c'), KeyModifiers::CONTROL) {
            return Err(Error::Config("ctrl-c is reserved for quit".into()));
        }
        for (a, b) in &mut self.bindings {
            if *a == action {
                *b = binding;
            }
        }
        Ok(())
    }

    pub fn action(&self, key: &KeyEvent) -> Option<Action> {
        self.bindings
            .iter()
            .find(|(_, b)| b.matches(key))
            .map(|(a, _)| *a)
    }

    pub fn binding(&self, action: Action) -> Option<KeyBinding> {
        self.bindings
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, b)| *b)
    }

    /// Display label for `action`, e.g. `"Tab"`.
    pub fn label(&self, action: Action) -> String {
        self.binding(action)
            .map(|b| b.to_string())
            .unwrap_or_default()
    }
}
