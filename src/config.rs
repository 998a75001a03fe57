//! Configuration file.
//!
//! Optional TOML at `$XDG_CONFIG_HOME/dashline/config.toml` (or
//! `~/.config/dashline/config.toml`). Every key has a default; a missing
//! file is the same as an empty one. Command-line flags are applied on top
//! by the binary.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::compositor::Preset;
use crate::error::{Error, Result};
use crate::payload::SourceKind;
use crate::theme::Theme;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub ui: UiConfig,
    pub keys: KeysConfig,
    pub sources: SourcesConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    /// Tick cadence.
    pub refresh_secs: u64,
    /// Deadline for a single fetch.
    pub fetch_timeout_secs: u64,
    pub theme: String,
    /// `grid` or a preset name.
    pub layout: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_secs: 5,
            fetch_timeout_secs: 10,
            theme: "default".to_string(),
            layout: "grid".to_string(),
        }
    }
}

/// Overrides for the global key bindings. Unset keys keep their default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    pub focus_next: Option<String>,
    pub focus_prev: Option<String>,
    pub expand: Option<String>,
    pub back: Option<String>,
    pub help: Option<String>,
    pub search: Option<String>,
    pub quit: Option<String>,
    pub theme: Option<String>,
    pub layout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// Directory holding `<source>.json` documents.
    pub data_dir: Option<PathBuf>,
    /// Source names; all sources when unset.
    pub enabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
    /// Age past which `cache prune` removes banners.
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_age_secs: 86_400,
        }
    }
}

/// `$XDG_<var>/dashline`, falling back to `~/<fallback>/dashline`.
fn xdg_dir(var: &str, fallback: &str) -> Option<PathBuf> {
    env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|h| PathBuf::from(h).join(fallback)))
        .map(|p| p.join("dashline"))
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        xdg_dir("XDG_CONFIG_HOME", ".config").map(|p| p.join("config.toml"))
    }

    /// Reads `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.ui.refresh_secs == 0 {
            return Err(Error::Config("ui.refresh_secs must be at least 1".into()));
        }
        if self.ui.fetch_timeout_secs == 0 {
            return Err(Error::Config("ui.fetch_timeout_secs must be at least 1".into()));
        }
        self.theme()?;
        self.layout()?;
        self.enabled_sources()?;
        Ok(())
    }

    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.ui.refresh_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.ui.fetch_timeout_secs)
    }

    pub fn theme(&self) -> Result<Theme> {
        Theme::by_name(&self.ui.theme)
            .ok_or_else(|| Error::Config(format!("unknown theme {:?}", self.ui.theme)))
    }

    /// `None` for the square grid.
    pub fn layout(&self) -> Result<Option<Preset>> {
        match self.ui.layout.as_str() {
            "grid" => Ok(None),
            name => Preset::from_name(name)
                .map(Some)
                .ok_or_else(|| Error::Config(format!("unknown layout {name:?}"))),
        }
    }

    pub fn enabled_sources(&self) -> Result<Vec<SourceKind>> {
        let Some(names) = &self.sources.enabled else {
            return Ok(SourceKind::ALL.to_vec());
        };
        let mut kinds = Vec::with_capacity(names.len());
        for name in names {
            let kind = SourceKind::from_name(name)
                .ok_or_else(|| Error::Config(format!("unknown source {name:?}")))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.sources
            .data_dir
            .clone()
            .or_else(|| xdg_dir("XDG_DATA_HOME", ".local/share"))
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .or_else(|| xdg_dir("XDG_CACHE_HOME", ".cache"))
            .unwrap_or_else(|| env::temp_dir().join("dashline"))
    }

    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cache.max_age_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_is_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.refresh(), Duration::from_secs(5));
        assert_eq!(config.layout().unwrap(), None);
        assert_eq!(config.enabled_sources().unwrap().len(), 5);
    }

    #[test]
    fn full_file() {
        let raw = r#"
            [ui]
            refresh_secs = 2
            theme = "solarized"
            layout = "wide"

            [keys]
            quit = "x"

            [sources]
            data_dir = "/var/lib/dashline"
            enabled = ["k8s", "sysmetrics", "k8s"]

            [cache]
            max_age_secs = 60
        "#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.ui.refresh_secs, 2);
        assert_eq!(config.ui.fetch_timeout_secs, 10);
        assert_eq!(config.theme().unwrap().name, "solarized");
        assert_eq!(config.layout().unwrap(), Some(Preset::Wide));
        assert_eq!(config.keys.quit.as_deref(), Some("x"));
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/dashline"));
        assert_eq!(
            config.enabled_sources().unwrap(),
            vec![SourceKind::K8s, SourceKind::System]
        );
        assert_eq!(config.cache_max_age(), Duration::from_secs(60));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for raw in [
            "[ui]\ntheme = \"neon\"",
            "[ui]\nlayout = \"huge\"",
            "[ui]\nrefresh_secs = 0",
            "[sources]\nenabled = [\"ftp\"]",
            "[bogus]\nx = 1",
            "[ui\n",
        ] {
            assert!(matches!(Config::parse(raw), Err(Error::Config(_))), "{raw}");
        }
    }

    #[test]
    fn load_missing_and_malformed() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(Config::load(&missing).unwrap(), Config::default());

        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "refresh_secs = ").unwrap();
        assert!(matches!(Config::load(&bad), Err(Error::Config(_))));
    }
}
