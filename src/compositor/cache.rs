//! Content-addressed disk cache for rendered banners.
//!
//! One file per key, `banner-<24 hex>.cache`, holding the rendered bytes.
//! Liveness is the file mtime; there is no index. Writes go through a temp
//! file in the same directory and a rename, so readers never observe a
//! partial banner.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};
use xxhash_rust::xxh3::xxh3_128;

use super::{BannerData, Preset, render_banner};
use crate::error::{Error, Result};
use crate::theme::Theme;

/// Entries younger than this are served without re-rendering.
pub const FRESHNESS: Duration = Duration::from_secs(30);

const FILE_PREFIX: &str = "banner-";
const FILE_SUFFIX: &str = ".cache";
const TMP_SUFFIX: &str = ".tmp";

fn feed(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn feed_num(buf: &mut Vec<u8>, n: usize) {
    buf.extend_from_slice(&(n as u64).to_le_bytes());
}

/// Stable key over everything that affects the rendered bytes.
///
/// Fields are length-prefixed so that moving text between adjacent fields
/// changes the key.
pub fn cache_key(data: &BannerData, preset: Preset, theme: &Theme) -> String {
    let mut buf = Vec::with_capacity(256);
    feed(&mut buf, preset.name().as_bytes());
    feed_num(&mut buf, preset.width());
    feed_num(&mut buf, preset.height());
    feed(&mut buf, theme.name.as_bytes());
    feed_num(&mut buf, data.widgets.len());
    for w in &data.widgets {
        feed(&mut buf, w.id.as_bytes());
        feed(&mut buf, w.title.as_bytes());
        feed(&mut buf, w.content.as_bytes());
        feed_num(&mut buf, w.min_w);
        feed_num(&mut buf, w.min_h);
        feed_num(&mut buf, w.preferred as usize);
    }
    let hex = format!("{:032x}", xxh3_128(&buf));
    hex[..24].to_string()
}

/// Outcome of [`BannerCache::prune`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub files_removed: usize,
    pub tmp_removed: usize,
    pub bytes_freed: u64,
    pub files_remaining: usize,
}

/// Banner cache rooted at a caller-chosen directory.
#[derive(Debug, Clone)]
pub struct BannerCache {
    dir: PathBuf,
    freshness: Duration,
}

fn age(mtime: SystemTime, now: SystemTime) -> Duration {
    match now.duration_since(mtime) {
        Ok(d) => d,
        Err(e) => e.duration(),
    }
}

impl BannerCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            freshness: FRESHNESS,
        }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{FILE_PREFIX}{key}{FILE_SUFFIX}"))
    }

    /// Returns the cached banner if its mtime is within the freshness window of `now`.
    pub fn read_fresh(&self, key: &str, now: SystemTime) -> Result<Option<String>> {
        let path = self.path_for(key);
        let io_err = |source: io::Error| Error::CacheIo {
            path: path.clone(),
            source,
        };
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err(e)),
        };
        let mtime = meta.modified().map_err(io_err)?;
        if age(mtime, now) > self.freshness {
            return Ok(None);
        }
        fs::read_to_string(&path).map(Some).map_err(io_err)
    }

    /// Atomically replaces the entry for `key`.
    pub fn write(&self, key: &str, contents: &str) -> Result<()> {
        let path = self.path_for(key);
        let io_err = |source: io::Error| Error::CacheIo {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(FILE_PREFIX)
            .suffix(TMP_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(io_err)?;
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    /// Renders through the cache at the current time.
    pub fn render(&self, data: &BannerData, preset: Preset, theme: &Theme) -> String {
        self.render_at(data, preset, theme, SystemTime::now())
    }

    /// Cached banner when fresh, otherwise a fresh render that is written back.
    ///
    /// Cache failures are logged and never fail the render.
    pub fn render_at(
        &self,
        data: &BannerData,
        preset: Preset,
        theme: &Theme,
        now: SystemTime,
    ) -> String {
        let key = cache_key(data, preset, theme);
        match self.read_fresh(&key, now) {
            Ok(Some(hit)) => {
                debug!(key = %key, "banner cache hit");
                return hit;
            }
            Ok(None) => debug!(key = %key, "banner cache miss"),
            Err(e) => warn!(error = %e, "banner cache read failed"),
        }
        let fresh = render_banner(data, preset, theme);
        if let Err(e) = self.write(&key, &fresh) {
            warn!(error = %e, "banner cache write failed");
        }
        fresh
    }

    /// Removes entries older than `max_age` and leftover temp files older
    /// than the freshness window. A missing directory prunes nothing.
    pub fn prune(&self, max_age: Duration) -> Result<PruneResult> {
        self.prune_at(max_age, SystemTime::now())
    }

    pub fn prune_at(&self, max_age: Duration, now: SystemTime) -> Result<PruneResult> {
        let mut result = PruneResult::default();
        let io_err = |source: io::Error| Error::CacheIo {
            path: self.dir.clone(),
            source,
        };
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(result),
            Err(e) => return Err(io_err(e)),
        };

        for entry in entries {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !name.starts_with(FILE_PREFIX) {
                continue;
            }
            let is_entry = name.ends_with(FILE_SUFFIX);
            let is_tmp = name.ends_with(TMP_SUFFIX);
            if !is_entry && !is_tmp {
                continue;
            }
            let meta = entry.metadata().map_err(io_err)?;
            let file_age = age(meta.modified().map_err(io_err)?, now);
            let limit = if is_tmp { FRESHNESS } else { max_age };
            if file_age <= limit {
                if is_entry {
                    result.files_remaining += 1;
                }
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "cannot remove cache file");
                continue;
            }
            result.bytes_freed += meta.len();
            if is_tmp {
                result.tmp_removed += 1;
            } else {
                result.files_removed += 1;
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::WidgetSpec;
    use std::fs::File;
    use tempfile::tempdir;

    fn data(content: &str) -> BannerData {
        BannerData {
            widgets: vec![
                WidgetSpec::new("cpu", "CPU", content, 20, 6),
                WidgetSpec::new("mem", "Memory", "used 4G", 20, 6),
            ],
        }
    }

    fn set_age(path: &Path, secs: u64) {
        let t = SystemTime::now() - Duration::from_secs(secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(t)
            .unwrap();
    }

    #[test]
    fn test_key_is_stable_and_sensitive() {
        let theme = Theme::default();
        let a = cache_key(&data("42%"), Preset::Compact, &theme);
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, cache_key(&data("42%"), Preset::Compact, &theme));
        assert_ne!(a, cache_key(&data("43%"), Preset::Compact, &theme));
        assert_ne!(a, cache_key(&data("42%"), Preset::Wide, &theme));
        assert_ne!(a, cache_key(&data("42%"), Preset::Compact, &Theme::mono()));
    }

    #[test]
    fn test_key_separates_fields() {
        let theme = Theme::default();
        let a = BannerData {
            widgets: vec![WidgetSpec::new("ab", "c", "", 1, 1)],
        };
        let b = BannerData {
            widgets: vec![WidgetSpec::new("a", "bc", "", 1, 1)],
        };
        assert_ne!(
            cache_key(&a, Preset::Compact, &theme),
            cache_key(&b, Preset::Compact, &theme)
        );
    }

    #[test]
    fn test_hit_within_freshness() {
        let dir = tempdir().unwrap();
        let cache = BannerCache::new(dir.path());
        let theme = Theme::default();
        let d = data("42%");

        let first = cache.render(&d, Preset::Compact, &theme);
        let key = cache_key(&d, Preset::Compact, &theme);
        assert_eq!(fs::read_to_string(cache.path_for(&key)).unwrap(), first);

        // A fresh entry is served verbatim.
        fs::write(cache.path_for(&key), "cached").unwrap();
        assert_eq!(cache.render(&d, Preset::Compact, &theme), "cached");
    }

    #[test]
    fn test_stale_entry_is_rerendered() {
        let dir = tempdir().unwrap();
        let cache = BannerCache::new(dir.path());
        let theme = Theme::default();
        let d = data("42%");
        let key = cache_key(&d, Preset::Compact, &theme);

        fs::write(cache.path_for(&key), "stale").unwrap();
        set_age(&cache.path_for(&key), 60);

        let out = cache.render(&d, Preset::Compact, &theme);
        assert_ne!(out, "stale");
        assert_eq!(out, render_banner(&d, Preset::Compact, &theme));
        assert_eq!(fs::read_to_string(cache.path_for(&key)).unwrap(), out);
        let mtime = fs::metadata(cache.path_for(&key)).unwrap().modified().unwrap();
        assert!(mtime > SystemTime::now() - Duration::from_secs(30));
    }

    #[test]
    fn test_unwritable_dir_still_renders() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();
        let cache = BannerCache::new(&blocker);
        let d = data("1");
        let out = cache.render(&d, Preset::Compact, &Theme::default());
        assert_eq!(out, render_banner(&d, Preset::Compact, &Theme::default()));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let cache = BannerCache::new(dir.path());
        cache.write("0123456789abcdef01234567", "banner").unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["banner-0123456789abcdef01234567.cache"]);
    }

    #[test]
    fn test_prune_by_age() {
        let dir = tempdir().unwrap();
        let cache = BannerCache::new(dir.path());
        cache.write("aaaaaaaaaaaaaaaaaaaaaaaa", "old").unwrap();
        cache.write("bbbbbbbbbbbbbbbbbbbbbbbb", "new").unwrap();
        set_age(&cache.path_for("aaaaaaaaaaaaaaaaaaaaaaaa"), 7200);

        let tmp = dir.path().join("banner-leftover.tmp");
        fs::write(&tmp, "partial").unwrap();
        set_age(&tmp, 120);
        let unrelated = dir.path().join("notes.txt");
        fs::write(&unrelated, "keep").unwrap();
        set_age(&unrelated, 7200);

        let result = cache.prune(Duration::from_secs(3600)).unwrap();
        assert_eq!(result.files_removed, 1);
        assert_eq!(result.tmp_removed, 1);
        assert_eq!(result.files_remaining, 1);
        assert_eq!(result.bytes_freed, 3 + 7);
        assert!(!cache.path_for("aaaaaaaaaaaaaaaaaaaaaaaa").exists());
        assert!(cache.path_for("bbbbbbbbbbbbbbbbbbbbbbbb").exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn test_prune_missing_dir() {
        let dir = tempdir().unwrap();
        let cache = BannerCache::new(dir.path().join("absent"));
        assert_eq!(
            cache.prune(Duration::from_secs(1)).unwrap(),
            PruneResult::default()
        );
    }
}
