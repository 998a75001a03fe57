//! dashline - terminal dashboard, login banner and prompt fragments.
//!
//! Usage:
//!   dashline                          # interactive dashboard
//!   dashline banner                   # banner sized to the terminal
//!   dashline banner --preset wide     # fixed preset
//!   dashline prompt k8s --width 20    # one line for PS1
//!   dashline cache prune --max-age 3600

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::env;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

use dashline::app::terminal::install_panic_hook;
use dashline::app::{KeyMap, Model, Runtime, Terminal};
use dashline::banner;
use dashline::compositor::{BannerCache, Preset};
use dashline::config::Config;
use dashline::fmt::{FmtStyle, format_bytes};
use dashline::payload::SourceKind;
use dashline::prompt::prompt_line;
use dashline::source::{CancelToken, DataSource, FetchError, FileSource, file_sources, load_all};
use dashline::text::ColorDepth;
use dashline::widgets::default_widgets;
use dashline::{Error, Result};

/// Terminal dashboard.
#[derive(Parser)]
#[command(name = "dashline", about = "Terminal dashboard, banner and prompt", version)]
struct Args {
    /// Config file (default: $XDG_CONFIG_HOME/dashline/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory with one `<source>.json` per data source.
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Banner cache directory.
    #[arg(long, global = true, value_name = "PATH")]
    cache_dir: Option<PathBuf>,

    /// Write logs here. The dashboard discards logs without it.
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive dashboard (default).
    Tui {
        /// Color theme: default, mono, solarized.
        #[arg(long)]
        theme: Option<String>,

        /// Layout: grid, compact, standard, wide, ultrawide.
        #[arg(long)]
        layout: Option<String>,
    },
    /// Print a composed banner, e.g. for a login message.
    Banner {
        /// auto, compact, standard, wide or ultrawide.
        #[arg(long, default_value = "auto")]
        preset: String,

        /// Width used to pick the preset in auto mode.
        #[arg(long)]
        width: Option<usize>,

        /// Height used to pick the preset in auto mode.
        #[arg(long)]
        height: Option<usize>,

        /// Always render fresh and skip the cache.
        #[arg(long)]
        no_cache: bool,
    },
    /// Print one widget summary for a shell prompt.
    Prompt {
        /// claude, billing, k8s, tailscale or sysmetrics.
        source: String,

        /// Maximum width in cells.
        #[arg(long, default_value_t = 40)]
        width: usize,
    },
    /// Banner cache housekeeping.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Remove cached banners older than the max age, and stale temp files.
    Prune {
        /// Seconds; defaults to `cache.max_age_secs`.
        #[arg(long)]
        max_age: Option<u64>,
    },
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the flags. The dashboard logs only to `--log-file`;
/// other commands log to stderr.
fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    let filter = if env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(format!("dashline={level}"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if interactive => builder.with_writer(io::sink).init(),
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        },
    };
    if let Some(dir) = &args.data_dir {
        config.sources.data_dir = Some(dir.clone());
    }
    if let Some(dir) = &args.cache_dir {
        config.cache.dir = Some(dir.clone());
    }
    Ok(config)
}

/// Cancels `cancel` on SIGINT.
fn cancel_on_signal(cancel: &CancelToken) {
    let c = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("received shutdown signal");
        c.cancel();
    }) {
        warn!("failed to set Ctrl-C handler: {e}");
    }
}

fn run_tui(mut config: Config, theme: Option<String>, layout: Option<String>) -> Result<()> {
    if let Some(theme) = theme {
        config.ui.theme = theme;
    }
    if let Some(layout) = layout {
        config.ui.layout = layout;
    }
    config.validate()?;

    let theme = config.theme()?;
    let enabled = config.enabled_sources()?;
    let data_dir = config.data_dir();
    info!(data_dir = %data_dir.display(), sources = enabled.len(), "starting dashboard");

    let mut model = Model::new(default_widgets(theme, &enabled))
        .with_keymap(KeyMap::from_config(&config.keys)?)
        .with_theme(theme)
        .with_sources(enabled.clone())
        .with_refresh(config.refresh())
        .with_fetch_timeout(config.fetch_timeout())
        .with_layout(config.layout()?);

    let cancel = CancelToken::new();
    cancel_on_signal(&cancel);
    let runtime = Runtime::new(file_sources(&data_dir, &enabled), cancel);

    install_panic_hook();
    let mut terminal = Terminal::enter()?;
    let input = runtime.spawn_input();
    let result = runtime.run(&mut model, &mut terminal);
    drop(terminal);
    if input.join().is_err() {
        warn!("input thread panicked");
    }
    result
}

fn run_banner(
    config: Config,
    preset: &str,
    width: Option<usize>,
    height: Option<usize>,
    no_cache: bool,
) -> Result<()> {
    let preset = match preset {
        "auto" => {
            let (tw, th) = crossterm::terminal::size()
                .map(|(w, h)| (usize::from(w), usize::from(h)))
                .unwrap_or((80, 24));
            Preset::select(width.unwrap_or(tw), height.unwrap_or(th))
        }
        name => Preset::from_name(name)
            .ok_or_else(|| Error::Config(format!("unknown preset {name:?}")))?,
    };
    let theme = config.theme()?;
    let enabled = config.enabled_sources()?;

    let cancel = CancelToken::new();
    cancel_on_signal(&cancel);
    let payloads = load_all(&file_sources(&config.data_dir(), &enabled), &cancel);
    debug!(%preset, loaded = payloads.len(), "banner data loaded");

    let widgets = banner::build_widgets(theme, &enabled, &payloads, Utc::now());
    let data = banner::banner_data(&widgets);
    let cache = (!no_cache).then(|| BannerCache::new(config.cache_dir()));
    let out = banner::render(&data, preset, &theme, cache.as_ref(), ColorDepth::detect());
    println!("{out}");
    Ok(())
}

fn run_prompt(config: Config, source: &str, width: usize) -> Result<()> {
    let kind = SourceKind::from_name(source)
        .ok_or_else(|| Error::Config(format!("unknown source {source:?}")))?;
    let cancel = CancelToken::new();
    let payload = match FileSource::new(kind, &config.data_dir()).fetch(&cancel) {
        Ok(p) => Some(p),
        Err(FetchError::NotFound) => None,
        Err(e) => {
            warn!(source = %kind, error = %e, "fetch failed");
            None
        }
    };
    let line = prompt_line(
        kind,
        payload.as_ref(),
        config.theme()?,
        width,
        ColorDepth::detect(),
        Utc::now(),
    );
    println!("{line}");
    Ok(())
}

fn run_prune(config: Config, max_age: Option<u64>) -> Result<()> {
    let max_age = max_age.map_or_else(|| config.cache_max_age(), Duration::from_secs);
    let cache = BannerCache::new(config.cache_dir());
    let result = cache.prune(max_age)?;
    info!(
        dir = %cache.dir().display(),
        removed = result.files_removed,
        tmp = result.tmp_removed,
        "cache pruned"
    );
    println!(
        "removed {} banners and {} temp files, freed {}, {} remaining",
        result.files_removed,
        result.tmp_removed,
        format_bytes(result.bytes_freed, FmtStyle::Detail),
        result.files_remaining
    );
    Ok(())
}

fn run(mut args: Args) -> Result<()> {
    let command = args.command.take().unwrap_or(Command::Tui {
        theme: None,
        layout: None,
    });
    let interactive = matches!(command, Command::Tui { .. });
    init_logging(args.verbose, args.quiet, args.log_file.as_deref(), interactive)?;
    let config = load_config(&args)?;

    match command {
        Command::Tui { theme, layout } => run_tui(config, theme, layout),
        Command::Banner {
            preset,
            width,
            height,
            no_cache,
        } => run_banner(config, &preset, width, height, no_cache),
        Command::Prompt { source, width } => run_prompt(config, &source, width),
        Command::Cache {
            action: CacheCommand::Prune { max_age },
        } => run_prune(config, max_age),
    }
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("dashline: {e}");
        std::process::exit(1);
    }
}
