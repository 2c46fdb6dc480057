//! Logging setup shared by the supervisor and its workers.
//!
//! Logs always go to stderr, optionally mirrored to a file. Worker stdout is
//! reserved for progress lines, so nothing here writes to stdout.
//!
//! # Environment Variables
//!
//! - `MESHBATCH_LOG` - Log filter (overrides RUST_LOG)
//! - `MESHBATCH_LOG_LEVEL` - Log level: error, warn, info, debug, trace
//! - `MESHBATCH_LOG_FORMAT` - Output format: pretty, compact, json
//! - `MESHBATCH_LOG_FILE` - Path to log file (in addition to stderr)
//! - `RUST_LOG` - Standard Rust log filter (fallback)

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Filter variable forwarded to workers so they log like their supervisor.
pub const LOG_FILTER_ENV: &str = "MESHBATCH_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable format
    Pretty,
    /// Single-line format (default)
    #[default]
    Compact,
    /// JSON lines for log aggregation systems
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "full" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Unknown log format: '{}'. Valid options: pretty, compact, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level, used when no filter is set
    pub level: Level,
    pub format: LogFormat,
    /// Mirror logs to this file (never rotated)
    pub file_path: Option<PathBuf>,
    /// Filter directive, overrides `level`
    pub filter: Option<String>,
    /// Show target module in logs
    pub show_target: bool,
    /// Colored stderr output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: LogFormat::Compact,
            file_path: None,
            filter: None,
            show_target: true,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Preset for `meshbatch run`: warnings only unless raised with `-v`.
    pub fn for_supervisor() -> Self {
        Self::default()
    }

    /// Preset for a worker process: no module targets, no colors, since its
    /// stderr is interleaved with its siblings'.
    pub fn for_worker() -> Self {
        Self {
            show_target: false,
            ansi: false,
            ..Self::default()
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }

    pub fn with_filter(mut self, filter: String) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Map a `-v` count onto the base level: 0 warn, 1 info, 2 debug, 3+ trace.
    pub fn with_verbosity(self, verbose: u8) -> Self {
        let level = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        self.with_level(level)
    }

    /// Apply environment variable overrides.
    ///
    /// `MESHBATCH_LOG` (then `RUST_LOG`) sets the filter unless one is already
    /// set; `MESHBATCH_LOG_LEVEL` only applies when no filter is set.
    pub fn with_env_overrides(mut self) -> Self {
        if self.filter.is_none() {
            if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
                self.filter = Some(filter);
            } else if let Ok(filter) = std::env::var("RUST_LOG") {
                self.filter = Some(filter);
            }
        }

        if self.filter.is_none()
            && let Ok(level) = std::env::var("MESHBATCH_LOG_LEVEL")
        {
            self.level = parse_level(&level).unwrap_or(self.level);
        }

        if let Ok(format) = std::env::var("MESHBATCH_LOG_FORMAT")
            && let Ok(f) = format.parse()
        {
            self.format = f;
        }

        if let Ok(path) = std::env::var("MESHBATCH_LOG_FILE") {
            self.file_path = Some(PathBuf::from(path));
        }

        self
    }

    /// Filter directive in effect, for forwarding to workers.
    pub fn effective_filter(&self) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None => self.level.to_string().to_lowercase(),
        }
    }

    fn build_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::new(self.level.to_string().to_lowercase());
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).unwrap_or_else(|_| {
                eprintln!("Warning: Invalid log filter '{}', using default", filter);
                fallback()
            }),
            None => fallback(),
        }
    }

    fn layer<S, W>(&self, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
        W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = fmt::layer()
            .with_target(self.show_target)
            .with_ansi(ansi)
            .with_writer(writer);
        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Compact => base.compact().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
        }
    }
}

/// Parse a log level string.
fn parse_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(config: LogConfig) {
    let mut layers = vec![config.layer(std::io::stderr, config.ansi)];

    if let Some(path) = &config.file_path {
        let dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("meshbatch.log");
        layers.push(config.layer(tracing_appender::rolling::never(dir, file_name), false));
    }

    let _ = tracing_subscriber::registry()
        .with(config.build_filter())
        .with(layers)
        .try_init();
}
