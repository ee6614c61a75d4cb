//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for Spire services.
//!
//! Console output is compact and colored by default, or one JSON object per
//! line when `json` is enabled. An optional directory adds a non-blocking
//! rolling file writer. `RUST_LOG` is honored unless an explicit filter is set.
//!
//! ## Example
//!
//! ```rust
//! # use spire_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder("spire")
//!     .level(LevelFilter::DEBUG)
//!     .env_filter("spire_kernel=trace,tower_http=info")
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use spire_domain::config::LoggingConfig;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileSettings {
    directory: PathBuf,
    rotation: Rotation,
    max_files: usize,
}

/// Configures and installs the global subscriber.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    env_filter: Option<String>,
    console: bool,
    json: bool,
    file: Option<FileSettings>,
}

impl LoggerBuilder {
    /// Minimum level for targets without a more specific directive.
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Directive list such as `spire_kernel=debug,hyper=warn`.
    ///
    /// Takes precedence over `RUST_LOG`. Invalid directives make
    /// [`LoggerBuilder::init`] fail.
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Emits JSON lines on every enabled output.
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Adds a rolling file writer in `directory`, created on init.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.file = Some(FileSettings {
            directory: directory.into(),
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
        });
        self
    }

    /// No effect without [`LoggerBuilder::directory`].
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(file) = &mut self.file {
            file.rotation = rotation;
        }
        self
    }

    /// No effect without [`LoggerBuilder::directory`].
    pub fn max_files(mut self, max_files: usize) -> Self {
        if let Some(file) = &mut self.file {
            file.max_files = max_files;
        }
        self
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's worker; keep it alive until
    /// shutdown so buffered lines are flushed.
    ///
    /// # Errors
    /// Returns [`LoggerError::Subscriber`] if a global subscriber is already set,
    /// and [`LoggerError::InvalidConfiguration`] for an empty name, a bad filter,
    /// `max_files == 0`, or when every output is disabled.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let filter = self.build_filter()?;

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if self.console {
            let console = layer().with_target(true);
            layers.push(if self.json { console.json().boxed() } else { console.compact().with_ansi(true).boxed() });
        }

        let guard = match &self.file {
            Some(file) => {
                let (file_layer, guard) = file_layer(&self.name, file, self.json)?;
                layers.push(file_layer);
                Some(guard)
            }
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "console and file output are both disabled".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(layers).with(filter).try_init()?;
        tracing::debug!(name = %self.name, level = %self.level, "Logger initialized");

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration { message: "logger name cannot be empty".into(), context: None });
        }
        if self.file.as_ref().is_some_and(|file| file.max_files == 0) {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn build_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.env_filter {
            Some(directives) => builder.parse(directives).map_err(|err| LoggerError::InvalidConfiguration {
                message: format!("invalid filter {directives:?}: {err}").into(),
                context: None,
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

fn file_layer(name: &str, file: &FileSettings, json: bool) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
    fs::create_dir_all(&file.directory).context(format!("Failed to create {}", file.directory.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(file.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(file.max_files)
        .build(&file.directory)?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let output = layer().with_writer(writer).with_ansi(false);
    let boxed = if json { output.json().boxed() } else { output.boxed() };

    Ok((boxed, guard))
}

/// Handle to the installed subscriber.
#[must_use = "dropping the handle stops the background log writer"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder; `name` prefixes rolling log files (`spire.2026-01-31.log`).
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LevelFilter::INFO,
            env_filter: None,
            console: true,
            json: false,
            file: None,
        }
    }

    /// Builder preset from the `[logging]` configuration section.
    ///
    /// # Errors
    /// Fails when `level` is not a valid level name.
    pub fn from_config(name: impl Into<String>, config: &LoggingConfig) -> Result<LoggerBuilder, LoggerError> {
        let level = config.level.parse::<LevelFilter>().map_err(|err| LoggerError::InvalidConfiguration {
            message: format!("level {:?}: {err}", config.level).into(),
            context: Some("[logging]".into()),
        })?;

        let mut builder = Self::builder(name).level(level).json(config.json);
        if let Some(filter) = &config.filter {
            builder = builder.env_filter(filter.clone());
        }
        if let Some(directory) = &config.directory {
            builder = builder.directory(directory.clone());
        }
        Ok(builder)
    }

    /// Whether a file writer is attached.
    #[must_use]
    pub const fn has_file_output(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}
