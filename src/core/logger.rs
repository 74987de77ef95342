use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, filter_fn};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry};

use crate::conf::{Environment, LoggingConfig};
use crate::core::ClusterError;

/// Target for records that abort the run; they land in the `fatal` log file.
pub const FATAL_TARGET: &str = "fatal";

const CONSOLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Fatal,
    Error,
    Info,
}

impl Severity {
    const ALL: [Severity; 3] = [Severity::Fatal, Severity::Error, Severity::Info];

    fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }

    /// `fatal` takes every record on the fatal target; the other two files
    /// split the rest by level and never see debug output.
    fn accepts(&self, target: &str, level: &Level) -> bool {
        let fatal = target == FATAL_TARGET;
        match self {
            Severity::Fatal => fatal,
            Severity::Error => !fatal && *level == Level::ERROR,
            Severity::Info => !fatal && (*level == Level::WARN || *level == Level::INFO),
        }
    }
}

/// Keeps the background file writers alive. Dropping it flushes pending lines.
#[must_use]
pub struct LogGuard {
    _guards: Vec<WorkerGuard>,
}

/// `<dir>/<base>.<env>.<severity>.log`
pub fn log_file_path(dir: &Path, base_name: &str, env: Environment, severity: &str) -> PathBuf {
    dir.join(log_file_name(base_name, env, severity))
}

fn log_file_name(base_name: &str, env: Environment, severity: &str) -> String {
    format!("{base_name}.{env}.{severity}.log")
}

/// Console output filtered by `RUST_LOG` (default `info`), plus the JSON
/// severity files when `config.files` is set. Records from the `log` macros
/// are bridged into the subscriber.
pub fn setup_logging(config: &LoggingConfig, env: Environment) -> Result<LogGuard, ClusterError> {
    let console = fmt::layer()
        .with_timer(ChronoUtc::new(CONSOLE_TIME_FORMAT.to_string()))
        .with_target(true)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .boxed();

    let mut layers = vec![console];
    let mut guards = Vec::new();
    if config.files {
        let (file_layers, file_guards) = severity_layers(&config.dir, &config.base_name, env)?;
        layers.extend(file_layers);
        guards = file_guards;
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| ClusterError::IoError(format!("installing logger: {e}")))?;
    Ok(LogGuard { _guards: guards })
}

fn severity_layers(
    dir: &Path,
    base_name: &str,
    env: Environment,
) -> Result<(Vec<BoxedLayer>, Vec<WorkerGuard>), ClusterError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ClusterError::IoError(format!("creating log directory {}: {e}", dir.display()))
    })?;

    let mut layers = Vec::with_capacity(Severity::ALL.len());
    let mut guards = Vec::with_capacity(Severity::ALL.len());
    for severity in Severity::ALL {
        let file_name = log_file_name(base_name, env, severity.as_str());
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(&file_name)
            .build(dir)
            .map_err(|e| {
                ClusterError::IoError(format!("opening {}: {e}", dir.join(&file_name).display()))
            })?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);

        let layer = fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_timer(ChronoUtc::rfc_3339())
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter_fn(move |meta| {
                severity.accepts(meta.target(), meta.level())
            }))
            .boxed();
        layers.push(layer);
    }
    Ok((layers, guards))
}
