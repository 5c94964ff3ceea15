//! Tracing setup for the exchange binary.
//!
//! Two rolling JSON files are written under `logging.dir`: the full event log
//! filtered by `logging.filter`, and an audit log that carries only desk and
//! expiry decisions (settlements, refusals, expirations) so that a coin
//! movement can be traced without reading transport noise.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const EVENT_LOG_PREFIX: &str = "exchange.log";
const AUDIT_LOG_PREFIX: &str = "exchange-audit.log";
const AUDIT_TARGETS: [&str; 2] = ["exchange_desk", "exchange_expiry"];

/// Keeps the non-blocking writers flushing until dropped.
pub struct LoggingGuard {
    _workers: Vec<WorkerGuard>,
    run_id: String,
    log_dir: PathBuf,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RetentionReport {
    removed: usize,
    warnings: Vec<String>,
}

pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    if logging_config.dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }

    let log_dir = resolve_log_dir(&logging_config.dir)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let retention = purge_expired_logs(
        &log_dir,
        &log_prefixes(logging_config),
        logging_config.retention_days,
        SystemTime::now(),
    );
    let env_filter = build_env_filter(&logging_config.filter)?;

    let (event_writer, event_guard) = tracing_appender::non_blocking(rolling_appender(
        &log_dir,
        EVENT_LOG_PREFIX,
        &logging_config.rotation,
    ));
    let mut workers = vec![event_guard];
    let event_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_ansi(false)
        .with_writer(event_writer)
        .with_filter(env_filter);

    let audit_layer = if logging_config.audit_enabled {
        let (audit_writer, audit_guard) = tracing_appender::non_blocking(rolling_appender(
            &log_dir,
            AUDIT_LOG_PREFIX,
            &logging_config.rotation,
        ));
        workers.push(audit_guard);
        Some(
            fmt::layer()
                .json()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_current_span(true)
                .with_ansi(false)
                .with_writer(audit_writer)
                .with_filter(audit_filter()),
        )
    } else {
        None
    };

    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(event_layer)
        .with(audit_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        audit_enabled = logging_config.audit_enabled,
        retention_days = logging_config.retention_days,
        retention_removed = retention.removed,
        "logging_initialized"
    );
    for warning in retention.warnings {
        tracing::warn!(target: "logging", warning = %warning, "logging_retention_warning");
    }

    Ok(LoggingGuard {
        _workers: workers,
        run_id,
        log_dir,
    })
}

fn build_env_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(filter)
        .with_context(|| format!("failed to parse logging.filter '{}'", filter))
}

/// Decisions that move or refuse to move coins, at info and above.
fn audit_filter() -> Targets {
    AUDIT_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, LevelFilter::INFO)
        })
}

fn log_prefixes(logging_config: &LoggingConfig) -> Vec<&'static str> {
    if logging_config.audit_enabled {
        vec![EVENT_LOG_PREFIX, AUDIT_LOG_PREFIX]
    } else {
        vec![EVENT_LOG_PREFIX]
    }
}

fn rolling_appender(log_dir: &Path, prefix: &str, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, prefix),
        LoggingRotation::Hourly => rolling::hourly(log_dir, prefix),
    }
}

fn resolve_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    Ok(std::env::current_dir()
        .context("failed to read current working directory for logging.dir resolution")?
        .join(dir))
}

/// Deletes log files with one of `prefixes` last modified at or before the
/// retention cutoff. Problems become warnings so that logging still starts.
fn purge_expired_logs(
    log_dir: &Path,
    prefixes: &[&str],
    retention_days: usize,
    now: SystemTime,
) -> RetentionReport {
    let retention = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60) as u64);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);
    let mut report = RetentionReport::default();

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(err) => {
            report.warnings.push(format!(
                "failed to scan logging directory {}: {}",
                log_dir.display(),
                err
            ));
            return report;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !prefixes.iter().any(|prefix| name.starts_with(prefix)) {
            continue;
        }

        let path = entry.path();
        let modified = match entry.metadata().and_then(|metadata| {
            if metadata.is_file() {
                metadata.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(err) => {
                report
                    .warnings
                    .push(format!("failed to stat {}: {}", path.display(), err));
                continue;
            }
        };
        if modified > cutoff {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => report.removed += 1,
            Err(err) => report.warnings.push(format!(
                "failed to remove expired log file {}: {}",
                path.display(),
                err
            )),
        }
    }

    report
}
