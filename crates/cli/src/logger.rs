//! File and stderr logging for canvas runs.
//!
//! Every line goes to stderr. With a log directory, lines are also written
//! to `{log_dir}/{run_id}/log`, where the run id is the start time plus a
//! short unique suffix.

use anyhow::{Context, Result};
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct CanvasLogger {
    level: LevelFilter,
    file: Option<Arc<Mutex<File>>>,
    run_id: String,
    log_path: Option<PathBuf>,
}

impl CanvasLogger {
    /// Creates a logger, opening `{log_dir}/{run_id}/log` when a directory
    /// is given.
    pub fn new(level: LevelFilter, log_dir: Option<&Path>) -> Result<Self> {
        let run_id = Self::new_run_id();

        let (file, log_path) = match log_dir {
            Some(log_dir) => {
                let run_dir = log_dir.join(&run_id);
                create_dir_all(&run_dir).with_context(|| {
                    format!("Failed to create log directory: {}", run_dir.display())
                })?;

                let log_path = run_dir.join("log");
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_path)
                    .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
                (Some(Arc::new(Mutex::new(file))), Some(log_path))
            }
            None => (None, None),
        };

        Ok(Self {
            level,
            file,
            run_id,
            log_path,
        })
    }

    fn new_run_id() -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let uuid_string = Uuid::new_v4().to_string();
        let uuid = uuid_string.split('-').next().unwrap_or("unknown");
        format!("{timestamp}_{uuid}")
    }

    /// Installs the logger as the global `log` backend.
    pub fn init(level: LevelFilter, log_dir: Option<&Path>) -> Result<()> {
        let logger = Self::new(level, log_dir)?;
        let run_id = logger.run_id.clone();
        let log_path = logger.log_path.clone();

        log::set_boxed_logger(Box::new(logger))
            .map(|()| log::set_max_level(level))
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {}", e))?;

        log::info!("canvas logger initialized. Run ID: {}", run_id);
        if let Some(log_path) = log_path {
            log::info!("Log file: {}", log_path.display());
        }
        Ok(())
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}

impl Log for CanvasLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let message = format!(
            "{} {} [{}] {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        );

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                // A failed log write must not take the run down
                let _ = writeln!(file, "{}", message);
                let _ = file.flush();
            }
        }

        eprintln!("{}", message);
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Marks the start of a phase in the log.
pub fn log_section(name: &str) {
    let separator = "=".repeat(50);
    log::info!("{}", separator);
    log::info!("SECTION: {}", name);
    log::info!("{}", separator);
}
