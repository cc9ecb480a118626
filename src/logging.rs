use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use chrono::Local;
use log::{Level, Metadata, Record, SetLoggerError};
use serde::Serialize;

static LOGGER: OnceLock<JsonLogger> = OnceLock::new();

#[derive(Debug, Serialize, Clone)]
pub struct LogMessage {
    level: String,
    target: String,
    message: String,
    timestamp: String,
}

/// Writes each log record to stderr as one JSON object, keeping stdout free
/// for display events.
pub struct JsonLogger {
    level: AtomicUsize,
}

impl JsonLogger {
    pub fn new(level: Level) -> Self {
        Self {
            level: AtomicUsize::new(level as usize),
        }
    }

    pub fn init(level: Level) -> Result<(), SetLoggerError> {
        let logger = LOGGER.get_or_init(|| JsonLogger::new(level));
        log::set_logger(logger).map(|()| log::set_max_level(level.to_level_filter()))
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as usize, Ordering::Relaxed);
    }

    fn to_message(record: &Record) -> LogMessage {
        LogMessage {
            level: record.level().to_string(),
            target: record.target().to_string(),
            message: record.args().to_string(),
            timestamp: Local::now().to_rfc3339(),
        }
    }
}

impl log::Log for JsonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as usize <= self.level.load(Ordering::Relaxed)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match serde_json::to_string(&Self::to_message(record)) {
            Ok(line) => {
                let _ = writeln!(std::io::stderr().lock(), "{}", line);
            }
            Err(e) => eprintln!("[{}] {} ({})", record.level(), record.args(), e),
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the JSON logger, falling back to `env_logger` when another
/// logger is already registered.
pub fn setup_logging(level: Level) {
    if JsonLogger::init(level).is_err() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Trace)
            .try_init();
        log::set_max_level(level.to_level_filter());
    }
    log::info!("Logging initialized");
}

/// Changes the level once the configured one is known.
pub fn set_level(level: Level) {
    if let Some(logger) = LOGGER.get() {
        logger.set_level(level);
    }
    log::set_max_level(level.to_level_filter());
}
