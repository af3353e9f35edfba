// File-backed diagnostics for the demo server.
//
// Route handlers and the tunnel loop log through the `sys_*` macros; the
// threshold comes from MLDEMO_LOG_LEVEL (debug/info/warn/error, default
// info) so a demo can run verbose without a rebuild.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

const LOG_PATH: &str = "logs/mldemo.log";

#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    fn from_env() -> Level {
        let level = std::env::var("MLDEMO_LOG_LEVEL").map(|v| v.to_ascii_lowercase());
        match level.as_deref() {
            Ok("debug") => Level::Debug,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }
}

pub struct Logger {
    file: Mutex<File>,
    threshold: Level,
}

impl Logger {
    pub fn new(log_path: &str, threshold: Level) -> std::io::Result<Self> {
        if let Some(parent) = Path::new(log_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(log_path)?;

        Ok(Logger {
            file: Mutex::new(file),
            threshold,
        })
    }

    pub fn log(&self, level: Level, message: &str) {
        if level < self.threshold {
            return;
        }
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let line = format!("[{}] [{}] {}\n", timestamp, level.label(), message);

        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

lazy_static::lazy_static! {
    pub static ref LOGGER: Logger = Logger::new(LOG_PATH, Level::from_env())
        .expect("Failed to create logger");
}

#[macro_export]
macro_rules! sys_debug {
    ($($arg:tt)*) => {
        $crate::web::logger::LOGGER.debug(&format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_info {
    ($($arg:tt)*) => {
        $crate::web::logger::LOGGER.info(&format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_warn {
    ($($arg:tt)*) => {
        $crate::web::logger::LOGGER.warn(&format!($($arg)*));
    };
}

#[macro_export]
macro_rules! sys_error {
    ($($arg:tt)*) => {
        $crate::web::logger::LOGGER.error(&format!($($arg)*));
    };
}
