//! Leveled stderr logging
//!
//! Results go to standard output; everything diagnostic goes through this
//! logger to standard error so the two streams stay separable.

use crate::error::{AppError, Result};
use chrono::Local;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - general application information
    Info = 1,
    /// Warning level - potentially harmful situations
    Warn = 2,
    /// Error level - error events but application can continue
    Error = 3,
    /// Fatal level - severe error events that cause application termination
    Fatal = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Colorized level tag for console output
    fn tag(&self, use_color: bool) -> String {
        if !use_color {
            return format!("[{}]", self.as_str());
        }
        use colored::Colorize;
        let tag = match self {
            LogLevel::Debug => self.as_str().cyan(),
            LogLevel::Info => self.as_str().green(),
            LogLevel::Warn => self.as_str().yellow(),
            LogLevel::Error => self.as_str().red(),
            LogLevel::Fatal => self.as_str().magenta().bold(),
        };
        format!("[{}]", tag)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            _ => Err(AppError::input(format!("invalid log level: {}", s))),
        }
    }
}

/// Console logger writing timestamped lines to stderr
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
}

impl Logger {
    /// Create a new logger
    pub fn new(min_level: LogLevel, use_color: bool) -> Self {
        Self {
            min_level,
            use_color,
        }
    }

    /// Log a message at the given level
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        eprintln!("{} {} {}", timestamp, level.tag(self.use_color), message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: &str) {
        self.log(LogLevel::Fatal, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogLevel::Info, true)
    }
}
