//! Error handling for the tunnel throughput tester

use thiserror::Error;

/// Custom error types for the tunnel throughput tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed user input (seed hex, flag values)
    #[error("Invalid input: {0}")]
    Input(String),

    /// Account derivation errors (seed -> keypair)
    #[error("Account error: {0}")]
    Account(String),

    /// Wallet derivation errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Invalid tunnel/service configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tunnel-entry startup exceeded its bound
    #[error("Connect timeout: {0}")]
    ConnectTimeout(String),

    /// Network errors (port allocation, speedtest, upload)
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors (result file writes, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new input error
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input(message.into())
    }

    /// Create a new account error
    pub fn account<S: Into<String>>(message: S) -> Self {
        Self::Account(message.into())
    }

    /// Create a new wallet error
    pub fn wallet<S: Into<String>>(message: S) -> Self {
        Self::Wallet(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new connect-timeout error
    pub fn connect_timeout<S: Into<String>>(message: S) -> Self {
        Self::ConnectTimeout(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Input(_) => "INPUT",
            Self::Account(_) => "ACCOUNT",
            Self::Wallet(_) => "WALLET",
            Self::Config(_) => "CONFIG",
            Self::ConnectTimeout(_) => "TIMEOUT",
            Self::Network(_) => "NETWORK",
            Self::Io(_) => "IO",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input(_) | Self::Config(_) => 1, // Invalid configuration/usage
            Self::Network(_) => 2,                 // Network issues
            Self::ConnectTimeout(_) => 3,          // Handshake timeout
            Self::Account(_) | Self::Wallet(_) => 4, // Identity derivation issues
            Self::Io(_) => 5,                      // I/O issues
            Self::Internal(_) => 99,               // Internal/unexpected errors
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Input(_) | Self::Config(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Network(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::ConnectTimeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::Account(_) | Self::Wallet(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library and dependency error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<hex::FromHexError> for AppError {
    fn from(error: hex::FromHexError) -> Self {
        Self::input(format!("invalid seed hex: {}", error))
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::config(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::network(format!("request timed out: {}", error))
        } else {
            Self::network(error.to_string())
        }
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
