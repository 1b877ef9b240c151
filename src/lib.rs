//! Tunnel Throughput Tester
//!
//! Measures HTTP download throughput through a local tunnel-proxy entry
//! port and reports the results in human-readable units. Results can be
//! written to a file (single-run binary) or uploaded to a collection
//! endpoint (batch binary).

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod output;
pub mod results;
pub mod speedtest;
pub mod tunnel;
pub mod utils;
pub mod wallet;

// Re-export commonly used types
pub use config::RunConfig;
pub use error::{AppError, Result};
pub use executor::TestExecutor;
pub use output::{format_throughput, StatusLine, StatusReporter};
pub use results::ResultSet;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const BUILD_VERSION: &str = env!("BUILD_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    pub const DEFAULT_NUM_TESTS: u32 = 1;
    pub const MAX_NUM_TESTS: u32 = 1000;

    /// Bound on the tunnel-entry startup handshake
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
    /// Seconds counted down before the speedtest begins
    pub const COUNTDOWN_SECS: u32 = 5;
    /// Status line re-render period
    pub const STATUS_TICK: Duration = Duration::from_millis(100);
    /// Timeout for the result-upload POST
    pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

    /// Tunnel service advertised by the entry
    pub const SERVICE_NAME: &str = "httpproxy";
    pub const SERVICE_ENCRYPTION: &str = "xsalsa20-poly1305";
    pub const LISTEN_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    /// Price ceiling accepted for relayed traffic
    pub const MAX_PRICE: &str = "0.01";
    pub const SUBSCRIPTION_PREFIX: &str = "tuna_v1.";
    /// Timeout for the entry's upstream dials
    pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

    pub const SPEEDTEST_HOME_URL: &str = "https://fast.com";
    pub const SPEEDTEST_API_URL: &str = "https://api.fast.com/netflix/speedtest";
    pub const SPEEDTEST_URL_COUNT: u32 = 5;
    /// Minimum spacing between streamed throughput samples
    pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(200);
}
