//! Command-line interfaces for the two binary variants

use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Batch throughput tester: run N measurements and optionally upload
#[derive(Parser, Debug, Clone)]
#[command(name = "ttt")]
#[command(version = crate::BUILD_VERSION, about, long_about = None)]
pub struct BatchCli {
    /// Number of test iterations
    #[arg(short = 'n', long = "num-tests", default_value_t = crate::defaults::DEFAULT_NUM_TESTS)]
    pub num_tests: u32,

    /// Wallet secret seed (hex)
    #[arg(short = 's', long = "seed", env = "TTT_SEED", value_name = "HEX")]
    pub seed: Option<String>,

    /// Upload results to this endpoint after the run
    #[arg(long = "upload", env = "TTT_UPLOAD_URL", value_name = "URL")]
    pub upload: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Single-run throughput tester: one measurement, optional file output
#[derive(Parser, Debug, Clone)]
#[command(name = "ttt-once")]
#[command(version = crate::BUILD_VERSION, about, long_about = None)]
pub struct SingleCli {
    /// Wallet secret seed (hex)
    #[arg(short = 's', long = "seed", env = "TTT_SEED", value_name = "HEX")]
    pub seed: Option<String>,

    /// Write the raw Kbps value to this file
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl BatchCli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color
    }
}

impl SingleCli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color
    }
}

/// Decode a hex wallet seed into raw bytes
pub fn parse_seed(seed_hex: &str) -> Result<Vec<u8>> {
    let trimmed = seed_hex.trim();
    if trimmed.is_empty() {
        return Err(crate::error::AppError::input("wallet seed must not be empty"));
    }
    Ok(hex::decode(trimmed)?)
}
