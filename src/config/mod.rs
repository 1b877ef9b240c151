//! Run configuration assembled from CLI arguments and environment

use crate::cli::{self, BatchCli, SingleCli};
use crate::defaults;
use crate::error::{AppError, Result};
use std::path::PathBuf;
use url::Url;

/// Immutable configuration for one invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Decoded wallet seed bytes
    pub seed: Vec<u8>,
    /// Iteration count (always 1 in single-run mode)
    pub num_tests: u32,
    /// File to receive the raw Kbps value (single-run mode)
    pub output_path: Option<PathBuf>,
    /// Result-collection endpoint (batch mode)
    pub upload_url: Option<String>,
    /// Colored terminal output
    pub enable_color: bool,
}

impl RunConfig {
    /// Build and validate a configuration from batch-mode arguments
    pub fn from_batch(cli: BatchCli) -> Result<Self> {
        let enable_color = cli.use_colors();
        let config = Self {
            seed: required_seed(cli.seed.as_deref())?,
            num_tests: cli.num_tests,
            output_path: None,
            upload_url: cli.upload,
            enable_color,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build and validate a configuration from single-run arguments
    pub fn from_single(cli: SingleCli) -> Result<Self> {
        let enable_color = cli.use_colors();
        let config = Self {
            seed: required_seed(cli.seed.as_deref())?,
            num_tests: 1,
            output_path: cli.output,
            upload_url: None,
            enable_color,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.seed.is_empty() {
            return Err(AppError::input("wallet seed must not be empty"));
        }

        if self.num_tests == 0 {
            return Err(AppError::config("iteration count must be at least 1"));
        }
        if self.num_tests > defaults::MAX_NUM_TESTS {
            return Err(AppError::config(format!(
                "iteration count cannot exceed {}",
                defaults::MAX_NUM_TESTS
            )));
        }

        if let Some(upload_url) = &self.upload_url {
            let parsed = Url::parse(upload_url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::config(format!(
                    "upload URL must be http or https: {}",
                    upload_url
                )));
            }
        }

        Ok(())
    }
}

/// The seed is the one argument without a usable default
fn required_seed(seed_hex: Option<&str>) -> Result<Vec<u8>> {
    let seed_hex = seed_hex
        .ok_or_else(|| AppError::input("wallet seed is required (-s <hex> or TTT_SEED)"))?;
    cli::parse_seed(seed_hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_seed_hex() -> String {
        "11".repeat(32)
    }

    #[test]
    fn test_from_batch_valid() {
        let cli = BatchCli::try_parse_from(["ttt", "-s", &valid_seed_hex(), "-n", "3"]).unwrap();
        let config = RunConfig::from_batch(cli).unwrap();
        assert_eq!(config.seed.len(), 32);
        assert_eq!(config.num_tests, 3);
        assert!(config.upload_url.is_none());
        assert!(config.output_path.is_none());
    }

    #[test]
    fn test_from_single_forces_one_iteration() {
        let cli =
            SingleCli::try_parse_from(["ttt-once", "-s", &valid_seed_hex(), "-o", "/tmp/x"])
                .unwrap();
        let config = RunConfig::from_single(cli).unwrap();
        assert_eq!(config.num_tests, 1);
        assert!(config.output_path.is_some());
        assert!(config.upload_url.is_none());
    }

    #[test]
    fn test_missing_seed_is_input_error() {
        let cli = BatchCli {
            num_tests: 1,
            seed: None,
            upload: None,
            no_color: false,
        };
        let err = RunConfig::from_batch(cli).unwrap_err();
        assert_eq!(err.category(), "INPUT");
        assert!(err.to_string().contains("seed is required"));
    }

    #[test]
    fn test_malformed_seed_is_input_error() {
        let cli = BatchCli {
            num_tests: 1,
            seed: Some("not-hex".to_string()),
            upload: None,
            no_color: false,
        };
        let err = RunConfig::from_batch(cli).unwrap_err();
        assert_eq!(err.category(), "INPUT");
    }

    #[test]
    fn test_zero_iterations_invalid() {
        let cli = BatchCli {
            num_tests: 0,
            seed: Some(valid_seed_hex()),
            upload: None,
            no_color: false,
        };
        let err = RunConfig::from_batch(cli).unwrap_err();
        assert_eq!(err.category(), "CONFIG");
    }

    #[test]
    fn test_upload_url_must_be_http() {
        let cli = BatchCli {
            num_tests: 1,
            seed: Some(valid_seed_hex()),
            upload: Some("ftp://example.com/up".to_string()),
            no_color: false,
        };
        let err = RunConfig::from_batch(cli).unwrap_err();
        assert_eq!(err.category(), "CONFIG");

        let cli = BatchCli {
            num_tests: 1,
            seed: Some(valid_seed_hex()),
            upload: Some("not a url".to_string()),
            no_color: false,
        };
        assert!(RunConfig::from_batch(cli).is_err());
    }

    #[test]
    fn test_upload_url_accepted() {
        let cli = BatchCli {
            num_tests: 2,
            seed: Some(valid_seed_hex()),
            upload: Some("https://example.com/results".to_string()),
            no_color: true,
        };
        let config = RunConfig::from_batch(cli).unwrap();
        assert_eq!(
            config.upload_url.as_deref(),
            Some("https://example.com/results")
        );
        assert!(!config.enable_color);
    }
}
