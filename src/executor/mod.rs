//! Run orchestration
//!
//! Drives the per-iteration sequence: free port, proxy start, countdown,
//! speedtest, proxy stop, result recording. The proxy is released on
//! every exit path of an iteration; in batch mode iteration failures are
//! logged and the loop simply moves on — there is no retry logic, the
//! configured iteration count is the only repetition mechanism.

use crate::config::RunConfig;
use crate::defaults;
use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::output::{format_throughput, StatusLine, StatusReporter};
use crate::results::ResultSet;
use crate::speedtest::SpeedtestClient;
use crate::tunnel::TunnelProxy;
use crate::utils::get_free_port;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sequences measurement iterations against one configuration
pub struct TestExecutor {
    config: RunConfig,
    status: StatusLine,
    logger: Logger,
}

impl TestExecutor {
    pub fn new(config: RunConfig, status: StatusLine, logger: Logger) -> Self {
        Self {
            config,
            status,
            logger,
        }
    }

    /// Run all configured iterations, collecting positive finals.
    /// Iteration errors are logged and swallowed here.
    pub async fn run(&self) -> ResultSet {
        self.run_loop(|iteration| self.run_iteration(iteration)).await
    }

    /// Run exactly one iteration, propagating any failure
    pub async fn run_once(&self) -> Result<f64> {
        self.run_iteration(0).await
    }

    /// The iteration loop, generic over the iteration body so batch
    /// continuation is testable without a live network.
    async fn run_loop<F, Fut>(&self, mut iteration: F) -> ResultSet
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<f64>>,
    {
        let mut results = ResultSet::with_capacity(self.config.num_tests as usize);
        for index in 0..self.config.num_tests {
            match iteration(index).await {
                Ok(kbps) => {
                    results.push(kbps);
                }
                Err(e) => {
                    self.logger
                        .error(&e.format_for_console(self.config.enable_color));
                }
            }
        }
        results
    }

    /// One full iteration with the proxy released on every exit path
    async fn run_iteration(&self, iteration: u32) -> Result<f64> {
        let port = get_free_port()?;
        let proxy = TunnelProxy::new(&self.config.seed, port)?;
        let outcome = self.measure_through(&proxy, iteration).await;
        proxy.stop().await;
        outcome
    }

    async fn measure_through(&self, proxy: &TunnelProxy, iteration: u32) -> Result<f64> {
        proxy.start().await?;
        self.logger.debug(&format!(
            "iteration {}: entry on port {} as {}",
            iteration + 1,
            proxy.port(),
            proxy.identity()
        ));

        for remaining in (1..=defaults::COUNTDOWN_SECS).rev() {
            self.status
                .set(format!("starting speedtest in {}s", remaining));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        self.status.set("starting speedtest");

        let mut client = SpeedtestClient::new(&format!("http://127.0.0.1:{}", proxy.port()))?;
        client.init().await?;

        self.status.set("connecting");
        let urls = client.get_urls().await?;

        self.status.set("loading");
        let (tx, mut rx) = mpsc::channel::<f64>(16);
        let status = self.status.clone();
        let consumer = tokio::spawn(async move {
            let mut last = 0.0f64;
            while let Some(sample) = rx.recv().await {
                last = sample;
                status.set(format_throughput(sample));
            }
            last
        });

        let measured = client.measure(&urls, tx).await;
        let last = consumer
            .await
            .map_err(|e| AppError::internal(format!("sample consumer failed: {}", e)))?;
        measured?;

        StatusReporter::print_result(&format_throughput(last));
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, Logger};

    fn test_executor(num_tests: u32) -> TestExecutor {
        let config = RunConfig {
            seed: vec![1u8; 32],
            num_tests,
            output_path: None,
            upload_url: None,
            enable_color: false,
        };
        TestExecutor::new(config, StatusLine::new(), Logger::new(LogLevel::Error, false))
    }

    #[tokio::test]
    async fn test_batch_continues_past_failures() {
        let executor = test_executor(3);
        let results = executor
            .run_loop(|iteration| async move {
                if iteration == 1 {
                    Err(AppError::network("port allocation failed"))
                } else {
                    Ok(((iteration + 1) as f64) * 1000.0)
                }
            })
            .await;

        // Iterations 1 and 3 still ran and recorded, in order
        assert_eq!(results.values(), &[1000.0, 3000.0]);
    }

    #[tokio::test]
    async fn test_zero_finals_are_not_recorded() {
        let executor = test_executor(2);
        let results = executor.run_loop(|_| async { Ok(0.0) }).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_set() {
        let executor = test_executor(3);
        let results = executor
            .run_loop(|_| async { Err(AppError::connect_timeout("tunnel connect timeout")) })
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_loop_runs_configured_count() {
        let executor = test_executor(5);
        let results = executor
            .run_loop(|iteration| async move { Ok((iteration + 1) as f64) })
            .await;
        assert_eq!(results.len(), 5);
        assert_eq!(results.values(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
