//! Batch throughput tester binary
//!
//! Runs the configured number of measurement iterations through the
//! tunnel entry, prints the collected results, and optionally uploads
//! them. Iteration failures are logged and the loop continues.

use clap::Parser;
use std::process;
use tunnel_throughput_tester::{
    cli::BatchCli,
    config::RunConfig,
    error::Result,
    executor::TestExecutor,
    logging::{LogLevel, Logger},
    output::{format_throughput, StatusLine, StatusReporter},
};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = BatchCli::parse();
    let use_color = cli.use_colors();
    let logger = Logger::new(LogLevel::Info, use_color);

    if let Err(e) = run(cli, &logger).await {
        logger.fatal(&e.format_for_console(use_color));
        process::exit(e.exit_code());
    }
}

async fn run(cli: BatchCli, logger: &Logger) -> Result<()> {
    let config = RunConfig::from_batch(cli)?;

    let status = StatusLine::new();
    let reporter = StatusReporter::spawn(status.clone());
    let executor = TestExecutor::new(config.clone(), status, logger.clone());
    let results = executor.run().await;
    reporter.stop();

    if results.is_empty() {
        return Ok(());
    }

    logger.info("Results:");
    for kbps in results.values() {
        println!("{}", format_throughput(*kbps));
    }

    if let Some(upload_url) = &config.upload_url {
        let body = results.upload(upload_url).await?;
        if !body.is_empty() {
            logger.info(&body);
        }
    }

    Ok(())
}
