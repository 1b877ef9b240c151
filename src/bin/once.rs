//! Single-run throughput tester binary
//!
//! One measurement iteration; every failure is fatal. The final Kbps
//! value can be written to a file for machine consumption.

use clap::Parser;
use std::process;
use tunnel_throughput_tester::{
    cli::SingleCli,
    config::RunConfig,
    error::Result,
    executor::TestExecutor,
    logging::{LogLevel, Logger},
    output::{format_throughput, StatusLine, StatusReporter},
    results::{self, ResultSet},
};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let cli = SingleCli::parse();
    let use_color = cli.use_colors();
    let logger = Logger::new(LogLevel::Info, use_color);

    if let Err(e) = run(cli, &logger).await {
        logger.fatal(&e.format_for_console(use_color));
        process::exit(e.exit_code());
    }
}

async fn run(cli: SingleCli, logger: &Logger) -> Result<()> {
    let config = RunConfig::from_single(cli)?;

    let status = StatusLine::new();
    let reporter = StatusReporter::spawn(status.clone());
    let executor = TestExecutor::new(config.clone(), status, logger.clone());
    let outcome = executor.run_once().await;
    reporter.stop();
    let kbps = outcome?;

    let mut results = ResultSet::new();
    if !results.push(kbps) {
        // Nothing measurable arrived; leave no output behind
        return Ok(());
    }

    println!("{}", format_throughput(kbps));

    if let Some(path) = &config.output_path {
        results::write_value(path, kbps)?;
    }

    Ok(())
}
