//! Binary entrypoint for prepare-data.
use anyhow::Context;
use clap::Parser;
use prepare_data::{logging, Cli};
use std::process::ExitCode;

/// Exit code for configuration errors, reported before any processing.
const CONFIG_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let dump_config = cli.dump_config;
    let report_path = cli.report.clone();

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("prepare-data: {e}");
            return ExitCode::from(if e.is_config() { CONFIG_EXIT } else { 1 });
        }
    };

    if dump_config {
        return match config.to_yaml() {
            Ok(yaml) => {
                print!("{yaml}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("prepare-data: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let outcome = async {
        let report = prepare_data::run(config).await.context("corpus preparation failed")?;
        if let Some(path) = report_path {
            std::fs::write(&path, report.to_json()?)
                .with_context(|| format!("writing report to {}", path.display()))?;
        }
        anyhow::Ok(())
    };

    match outcome.await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("prepare-data: {e:#}");
            ExitCode::FAILURE
        }
    }
}
