//! # Mono Bridge CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 参数解析 (词汇表与配置文件两个位置参数)
//! - 会话生命周期与信号处理
//! - 退出码映射

mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{error, info};

use cli::Cli;
use commands::run_session;
use error::{parse_exit, CliError};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit(e.kind()));
        }
    };

    if let Err(e) = init_logging(&cli) {
        eprintln!("{e}");
        return ExitCode::from(e.exit_code());
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Mono Bridge starting");

    match run_session(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Session failed");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initialize logging and the optional metrics endpoint based on CLI options
fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: (cli.metrics_port != 0).then_some(cli.metrics_port),
        default_log_level: default_log_level.to_string(),
    })
    .context("Failed to initialize observability")?;

    Ok(())
}
