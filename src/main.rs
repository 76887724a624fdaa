// file: src/main.rs
// version: 2.0.0
// guid: h8i9j0k1-l2m3-4567-8901-234567hijklm

//! Pages Agent - Main entry point

use clap::Parser;
use pages_agent::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging, Result,
};
use std::process::ExitCode;
use tokio::signal;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_logs = matches!(cli.command, Commands::Serve { json_logs: true, .. });
    let logger = if json_logs {
        logging::init_json_logger(cli.verbose, cli.quiet)
    } else {
        logging::init_logger(cli.verbose, cli.quiet)
    };
    if let Err(e) = logger {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config: config_path,
        ..
    } = cli;
    let config = config_path.as_deref();

    // The server handles Ctrl+C itself and waits for running builds
    let command = match command {
        Commands::Serve { bind, .. } => {
            return serve_command(config, bind, shutdown_signal()).await;
        }
        other => other,
    };

    let command_future = async {
        match command {
            Commands::Provision {
                manifest,
                gh_method,
                gh_version,
                install_dir,
                skip_checksum,
            } => {
                let options = ProvisionOptions {
                    manifest,
                    gh_method: gh_method.map(Into::into),
                    gh_version,
                    install_dir,
                    skip_checksum,
                };
                provision_command(config, options).await
            }
            Commands::RunTask { file } => run_task_command(config, &file).await,
            Commands::CheckPrereqs => check_prerequisites_command(config).await,
            Commands::Serve { .. } => Ok(()),
        }
    };

    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal() => {
            warn!("Application interrupted by user");
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Received Ctrl+C, initiating graceful shutdown...");
}
