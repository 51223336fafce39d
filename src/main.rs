//! crew - AI employee and skill installer.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crew::app::AppContext;
use crew::cli::{commands, Cli};
use crew::Result;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);
    let robot = cli.robot;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if robot {
                // Robot mode: JSON error output to stdout
                let error_json = serde_json::json!({
                    "error": true,
                    "code": e.code(),
                    "message": e.to_string(),
                    "suggestion": e.suggestion(),
                });
                println!("{}", serde_json::to_string(&error_json).unwrap_or_default());
            } else {
                eprintln!("{} {e}", style("✖").red().bold());
                eprintln!("  {} {}", style("Code:").dim(), e.code());
                eprintln!("  {} {}", style("Suggestion:").dim(), e.suggestion());
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_cli(&cli)?;
    commands::run(&ctx, cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,crew=info",
        1 => "info,crew=debug",
        2 => "debug,crew=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        // Human-readable logging
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
