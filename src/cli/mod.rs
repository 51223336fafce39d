//! Command-line surface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

pub use output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "crew",
    version,
    about = "Install AI employee bundles and skills into your project",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: commands::Commands,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub robot: bool,

    /// Working directory (defaults to the current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.robot {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_flags() {
        let cli = Cli::parse_from([
            "crew",
            "add",
            "pm",
            "@crew/pm/brainstorming",
            "--platform",
            "codex",
            "--overwrite",
            "--yes",
        ]);
        match cli.command {
            commands::Commands::Add(args) => {
                assert_eq!(args.items, vec!["pm", "@crew/pm/brainstorming"]);
                assert!(args.overwrite);
                assert!(args.yes);
                assert_eq!(args.platform.len(), 1);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn robot_flag_selects_json_output() {
        let cli = Cli::parse_from(["crew", "--robot", "list"]);
        assert_eq!(cli.output_format(), OutputFormat::Json);
    }

    #[test]
    fn remove_supports_dry_run() {
        let cli = Cli::parse_from(["crew", "remove", "backend", "--dry-run"]);
        match cli.command {
            commands::Commands::Remove(args) => assert!(args.dry_run),
            _ => panic!("expected remove"),
        }
    }
}
