//! Shared application context handed to every command.

use std::env;
use std::path::PathBuf;

use crate::cli::{Cli, OutputFormat};
use crate::config::StateFile;
use crate::error::CrewError;
use crate::Result;

/// Everything a command needs: the working directory, a handle on the state
/// file, and how output should be rendered. Construction never touches the
/// filesystem; commands load state themselves so `init` can run in an empty
/// directory.
pub struct AppContext {
    pub cwd: PathBuf,
    pub state_file: StateFile,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = match &cli.cwd {
            Some(dir) => {
                let dir = dir.clone();
                if !dir.is_dir() {
                    return Err(CrewError::Validation(format!(
                        "not a directory: {}",
                        dir.display()
                    )));
                }
                dir
            }
            None => env::current_dir()?,
        };
        let state_file = StateFile::in_dir(&cwd);
        Ok(Self {
            cwd,
            state_file,
            format: cli.output_format(),
        })
    }
}
