//! Per-platform naming strategy.
//!
//! Both platforms share the skill directory convention
//! (`crew-{employee}-{skill}`); only the command file naming differs:
//! - claude-code: `.claude/commands/{employee}.{command}.md`
//! - codex:       `.codex/prompts/crew.{employee}.{command}.md`
//!   (invoked as `/prompts:crew.{employee}.{command}`)

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const SKILL_DIR_PREFIX: &str = "crew-";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum Platform {
    #[serde(rename = "claude-code")]
    #[value(name = "claude-code")]
    ClaudeCode,
    #[serde(rename = "codex")]
    #[value(name = "codex")]
    Codex,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClaudeCode => write!(f, "claude-code"),
            Self::Codex => write!(f, "codex"),
        }
    }
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::ClaudeCode, Platform::Codex];

    /// Directory name for an employee-bundled skill.
    pub fn skill_dir_name(&self, employee: &str, skill: &str) -> String {
        format!("{SKILL_DIR_PREFIX}{employee}-{skill}")
    }

    /// File name for an employee command.
    pub fn command_file_name(&self, employee: &str, command: &str) -> String {
        match self {
            Self::ClaudeCode => format!("{employee}.{command}.md"),
            Self::Codex => format!("crew.{employee}.{command}.md"),
        }
    }

    /// Prefix matched by the uninstall sweep over the commands dir.
    pub fn command_sweep_prefix(&self, employee: &str) -> String {
        match self {
            Self::ClaudeCode => format!("{employee}."),
            Self::Codex => format!("crew.{employee}."),
        }
    }
}
