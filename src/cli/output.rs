//! Console output helpers.
//!
//! Human output goes through [`console`] styling; robot mode emits one JSON
//! document per command on stdout and nothing else.

use console::style;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Prints a green check line.
pub fn success(msg: &str) {
    println!("{} {msg}", style("✔").green().bold());
}

/// Prints a yellow warning line.
pub fn warn(msg: &str) {
    println!("{} {msg}", style("⚠").yellow().bold());
}

/// Prints a plain informational line.
pub fn info(msg: &str) {
    println!("{msg}");
}

/// Prints a dimmed secondary line, indented under the previous one.
pub fn detail(msg: &str) {
    println!("  {}", style(msg).dim());
}

/// Prints a section heading.
pub fn heading(msg: &str) {
    println!("\n{}", style(msg).bold());
}

/// Serializes `value` as pretty JSON on stdout.
pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
