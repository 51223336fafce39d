use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::{resolve_platform_paths, EmployeeState, State};
use crate::error::CrewError;
use crate::installer::bundle_relative_path;
use crate::registry::RegistryClient;
use crate::schema::rewrite_frontmatter_name;
use crate::target::{parse_target, DEFAULT_REGISTRY};
use crate::Result;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Employee to diff; omit to scan every installed employee
    pub employee: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct EmployeeDiff {
    employee: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skills_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skills_removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commands_added: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    commands_removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files_modified: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files_missing: Vec<PathBuf>,
}

impl EmployeeDiff {
    fn is_clean(&self) -> bool {
        self.skills_added.is_empty()
            && self.skills_removed.is_empty()
            && self.commands_added.is_empty()
            && self.commands_removed.is_empty()
            && self.files_modified.is_empty()
            && self.files_missing.is_empty()
    }
}

pub fn run(ctx: &AppContext, args: DiffArgs) -> Result<()> {
    let state = ctx.state_file.load()?;

    let names: Vec<String> = match &args.employee {
        Some(name) => {
            let target = parse_target(name, DEFAULT_REGISTRY);
            if !state.employees.contains_key(&target.name) {
                return Err(CrewError::EmployeeNotFound(target.full_name));
            }
            vec![target.name]
        }
        None => state.employees.keys().cloned().collect(),
    };

    if names.is_empty() {
        if ctx.format.is_json() {
            return output::emit_json(&Vec::<EmployeeDiff>::new());
        }
        output::info("No employees installed.");
        return Ok(());
    }

    let mut diffs = Vec::new();
    for name in &names {
        let entry = &state.employees[name];
        diffs.push(diff_employee(ctx, &state, name, entry)?);
    }

    if ctx.format.is_json() {
        return output::emit_json(&diffs);
    }

    for diff in &diffs {
        if diff.is_clean() {
            output::success(&format!("{}: in sync with registry", diff.employee));
            continue;
        }
        output::heading(&diff.employee);
        for name in &diff.skills_added {
            output::info(&format!("  + skill {name} (not installed)"));
        }
        for name in &diff.skills_removed {
            output::info(&format!("  - skill {name} (no longer in bundle)"));
        }
        for name in &diff.commands_added {
            output::info(&format!("  + command {name} (not installed)"));
        }
        for name in &diff.commands_removed {
            output::info(&format!("  - command {name} (no longer in bundle)"));
        }
        for path in &diff.files_modified {
            output::info(&format!("  ~ {}", path.display()));
        }
        for path in &diff.files_missing {
            output::info(&format!("  ! {} (missing)", path.display()));
        }
    }
    Ok(())
}

/// Compare the registry's current bundle against what is on disk.
///
/// Membership drift comes from comparing the descriptor with the
/// recorded skill/command lists; content drift from comparing each
/// expected file (frontmatter rewrite applied) byte-for-byte.
fn diff_employee(
    ctx: &AppContext,
    state: &State,
    name: &str,
    entry: &EmployeeState,
) -> Result<EmployeeDiff> {
    let target = parse_target(name, DEFAULT_REGISTRY);
    let client = RegistryClient::new(state, &ctx.cwd);
    let employee = client.fetch_employee(&target)?;

    let platform = entry
        .platforms
        .first()
        .copied()
        .unwrap_or(state.default_platform);
    let (skills_dir, commands_dir) = resolve_platform_paths(&ctx.cwd, state, platform)?;

    let mut diff = EmployeeDiff {
        employee: name.to_string(),
        ..EmployeeDiff::default()
    };

    for skill in &employee.skills {
        if !entry.skills.contains(&skill.name) {
            diff.skills_added.push(skill.name.clone());
            continue;
        }
        let dir_name = platform.skill_dir_name(name, &skill.name);
        let skill_dir = skills_dir.join(&dir_name);
        for file in &skill.files {
            let relative = bundle_relative_path(&file.path, &skill.name);
            let path = skill_dir.join(&relative);
            let expected = if relative == "SKILL.md" || relative.ends_with("/SKILL.md") {
                rewrite_frontmatter_name(&file.content, &dir_name)
            } else {
                file.content.clone()
            };
            match fs::read_to_string(&path) {
                Ok(actual) if actual == expected => {}
                Ok(_) => diff.files_modified.push(path),
                Err(_) => diff.files_missing.push(path),
            }
        }
    }
    for recorded in &entry.skills {
        if !employee.skills.iter().any(|s| &s.name == recorded) {
            diff.skills_removed.push(recorded.clone());
        }
    }

    for command in &employee.commands {
        if !entry.commands.contains(&command.name) {
            diff.commands_added.push(command.name.clone());
            continue;
        }
        let path = commands_dir.join(platform.command_file_name(name, &command.name));
        let expected = command.files.first().map(|f| f.content.as_str());
        match (fs::read_to_string(&path), expected) {
            (Ok(actual), Some(content)) if actual == content => {}
            (Ok(_), Some(_)) => diff.files_modified.push(path),
            (Err(_), _) => diff.files_missing.push(path),
            _ => {}
        }
    }
    for recorded in &entry.commands {
        if !employee.commands.iter().any(|c| &c.name == recorded) {
            diff.commands_removed.push(recorded.clone());
        }
    }

    debug!(target: "diff", employee = %name, clean = diff.is_clean(), "compared against registry");
    Ok(diff)
}
