use std::fs;

use clap::Args;
use serde_json::json;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::{resolve_platform_paths, State};
use crate::installer::skill::skill_dir_name;
use crate::registry::RegistryClient;
use crate::schema::parse_skill_frontmatter;
use crate::Result;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also list standalone and shared skills
    #[arg(short, long)]
    pub skills: bool,

    /// Browse what the default registry offers instead of local state
    #[arg(short, long)]
    pub available: bool,
}

pub fn run(ctx: &AppContext, args: ListArgs) -> Result<()> {
    let state = ctx.state_file.load()?;

    if args.available {
        return list_available(ctx, &state);
    }

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "defaultPlatform": state.default_platform,
            "employees": state.employees,
            "skills": state.skills,
            "sharedSkills": state.shared_skills,
        }));
    }

    if state.employees.is_empty() && state.skills.is_empty() && state.shared_skills.is_empty() {
        output::info("Nothing installed yet. Try `crew add <employee>`.");
        return Ok(());
    }

    if !state.employees.is_empty() {
        output::heading("Employees");
        for (name, entry) in &state.employees {
            let version = entry.version.as_deref().unwrap_or("-");
            let platforms: Vec<String> =
                entry.platforms.iter().map(|p| p.to_string()).collect();
            output::info(&format!(
                "  {name}  v{version}  [{}]  {} skill(s), {} command(s)",
                platforms.join(", "),
                entry.skills.len(),
                entry.commands.len()
            ));
        }
    }

    if args.skills {
        if !state.skills.is_empty() {
            output::heading("Skills");
            for (full_name, entry) in &state.skills {
                output::info(&format!("  {full_name}  v{}", entry.version));
                if let Some(description) = installed_description(ctx, &state, full_name) {
                    output::detail(&description);
                }
            }
        }
        if !state.shared_skills.is_empty() {
            output::heading("Shared skills");
            for (full_name, entry) in &state.shared_skills {
                output::info(&format!(
                    "  {full_name}  v{}  used by {}",
                    entry.version,
                    entry.used_by.join(", ")
                ));
            }
        }
    }
    Ok(())
}

/// Description from the installed SKILL.md frontmatter, if readable.
fn installed_description(ctx: &AppContext, state: &State, full_name: &str) -> Option<String> {
    let (skills_dir, _) = resolve_platform_paths(&ctx.cwd, state, state.default_platform).ok()?;
    let path = skills_dir.join(skill_dir_name(full_name)).join("SKILL.md");
    let content = fs::read_to_string(path).ok()?;
    let frontmatter = parse_skill_frontmatter(&content)?;
    if frontmatter.description.is_empty() {
        None
    } else {
        Some(frontmatter.description)
    }
}

fn list_available(ctx: &AppContext, state: &State) -> Result<()> {
    let client = RegistryClient::new(state, &ctx.cwd);
    let index = client.fetch_index(None)?;

    if ctx.format.is_json() {
        return output::emit_json(&index);
    }

    if index.employees.is_empty() && index.skills.is_empty() {
        output::info("The registry lists nothing yet.");
        return Ok(());
    }

    if !index.employees.is_empty() {
        output::heading("Available employees");
        for employee in &index.employees {
            output::info(&format!("  {}  {}", employee.name, employee.role));
            if !employee.description.is_empty() {
                output::detail(&employee.description);
            }
        }
    }
    if !index.skills.is_empty() {
        output::heading("Available skills");
        for skill in &index.skills {
            output::info(&format!("  {}  v{}", skill.full_name, skill.version));
            if !skill.description.is_empty() {
                output::detail(&skill.description);
            }
        }
    }
    Ok(())
}
