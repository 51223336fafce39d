use clap::Args;
use serde_json::json;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::cli::output;
use crate::config::State;
use crate::installer::{self, skill as skill_installer, Platform};
use crate::registry::RegistryClient;
use crate::target::{is_shared_skill, parse_target, Target, TargetKind, DEFAULT_REGISTRY};
use crate::Result;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Employees or skills to remove
    #[arg(required = true)]
    pub items: Vec<String>,

    /// Platform(s) to remove from; defaults to all configured
    #[arg(short, long, value_enum)]
    pub platform: Vec<Platform>,

    /// Remove a skill even when an installed employee owns it
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be removed without removing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(ctx: &AppContext, args: RemoveArgs) -> Result<()> {
    let state = ctx.state_file.load()?;

    let platforms = if args.platform.is_empty() {
        state.platforms.keys().copied().collect()
    } else {
        args.platform.clone()
    };

    for item in &args.items {
        let target = parse_target(item, DEFAULT_REGISTRY);
        match target.kind {
            TargetKind::Employee => {
                remove_employee(ctx, &state, &target, &platforms, args.dry_run)?;
            }
            TargetKind::Skill => {
                remove_skill(ctx, &state, &target, &platforms, args.force, args.dry_run)?;
            }
        }
    }
    Ok(())
}

fn remove_employee(
    ctx: &AppContext,
    state: &State,
    target: &Target,
    platforms: &[Platform],
    dry_run: bool,
) -> Result<()> {
    let name = &target.name;

    if dry_run {
        if ctx.format.is_json() {
            return output::emit_json(&json!({
                "wouldRemove": name,
                "platforms": platforms,
                "sharedSkills": shared_dependencies(ctx, state, target),
            }));
        }
        output::info(&format!("Would remove employee {name}"));
        for dep in shared_dependencies(ctx, state, target) {
            output::detail(&format!("would release shared skill {dep}"));
        }
        return Ok(());
    }

    installer::sweep_employee_files(name, state, &ctx.cwd, platforms)?;

    let mut released = Vec::new();
    let mut kept = Vec::new();
    for dep in shared_dependencies(ctx, state, target) {
        let outcome = ctx.state_file.remove_shared_skill_reference(&dep, name)?;
        if outcome.should_uninstall {
            for &platform in platforms {
                skill_installer::uninstall_skill(&dep, state, &ctx.cwd, platform, false)?;
            }
            released.push(dep);
        } else if !outcome.remaining_users.is_empty() {
            kept.push((dep, outcome.remaining_users));
        }
    }

    let was_installed = state.employees.contains_key(name);
    if was_installed {
        ctx.state_file.remove_employee(name)?;
    }

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "removed": name,
            "platforms": platforms,
            "sharedSkillsRemoved": released,
            "sharedSkillsKept": kept.iter().map(|(d, _)| d).collect::<Vec<_>>(),
            "wasInstalled": was_installed,
        }));
    }

    output::success(&format!("Removed employee {name}"));
    for dep in &released {
        output::detail(&format!("removed shared skill {dep} (no longer used)"));
    }
    for (dep, users) in &kept {
        output::detail(&format!("kept shared skill {dep} (used by {})", users.join(", ")));
    }
    Ok(())
}

/// Shared skill dependencies to release for an employee.
///
/// Prefers the registry descriptor so removal also covers references
/// recorded by a newer bundle version; falls back to scanning state
/// when the registry is unreachable.
fn shared_dependencies(ctx: &AppContext, state: &State, target: &Target) -> Vec<String> {
    let client = RegistryClient::new(state, &ctx.cwd);
    match client.fetch_employee(target) {
        Ok(employee) => employee.dependencies,
        Err(err) => {
            debug!(target: "installer", employee = %target.name, error = %err, "registry unavailable, using state");
            state
                .shared_skills
                .iter()
                .filter(|(_, entry)| entry.used_by.iter().any(|e| e == &target.name))
                .map(|(full_name, _)| full_name.clone())
                .collect()
        }
    }
}

fn remove_skill(
    ctx: &AppContext,
    state: &State,
    target: &Target,
    platforms: &[Platform],
    force: bool,
    dry_run: bool,
) -> Result<()> {
    if is_shared_skill(&target.full_name) && !force {
        if let Some(entry) = state.shared_skills.get(&target.full_name) {
            if !entry.used_by.is_empty() {
                output::warn(&format!(
                    "{} is still used by {}; use --force to remove it anyway",
                    target.full_name,
                    entry.used_by.join(", ")
                ));
                return Ok(());
            }
        }
    }

    if let Some(owner) = state.owning_employee(&target.name) {
        if !force {
            output::warn(&format!(
                "{} belongs to employee {owner}; use --force to remove it anyway",
                target.full_name
            ));
            return Ok(());
        }
        warn!(target: "installer", skill = %target.full_name, %owner, "force-removing employee-owned skill");
    }

    let mut files = Vec::new();
    let mut removed = false;
    for &platform in platforms {
        let outcome =
            skill_installer::uninstall_skill(&target.full_name, state, &ctx.cwd, platform, dry_run)?;
        removed |= outcome.removed;
        files.extend(outcome.files);
    }

    if dry_run {
        if ctx.format.is_json() {
            return output::emit_json(&json!({
                "wouldRemove": target.full_name,
                "files": files,
            }));
        }
        output::info(&format!(
            "Would remove {} ({} file(s))",
            target.full_name,
            files.len()
        ));
        for file in &files {
            output::detail(&file.display().to_string());
        }
        return Ok(());
    }

    if state.skills.contains_key(&target.full_name) {
        ctx.state_file.remove_skill(&target.full_name)?;
    }
    // Force-removing a shared skill drops its remaining references too.
    if let Some(entry) = state.shared_skills.get(&target.full_name) {
        for user in &entry.used_by {
            ctx.state_file
                .remove_shared_skill_reference(&target.full_name, user)?;
        }
    }

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "removed": target.full_name,
            "files": files,
            "foundOnDisk": removed,
        }));
    }

    if removed {
        output::success(&format!("Removed {}", target.full_name));
    } else {
        output::warn(&format!("{} was not installed", target.full_name));
    }
    Ok(())
}
