use clap::Args;
use serde_json::json;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::cli::output;
use crate::config::{SkillOrigin, State};
use crate::error::CrewError;
use crate::installer::{self, skill as skill_installer, InstallOptions, Platform};
use crate::registry::{format_tree, DependencyResolver, RegistryClient, SkillSource};
use crate::schema::Employee;
use crate::target::{parse_target, Target, TargetKind, DEFAULT_REGISTRY};
use crate::Result;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Employees (`backend`, `@crew/backend`) or skills (`@crew/pm/brainstorming`)
    #[arg(required = true)]
    pub items: Vec<String>,

    /// Target platform(s); defaults to the configured default
    #[arg(short, long, value_enum)]
    pub platform: Vec<Platform>,

    /// Replace files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Assume yes to all prompts (implies --overwrite on conflict)
    #[arg(short, long)]
    pub yes: bool,

    /// Install skills without their dependencies
    #[arg(long)]
    pub no_deps: bool,
}

pub fn run(ctx: &AppContext, args: AddArgs) -> Result<()> {
    let state = ctx.state_file.load()?;

    let platforms = if args.platform.is_empty() {
        vec![state.default_platform]
    } else {
        args.platform.clone()
    };
    for platform in &platforms {
        if !state.platforms.contains_key(platform) {
            return Err(CrewError::PlatformNotConfigured(platform.to_string()));
        }
    }

    let mut employees = Vec::new();
    let mut skills = Vec::new();
    for item in &args.items {
        let target = parse_target(item, DEFAULT_REGISTRY);
        match target.kind {
            TargetKind::Employee => employees.push(target),
            TargetKind::Skill => skills.push(target),
        }
    }

    let overwrite = args.overwrite || args.yes;
    for target in &employees {
        add_employee(ctx, &state, target, &platforms, overwrite)?;
    }
    if !skills.is_empty() {
        add_skills(ctx, &state, &skills, &platforms, overwrite, args.no_deps)?;
    }
    Ok(())
}

fn add_employee(
    ctx: &AppContext,
    state: &State,
    target: &Target,
    platforms: &[Platform],
    overwrite: bool,
) -> Result<()> {
    let client = RegistryClient::new(state, &ctx.cwd);
    let employee = client.fetch_employee(target)?;

    let conflicts = installer::check_conflicts(&employee, state, &ctx.cwd, platforms)?;
    let is_update = state.employees.contains_key(&employee.name);
    if !conflicts.is_empty() && !overwrite && !is_update {
        return Err(CrewError::FileConflicts {
            paths: conflicts
                .iter()
                .map(|c| c.path.display().to_string())
                .collect(),
        });
    }

    // Reinstalls sweep first so files dropped from the bundle don't
    // linger on disk.
    if is_update {
        installer::sweep_employee_files(&employee.name, state, &ctx.cwd, platforms)?;
    }

    let summaries = installer::install_employee(
        &employee,
        state,
        &ctx.cwd,
        platforms,
        InstallOptions { overwrite },
    )?;

    let shared =
        install_shared_dependencies(ctx, state, &client, &employee, platforms, overwrite)?;

    ctx.state_file.record_employee(
        &employee.name,
        employee.version.clone(),
        employee.skills.iter().map(|s| s.name.clone()).collect(),
        employee.commands.iter().map(|c| c.name.clone()).collect(),
        platforms.to_vec(),
    )?;

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "employee": employee.name,
            "version": employee.version,
            "platforms": platforms,
            "skills": summaries.first().map(|s| s.skills_installed).unwrap_or(0),
            "commands": summaries.first().map(|s| s.commands_installed).unwrap_or(0),
            "sharedSkills": shared,
            "updated": is_update,
        }));
    }

    let verb = if is_update { "Updated" } else { "Installed" };
    output::success(&format!("{verb} employee {}", employee.name));
    for summary in &summaries {
        output::detail(&format!(
            "{}: {} skill(s), {} command(s)",
            summary.platform, summary.skills_installed, summary.commands_installed
        ));
    }
    for dep in &shared {
        output::detail(&format!("shared skill: {dep}"));
    }
    Ok(())
}

/// Install the employee's shared skill dependencies and reference them.
///
/// A fetch or install failure for one dependency degrades to a warning
/// and skips that dependency entirely; no reference is recorded for it,
/// so `sharedSkills` never points at files that are not on disk.
fn install_shared_dependencies(
    ctx: &AppContext,
    state: &State,
    client: &RegistryClient<'_>,
    employee: &Employee,
    platforms: &[Platform],
    overwrite: bool,
) -> Result<Vec<String>> {
    let mut referenced = Vec::new();

    for dep in &employee.dependencies {
        let mut version = "1.0.0".to_string();
        let mut installed = ctx.state_file.load()?.is_shared_skill_installed(dep);
        // Repair: a recorded reference with missing files still reinstalls.
        for &platform in platforms {
            if !skill_installer::is_skill_dir_installed(dep, state, &ctx.cwd, platform)? {
                installed = false;
            }
        }

        if !installed {
            match fetch_and_install_shared(ctx, state, client, dep, platforms, overwrite) {
                Ok(fetched_version) => version = fetched_version,
                Err(err) => {
                    warn!(target: "installer", skill = %dep, error = %err, "shared dependency install failed");
                    output::warn(&format!("could not install shared skill {dep}: {err}"));
                    continue;
                }
            }
        } else {
            debug!(target: "installer", skill = %dep, "shared dependency already installed");
        }

        ctx.state_file
            .add_shared_skill_reference(dep, &employee.name, &version, platforms)?;
        referenced.push(dep.clone());
    }

    Ok(referenced)
}

fn fetch_and_install_shared(
    ctx: &AppContext,
    state: &State,
    client: &RegistryClient<'_>,
    full_name: &str,
    platforms: &[Platform],
    overwrite: bool,
) -> Result<String> {
    let skill = client.fetch_skill(full_name)?;
    for &platform in platforms {
        skill_installer::install_skill(&skill, state, &ctx.cwd, platform, overwrite)?;
    }
    Ok(skill.version)
}

fn add_skills(
    ctx: &AppContext,
    state: &State,
    targets: &[Target],
    platforms: &[Platform],
    overwrite: bool,
    no_deps: bool,
) -> Result<()> {
    let client = RegistryClient::new(state, &ctx.cwd);

    let to_install = if no_deps {
        targets
            .iter()
            .map(|t| client.fetch_skill(&t.full_name))
            .collect::<Result<Vec<_>>>()?
    } else {
        let requested: Vec<String> = targets.iter().map(|t| t.full_name.clone()).collect();
        let mut resolver = DependencyResolver::new(&client);
        let resolution = resolver.resolve(&requested)?;

        if !ctx.format.is_json() {
            for tree in &resolution.trees {
                output::info(&format_tree(tree));
            }
        }
        resolution.install_order
    };

    let mut installed = Vec::new();
    let mut skipped = Vec::new();
    for skill in &to_install {
        // Employee-owned skills shadow standalone installs of the same name.
        if !overwrite && state.is_skill_installed(&skill.full_name, &skill.name) {
            skipped.push(skill.full_name.clone());
            continue;
        }
        let mut wrote_any = false;
        for &platform in platforms {
            let outcome =
                skill_installer::install_skill(skill, state, &ctx.cwd, platform, overwrite)?;
            if outcome.skipped {
                skipped.push(skill.full_name.clone());
            } else {
                wrote_any = true;
            }
        }
        if wrote_any {
            ctx.state_file.record_skill(
                &skill.full_name,
                &skill.version,
                SkillOrigin::Standalone,
                platforms.to_vec(),
            )?;
            installed.push(skill.full_name.clone());
        }
    }
    skipped.sort();
    skipped.dedup();

    if ctx.format.is_json() {
        return output::emit_json(&json!({
            "installed": installed,
            "skipped": skipped,
            "platforms": platforms,
        }));
    }

    for name in &installed {
        output::success(&format!("Installed {name}"));
    }
    for name in &skipped {
        output::warn(&format!("{name} already exists, skipped (use --overwrite)"));
    }
    Ok(())
}
