use clap::Args;
use semver::Version;
use serde_json::json;
use tracing::warn;

use crate::app::AppContext;
use crate::cli::output;
use crate::config::{SkillOrigin, State};
use crate::installer::{skill as skill_installer, Platform};
use crate::registry::{RegistryClient, SkillSource};
use crate::target::{parse_target, DEFAULT_REGISTRY};
use crate::Result;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Skills to update; defaults to every installed standalone skill
    pub skills: Vec<String>,

    /// Only report available updates
    #[arg(long)]
    pub dry_run: bool,
}

struct UpdateCheck {
    full_name: String,
    current: String,
    latest: String,
    platforms: Vec<Platform>,
}

pub fn run(ctx: &AppContext, args: UpdateArgs) -> Result<()> {
    let state = ctx.state_file.load()?;
    let client = RegistryClient::new(&state, &ctx.cwd);

    let to_check: Vec<String> = if args.skills.is_empty() {
        state.installed_standalone_skills()
    } else {
        args.skills
            .iter()
            .map(|s| parse_target(s, DEFAULT_REGISTRY).full_name)
            .collect()
    };

    if to_check.is_empty() {
        if ctx.format.is_json() {
            return output::emit_json(&json!({ "updates": [] }));
        }
        output::info("No standalone skills installed.");
        return Ok(());
    }

    let mut updates = Vec::new();
    let mut up_to_date = 0usize;
    for full_name in &to_check {
        let Some(entry) = state.skills.get(full_name) else {
            output::warn(&format!("{full_name} is not installed, skipping"));
            continue;
        };
        let latest = match client.fetch_skill(full_name) {
            Ok(skill) => skill.version,
            Err(err) => {
                warn!(target: "registry", skill = %full_name, error = %err, "update check failed");
                output::warn(&format!("could not check {full_name}: {err}"));
                continue;
            }
        };
        if is_newer(&latest, &entry.version) {
            updates.push(UpdateCheck {
                full_name: full_name.clone(),
                current: entry.version.clone(),
                latest,
                platforms: entry.platforms.clone(),
            });
        } else {
            up_to_date += 1;
        }
    }

    if ctx.format.is_json() {
        let listed: Vec<_> = updates
            .iter()
            .map(|u| {
                json!({
                    "skill": u.full_name,
                    "current": u.current,
                    "latest": u.latest,
                })
            })
            .collect();
        if !args.dry_run {
            apply_updates(ctx, &state, &client, &updates)?;
        }
        return output::emit_json(&json!({
            "updates": listed,
            "applied": !args.dry_run,
            "upToDate": up_to_date,
        }));
    }

    if updates.is_empty() {
        output::success("All skills are up to date.");
        return Ok(());
    }

    for update in &updates {
        output::info(&format!(
            "{}: {} -> {}",
            update.full_name, update.current, update.latest
        ));
    }
    if args.dry_run {
        output::info(&format!("{} update(s) available.", updates.len()));
        return Ok(());
    }

    apply_updates(ctx, &state, &client, &updates)?;
    output::success(&format!("Updated {} skill(s).", updates.len()));
    Ok(())
}

fn apply_updates(
    ctx: &AppContext,
    state: &State,
    client: &RegistryClient<'_>,
    updates: &[UpdateCheck],
) -> Result<()> {
    for update in updates {
        let skill = client.fetch_skill(&update.full_name)?;
        let platforms = if update.platforms.is_empty() {
            vec![state.default_platform]
        } else {
            update.platforms.clone()
        };
        for &platform in &platforms {
            skill_installer::uninstall_skill(&update.full_name, state, &ctx.cwd, platform, false)?;
            skill_installer::install_skill(&skill, state, &ctx.cwd, platform, true)?;
        }
        ctx.state_file.record_skill(
            &update.full_name,
            &skill.version,
            SkillOrigin::Standalone,
            platforms,
        )?;
    }
    Ok(())
}

/// Semver comparison with a lexical fallback for non-semver versions.
fn is_newer(latest: &str, current: &str) -> bool {
    match (Version::parse(latest), Version::parse(current)) {
        (Ok(l), Ok(c)) => l > c,
        _ => latest != current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semver_comparison() {
        assert!(is_newer("1.2.0", "1.1.9"));
        assert!(!is_newer("1.1.9", "1.2.0"));
        assert!(!is_newer("1.0.0", "1.0.0"));
    }

    #[test]
    fn non_semver_falls_back_to_inequality() {
        assert!(is_newer("2024-05", "2024-04"));
        assert!(!is_newer("abc", "abc"));
    }
}
