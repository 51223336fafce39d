//! Standalone skill installation.
//!
//! Unlike the employee sweep, this path is precise and state-driven: a
//! skill's directory is computed from its fullName and removed exactly.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{resolve_platform_paths, State};
use crate::error::Result;
use crate::installer::platform::Platform;
use crate::installer::write_bundle_file;
use crate::schema::Skill;

/// Directory name for a standalone-installed skill.
///
/// `@crew/pm/brainstorming` → `crew-pm-brainstorming`; shared skills
/// drop the registry segment: `@crew/_shared/code-review` →
/// `crew-code-review`.
pub fn skill_dir_name(full_name: &str) -> String {
    if full_name.starts_with('@') {
        if full_name.contains("/_shared/") {
            let skill = full_name.rsplit('/').next().unwrap_or_default();
            return format!("crew-{skill}");
        }
        return full_name.trim_start_matches('@').replace('/', "-");
    }
    full_name.to_string()
}

#[derive(Debug)]
pub struct InstallSkillOutcome {
    pub installed: bool,
    pub skipped: bool,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct UninstallSkillOutcome {
    pub removed: bool,
    /// Files that were (or, on dry run, would be) removed.
    pub files: Vec<PathBuf>,
}

/// Install a single skill's files to one platform.
///
/// When the target directory exists and `overwrite` is false, returns
/// `skipped=true` without touching the filesystem.
pub fn install_skill(
    skill: &Skill,
    state: &State,
    cwd: &Path,
    platform: Platform,
    overwrite: bool,
) -> Result<InstallSkillOutcome> {
    let (skills_dir, _) = resolve_platform_paths(cwd, state, platform)?;
    let dir_name = skill_dir_name(&skill.full_name);
    let skill_dir = skills_dir.join(&dir_name);

    if skill_dir.exists() {
        if !overwrite {
            return Ok(InstallSkillOutcome {
                installed: false,
                skipped: true,
                path: skill_dir,
            });
        }
        fs::remove_dir_all(&skill_dir)?;
    }

    fs::create_dir_all(&skill_dir)?;
    for file in &skill.files {
        write_bundle_file(&skill_dir, &file.path, file, &dir_name)?;
    }

    debug!(target: "installer", %platform, skill = %skill.full_name, "installed skill");
    Ok(InstallSkillOutcome {
        installed: true,
        skipped: false,
        path: skill_dir,
    })
}

/// Remove a single skill's directory from one platform. With `dry_run`,
/// only reports the files that removal would delete.
pub fn uninstall_skill(
    full_name: &str,
    state: &State,
    cwd: &Path,
    platform: Platform,
    dry_run: bool,
) -> Result<UninstallSkillOutcome> {
    let (skills_dir, _) = resolve_platform_paths(cwd, state, platform)?;
    let skill_dir = skills_dir.join(skill_dir_name(full_name));

    if !skill_dir.exists() {
        return Ok(UninstallSkillOutcome {
            removed: false,
            files: Vec::new(),
        });
    }

    let mut files = Vec::new();
    collect_files(&skill_dir, &mut files)?;

    if dry_run {
        return Ok(UninstallSkillOutcome {
            removed: false,
            files,
        });
    }

    fs::remove_dir_all(&skill_dir)?;
    debug!(target: "installer", %platform, skill = %full_name, "uninstalled skill");
    Ok(UninstallSkillOutcome {
        removed: true,
        files,
    })
}

pub fn is_skill_dir_installed(
    full_name: &str,
    state: &State,
    cwd: &Path,
    platform: Platform,
) -> Result<bool> {
    let (skills_dir, _) = resolve_platform_paths(cwd, state, platform)?;
    Ok(skills_dir.join(skill_dir_name(full_name)).exists())
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
