//! Installer/reconciler.
//!
//! Writes employee bundles to platform directories, detects conflicts
//! ahead of time, and sweeps them back out on uninstall. Standalone
//! skill installation lives in [`skill`]; per-platform naming in
//! [`platform`].

pub mod platform;
pub mod skill;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{resolve_platform_paths, State};
use crate::error::Result;
use crate::schema::{rewrite_frontmatter_name, Employee, FileType, SkillFile};
pub use platform::Platform;
use platform::SKILL_DIR_PREFIX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Skill,
    Command,
}

/// A path that installation would overwrite.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub path: PathBuf,
    pub kind: ConflictKind,
}

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct InstallSummary {
    pub platform: Platform,
    pub skills_installed: usize,
    pub commands_installed: usize,
}

/// Pre-flight conflict scan. Collects every skill directory and command
/// file that already exists on any target platform; mutates nothing.
pub fn check_conflicts(
    employee: &Employee,
    state: &State,
    cwd: &Path,
    platforms: &[Platform],
) -> Result<Vec<Conflict>> {
    let mut conflicts = Vec::new();

    for &platform in platforms {
        let (skills_dir, commands_dir) = resolve_platform_paths(cwd, state, platform)?;

        for skill in &employee.skills {
            let dir = skills_dir.join(platform.skill_dir_name(&employee.name, &skill.name));
            if dir.exists() {
                conflicts.push(Conflict {
                    path: dir,
                    kind: ConflictKind::Skill,
                });
            }
        }

        for command in &employee.commands {
            let file = commands_dir.join(platform.command_file_name(&employee.name, &command.name));
            if file.exists() {
                conflicts.push(Conflict {
                    path: file,
                    kind: ConflictKind::Command,
                });
            }
        }
    }

    Ok(conflicts)
}

/// Install an employee's skills and commands to the target platforms.
///
/// Writes unconditionally; conflict policy is decided by the caller
/// before this runs.
pub fn install_employee(
    employee: &Employee,
    state: &State,
    cwd: &Path,
    platforms: &[Platform],
    _options: InstallOptions,
) -> Result<Vec<InstallSummary>> {
    let mut summaries = Vec::new();

    for &platform in platforms {
        let (skills_dir, commands_dir) = resolve_platform_paths(cwd, state, platform)?;
        fs::create_dir_all(&skills_dir)?;
        fs::create_dir_all(&commands_dir)?;

        let mut skills_installed = 0;
        for skill in &employee.skills {
            let dir_name = platform.skill_dir_name(&employee.name, &skill.name);
            let skill_dir = skills_dir.join(&dir_name);
            fs::create_dir_all(&skill_dir)?;

            for file in &skill.files {
                let relative = bundle_relative_path(&file.path, &skill.name);
                write_bundle_file(&skill_dir, &relative, file, &dir_name)?;
            }
            skills_installed += 1;
        }

        let mut commands_installed = 0;
        for command in &employee.commands {
            let file_name = platform.command_file_name(&employee.name, &command.name);
            for file in &command.files {
                let path = commands_dir.join(&file_name);
                fs::write(&path, &file.content)?;
            }
            commands_installed += 1;
        }

        debug!(
            target: "installer",
            %platform, skills = skills_installed, commands = commands_installed,
            employee = %employee.name, "installed employee"
        );
        summaries.push(InstallSummary {
            platform,
            skills_installed,
            commands_installed,
        });
    }

    Ok(summaries)
}

/// Strip the `skills/{name}/` bundle prefix; unprefixed paths collapse
/// to their basename.
pub fn bundle_relative_path(path: &str, skill_name: &str) -> String {
    let prefix = format!("skills/{skill_name}/");
    match path.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string()),
    }
}

/// Write one bundled file under `dir`, rewriting the SKILL.md
/// frontmatter name so the installed identity matches its directory and
/// marking scripts executable.
pub(crate) fn write_bundle_file(
    dir: &Path,
    relative: &str,
    file: &SkillFile,
    dir_name: &str,
) -> Result<()> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = if relative == "SKILL.md" || relative.ends_with("/SKILL.md") {
        rewrite_frontmatter_name(&file.content, dir_name)
    } else {
        file.content.clone()
    };
    fs::write(&path, content)?;

    if file.file_type == FileType::Script {
        make_executable(&path)?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Remove an employee's installed files by convention sweep.
///
/// This deliberately matches `crew-{employee}-*` skill directories and
/// the platform's command prefix instead of replaying a precise list
/// from state, so it tolerates drift between state and filesystem.
/// Anything else sharing the prefix goes too; that imprecision is the
/// contract, not a bug. The precise, state-driven removal path for
/// standalone/shared skills is [`skill::uninstall_skill`].
pub fn sweep_employee_files(
    employee_name: &str,
    state: &State,
    cwd: &Path,
    platforms: &[Platform],
) -> Result<()> {
    for &platform in platforms {
        let (skills_dir, commands_dir) = resolve_platform_paths(cwd, state, platform)?;

        let skill_prefix = format!("{SKILL_DIR_PREFIX}{employee_name}-");
        if skills_dir.exists() {
            for entry in fs::read_dir(&skills_dir)? {
                let entry = entry?;
                if entry.file_name().to_string_lossy().starts_with(&skill_prefix) {
                    fs::remove_dir_all(entry.path())?;
                }
            }
        }

        let command_prefix = platform.command_sweep_prefix(employee_name);
        if commands_dir.exists() {
            for entry in fs::read_dir(&commands_dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&command_prefix) && name.ends_with(".md") {
                    fs::remove_file(entry.path())?;
                }
            }
        }

        debug!(target: "installer", %platform, employee = %employee_name, "swept employee files");
    }

    Ok(())
}
