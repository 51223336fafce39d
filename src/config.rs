//! Persisted installation state (`crew.json`).
//!
//! The state file is the source of truth for what is installed. Every
//! mutation goes through one discipline: load the full file, apply one
//! logical change in memory, write the full file back. There is no
//! partial-write API and no locking; one CLI invocation is the only
//! writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CrewError, Result};
use crate::installer::platform::Platform;
use crate::target::DEFAULT_REGISTRY;

pub const STATE_FILENAME: &str = "crew.json";
pub const DEFAULT_REGISTRY_URL: &str = "https://crew-registry.dev/r/{name}.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformPaths {
    pub skills: String,
    pub commands: String,
}

/// A registry is either a bare URL template or a template with headers.
/// The template must contain a `{name}` placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryConfig {
    Url(String),
    Detailed {
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
}

impl RegistryConfig {
    pub fn url_template(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Detailed { url, .. } => url,
        }
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Url(_) => None,
            Self::Detailed { headers, .. } => Some(headers),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeState {
    #[serde(rename = "installedAt")]
    pub installed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillOrigin {
    Standalone,
    Employee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillState {
    pub version: String,
    #[serde(rename = "installedAt")]
    pub installed_at: String,
    pub source: SkillOrigin,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

/// Reference-counted shared skill entry. The entry exists iff at least
/// one employee still uses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedSkillState {
    pub version: String,
    #[serde(rename = "installedAt")]
    pub installed_at: String,
    #[serde(rename = "usedBy")]
    pub used_by: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

/// The full `crew.json` document.
///
/// Unknown top-level keys round-trip through `extra` so a newer tool's
/// fields survive writes by an older one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "defaultPlatform")]
    pub default_platform: Platform,
    pub platforms: BTreeMap<Platform, PlatformPaths>,
    #[serde(default)]
    pub employees: BTreeMap<String, EmployeeState>,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillState>,
    #[serde(rename = "sharedSkills", default)]
    pub shared_skills: BTreeMap<String, SharedSkillState>,
    #[serde(default)]
    pub registries: BTreeMap<String, RegistryConfig>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl State {
    pub fn with_defaults(default_platform: Platform) -> Self {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            Platform::ClaudeCode,
            PlatformPaths {
                skills: ".claude/skills".to_string(),
                commands: ".claude/commands".to_string(),
            },
        );
        // Codex prompts are global: install once, available everywhere.
        platforms.insert(
            Platform::Codex,
            PlatformPaths {
                skills: ".codex/skills".to_string(),
                commands: "~/.codex/prompts".to_string(),
            },
        );

        let mut registries = BTreeMap::new();
        registries.insert(
            DEFAULT_REGISTRY.to_string(),
            RegistryConfig::Url(DEFAULT_REGISTRY_URL.to_string()),
        );

        Self {
            default_platform,
            platforms,
            employees: BTreeMap::new(),
            skills: BTreeMap::new(),
            shared_skills: BTreeMap::new(),
            registries,
            extra: BTreeMap::new(),
        }
    }

    /// True if the skill is recorded either standalone or inside any
    /// installed employee.
    pub fn is_skill_installed(&self, full_name: &str, skill_name: &str) -> bool {
        if self.skills.contains_key(full_name) {
            return true;
        }
        self.employees
            .values()
            .any(|emp| emp.skills.iter().any(|s| s == skill_name))
    }

    pub fn is_shared_skill_installed(&self, full_name: &str) -> bool {
        self.shared_skills.contains_key(full_name)
    }

    /// The employee that owns a skill name, if any.
    pub fn owning_employee(&self, skill_name: &str) -> Option<&str> {
        self.employees
            .iter()
            .find(|(_, emp)| emp.skills.iter().any(|s| s == skill_name))
            .map(|(name, _)| name.as_str())
    }

    pub fn installed_standalone_skills(&self) -> Vec<String> {
        self.skills.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddReference {
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReference {
    pub should_uninstall: bool,
    pub remaining_users: Vec<String>,
}

/// Handle on a `crew.json` path. All mutating operations reload and
/// rewrite the whole document.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn in_dir(cwd: &Path) -> Self {
        Self {
            path: cwd.join(STATE_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<State> {
        if !self.path.exists() {
            return Err(CrewError::NotInitialized);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw)
            .map_err(|err| CrewError::ConfigInvalid(format!("{}: {err}", self.path.display())))
    }

    pub fn save(&self, state: &State) -> Result<()> {
        let payload = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, payload + "\n")?;
        Ok(())
    }

    /// Create the state file. Refuses to clobber an existing one unless
    /// `force` is set.
    pub fn init(&self, state: &State, force: bool) -> Result<()> {
        if self.exists() && !force {
            return Err(CrewError::ConfigExists);
        }
        self.save(state)
    }

    // ------------------------------------------------------------------
    // Employees
    // ------------------------------------------------------------------

    pub fn record_employee(
        &self,
        name: &str,
        version: Option<String>,
        skills: Vec<String>,
        commands: Vec<String>,
        platforms: Vec<Platform>,
    ) -> Result<()> {
        let mut state = self.load()?;
        state.employees.insert(
            name.to_string(),
            EmployeeState {
                installed_at: Utc::now().to_rfc3339(),
                version,
                skills,
                commands,
                platforms,
            },
        );
        self.save(&state)
    }

    pub fn remove_employee(&self, name: &str) -> Result<()> {
        let mut state = self.load()?;
        state.employees.remove(name);
        self.save(&state)
    }

    // ------------------------------------------------------------------
    // Standalone skills
    // ------------------------------------------------------------------

    pub fn record_skill(
        &self,
        full_name: &str,
        version: &str,
        source: SkillOrigin,
        platforms: Vec<Platform>,
    ) -> Result<()> {
        let mut state = self.load()?;
        state.skills.insert(
            full_name.to_string(),
            SkillState {
                version: version.to_string(),
                installed_at: Utc::now().to_rfc3339(),
                source,
                platforms,
            },
        );
        self.save(&state)
    }

    pub fn remove_skill(&self, full_name: &str) -> Result<()> {
        let mut state = self.load()?;
        state.skills.remove(full_name);
        self.save(&state)
    }

    // ------------------------------------------------------------------
    // Shared skills (reference counted)
    // ------------------------------------------------------------------

    /// Add `employee` to a shared skill's user set. Idempotent: repeated
    /// calls with the same employee never duplicate the reference.
    pub fn add_shared_skill_reference(
        &self,
        full_name: &str,
        employee: &str,
        version: &str,
        platforms: &[Platform],
    ) -> Result<AddReference> {
        let mut state = self.load()?;

        if let Some(entry) = state.shared_skills.get_mut(full_name) {
            if !entry.used_by.iter().any(|e| e == employee) {
                entry.used_by.push(employee.to_string());
            }
            for platform in platforms {
                if !entry.platforms.contains(platform) {
                    entry.platforms.push(*platform);
                }
            }
            self.save(&state)?;
            return Ok(AddReference { is_new: false });
        }

        state.shared_skills.insert(
            full_name.to_string(),
            SharedSkillState {
                version: version.to_string(),
                installed_at: Utc::now().to_rfc3339(),
                used_by: vec![employee.to_string()],
                platforms: platforms.to_vec(),
            },
        );
        self.save(&state)?;
        Ok(AddReference { is_new: true })
    }

    /// Drop `employee` from a shared skill's user set. When the set
    /// empties, the entry is deleted and the caller must remove the
    /// installed files. A missing entry is a tolerated no-op, because
    /// removal runs on best-effort dependency discovery.
    pub fn remove_shared_skill_reference(
        &self,
        full_name: &str,
        employee: &str,
    ) -> Result<ReleaseReference> {
        let mut state = self.load()?;

        let Some(entry) = state.shared_skills.get_mut(full_name) else {
            return Ok(ReleaseReference {
                should_uninstall: false,
                remaining_users: Vec::new(),
            });
        };

        entry.used_by.retain(|e| e != employee);

        if entry.used_by.is_empty() {
            state.shared_skills.remove(full_name);
            self.save(&state)?;
            return Ok(ReleaseReference {
                should_uninstall: true,
                remaining_users: Vec::new(),
            });
        }

        let remaining = entry.used_by.clone();
        self.save(&state)?;
        Ok(ReleaseReference {
            should_uninstall: false,
            remaining_users: remaining,
        })
    }
}

// ============================================================================
// Platform path resolution
// ============================================================================

fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve a platform's skills and commands directories: `~` expands to
/// the home directory, relative paths resolve against `cwd`.
pub fn resolve_platform_paths(
    cwd: &Path,
    state: &State,
    platform: Platform,
) -> Result<(PathBuf, PathBuf)> {
    let paths = state
        .platforms
        .get(&platform)
        .ok_or_else(|| CrewError::PlatformNotConfigured(platform.to_string()))?;

    let resolve = |raw: &str| -> PathBuf {
        let expanded = expand_tilde(raw);
        if expanded.is_absolute() {
            expanded
        } else {
            cwd.join(expanded)
        }
    };

    Ok((resolve(&paths.skills), resolve(&paths.commands)))
}
