//! Registry client.
//!
//! Fetches typed employee/skill descriptors and the discovery index from
//! a registry named in `crew.json`. A registry URL template either points
//! at a local directory (`file://./registry/{name}.json`) or a remote
//! HTTP endpoint; both are interchangeable behind this interface.
//!
//! Network fetches carry a bounded timeout and are never retried here;
//! retrying is the caller's call.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::config::{RegistryConfig, State};
use crate::error::{CrewError, Result};
use crate::schema::{Employee, RegistryIndex, Skill};
use crate::target::{parse_skill_full_name, Target, DEFAULT_REGISTRY};

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Narrow fetch contract the dependency resolver consumes. Lets tests
/// drive the resolver from an in-memory skill set.
pub trait SkillSource {
    fn fetch_skill(&self, full_name: &str) -> Result<Skill>;
}

pub struct RegistryClient<'a> {
    state: &'a State,
    cwd: PathBuf,
    http: reqwest::blocking::Client,
    timeout_ms: u64,
}

impl<'a> RegistryClient<'a> {
    pub fn new(state: &'a State, cwd: &Path) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self {
            state,
            cwd: cwd.to_path_buf(),
            http,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    fn registry(&self, key: &str) -> Result<&RegistryConfig> {
        self.state
            .registries
            .get(key)
            .ok_or_else(|| CrewError::RegistryNotConfigured(key.to_string()))
    }

    /// Fetch an employee descriptor by reference (e.g. `@crew/pm`).
    pub fn fetch_employee(&self, target: &Target) -> Result<Employee> {
        let registry = self.registry(&target.registry)?;
        let url = registry.url_template().replace("{name}", &target.name);
        debug!(target: "registry", url = %url, "fetch employee");

        let value = self.fetch_json(&url, registry, || {
            CrewError::EmployeeNotFound(target.full_name.clone())
        })?;
        let employee: Employee = serde_json::from_value(value).map_err(|err| {
            CrewError::Validation(format!("invalid employee descriptor at {url}: {err}"))
        })?;
        employee.validate()?;
        Ok(employee)
    }

    /// Fetch the registry discovery index. A missing index is treated as
    /// an empty registry, not an error.
    pub fn fetch_index(&self, registry_key: Option<&str>) -> Result<RegistryIndex> {
        let key = registry_key.unwrap_or(DEFAULT_REGISTRY);
        let registry = self.registry(key)?;
        let url = registry.url_template().replace("{name}", "index");

        match self.fetch_json(&url, registry, || CrewError::EmployeeNotFound("index".into())) {
            Ok(value) => serde_json::from_value(value).map_err(|err| {
                CrewError::Validation(format!("invalid registry index at {url}: {err}"))
            }),
            Err(CrewError::EmployeeNotFound(_)) => Ok(RegistryIndex::default()),
            Err(err) => Err(err),
        }
    }

    fn skill_url(&self, registry: &RegistryConfig, full_name: &str) -> Result<String> {
        let (reg, group, skill) = parse_skill_full_name(full_name).ok_or_else(|| {
            CrewError::Validation(format!(
                "skill fullName '{full_name}' must have the shape @registry/group/skill"
            ))
        })?;
        let base = registry.url_template().replace("{name}.json", "");
        Ok(format!(
            "{base}skills/{}/{group}/{skill}.json",
            reg.trim_start_matches('@')
        ))
    }

    fn fetch_json(
        &self,
        url: &str,
        registry: &RegistryConfig,
        not_found: impl Fn() -> CrewError,
    ) -> Result<serde_json::Value> {
        if let Some(rest) = url.strip_prefix("file://") {
            let path = PathBuf::from(rest);
            let resolved = if path.is_absolute() {
                path
            } else {
                self.cwd.join(path)
            };
            if !resolved.exists() {
                return Err(not_found());
            }
            let raw = std::fs::read_to_string(&resolved)?;
            return serde_json::from_str(&raw).map_err(|err| {
                CrewError::Validation(format!("invalid JSON at {}: {err}", resolved.display()))
            });
        }

        let mut request = self.http.get(url);
        if let Some(headers) = registry.headers() {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        let response = request.send().map_err(|err| {
            if err.is_timeout() {
                CrewError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                CrewError::Network(err.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(not_found());
        }
        if !status.is_success() {
            return Err(CrewError::RegistryFetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json()
            .map_err(|err| CrewError::Network(format!("decode {url}: {err}")))
    }
}

impl SkillSource for RegistryClient<'_> {
    fn fetch_skill(&self, full_name: &str) -> Result<Skill> {
        let (registry_key, _, _) = parse_skill_full_name(full_name).ok_or_else(|| {
            CrewError::Validation(format!(
                "skill fullName '{full_name}' must have the shape @registry/group/skill"
            ))
        })?;
        let registry = self.registry(&registry_key)?;
        let url = self.skill_url(registry, full_name)?;
        debug!(target: "registry", url = %url, "fetch skill");

        let value = self.fetch_json(&url, registry, || {
            CrewError::SkillNotFound(full_name.to_string())
        })?;
        let skill: Skill = serde_json::from_value(value).map_err(|err| {
            CrewError::Validation(format!("invalid skill descriptor at {url}: {err}"))
        })?;
        skill.validate()?;
        Ok(skill)
    }
}
