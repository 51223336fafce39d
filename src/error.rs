//! Error taxonomy for crew.
//!
//! Every domain error carries a stable machine code (for scripting against
//! robot output) and an actionable suggestion string.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrewError>;

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("Circular dependency detected: {}", cycle.join(" → "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Employee '{0}' not found in registry.")]
    EmployeeNotFound(String),

    #[error("Skill '{0}' not found in registry.")]
    SkillNotFound(String),

    #[error("Failed to fetch from registry: {url} (status: {status})")]
    RegistryFetch { url: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Registry '{0}' not found in crew.json.")]
    RegistryNotConfigured(String),

    #[error("No crew.json found in current directory.")]
    NotInitialized,

    #[error("crew.json already exists in current directory.")]
    ConfigExists,

    #[error("Invalid crew.json: {0}")]
    ConfigInvalid(String),

    #[error("Platform '{0}' is not configured.")]
    PlatformNotConfigured(String),

    #[error("{} file(s) already exist (first: {})", paths.len(), paths.first().map(String::as_str).unwrap_or(""))]
    FileConflicts { paths: Vec<String> },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl CrewError {
    /// Stable machine-readable code, kept backward compatible.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CircularDependency { .. } => "CIRCULAR_DEPENDENCY",
            Self::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            Self::SkillNotFound(_) => "SKILL_NOT_FOUND",
            Self::RegistryFetch { .. } => "FETCH_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
            Self::RegistryNotConfigured(_) => "REGISTRY_NOT_CONFIGURED",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::ConfigExists => "CONFIG_EXISTS",
            Self::ConfigInvalid(_) => "CONFIG_INVALID",
            Self::PlatformNotConfigured(_) => "PLATFORM_NOT_SUPPORTED",
            Self::FileConflicts { .. } => "FILE_EXISTS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Human-actionable guidance printed under the error message.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::CircularDependency { .. } => {
                "Check your skill dependencies for circular references."
            }
            Self::EmployeeNotFound(_) => "Use `crew list` to see installed employees.",
            Self::SkillNotFound(_) => "Use `crew list --skills` to see installed skills.",
            Self::RegistryFetch { .. } => "Verify the registry URL is correct and accessible.",
            Self::Network(_) => "Check your internet connection and try again.",
            Self::Timeout { .. } => "The request timed out. Try again or check your network.",
            Self::RegistryNotConfigured(_) => {
                "Add the registry under `registries` in crew.json."
            }
            Self::NotInitialized => "Run `crew init` to initialize the project.",
            Self::ConfigExists => "Use `crew init --force` to overwrite existing config.",
            Self::ConfigInvalid(_) => {
                "Check crew.json for syntax errors or run `crew init --force`."
            }
            Self::PlatformNotConfigured(_) => "Supported platforms: claude-code, codex.",
            Self::FileConflicts { .. } => "Use `--overwrite` to replace existing files.",
            Self::Validation(_) => "Check the input format and try again.",
            Self::Io(_) => "Check file permissions and disk space.",
            Self::Json(_) => "The file contains invalid JSON. Check for syntax errors.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_full_path() {
        let err = CrewError::CircularDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: a → b → a");
        assert_eq!(err.code(), "CIRCULAR_DEPENDENCY");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(CrewError::NotInitialized.code(), "NOT_INITIALIZED");
        assert_eq!(
            CrewError::RegistryFetch {
                url: "https://x".into(),
                status: 500
            }
            .code(),
            "FETCH_ERROR"
        );
    }
}
