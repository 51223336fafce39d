//! Employee descriptor and registry index types.

use serde::{Deserialize, Serialize};

use crate::error::{CrewError, Result};
use crate::schema::skill::{FileType, SkillFile, SkillSummary};

/// A skill bundled inside an employee, with its files inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub files: Vec<SkillFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    pub name: String,
    pub files: Vec<SkillFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocDef {
    pub name: String,
    pub files: Vec<SkillFile>,
}

/// Full employee descriptor: a bundle of skills and commands plus
/// declared dependencies on shared skills (`_shared` namespace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub skills: Vec<SkillDef>,
    #[serde(default)]
    pub commands: Vec<CommandDef>,
    #[serde(default)]
    pub docs: Vec<DocDef>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Employee {
    /// Command-typed files are reserved for command definitions.
    pub fn validate(&self) -> Result<()> {
        for skill in &self.skills {
            if skill.files.iter().any(|f| f.file_type == FileType::Command) {
                return Err(CrewError::Validation(format!(
                    "employee '{}' skill '{}' contains a command-typed file",
                    self.name, skill.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "skillCount", default)]
    pub skill_count: Option<usize>,
    #[serde(rename = "commandCount", default)]
    pub command_count: Option<usize>,
}

/// Registry discovery index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryIndex {
    #[serde(default)]
    pub employees: Vec<EmployeeSummary>,
    #[serde(default)]
    pub skills: Vec<SkillSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_descriptor_roundtrip() {
        let json = r#"{
            "name": "backend",
            "role": "Backend Engineer",
            "skills": [
                {"name": "init", "files": [
                    {"path": "skills/init/SKILL.md", "type": "skill", "content": "---\nname: init\n---\n"}
                ]}
            ],
            "commands": [
                {"name": "plan", "files": [
                    {"path": "commands/plan.md", "type": "command", "content": "plan"}
                ]}
            ],
            "dependencies": ["@crew/_shared/code-review"]
        }"#;
        let emp: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(emp.name, "backend");
        assert_eq!(emp.skills.len(), 1);
        assert_eq!(emp.dependencies, vec!["@crew/_shared/code-review"]);
        assert!(emp.validate().is_ok());
    }

    #[test]
    fn command_file_in_skill_is_rejected() {
        let json = r#"{
            "name": "backend",
            "role": "Backend Engineer",
            "skills": [
                {"name": "init", "files": [
                    {"path": "x.md", "type": "command", "content": "x"}
                ]}
            ]
        }"#;
        let emp: Employee = serde_json::from_str(json).unwrap();
        assert!(emp.validate().is_err());
    }
}
