//! Skill descriptor and SKILL.md frontmatter handling.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CrewError, Result};
use crate::target::parse_skill_full_name;

/// Role of a file inside a skill or employee bundle.
///
/// `command` is reserved for command definitions; skill files must not
/// carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Skill,
    Command,
    Doc,
    Reference,
    Script,
    Asset,
}

/// A file with embedded content, as shipped in registry descriptors.
///
/// Content stays opaque; the installer only ever inspects it for the one
/// frontmatter `name:` rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFile {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpDependency {
    pub name: String,
    pub package: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "docsUrl", default)]
    pub docs_url: String,
}

/// Full skill descriptor from the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(rename = "mcpDependencies", default)]
    pub mcp_dependencies: Vec<McpDependency>,
    pub files: Vec<SkillFile>,
}

impl Skill {
    /// Validate the invariants a registry is supposed to uphold:
    /// a well-formed 3-segment fullName and no command-typed files.
    pub fn validate(&self) -> Result<()> {
        if parse_skill_full_name(&self.full_name).is_none() {
            return Err(CrewError::Validation(format!(
                "skill fullName '{}' must have the shape @registry/group/skill",
                self.full_name
            )));
        }
        if self.files.iter().any(|f| f.file_type == FileType::Command) {
            return Err(CrewError::Validation(format!(
                "skill '{}' contains a command-typed file; commands belong to employees",
                self.full_name
            )));
        }
        Ok(())
    }
}

/// Summary entry from the skills index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSummary {
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ============================================================================
// SKILL.md frontmatter
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFrontmatter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Parse the YAML frontmatter of a SKILL.md document, if present.
pub fn parse_skill_frontmatter(content: &str) -> Option<SkillFrontmatter> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let rest = content.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
    let end = rest.find("\n---")?;
    serde_yaml::from_str(&rest[..end]).ok()
}

fn frontmatter_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(name:[ \t]*).*$").expect("frontmatter name regex"))
}

/// Rewrite the `name:` field inside a SKILL.md frontmatter block so the
/// installed skill's identity matches its directory name.
///
/// The rewrite is bounded to the frontmatter block, so a `name:` in the
/// body is never touched. Returns the content unchanged when there is
/// no frontmatter or the frontmatter has no `name:` field.
pub fn rewrite_frontmatter_name(content: &str, new_name: &str) -> String {
    let Some(rest) = content.strip_prefix("---") else {
        return content.to_string();
    };
    let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
        return content.to_string();
    };
    let Some(end) = rest.find("\n---") else {
        return content.to_string();
    };

    // Opening fence plus frontmatter lines, up to the closing fence.
    let block_len = (content.len() - rest.len()) + end + 1;
    let (block, body) = content.split_at(block_len);
    let rewritten = frontmatter_name_re().replace(block, format!("${{1}}{new_name}"));
    format!("{rewritten}{body}")
}
