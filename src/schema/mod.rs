//! Registry descriptor types.
//!
//! These mirror the JSON documents served by a registry: full skill and
//! employee descriptors (with embedded file contents) plus the summary
//! index used for discovery.

pub mod employee;
pub mod skill;

pub use employee::{CommandDef, DocDef, Employee, EmployeeSummary, RegistryIndex, SkillDef};
pub use skill::{
    parse_skill_frontmatter, rewrite_frontmatter_name, FileType, Skill, SkillFile,
    SkillFrontmatter, SkillSummary,
};
