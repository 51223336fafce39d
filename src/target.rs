//! Target reference parsing.
//!
//! User input on the command line can name an employee (`pm`,
//! `@crew/pm`) or a skill (`@crew/pm/brainstorming`). Shared skills use
//! the `_shared` group (`@crew/_shared/code-review`).

use std::sync::OnceLock;

use regex::Regex;

pub const DEFAULT_REGISTRY: &str = "@crew";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Employee,
    Skill,
}

#[derive(Debug, Clone)]
pub struct Target {
    pub kind: TargetKind,
    pub registry: String,
    /// Leaf name: the employee or skill name.
    pub name: String,
    /// `@registry/employee` or `@registry/group/skill`.
    pub full_name: String,
}

fn skill_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(@[a-z0-9-]+)/([a-z0-9_-]+)/([a-z0-9-]+)$").expect("skill name regex")
    })
}

/// Parse user input into an employee or skill reference.
///
/// Bare names are treated as employees in the default registry.
pub fn parse_target(input: &str, default_registry: &str) -> Target {
    let trimmed = input.trim();

    if trimmed.starts_with('@') {
        let parts: Vec<&str> = trimmed.split('/').collect();
        match parts.as_slice() {
            [registry, name] => {
                return Target {
                    kind: TargetKind::Employee,
                    registry: (*registry).to_string(),
                    name: (*name).to_string(),
                    full_name: trimmed.to_string(),
                };
            }
            [registry, _group, skill] => {
                return Target {
                    kind: TargetKind::Skill,
                    registry: (*registry).to_string(),
                    name: (*skill).to_string(),
                    full_name: trimmed.to_string(),
                };
            }
            _ => {}
        }
    }

    Target {
        kind: TargetKind::Employee,
        registry: default_registry.to_string(),
        name: trimmed.to_string(),
        full_name: format!("{default_registry}/{trimmed}"),
    }
}

/// Decompose a skill fullName into (registry, group, skill).
///
/// Returns `None` unless the name has exactly three well-formed
/// segments; dependencies and installs both rely on this invariant.
pub fn parse_skill_full_name(full_name: &str) -> Option<(String, String, String)> {
    let caps = skill_re().captures(full_name)?;
    Some((caps[1].to_string(), caps[2].to_string(), caps[3].to_string()))
}

/// Whether a skill lives in the reference-counted `_shared` group.
pub fn is_shared_skill(full_name: &str) -> bool {
    parse_skill_full_name(full_name).is_some_and(|(_, group, _)| group == "_shared")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_is_employee_in_default_registry() {
        let t = parse_target("pm", DEFAULT_REGISTRY);
        assert_eq!(t.kind, TargetKind::Employee);
        assert_eq!(t.registry, "@crew");
        assert_eq!(t.full_name, "@crew/pm");
        assert_eq!(t.name, "pm");
    }

    #[test]
    fn two_segments_is_employee() {
        let t = parse_target("@other/frontend", DEFAULT_REGISTRY);
        assert_eq!(t.kind, TargetKind::Employee);
        assert_eq!(t.registry, "@other");
        assert_eq!(t.name, "frontend");
    }

    #[test]
    fn three_segments_is_skill() {
        let t = parse_target("@crew/pm/brainstorming", DEFAULT_REGISTRY);
        assert_eq!(t.kind, TargetKind::Skill);
        assert_eq!(t.name, "brainstorming");
        assert_eq!(t.full_name, "@crew/pm/brainstorming");
    }

    #[test]
    fn full_name_decomposes_into_three_segments() {
        let (reg, group, skill) = parse_skill_full_name("@crew/_shared/code-review").unwrap();
        assert_eq!(reg, "@crew");
        assert_eq!(group, "_shared");
        assert_eq!(skill, "code-review");
    }

    #[test]
    fn malformed_full_names_are_rejected() {
        assert!(parse_skill_full_name("@crew/pm").is_none());
        assert!(parse_skill_full_name("crew/pm/x").is_none());
        assert!(parse_skill_full_name("@crew/pm/x/y").is_none());
        assert!(parse_skill_full_name("@Crew/pm/x").is_none());
    }

    #[test]
    fn shared_detection() {
        assert!(is_shared_skill("@crew/_shared/code-review"));
        assert!(!is_shared_skill("@crew/pm/brainstorming"));
        assert!(!is_shared_skill("@crew/pm"));
    }
}
