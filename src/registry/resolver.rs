//! Dependency resolution.
//!
//! Given a set of requested skill fullNames, fetches the transitive
//! dependency closure, rejects cycles, and produces a deterministic
//! installation order (dependencies first) plus an advisory display tree
//! per requested root.
//!
//! The fetch cache lives on the resolver instance, scoped to its
//! lifetime; construct one resolver per logical resolve.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::{CrewError, Result};
use crate::registry::client::SkillSource;
use crate::schema::Skill;

#[derive(Debug)]
pub struct Resolution {
    /// Skills in installation order: every in-set dependency precedes
    /// its dependents.
    pub install_order: Vec<Skill>,
    /// One advisory tree per requested root, in request order.
    pub trees: Vec<DependencyNode>,
}

#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub full_name: String,
    pub version: String,
    pub children: Vec<DependencyNode>,
}

pub struct DependencyResolver<'a> {
    source: &'a dyn SkillSource,
    cache: HashMap<String, Skill>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(source: &'a dyn SkillSource) -> Self {
        Self {
            source,
            cache: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, requested: &[String]) -> Result<Resolution> {
        let mut visited = HashSet::new();
        let mut discovered: Vec<Skill> = Vec::new();

        for name in requested {
            let mut path = Vec::new();
            self.fetch_with_dependencies(name, &mut visited, &mut path, &mut discovered)?;
        }

        let unique = dedup_skills(discovered);
        let install_order = topological_sort(unique)?;
        debug!(target: "resolver", count = install_order.len(), "resolved install order");

        let by_name: HashMap<&str, &Skill> = install_order
            .iter()
            .map(|s| (s.full_name.as_str(), s))
            .collect();
        let trees = requested
            .iter()
            .map(|name| build_tree(name, &by_name, &HashSet::new()))
            .collect();

        Ok(Resolution {
            install_order,
            trees,
        })
    }

    /// Depth-first traversal with an explicit path stack for precise
    /// cycle reporting. Appends skills post-order (dependencies first).
    fn fetch_with_dependencies(
        &mut self,
        name: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
        out: &mut Vec<Skill>,
    ) -> Result<()> {
        if path.iter().any(|p| p == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(CrewError::CircularDependency { cycle });
        }

        if !visited.insert(name.to_string()) {
            return Ok(());
        }

        let skill = match self.cache.get(name) {
            Some(skill) => skill.clone(),
            None => {
                let fetched = self.source.fetch_skill(name)?;
                self.cache.insert(name.to_string(), fetched.clone());
                fetched
            }
        };

        path.push(name.to_string());
        for dep in &skill.dependencies {
            self.fetch_with_dependencies(dep, visited, path, out)?;
        }
        path.pop();

        out.push(skill);
        Ok(())
    }
}

/// Keep the first occurrence of each fullName.
fn dedup_skills(skills: Vec<Skill>) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter(|s| seen.insert(s.full_name.clone()))
        .collect()
}

/// Kahn's algorithm over edges `dependency → dependent`, restricted to
/// dependencies inside the set. Zero-in-degree nodes are processed in
/// insertion order, so the result is deterministic for a fixed input.
fn topological_sort(skills: Vec<Skill>) -> Result<Vec<Skill>> {
    let order: Vec<String> = skills.iter().map(|s| s.full_name.clone()).collect();
    let mut by_name: HashMap<String, Skill> = skills
        .into_iter()
        .map(|s| (s.full_name.clone(), s))
        .collect();

    let mut in_degree: HashMap<String, usize> = order.iter().map(|n| (n.clone(), 0)).collect();
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();

    for name in &order {
        for dep in &by_name[name].dependencies {
            // Dependencies outside the set were already validated to
            // exist during traversal; they don't constrain ordering.
            if in_degree.contains_key(dep) {
                edges.entry(dep.clone()).or_default().push(name.clone());
                *in_degree.get_mut(name).expect("node in set") += 1;
            }
        }
    }

    let mut queue: VecDeque<String> = order
        .iter()
        .filter(|n| in_degree[*n] == 0)
        .cloned()
        .collect();

    let mut sorted_names: Vec<String> = Vec::with_capacity(order.len());
    while let Some(node) = queue.pop_front() {
        if let Some(dependents) = edges.get(&node) {
            for dependent in dependents.clone() {
                let degree = in_degree.get_mut(&dependent).expect("node in set");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
        sorted_names.push(node);
    }

    // Unreachable if traversal cycle detection is sound; guards against
    // resolver/fetch inconsistencies.
    if sorted_names.len() != order.len() {
        let stuck: Vec<String> = order
            .iter()
            .filter(|n| !sorted_names.contains(n))
            .cloned()
            .collect();
        return Err(CrewError::CircularDependency { cycle: stuck });
    }

    Ok(sorted_names
        .into_iter()
        .map(|n| by_name.remove(&n).expect("sorted name came from the set"))
        .collect())
}

/// Advisory display tree. Re-visited nodes are labeled rather than
/// recursed into; the install order is the authoritative output.
fn build_tree(
    name: &str,
    by_name: &HashMap<&str, &Skill>,
    visited: &HashSet<String>,
) -> DependencyNode {
    let Some(skill) = by_name.get(name) else {
        return DependencyNode {
            full_name: name.to_string(),
            version: "unknown".to_string(),
            children: Vec::new(),
        };
    };

    if visited.contains(name) {
        return DependencyNode {
            full_name: format!("{name} (circular)"),
            version: skill.version.clone(),
            children: Vec::new(),
        };
    }

    let mut next_visited = visited.clone();
    next_visited.insert(name.to_string());

    let children = skill
        .dependencies
        .iter()
        .filter(|dep| by_name.contains_key(dep.as_str()))
        .map(|dep| build_tree(dep, by_name, &next_visited))
        .collect();

    DependencyNode {
        full_name: name.to_string(),
        version: skill.version.clone(),
        children,
    }
}

/// Render a dependency tree with ASCII branches.
pub fn format_tree(node: &DependencyNode) -> String {
    let mut lines = vec![format!("{} ({})", node.full_name, node.version)];
    format_children(&node.children, "", &mut lines);
    lines.join("\n")
}

fn format_children(nodes: &[DependencyNode], prefix: &str, lines: &mut Vec<String>) {
    for (index, node) in nodes.iter().enumerate() {
        let last = index == nodes.len() - 1;
        let connector = if last { "└── " } else { "├── " };
        let extension = if last { "    " } else { "│   " };
        lines.push(format!(
            "{prefix}{connector}{} ({})",
            node.full_name, node.version
        ));
        format_children(&node.children, &format!("{prefix}{extension}"), lines);
    }
}
