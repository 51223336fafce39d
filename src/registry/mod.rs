//! Registry access: descriptor fetching and dependency resolution.

pub mod client;
pub mod resolver;

pub use client::{RegistryClient, SkillSource};
pub use resolver::{format_tree, DependencyNode, DependencyResolver, Resolution};
