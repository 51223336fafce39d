//! crew - install AI employee bundles and skills into your project.
//!
//! The crate is organized around four collaborators:
//! - `registry`: fetches typed employee/skill descriptors from local or
//!   remote registries and resolves inter-skill dependencies
//! - `config`: the persisted installation state in `crew.json`
//! - `installer`: writes/removes files per platform and reconciles
//!   shared-skill reference counts
//! - `cli`: clap command surface wiring the above together

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod installer;
pub mod registry;
pub mod schema;
pub mod target;

pub use error::{CrewError, Result};
