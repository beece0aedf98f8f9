//! Vigil Checks - Plugin registry, built-in filters/parsers, and check catalog
//!
//! This crate provides:
//! - `PluginRegistry`: filter and parser implementations indexed by name
//! - Built-in `regex`, `attr`, `compare`, `foreach` filters and
//!   `lines`, `key_value`, `json` parsers
//! - `CheckCatalog`: check definitions with plugin names resolved once

pub mod catalog;
pub mod filters;
pub mod parsers;
pub mod registry;

pub use catalog::{
    BrokenProbe, CheckCatalog, CompiledCheck, CompiledMethod, CompiledProbe, CompiledStep,
    ProbePlan,
};
pub use registry::PluginRegistry;
