//! Vigil Core - Foundation types for host check evaluation
//!
//! This crate provides the core abstractions used throughout the Vigil engine:
//! - `Check`, `Method`, `Probe`, `Filter`: declarative check definitions
//! - `Match`: quantifiers turning hit counts into verdicts
//! - `Target`: OS/CPE/label restrictions gating where a check applies
//! - `KnowledgeBase`: the host facts a run evaluates against
//! - `Anomaly`, `CheckResult`, `CheckResults`: what a run produces
//! - `FilterPlugin`, `ParserPlugin`: the plugin contracts

pub mod anomaly;
pub mod check;
pub mod cpe;
pub mod error;
pub mod hint;
pub mod knowledge;
pub mod plugin;
pub mod quantifier;
pub mod severity;
pub mod target;

// Re-export commonly used types at crate root
pub use anomaly::{Anomaly, AnomalyType, CheckResult, CheckResults, ProbeError, RunSummary};
pub use check::{Check, Filter, Method, Mode, Probe, ResultContext};
pub use cpe::{Cpe, CpeParseError};
pub use error::{ConfigError, Error, Result};
pub use hint::Hint;
pub use knowledge::{ArtifactSource, HostFacts, Item, KnowledgeBase, KnowledgeBaseSource, Resource};
pub use plugin::{CompiledFilter, FilterPlugin, FilterVerdict, ParserPlugin};
pub use quantifier::{ListPolicy, Match, MATCH_LIST_POLICY};
pub use severity::Severity;
pub use target::Target;
