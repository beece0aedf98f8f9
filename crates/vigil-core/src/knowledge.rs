//! Host knowledge base - the facts a run evaluates checks against

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single artifact item (a package record, a config line, a file stat...)
pub type Item = serde_json::Value;

/// Opaque key/value parameters a method passes to artifact retrieval
pub type Resource = BTreeMap<String, String>;

/// Identity facts about the host the knowledge base describes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFacts {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub cpe: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Per-host collection of artifact data available to an evaluation run.
///
/// Nothing in the engine mutates a knowledge base; runs share it behind an
/// `Arc` for their whole duration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub host: HostFacts,
    #[serde(default)]
    pub artifacts: HashMap<String, Vec<Item>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.host.hostname = Some(hostname.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.host.os = Some(os.into());
        self
    }

    pub fn with_cpe(mut self, cpe: impl Into<String>) -> Self {
        self.host.cpe.push(cpe.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.host.labels.push(label.into());
        self
    }

    /// Add (or replace) the items collected for an artifact
    pub fn with_artifact(mut self, name: impl Into<String>, items: Vec<Item>) -> Self {
        self.artifacts.insert(name.into(), items);
        self
    }

    /// Items collected for an artifact, if any were
    pub fn artifact(&self, name: &str) -> Option<&[Item]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    /// Display name for logs
    pub fn host_str(&self) -> &str {
        self.host.hostname.as_deref().unwrap_or("<unknown host>")
    }
}

/// Where probes get their artifact items from.
///
/// Implementations must not block indefinitely; retrieval is expected to be an
/// in-memory lookup by the time the engine runs.
pub trait ArtifactSource: Send + Sync {
    /// Items for `artifact`, or `None` if nothing was collected under that name
    fn fetch(&self, artifact: &str, kb: &KnowledgeBase, resources: &[Resource]) -> Option<Vec<Item>>;
}

/// Reads artifacts straight out of the knowledge base, ignoring resources
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeBaseSource;

impl ArtifactSource for KnowledgeBaseSource {
    fn fetch(&self, artifact: &str, kb: &KnowledgeBase, _resources: &[Resource]) -> Option<Vec<Item>> {
        kb.artifact(artifact).map(<[Item]>::to_vec)
    }
}
