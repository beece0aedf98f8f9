//! Request-level restrictions on a catalog run

use serde::{Deserialize, Serialize};
use vigil_checks::CompiledCheck;
use vigil_core::Target;

/// Arguments of one catalog run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFlowArgs {
    #[serde(default)]
    pub only_os: Vec<String>,
    #[serde(default)]
    pub only_cpe: Vec<String>,
    #[serde(default)]
    pub only_label: Vec<String>,
    /// Anomalies per check; `None` falls back to the engine default
    #[serde(default)]
    pub max_findings: Option<usize>,
    /// Allow-list of check ids; empty means every check
    #[serde(default)]
    pub restrict_checks: Vec<String>,
}

impl CheckFlowArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_os(mut self, os: impl Into<String>) -> Self {
        self.only_os.push(os.into());
        self
    }

    pub fn only_cpe(mut self, cpe: impl Into<String>) -> Self {
        self.only_cpe.push(cpe.into());
        self
    }

    pub fn only_label(mut self, label: impl Into<String>) -> Self {
        self.only_label.push(label.into());
        self
    }

    pub fn max_findings(mut self, max: usize) -> Self {
        self.max_findings = Some(max);
        self
    }

    pub fn restrict_to(mut self, check_id: impl Into<String>) -> Self {
        self.restrict_checks.push(check_id.into());
        self
    }

    /// The `only_*` dimensions as a target
    pub fn request_target(&self) -> Target {
        Target {
            cpe: self.only_cpe.clone(),
            os: self.only_os.clone(),
            label: self.only_label.clone(),
        }
    }

    /// Whether a check is selected: allow-listed, and its target intersects the request
    pub fn selects(&self, check: &CompiledCheck, request: &Target) -> bool {
        let allowed = self.restrict_checks.is_empty()
            || self.restrict_checks.iter().any(|id| *id == check.check_id);

        allowed && check.target.as_ref().map_or(true, |t| t.overlaps(request))
    }
}
