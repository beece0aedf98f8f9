//! Anomalies and check results - what an evaluation run produces

use crate::error::ConfigError;
use crate::knowledge::KnowledgeBase;
use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Where an anomaly came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    /// Raised by check analysis of artifact data
    #[default]
    AnalysisAnomaly,
    /// Reported by an artifact parser and passed through by a probe
    ParserAnomaly,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::AnalysisAnomaly => "ANALYSIS_ANOMALY",
            AnomalyType::ParserAnomaly => "PARSER_ANOMALY",
        }
    }
}

/// A structured finding emitted when a check's verdict is true
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    /// Unique anomaly ID
    pub id: Uuid,

    /// Check that generated this anomaly
    pub check_id: String,
    pub anomaly_type: AnomalyType,
    pub severity: Severity,

    /// Operator-facing text, from the effective hint
    pub symptom: String,
    pub explanation: Option<String>,
    pub summary: Option<String>,

    /// Rendered matched items
    #[serde(default)]
    pub finding: Vec<String>,

    /// Artifact the matched items came from
    pub artifact: String,

    pub generated_at: DateTime<Utc>,
}

impl Anomaly {
    /// Create a new anomaly builder
    pub fn builder(check_id: impl Into<String>, artifact: impl Into<String>) -> AnomalyBuilder {
        AnomalyBuilder::new(check_id, artifact)
    }
}

/// Builder for constructing anomalies
pub struct AnomalyBuilder {
    anomaly: Anomaly,
}

impl AnomalyBuilder {
    pub fn new(check_id: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            anomaly: Anomaly {
                id: Uuid::new_v4(),
                check_id: check_id.into(),
                anomaly_type: AnomalyType::AnalysisAnomaly,
                severity: Severity::default(),
                symptom: String::new(),
                explanation: None,
                summary: None,
                finding: Vec::new(),
                artifact: artifact.into(),
                generated_at: Utc::now(),
            },
        }
    }

    pub fn anomaly_type(mut self, anomaly_type: AnomalyType) -> Self {
        self.anomaly.anomaly_type = anomaly_type;
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.anomaly.severity = severity;
        self
    }

    pub fn symptom(mut self, symptom: impl Into<String>) -> Self {
        self.anomaly.symptom = symptom.into();
        self
    }

    pub fn explanation(mut self, explanation: Option<String>) -> Self {
        self.anomaly.explanation = explanation;
        self
    }

    pub fn summary(mut self, summary: Option<String>) -> Self {
        self.anomaly.summary = summary;
        self
    }

    pub fn finding(mut self, finding: Vec<String>) -> Self {
        self.anomaly.finding = finding;
        self
    }

    pub fn build(self) -> Anomaly {
        self.anomaly
    }
}

/// A probe that could not run because of its configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeError {
    pub artifact: String,
    pub code: String,
    pub message: String,
}

impl ProbeError {
    pub fn new(artifact: impl Into<String>, error: &ConfigError) -> Self {
        Self {
            artifact: artifact.into(),
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one check that applied to the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    /// Configuration errors hit while evaluating, kept apart from findings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ProbeError>,
}

impl CheckResult {
    pub fn new(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            anomalies: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Whether the check found anything
    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Checks selected by the request
    pub selected: usize,
    /// Checks fully evaluated
    pub evaluated: usize,
    /// Checks whose verdict was true
    pub matched: usize,
    /// Checks gated out by target, or with no applicable method
    pub not_applicable: usize,
    /// Checks that reported configuration errors
    pub errored: usize,
    /// Checks not evaluated because the run was cancelled
    pub skipped: usize,
}

/// Everything one evaluation run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResults {
    pub knowledge_base: Arc<KnowledgeBase>,
    pub results: Vec<CheckResult>,
    pub summary: RunSummary,
    #[serde(default)]
    pub cancelled: bool,
}

impl CheckResults {
    /// Result for a check id, if one was emitted
    pub fn get(&self, check_id: &str) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.check_id == check_id)
    }

    /// Ids of checks that emitted a result, in order
    pub fn check_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.check_id.as_str()).collect()
    }

    pub fn anomaly_count(&self) -> usize {
        self.results.iter().map(|r| r.anomalies.len()).sum()
    }
}
