//! Declarative check definitions: Check → Method → Probe → Filter
//!
//! These are plain data. Plugin names are resolved and expressions compiled
//! when a catalog is built (see `vigil-checks`), not here.

use crate::hint::Hint;
use crate::knowledge::Resource;
use crate::quantifier::Match;
use crate::severity::Severity;
use crate::target::Target;
use serde::{Deserialize, Serialize};

/// The externally addressable unit of evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub check_id: String,
    #[serde(default, rename = "method")]
    pub methods: Vec<Method>,
    #[serde(default, rename = "match")]
    pub quantifiers: Vec<Match>,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub hint: Option<Hint>,
    #[serde(default)]
    pub severity: Severity,
}

impl Check {
    pub fn new(check_id: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            methods: Vec::new(),
            quantifiers: Vec::new(),
            target: None,
            hint: None,
            severity: Severity::default(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_match(mut self, quantifier: Match) -> Self {
        self.quantifiers.push(quantifier);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// A group of probes sharing resource parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Method {
    #[serde(default, rename = "probe")]
    pub probes: Vec<Probe>,
    #[serde(default, rename = "resource")]
    pub resources: Vec<Resource>,
    #[serde(default, rename = "match")]
    pub quantifiers: Vec<Match>,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub hint: Option<Hint>,
}

impl Method {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probe(mut self, probe: Probe) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_match(mut self, quantifier: Match) -> Self {
        self.quantifiers.push(quantifier);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }
}

/// How sibling probes within a method are executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Serial,
    Parallel,
}

/// How an artifact's items are interpreted before filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResultContext {
    /// Structured items, produced by the probe's parsers if it names any
    #[default]
    Parser,
    /// Pre-existing anomaly objects
    Anomaly,
    /// Raw, unprocessed values
    Raw,
}

/// One data-collection-and-test unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub artifact: String,
    #[serde(default, rename = "parser")]
    pub parsers: Vec<String>,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub baseline: Vec<Filter>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, rename = "match")]
    pub quantifiers: Vec<Match>,
    #[serde(default)]
    pub target: Option<Target>,
    #[serde(default)]
    pub hint: Option<Hint>,
    #[serde(default)]
    pub result_context: ResultContext,
}

impl Probe {
    pub fn new(artifact: impl Into<String>) -> Self {
        Self {
            artifact: artifact.into(),
            parsers: Vec::new(),
            mode: Mode::default(),
            baseline: Vec::new(),
            filters: Vec::new(),
            quantifiers: Vec::new(),
            target: None,
            hint: None,
            result_context: ResultContext::default(),
        }
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parsers.push(parser.into());
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_baseline(mut self, filter: Filter) -> Self {
        self.baseline.push(filter);
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_match(mut self, quantifier: Match) -> Self {
        self.quantifiers.push(quantifier);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_context(mut self, context: ResultContext) -> Self {
        self.result_context = context;
        self
    }
}

/// A named predicate or transform applied to artifact items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(rename = "type")]
    pub filter_type: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub hint: Option<Hint>,
}

impl Filter {
    pub fn new(filter_type: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            filter_type: filter_type.into(),
            expression: expression.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = Some(hint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_check() {
        let yaml = r#"
check_id: "SSH-ROOT-LOGIN"
severity: high
match: [ANY]
target:
  os: [linux]
hint:
  problem: "sshd permits root login"
  fix: "Set PermitRootLogin no"
  format: "{key} {value}"
method:
  - probe:
      - artifact: sshd_config
        parser: [key_value]
        filters:
          - type: compare
            expression: "key == PermitRootLogin"
          - type: compare
            expression: "value != no"
        match: [ANY]
"#;
        let check: Check = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(check.check_id, "SSH-ROOT-LOGIN");
        assert_eq!(check.severity, Severity::High);
        assert_eq!(check.quantifiers, vec![Match::Any]);
        assert_eq!(check.target.as_ref().unwrap().os, vec!["linux"]);

        let probe = &check.methods[0].probes[0];
        assert_eq!(probe.artifact, "sshd_config");
        assert_eq!(probe.parsers, vec!["key_value"]);
        assert_eq!(probe.mode, Mode::Serial);
        assert_eq!(probe.result_context, ResultContext::Parser);
        assert_eq!(probe.filters[1].filter_type, "compare");
    }

    #[test]
    fn test_builder() {
        let check = Check::new("C1").with_match(Match::Any).with_method(
            Method::new().with_probe(
                Probe::new("pkg_list")
                    .with_filter(Filter::new("regex", "^telnetd"))
                    .with_match(Match::Any)
                    .with_context(ResultContext::Raw),
            ),
        );
        assert_eq!(check.methods.len(), 1);
        assert_eq!(check.methods[0].probes[0].filters[0].expression, "^telnetd");
        assert_eq!(check.severity, Severity::Medium);
    }
}
