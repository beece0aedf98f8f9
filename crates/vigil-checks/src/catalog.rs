//! Check catalog - check definitions with every plugin name resolved
//!
//! Filter types and parser names are looked up, and filter expressions
//! compiled, exactly once when the catalog is built. A probe whose
//! configuration cannot be resolved is kept in the catalog as broken so it
//! can be reported at evaluation time without taking its check down with it.

use crate::PluginRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vigil_core::{
    Check, CompiledFilter, ConfigError, Error, Filter, Hint, Match, Method, Mode, ParserPlugin,
    Probe, Resource, Result, ResultContext, Severity, Target,
};

/// A filter bound to its compiled expression
#[derive(Debug)]
pub struct CompiledStep {
    pub filter_type: String,
    pub hint: Option<Hint>,
    pub filter: Box<dyn CompiledFilter>,
}

/// Everything a ready probe needs at evaluation time
pub struct ProbePlan {
    pub parsers: Vec<Arc<dyn ParserPlugin>>,
    pub baseline: Vec<CompiledStep>,
    pub filters: Vec<CompiledStep>,
    /// Hint of the last filter that carries one
    pub filter_hint: Option<Hint>,
}

impl std::fmt::Debug for ProbePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbePlan")
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("baseline", &self.baseline)
            .field("filters", &self.filters)
            .field("filter_hint", &self.filter_hint)
            .finish()
    }
}

#[derive(Debug)]
pub struct CompiledProbe {
    pub artifact: String,
    pub mode: Mode,
    pub quantifiers: Vec<Match>,
    pub target: Option<Target>,
    pub hint: Option<Hint>,
    pub result_context: ResultContext,
    /// Resolved plan, or the configuration error that prevents running it
    pub plan: std::result::Result<ProbePlan, ConfigError>,
}

impl CompiledProbe {
    pub fn is_broken(&self) -> bool {
        self.plan.is_err()
    }
}

#[derive(Debug)]
pub struct CompiledMethod {
    pub probes: Vec<CompiledProbe>,
    pub resources: Vec<Resource>,
    pub quantifiers: Vec<Match>,
    pub target: Option<Target>,
    pub hint: Option<Hint>,
}

impl CompiledMethod {
    /// Probes run concurrently only if every one of them asks for it
    pub fn is_parallel(&self) -> bool {
        !self.probes.is_empty() && self.probes.iter().all(|p| p.mode == Mode::Parallel)
    }
}

#[derive(Debug)]
pub struct CompiledCheck {
    pub check_id: String,
    pub methods: Vec<CompiledMethod>,
    pub quantifiers: Vec<Match>,
    pub target: Option<Target>,
    pub hint: Option<Hint>,
    pub severity: Severity,
}

/// A broken probe, as reported by [`CheckCatalog::broken_probes`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenProbe {
    pub check_id: String,
    pub artifact: String,
    pub error: ConfigError,
}

/// Ordered, resolved set of checks ready for evaluation
#[derive(Debug, Default)]
pub struct CheckCatalog {
    checks: Vec<Arc<CompiledCheck>>,
    /// Position in `checks`, by id
    index: HashMap<String, usize>,
}

impl CheckCatalog {
    /// Resolve a set of check definitions against a plugin registry
    pub fn build(checks: Vec<Check>, registry: &PluginRegistry) -> Result<Self> {
        let mut catalog = Self::default();

        for check in checks {
            validate(&check)?;
            if catalog.index.contains_key(&check.check_id) {
                return Err(Error::DuplicateCheck {
                    check_id: check.check_id,
                });
            }

            let compiled = compile_check(check, registry);
            debug!(
                "Compiled check {} ({} methods)",
                compiled.check_id,
                compiled.methods.len()
            );
            catalog
                .index
                .insert(compiled.check_id.clone(), catalog.checks.len());
            catalog.checks.push(Arc::new(compiled));
        }

        let broken = catalog.broken_probes();
        for probe in &broken {
            warn!(
                "Check {} probe on {} cannot run: {}",
                probe.check_id, probe.artifact, probe.error
            );
        }
        info!(
            "Built catalog with {} checks ({} broken probes)",
            catalog.len(),
            broken.len()
        );

        Ok(catalog)
    }

    /// Get a check by ID
    pub fn get(&self, id: &str) -> Option<Arc<CompiledCheck>> {
        self.index.get(id).map(|&i| Arc::clone(&self.checks[i]))
    }

    /// All check IDs, in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.check_id.as_str())
    }

    /// All checks, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledCheck>> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks with the given IDs, in the order requested
    pub fn by_ids(&self, ids: &[String]) -> Vec<Arc<CompiledCheck>> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Every probe whose configuration could not be resolved
    pub fn broken_probes(&self) -> Vec<BrokenProbe> {
        let mut broken = Vec::new();
        for check in &self.checks {
            for probe in check.methods.iter().flat_map(|m| m.probes.iter()) {
                if let Err(error) = &probe.plan {
                    broken.push(BrokenProbe {
                        check_id: check.check_id.clone(),
                        artifact: probe.artifact.clone(),
                        error: error.clone(),
                    });
                }
            }
        }
        broken
    }
}

fn validate(check: &Check) -> Result<()> {
    let invalid = |message: &str| Error::InvalidCheckDefinition {
        check_id: check.check_id.clone(),
        message: message.to_string(),
    };

    if check.check_id.trim().is_empty() {
        return Err(invalid("check_id must not be empty"));
    }
    if check.methods.is_empty() {
        return Err(invalid("a check needs at least one method"));
    }
    if check.methods.iter().any(|m| m.probes.is_empty()) {
        return Err(invalid("every method needs at least one probe"));
    }
    if check
        .methods
        .iter()
        .flat_map(|m| m.probes.iter())
        .any(|p| p.artifact.trim().is_empty())
    {
        return Err(invalid("every probe must name an artifact"));
    }
    Ok(())
}

fn compile_check(check: Check, registry: &PluginRegistry) -> CompiledCheck {
    CompiledCheck {
        check_id: check.check_id,
        methods: check
            .methods
            .into_iter()
            .map(|m| compile_method(m, registry))
            .collect(),
        quantifiers: check.quantifiers,
        target: check.target,
        hint: check.hint,
        severity: check.severity,
    }
}

fn compile_method(method: Method, registry: &PluginRegistry) -> CompiledMethod {
    CompiledMethod {
        probes: method
            .probes
            .into_iter()
            .map(|p| compile_probe(p, registry))
            .collect(),
        resources: method.resources,
        quantifiers: method.quantifiers,
        target: method.target,
        hint: method.hint,
    }
}

fn compile_probe(probe: Probe, registry: &PluginRegistry) -> CompiledProbe {
    let plan = plan_probe(&probe, registry);
    CompiledProbe {
        artifact: probe.artifact,
        mode: probe.mode,
        quantifiers: probe.quantifiers,
        target: probe.target,
        hint: probe.hint,
        result_context: probe.result_context,
        plan,
    }
}

fn plan_probe(
    probe: &Probe,
    registry: &PluginRegistry,
) -> std::result::Result<ProbePlan, ConfigError> {
    let parsers = probe
        .parsers
        .iter()
        .map(|name| {
            registry.parser(name).ok_or_else(|| ConfigError::UnknownParser {
                parser: name.clone(),
            })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let baseline = compile_steps(&probe.baseline, registry)?;
    let filters = compile_steps(&probe.filters, registry)?;
    let filter_hint = filters.iter().rev().find_map(|s| s.hint.clone());

    Ok(ProbePlan {
        parsers,
        baseline,
        filters,
        filter_hint,
    })
}

fn compile_steps(
    filters: &[Filter],
    registry: &PluginRegistry,
) -> std::result::Result<Vec<CompiledStep>, ConfigError> {
    filters
        .iter()
        .map(|f| {
            let plugin = registry
                .filter(&f.filter_type)
                .ok_or_else(|| ConfigError::UnknownFilter {
                    filter_type: f.filter_type.clone(),
                })?;
            Ok(CompiledStep {
                filter_type: f.filter_type.clone(),
                hint: f.hint.clone(),
                filter: plugin.compile(&f.expression)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(artifact: &str) -> Probe {
        Probe::new(artifact).with_filter(Filter::new("regex", "^telnetd"))
    }

    fn check(id: &str, probe: Probe) -> Check {
        Check::new(id).with_method(Method::new().with_probe(probe))
    }

    #[test]
    fn test_build_resolves_plugins() {
        let registry = PluginRegistry::with_builtins();
        let catalog = CheckCatalog::build(
            vec![check("C1", probe("pkg_list").with_parser("lines"))],
            &registry,
        )
        .unwrap();

        assert_eq!(catalog.len(), 1);
        let c1 = catalog.get("C1").unwrap();
        let plan = c1.methods[0].probes[0].plan.as_ref().unwrap();
        assert_eq!(plan.parsers.len(), 1);
        assert_eq!(plan.filters[0].filter_type, "regex");
        assert!(catalog.broken_probes().is_empty());
    }

    #[test]
    fn test_unknown_filter_breaks_only_that_probe() {
        let registry = PluginRegistry::with_builtins();
        let bad = Probe::new("pkg_list").with_filter(Filter::new("ObjectFilter", "name is 'x'"));
        let catalog = CheckCatalog::build(
            vec![Check::new("C1").with_method(
                Method::new().with_probe(bad).with_probe(probe("pkg_list")),
            )],
            &registry,
        )
        .unwrap();

        let c1 = catalog.get("C1").unwrap();
        assert!(c1.methods[0].probes[0].is_broken());
        assert!(!c1.methods[0].probes[1].is_broken());

        let broken = catalog.broken_probes();
        assert_eq!(broken.len(), 1);
        assert_eq!(
            broken[0].error,
            ConfigError::UnknownFilter {
                filter_type: "ObjectFilter".into()
            }
        );
    }

    #[test]
    fn test_unknown_parser_and_bad_expression() {
        let registry = PluginRegistry::with_builtins();
        let catalog = CheckCatalog::build(
            vec![
                check("C1", probe("a").with_parser("rpm")),
                check("C2", Probe::new("b").with_baseline(Filter::new("regex", "["))),
            ],
            &registry,
        )
        .unwrap();

        let codes: Vec<&str> = catalog
            .broken_probes()
            .iter()
            .map(|b| b.error.code())
            .collect();
        assert_eq!(codes, vec!["UNKNOWN_PARSER", "MALFORMED_EXPRESSION"]);
    }

    #[test]
    fn test_build_from_yaml() {
        let checks: Vec<Check> = serde_yaml::from_str(
            r#"
- check_id: WORLD-WRITABLE
  severity: critical
  method:
    - probe:
        - artifact: file_stat
          parser: [json]
          mode: PARALLEL
          filters:
            - type: compare
              expression: "mode >= 666"
            - type: attr
              expression: path
              hint: {format: "{}"}
"#,
        )
        .unwrap();
        let catalog = CheckCatalog::build(checks, &PluginRegistry::with_builtins()).unwrap();

        let check = catalog.get("WORLD-WRITABLE").unwrap();
        assert_eq!(check.severity, Severity::Critical);
        let plan = check.methods[0].probes[0].plan.as_ref().unwrap();
        assert_eq!(plan.filters.len(), 2);
        assert!(plan.filter_hint.is_some());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let registry = PluginRegistry::with_builtins();
        let err = CheckCatalog::build(
            vec![check("C1", probe("a")), check("C1", probe("b"))],
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateCheck { check_id } if check_id == "C1"));
    }

    #[test]
    fn test_empty_check_rejected() {
        let registry = PluginRegistry::with_builtins();
        let err = CheckCatalog::build(vec![Check::new("C1")], &registry).unwrap_err();
        assert_eq!(err.code(), "INVALID_CHECK_DEF");
    }

    #[test]
    fn test_order_and_lookup() {
        let registry = PluginRegistry::with_builtins();
        let catalog = CheckCatalog::build(
            vec![check("B", probe("a")), check("A", probe("a"))],
            &registry,
        )
        .unwrap();
        assert_eq!(catalog.ids().collect::<Vec<_>>(), vec!["B", "A"]);
        let picked = catalog.by_ids(&["A".to_string(), "Z".to_string()]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].check_id, "A");
    }

    #[test]
    fn test_filter_hint_and_parallel_mode() {
        let registry = PluginRegistry::with_builtins();
        let p = Probe::new("a")
            .with_mode(Mode::Parallel)
            .with_filter(Filter::new("regex", "x").with_hint(Hint::new().problem("first")))
            .with_filter(Filter::new("regex", "y").with_hint(Hint::new().problem("last")));
        let catalog = CheckCatalog::build(vec![check("C1", p)], &registry).unwrap();
        let c1 = catalog.get("C1").unwrap();
        assert!(c1.methods[0].is_parallel());
        let plan = c1.methods[0].probes[0].plan.as_ref().unwrap();
        assert_eq!(
            plan.filter_hint.as_ref().and_then(|h| h.problem.as_deref()),
            Some("last")
        );
    }
}
