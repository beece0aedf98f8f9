//! Check runner - aggregate method verdicts and emit anomalies

use crate::method::{run_method, MethodOutcome, MethodReport, Tally};
use crate::pipeline::PipelineOutput;
use crate::probe::EvalContext;
use tracing::{debug, warn};
use vigil_checks::{CompiledCheck, CompiledMethod, CompiledProbe};
use vigil_core::{Anomaly, AnomalyType, CheckResult, Hint, ProbeError, ResultContext};

/// What evaluating one check produced
#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// The check's own target does not admit the host
    GatedOut,
    Completed {
        /// `None` when no method applied
        verdict: Option<bool>,
        result: Option<CheckResult>,
    },
    /// Interrupted by cancellation; any partial work is discarded
    Cancelled,
}

/// Evaluate one check against the host.
///
/// `max_findings` caps the anomalies emitted for this check.
pub fn run_check(check: &CompiledCheck, ctx: &EvalContext<'_>, max_findings: Option<usize>) -> CheckOutcome {
    if let Some(target) = &check.target {
        if !target.admits(&ctx.kb.host) {
            debug!("Check {} not applicable to {}", check.check_id, ctx.kb.host_str());
            return CheckOutcome::GatedOut;
        }
    }

    let mut tally = Tally::default();
    let mut errors: Vec<ProbeError> = Vec::new();
    let mut reports: Vec<(usize, MethodReport)> = Vec::with_capacity(check.methods.len());

    for (index, method) in check.methods.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return CheckOutcome::Cancelled;
        }

        if let Some(target) = &method.target {
            if !target.admits(&ctx.kb.host) {
                debug!("Check {} method {} not applicable", check.check_id, index);
                continue;
            }
        }

        match run_method(method, ctx) {
            MethodOutcome::Cancelled => return CheckOutcome::Cancelled,
            MethodOutcome::Completed(mut report) => {
                tally.record(report.verdict);
                errors.append(&mut report.errors);
                reports.push((index, report));
            }
        }
    }

    for error in &errors {
        warn!(
            "Check {} probe on {} skipped: {}",
            check.check_id, error.artifact, error.message
        );
    }

    let verdict = tally.verdict(&check.quantifiers);
    debug!(
        "Check {} verdict {:?} (hits={} total={})",
        check.check_id, verdict, tally.hits, tally.total
    );

    let result = match verdict {
        None if errors.is_empty() => None,
        None | Some(false) => Some(CheckResult {
            check_id: check.check_id.clone(),
            anomalies: Vec::new(),
            errors,
        }),
        Some(true) => Some(CheckResult {
            check_id: check.check_id.clone(),
            anomalies: emit_anomalies(check, &reports, max_findings),
            errors,
        }),
    };

    CheckOutcome::Completed { verdict, result }
}

/// One anomaly per matched probe of each true method, in declared order.
///
/// A true method without matched probes (e.g. `NONE` over its probes) gets a
/// single method-level anomaly; a true check with nothing else to show gets a
/// single check-level one.
fn emit_anomalies(
    check: &CompiledCheck,
    reports: &[(usize, MethodReport)],
    max_findings: Option<usize>,
) -> Vec<Anomaly> {
    let cap = max_findings.unwrap_or(usize::MAX);
    let mut anomalies = Vec::new();

    'methods: for (index, report) in reports {
        if report.verdict != Some(true) {
            continue;
        }
        let method = &check.methods[*index];

        let mut matched = report.matched().peekable();
        if matched.peek().is_none() {
            if anomalies.len() >= cap {
                break;
            }
            anomalies.push(method_anomaly(check, method));
            continue;
        }

        for (probe_index, output) in matched {
            if anomalies.len() >= cap {
                break 'methods;
            }
            anomalies.push(probe_anomaly(check, method, &method.probes[probe_index], output));
        }
    }

    if anomalies.is_empty() && cap > 0 {
        anomalies.push(check_anomaly(check));
    }

    if anomalies.len() == cap {
        debug!("Check {} reached max_findings ({})", check.check_id, cap);
    }

    anomalies
}

fn probe_anomaly(
    check: &CompiledCheck,
    method: &CompiledMethod,
    probe: &CompiledProbe,
    output: &PipelineOutput,
) -> Anomaly {
    let filter_hint = probe.plan.as_ref().ok().and_then(|plan| plan.filter_hint.as_ref());
    let hint = Hint::resolve([
        filter_hint,
        probe.hint.as_ref(),
        method.hint.as_ref(),
        check.hint.as_ref(),
    ]);

    let anomaly_type = match probe.result_context {
        ResultContext::Anomaly => AnomalyType::ParserAnomaly,
        ResultContext::Parser | ResultContext::Raw => AnomalyType::AnalysisAnomaly,
    };

    build(check, &hint, &probe.artifact)
        .anomaly_type(anomaly_type)
        .finding(hint.render_all(&output.items))
        .build()
}

fn method_anomaly(check: &CompiledCheck, method: &CompiledMethod) -> Anomaly {
    let hint = Hint::resolve([method.hint.as_ref(), check.hint.as_ref()]);
    build(check, &hint, &artifacts(std::slice::from_ref(method))).build()
}

fn check_anomaly(check: &CompiledCheck) -> Anomaly {
    let hint = Hint::resolve([check.hint.as_ref()]);
    build(check, &hint, &artifacts(&check.methods)).build()
}

fn build(check: &CompiledCheck, hint: &Hint, artifact: &str) -> vigil_core::anomaly::AnomalyBuilder {
    let symptom = hint
        .problem
        .clone()
        .unwrap_or_else(|| format!("Check {} failed", check.check_id));

    Anomaly::builder(&check.check_id, artifact)
        .severity(check.severity)
        .symptom(symptom)
        .explanation(hint.fix.clone())
        .summary(hint.summary.clone())
}

/// Distinct artifact names across methods, in declared order
fn artifacts(methods: &[CompiledMethod]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for probe in methods.iter().flat_map(|m| m.probes.iter()) {
        if !names.contains(&probe.artifact.as_str()) {
            names.push(&probe.artifact);
        }
    }
    names.join(",")
}
