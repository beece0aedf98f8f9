//! Method runner - run a method's probes and quantify their verdicts

use crate::probe::{run_probe, EvalContext, ProbeOutcome};
use rayon::prelude::*;
use tracing::debug;
use vigil_checks::CompiledMethod;
use vigil_core::quantifier;
use vigil_core::ProbeError;

/// Verdict tally over units that produced a verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub hits: usize,
    pub total: usize,
}

impl Tally {
    pub fn record(&mut self, verdict: Option<bool>) {
        if let Some(v) = verdict {
            self.total += 1;
            if v {
                self.hits += 1;
            }
        }
    }

    /// `None` when no unit voted
    pub fn verdict(&self, quantifiers: &[vigil_core::Match]) -> Option<bool> {
        if self.total == 0 {
            None
        } else {
            Some(quantifier::evaluate(quantifiers, self.hits, self.total))
        }
    }
}

/// Everything a completed method produced
#[derive(Debug, Clone, Default)]
pub struct MethodReport {
    /// `None` if every probe was not applicable or failed
    pub verdict: Option<bool>,
    /// Outcomes of the probes that ran, by probe index, in declared order
    pub outcomes: Vec<(usize, ProbeOutcome)>,
    pub errors: Vec<ProbeError>,
}

impl MethodReport {
    /// Probes whose own verdict was true, in declared order
    pub fn matched(&self) -> impl Iterator<Item = (usize, &crate::pipeline::PipelineOutput)> {
        self.outcomes.iter().filter_map(|(index, outcome)| match outcome {
            ProbeOutcome::Matched(output) => Some((*index, output)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub enum MethodOutcome {
    Completed(MethodReport),
    Cancelled,
}

/// Run a method whose check already admits the host.
///
/// The caller gates on the method's own target.
pub fn run_method(method: &CompiledMethod, ctx: &EvalContext<'_>) -> MethodOutcome {
    if method.is_parallel() {
        run_parallel(method, ctx)
    } else {
        run_serial(method, ctx)
    }
}

fn run_serial(method: &CompiledMethod, ctx: &EvalContext<'_>) -> MethodOutcome {
    let mut tally = Tally::default();
    let mut outcomes = Vec::with_capacity(method.probes.len());

    for (index, probe) in method.probes.iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            return MethodOutcome::Cancelled;
        }

        let remaining = method.probes.len() - index;
        if tally.total > 0 {
            if let Some(verdict) =
                quantifier::decided(&method.quantifiers, tally.hits, tally.total, remaining)
            {
                debug!(
                    "Method decided ({}) with {} probes outstanding",
                    verdict, remaining
                );
                break;
            }
        }

        let outcome = run_probe(probe, &method.resources, ctx);
        tally.record(outcome.verdict());
        outcomes.push((index, outcome));
    }

    MethodOutcome::Completed(report(method, ctx, tally, outcomes))
}

fn run_parallel(method: &CompiledMethod, ctx: &EvalContext<'_>) -> MethodOutcome {
    let ran: Vec<Option<ProbeOutcome>> = method
        .probes
        .par_iter()
        .map(|probe| {
            if ctx.cancel.is_cancelled() {
                None
            } else {
                Some(run_probe(probe, &method.resources, ctx))
            }
        })
        .collect();

    let mut tally = Tally::default();
    let mut outcomes = Vec::with_capacity(ran.len());
    for (index, outcome) in ran.into_iter().enumerate() {
        let Some(outcome) = outcome else {
            return MethodOutcome::Cancelled;
        };
        tally.record(outcome.verdict());
        outcomes.push((index, outcome));
    }

    MethodOutcome::Completed(report(method, ctx, tally, outcomes))
}

/// Broken probes are reported even when short-circuiting skipped them
fn report(
    method: &CompiledMethod,
    ctx: &EvalContext<'_>,
    tally: Tally,
    outcomes: Vec<(usize, ProbeOutcome)>,
) -> MethodReport {
    let ran = outcomes.len();
    let mut errors: Vec<ProbeError> = outcomes
        .iter()
        .filter_map(|(index, outcome)| match outcome {
            ProbeOutcome::Failed(e) => Some(ProbeError::new(&method.probes[*index].artifact, e)),
            _ => None,
        })
        .collect();

    for probe in method.probes.iter().skip(ran) {
        let applies = probe
            .target
            .as_ref()
            .map_or(true, |t| t.admits(&ctx.kb.host));
        if let (true, Err(e)) = (applies, &probe.plan) {
            errors.push(ProbeError::new(&probe.artifact, e));
        }
    }

    let verdict = tally.verdict(&method.quantifiers);
    debug!(
        "Method verdict {:?} (hits={} total={} ran={}/{})",
        verdict,
        tally.hits,
        tally.total,
        ran,
        method.probes.len()
    );

    MethodReport {
        verdict,
        outcomes,
        errors,
    }
}
