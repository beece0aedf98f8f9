//! Probe runner - fetch, interpret, filter and quantify one artifact

use crate::cancel::CancellationToken;
use crate::pipeline::{self, PipelineOutput};
use tracing::debug;
use vigil_checks::{CompiledProbe, ProbePlan};
use vigil_core::quantifier;
use vigil_core::{ArtifactSource, ConfigError, Item, KnowledgeBase, Resource, ResultContext};

/// Read-only state shared by every unit evaluated in one run
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    pub kb: &'a KnowledgeBase,
    pub source: &'a dyn ArtifactSource,
    pub cancel: &'a CancellationToken,
}

/// Result of running one probe
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Matched(PipelineOutput),
    Unmatched(PipelineOutput),
    /// Gated out by the probe's own target
    NotApplicable,
    /// The probe's configuration prevented it from running
    Failed(ConfigError),
}

impl ProbeOutcome {
    /// `Some(verdict)` when the probe takes part in its method's aggregation
    pub fn verdict(&self) -> Option<bool> {
        match self {
            ProbeOutcome::Matched(_) => Some(true),
            ProbeOutcome::Unmatched(_) => Some(false),
            ProbeOutcome::NotApplicable | ProbeOutcome::Failed(_) => None,
        }
    }
}

/// Run a probe whose method and check already admit the host
pub fn run_probe(probe: &CompiledProbe, resources: &[Resource], ctx: &EvalContext<'_>) -> ProbeOutcome {
    if let Some(target) = &probe.target {
        if !target.admits(&ctx.kb.host) {
            debug!("Probe on {} not applicable to {}", probe.artifact, ctx.kb.host_str());
            return ProbeOutcome::NotApplicable;
        }
    }

    let plan = match &probe.plan {
        Ok(plan) => plan,
        Err(e) => return ProbeOutcome::Failed(e.clone()),
    };

    // A missing artifact is an empty one
    let raw = ctx
        .source
        .fetch(&probe.artifact, ctx.kb, resources)
        .unwrap_or_default();

    let items = match probe.result_context {
        ResultContext::Parser => match parse(&probe.artifact, plan, raw) {
            Ok(items) => items,
            Err(e) => return ProbeOutcome::Failed(e),
        },
        ResultContext::Anomaly | ResultContext::Raw => raw,
    };

    let output = pipeline::apply(&plan.filters, items, &plan.baseline);
    let matched = quantifier::evaluate(&probe.quantifiers, output.hits, output.total);
    debug!(
        "Probe on {}: hits={} total={} matched={}",
        probe.artifact, output.hits, output.total, matched
    );

    if matched {
        ProbeOutcome::Matched(output)
    } else {
        ProbeOutcome::Unmatched(output)
    }
}

/// Apply each parser in order; every item may become zero or more items
fn parse(artifact: &str, plan: &ProbePlan, mut items: Vec<Item>) -> Result<Vec<Item>, ConfigError> {
    for parser in &plan.parsers {
        let mut parsed = Vec::with_capacity(items.len());
        for item in &items {
            let out = parser.parse(item).map_err(|message| ConfigError::ParserFailed {
                parser: parser.name().to_string(),
                artifact: artifact.to_string(),
                message,
            })?;
            parsed.extend(out);
        }
        items = parsed;
    }
    Ok(items)
}
