//! Engine - runs a check catalog against one knowledge base

use crate::cancel::CancellationToken;
use crate::check::{run_check, CheckOutcome};
use crate::probe::EvalContext;
use crate::request::CheckFlowArgs;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use vigil_checks::CheckCatalog;
use vigil_core::{
    ArtifactSource, CheckResults, Error, KnowledgeBase, KnowledgeBaseSource, Result, RunSummary,
};

/// Engine tuning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Worker threads for check evaluation (0 = one per CPU)
    pub worker_threads: usize,
    /// Anomaly cap per check when a request sets none
    pub default_max_findings: Option<usize>,
}

/// Evaluates catalogs on a dedicated worker pool
pub struct Engine {
    options: EngineOptions,
    source: Arc<dyn ArtifactSource>,
    pool: rayon::ThreadPool,
}

impl Engine {
    /// Create an engine reading artifacts straight from the knowledge base
    pub fn new(options: EngineOptions) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("vigil-worker-{}", i));
        if options.worker_threads > 0 {
            builder = builder.num_threads(options.worker_threads);
        }
        let pool = builder
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build worker pool: {}", e)))?;

        debug!("Engine worker pool: {} threads", pool.current_num_threads());

        Ok(Self {
            options,
            source: Arc::new(KnowledgeBaseSource),
            pool,
        })
    }

    /// Replace the artifact source
    pub fn with_source(mut self, source: Arc<dyn ArtifactSource>) -> Self {
        self.source = source;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluate every selected check of `catalog` against `kb`.
    ///
    /// Results come back in catalog order. Checks never produce results when
    /// gated out or when no method applied and nothing went wrong. After
    /// cancellation, results of checks that completed are still returned.
    pub fn run(
        &self,
        kb: Arc<KnowledgeBase>,
        catalog: &CheckCatalog,
        args: &CheckFlowArgs,
        cancel: &CancellationToken,
    ) -> CheckResults {
        let request = args.request_target();
        let selected: Vec<_> = catalog
            .iter()
            .filter(|check| args.selects(check, &request))
            .collect();
        let max_findings = args.max_findings.or(self.options.default_max_findings);

        info!(
            "Evaluating {} of {} checks against {}",
            selected.len(),
            catalog.len(),
            kb.host_str()
        );

        let ctx = EvalContext {
            kb: &kb,
            source: self.source.as_ref(),
            cancel,
        };

        let outcomes: Vec<CheckOutcome> = self.pool.install(|| {
            selected
                .par_iter()
                .map(|check| {
                    if cancel.is_cancelled() {
                        CheckOutcome::Cancelled
                    } else {
                        run_check(check, &ctx, max_findings)
                    }
                })
                .collect()
        });

        let mut summary = RunSummary {
            selected: selected.len(),
            ..Default::default()
        };
        let mut results = Vec::new();

        for outcome in outcomes {
            match outcome {
                CheckOutcome::GatedOut => summary.not_applicable += 1,
                CheckOutcome::Cancelled => summary.skipped += 1,
                CheckOutcome::Completed { verdict, result } => {
                    summary.evaluated += 1;
                    match verdict {
                        Some(true) => summary.matched += 1,
                        Some(false) => {}
                        None => summary.not_applicable += 1,
                    }
                    if let Some(result) = result {
                        if !result.errors.is_empty() {
                            summary.errored += 1;
                        }
                        results.push(result);
                    }
                }
            }
        }

        let cancelled = cancel.is_cancelled();
        info!(
            "Run complete on {}: {} evaluated, {} matched, {} not applicable, {} errored, {} skipped{}",
            kb.host_str(),
            summary.evaluated,
            summary.matched,
            summary.not_applicable,
            summary.errored,
            summary.skipped,
            if cancelled { " (cancelled)" } else { "" }
        );

        CheckResults {
            knowledge_base: kb,
            results,
            summary,
            cancelled,
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
