//! Vigil Engine - Check evaluation over a host knowledge base
//!
//! Evaluation descends Check → Method → Probe → filter pipeline, consulting
//! each unit's target before descending. Units that do not apply never vote
//! in their parent's aggregation.
//!
//! ```ignore
//! let engine = Engine::new(EngineOptions::default())?;
//! let results = engine.run(kb, &catalog, &CheckFlowArgs::new(), &CancellationToken::new());
//! ```

pub mod cancel;
pub mod check;
pub mod engine;
pub mod method;
pub mod pipeline;
pub mod probe;
pub mod request;

pub use cancel::CancellationToken;
pub use check::{run_check, CheckOutcome};
pub use engine::{Engine, EngineOptions};
pub use method::{run_method, MethodOutcome, MethodReport};
pub use pipeline::{apply, PipelineOutput};
pub use probe::{run_probe, EvalContext, ProbeOutcome};
pub use request::CheckFlowArgs;
