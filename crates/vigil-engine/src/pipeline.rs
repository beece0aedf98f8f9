//! Filter pipeline - ordered filters over artifact items, relative to a baseline

use vigil_checks::CompiledStep;
use vigil_core::{FilterVerdict, Item};

/// Items surviving the filters, and the counts the quantifier sees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutput {
    /// Filter output of every input item outside the baseline
    pub items: Vec<Item>,
    /// Input items outside the baseline that yielded at least one output
    pub hits: usize,
    /// Input items outside the baseline
    pub total: usize,
}

/// Run `steps` in declared order, each over the previous step's output
pub fn run_steps(steps: &[CompiledStep], items: Vec<Item>) -> Vec<Item> {
    steps.iter().fold(items, |current, step| {
        let mut next = Vec::with_capacity(current.len());
        for item in current {
            match step.filter.evaluate(&item) {
                FilterVerdict::Keep => next.push(item),
                FilterVerdict::Drop => {}
                FilterVerdict::Replace(values) => next.extend(values),
            }
        }
        next
    })
}

/// Apply `filters` to `items`, suppressing members of the `baseline` subset.
///
/// Both chains are traced per input item. An input item is a baseline member
/// when the baseline chain yields anything for it; members are excluded from
/// `total` and none of their filter output is reported. A hit is a remaining
/// input item for which the filters yield at least one output, so
/// `hits <= total` holds even when a transform expands items.
pub fn apply(filters: &[CompiledStep], items: Vec<Item>, baseline: &[CompiledStep]) -> PipelineOutput {
    let mut output = PipelineOutput::default();

    for item in items {
        if !baseline.is_empty() && !run_steps(baseline, vec![item.clone()]).is_empty() {
            continue;
        }
        output.total += 1;

        let produced = run_steps(filters, vec![item]);
        if !produced.is_empty() {
            output.hits += 1;
            output.items.extend(produced);
        }
    }

    output
}
