//! 0/1 knapsack dynamic programming with a frame per table cell
//!
//! The trace walks the DP table row by row, one frame per cell decision,
//! then replays the traceback that recovers the chosen items. The terminal
//! frame carries the finished table so the frontend never has to rebuild it
//! from the cell updates.

use crate::catalog::AlgorithmKind;
use crate::config::TraceLimits;
use crate::trace::{StepBuffer, TraceEnvelope, TraceError, TraceOutcome};
use serde::{Deserialize, Serialize};

/// Per-item value bound so no subset sum can overflow u64
pub const MAX_ITEM_VALUE: u64 = 1_000_000_000;

const MAX_LABEL_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnapsackItem {
    #[serde(default)]
    pub label: String,
    pub weight: usize,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnapsackInput {
    pub items: Vec<KnapsackItem>,
    pub capacity: usize,
}

/// One frame of a knapsack trace
///
/// Unlike the other generators there is no per-frame snapshot: the table
/// grows monotonically, so each frame carries only its own cell and the
/// terminal frame carries the whole table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnapsackStep {
    pub action: KnapsackAction,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KnapsackAction {
    /// Table row `item` (1-based; row i covers the first i items) at
    /// capacity column `cap` settles on `value`
    FillCell {
        item: usize,
        cap: usize,
        value: u64,
        decision: CellDecision,
    },
    TracebackTake { item: usize, cap: usize },
    TracebackSkip { item: usize, cap: usize },
    Done {
        best_value: u64,
        table: Vec<Vec<u64>>,
        chosen: Vec<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellDecision {
    Exclude,
    Include { gain: u64 },
}

/// Builds the full DP table and traceback for a 0/1 knapsack instance
pub fn knapsack_steps(
    input: &KnapsackInput,
    limits: &TraceLimits,
) -> Result<TraceEnvelope<KnapsackStep>, TraceError> {
    validate(input, limits)?;

    let n = input.items.len();
    let capacity = input.capacity;
    let mut table = vec![vec![0u64; capacity + 1]; n + 1];
    let mut buf = StepBuffer::new(limits.max_trace_steps);

    for i in 1..=n {
        let item = &input.items[i - 1];
        let name = item_name(&input.items, i);

        for w in 0..=capacity {
            let without = table[i - 1][w];
            let (value, decision) = if item.weight <= w {
                let with = table[i - 1][w - item.weight] + item.value;
                if with > without {
                    (with, CellDecision::Include { gain: with - without })
                } else {
                    (without, CellDecision::Exclude)
                }
            } else {
                (without, CellDecision::Exclude)
            };
            table[i][w] = value;

            let message = match decision {
                CellDecision::Include { .. } => {
                    format!("Include {name} at capacity {w} for value {value}")
                }
                CellDecision::Exclude if item.weight > w => {
                    format!("{name} does not fit at capacity {w}; value stays {value}")
                }
                CellDecision::Exclude => {
                    format!("Excluding {name} keeps the better value {value} at capacity {w}")
                }
            };

            buf.push(KnapsackStep {
                action: KnapsackAction::FillCell {
                    item: i,
                    cap: w,
                    value,
                    decision,
                },
                message,
            })?;
        }
    }

    // Walk back from the final cell to recover the chosen set
    let mut chosen = Vec::new();
    let mut w = capacity;
    for i in (1..=n).rev() {
        let name = item_name(&input.items, i);
        if table[i][w] == table[i - 1][w] {
            buf.push(KnapsackStep {
                action: KnapsackAction::TracebackSkip { item: i, cap: w },
                message: format!("{name} was not needed for the best value"),
            })?;
        } else {
            let at = w;
            chosen.push(i - 1);
            w -= input.items[i - 1].weight;
            buf.push(KnapsackStep {
                action: KnapsackAction::TracebackTake { item: i, cap: at },
                message: format!("{name} is in the best set; remaining capacity {w}"),
            })?;
        }
    }
    chosen.reverse();

    let best_value = table[n][capacity];
    buf.push(KnapsackStep {
        action: KnapsackAction::Done {
            best_value,
            table,
            chosen: chosen.clone(),
        },
        message: format!(
            "Best value {best_value} using {} of {n} items",
            chosen.len()
        ),
    })?;

    Ok(TraceEnvelope::new(
        AlgorithmKind::Knapsack01,
        TraceOutcome::Completed,
        buf.into_steps(),
    ))
}

fn validate(input: &KnapsackInput, limits: &TraceLimits) -> Result<(), TraceError> {
    if input.items.len() > limits.max_items {
        return Err(TraceError::limit_exceeded(
            "item count",
            input.items.len(),
            limits.max_items,
        ));
    }
    if input.capacity > limits.max_capacity {
        return Err(TraceError::limit_exceeded(
            "capacity",
            input.capacity,
            limits.max_capacity,
        ));
    }

    for (i, item) in input.items.iter().enumerate() {
        if item.value > MAX_ITEM_VALUE {
            return Err(TraceError::invalid_input(format!(
                "item {i} value {} is out of range",
                item.value
            )));
        }
        if item.label.len() > MAX_LABEL_LEN {
            return Err(TraceError::invalid_input(format!(
                "item {i} label is longer than {MAX_LABEL_LEN} characters"
            )));
        }
    }

    Ok(())
}

/// Display name for the 1-based table row `row`
fn item_name(items: &[KnapsackItem], row: usize) -> String {
    let item = &items[row - 1];
    if item.label.is_empty() {
        format!("item {row}")
    } else {
        item.label.clone()
    }
}
