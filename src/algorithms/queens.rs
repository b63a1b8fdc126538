//! N-Queens backtracking search with a frame per decision
//!
//! The search places one queen per row. Every candidate column produces a
//! frame, so the playback shows the dead ends as clearly as the solutions.
//! An unsolvable board (sizes 2 and 3) is a trace with the `no_solution`
//! outcome, not an error.

use crate::catalog::AlgorithmKind;
use crate::config::TraceLimits;
use crate::trace::{StepBuffer, TraceEnvelope, TraceError, TraceOutcome};
use serde::{Deserialize, Serialize};

/// Hard cap on board size; the board component renders at most 10x10
pub const MAX_BOARD_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueensInput {
    pub board_size: usize,
    #[serde(default)]
    pub mode: QueensMode,
}

/// Whether to stop at the first complete placement or enumerate them all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueensMode {
    #[default]
    FirstSolution,
    AllSolutions,
}

/// One frame of an N-Queens trace
///
/// `queens[row]` is the column of the queen placed in that row, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueensStep {
    pub action: QueensAction,
    pub queens: Vec<Option<usize>>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueensAction {
    TryColumn { row: usize, col: usize },
    Conflict { row: usize, col: usize, with_row: usize },
    PlaceQueen { row: usize, col: usize },
    Backtrack { row: usize },
    Solution { index: usize },
    Done { solutions_found: usize },
}

/// Runs the backtracking search over an `board_size` x `board_size` board
pub fn n_queens_steps(
    input: &QueensInput,
    limits: &TraceLimits,
) -> Result<TraceEnvelope<QueensStep>, TraceError> {
    if input.board_size == 0 {
        return Err(TraceError::invalid_input("board size must be at least 1"));
    }
    if input.board_size > MAX_BOARD_SIZE {
        return Err(TraceError::limit_exceeded(
            "board size",
            input.board_size,
            MAX_BOARD_SIZE,
        ));
    }

    let n = input.board_size;
    let mut queens: Vec<Option<usize>> = vec![None; n];
    let mut solutions = 0usize;
    let mut buf = StepBuffer::new(limits.max_trace_steps);

    search(0, n, input.mode, &mut queens, &mut solutions, &mut buf)?;

    let message = match solutions {
        0 => format!("No arrangement of {n} queens avoids every attack"),
        1 => "Search complete: 1 solution found".to_string(),
        k => format!("Search complete: {k} solutions found"),
    };
    buf.push(QueensStep {
        action: QueensAction::Done {
            solutions_found: solutions,
        },
        queens: queens.clone(),
        message,
    })?;

    let outcome = if solutions == 0 {
        TraceOutcome::NoSolution
    } else {
        TraceOutcome::Completed
    };

    Ok(TraceEnvelope::new(
        AlgorithmKind::NQueens,
        outcome,
        buf.into_steps(),
    ))
}

/// Explores row `row`; returns true when the search should stop
fn search(
    row: usize,
    n: usize,
    mode: QueensMode,
    queens: &mut Vec<Option<usize>>,
    solutions: &mut usize,
    buf: &mut StepBuffer<QueensStep>,
) -> Result<bool, TraceError> {
    if row == n {
        *solutions += 1;
        buf.push(QueensStep {
            action: QueensAction::Solution { index: *solutions },
            queens: queens.clone(),
            message: format!("Solution {} complete: all {n} queens are safe", *solutions),
        })?;
        return Ok(mode == QueensMode::FirstSolution);
    }

    for col in 0..n {
        buf.push(QueensStep {
            action: QueensAction::TryColumn { row, col },
            queens: queens.clone(),
            message: format!("Try column {col} in row {row}"),
        })?;

        if let Some(with_row) = first_conflict(queens, row, col) {
            buf.push(QueensStep {
                action: QueensAction::Conflict { row, col, with_row },
                queens: queens.clone(),
                message: format!("Column {col} is attacked by the queen in row {with_row}"),
            })?;
            continue;
        }

        queens[row] = Some(col);
        buf.push(QueensStep {
            action: QueensAction::PlaceQueen { row, col },
            queens: queens.clone(),
            message: format!("Queen placed at row {row}, column {col}"),
        })?;

        if search(row + 1, n, mode, queens, solutions, buf)? {
            return Ok(true);
        }
        queens[row] = None;
    }

    buf.push(QueensStep {
        action: QueensAction::Backtrack { row },
        queens: queens.clone(),
        message: format!("No safe column left in row {row}; backtracking"),
    })?;
    Ok(false)
}

/// Earliest placed queen attacking `(row, col)`, if any
fn first_conflict(queens: &[Option<usize>], row: usize, col: usize) -> Option<usize> {
    for (r, placed) in queens.iter().enumerate().take(row) {
        if let Some(c) = placed {
            if *c == col || row - r == col.abs_diff(*c) {
                return Some(r);
            }
        }
    }
    None
}
