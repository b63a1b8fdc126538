//! Step-trace envelope shared by every generator
//!
//! A trace is an eagerly materialized list of frames. Each frame is a full
//! snapshot of the algorithm's working state plus a human-readable caption,
//! so the frontend can scrub forward and backward without replay logic.

use crate::catalog::AlgorithmKind;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Complete trace for one algorithm run
///
/// `S` is the per-algorithm step type. The envelope fields are identical
/// across algorithms so the frontend player can stay generic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEnvelope<S> {
    /// Unique id for this generated trace
    pub trace_id: Uuid,
    /// Which algorithm produced the steps
    pub algorithm: AlgorithmKind,
    /// RFC 3339 generation timestamp
    pub generated_at: String,
    /// How the run ended
    pub outcome: TraceOutcome,
    /// Convenience copy of `steps.len()`
    pub step_count: usize,
    /// Ordered frames, first to last
    pub steps: Vec<S>,
}

impl<S> TraceEnvelope<S> {
    pub fn new(algorithm: AlgorithmKind, outcome: TraceOutcome, steps: Vec<S>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            algorithm,
            generated_at: Utc::now().to_rfc3339(),
            outcome,
            step_count: steps.len(),
            steps,
        }
    }
}

/// Terminal state of a trace
///
/// Failure to *solve* is not an error: a negative cycle or an unsolvable
/// board still yields a complete, playable trace with the matching outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceOutcome {
    Completed,
    NegativeCycleDetected,
    NoSolution,
}

/// Errors that prevent a trace from being generated at all
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TraceError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{what} is {actual}, limit is {limit}")]
    LimitExceeded {
        what: &'static str,
        actual: usize,
        limit: usize,
    },

    #[error("trace would exceed the step budget of {limit} frames")]
    StepBudgetExceeded { limit: usize },
}

impl TraceError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        TraceError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn limit_exceeded(what: &'static str, actual: usize, limit: usize) -> Self {
        TraceError::LimitExceeded { what, actual, limit }
    }
}

/// Budgeted frame collector
///
/// Generators push every frame through this so a pathological input fails
/// with [`TraceError::StepBudgetExceeded`] instead of materializing an
/// unbounded vector.
#[derive(Debug)]
pub struct StepBuffer<S> {
    steps: Vec<S>,
    budget: usize,
}

impl<S> StepBuffer<S> {
    pub fn new(budget: usize) -> Self {
        Self {
            steps: Vec::new(),
            budget,
        }
    }

    /// Appends a frame, failing once the budget is spent
    pub fn push(&mut self, step: S) -> Result<(), TraceError> {
        if self.steps.len() >= self.budget {
            return Err(TraceError::StepBudgetExceeded { limit: self.budget });
        }
        self.steps.push(step);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<S> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_counts_steps() {
        let envelope = TraceEnvelope::new(
            AlgorithmKind::BubbleSort,
            TraceOutcome::Completed,
            vec!["a", "b", "c"],
        );

        assert_eq!(envelope.step_count, 3);
        assert_eq!(envelope.steps.len(), 3);
        assert_eq!(envelope.algorithm, AlgorithmKind::BubbleSort);
        assert!(!envelope.generated_at.is_empty());
    }

    #[test]
    fn test_envelope_ids_are_unique() {
        let a = TraceEnvelope::new(AlgorithmKind::NQueens, TraceOutcome::NoSolution, vec![0u8]);
        let b = TraceEnvelope::new(AlgorithmKind::NQueens, TraceOutcome::NoSolution, vec![0u8]);
        assert_ne!(a.trace_id, b.trace_id);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&TraceOutcome::NegativeCycleDetected).unwrap();
        assert_eq!(json, "\"negative_cycle_detected\"");

        let json = serde_json::to_string(&TraceOutcome::NoSolution).unwrap();
        assert_eq!(json, "\"no_solution\"");
    }

    #[test]
    fn test_step_buffer_enforces_budget() {
        let mut buf = StepBuffer::new(2);
        buf.push(1).unwrap();
        buf.push(2).unwrap();

        let err = buf.push(3).unwrap_err();
        assert_eq!(err, TraceError::StepBudgetExceeded { limit: 2 });
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.into_steps(), vec![1, 2]);
    }

    #[test]
    fn test_step_buffer_zero_budget_rejects_first_push() {
        let mut buf: StepBuffer<u8> = StepBuffer::new(0);
        assert!(buf.is_empty());
        assert!(matches!(
            buf.push(1),
            Err(TraceError::StepBudgetExceeded { limit: 0 })
        ));
    }

    #[test]
    fn test_error_helpers() {
        let err = TraceError::invalid_input("source out of range");
        assert_eq!(err.to_string(), "invalid input: source out of range");

        let err = TraceError::limit_exceeded("array length", 100, 64);
        assert_eq!(err.to_string(), "array length is 100, limit is 64");
    }
}
