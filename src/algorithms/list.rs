//! Singly linked list operations shown as pointer walks
//!
//! The generator runs a small script of operations against one list. Every
//! traversal hop is a frame with the cursor on the visited node. An
//! operation that cannot apply (index out of range, list full) produces an
//! `op_failed` frame and the script moves on; only malformed input is an
//! error.

use crate::catalog::AlgorithmKind;
use crate::config::TraceLimits;
use crate::trace::{StepBuffer, TraceEnvelope, TraceError, TraceOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListInput {
    #[serde(default)]
    pub initial: Vec<i64>,
    #[serde(default)]
    pub ops: Vec<ListOp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ListOp {
    PushFront { value: i64 },
    PushBack { value: i64 },
    InsertAt { index: usize, value: i64 },
    RemoveAt { index: usize },
    RemoveValue { value: i64 },
    Search { value: i64 },
}

impl ListOp {
    fn describe(&self) -> String {
        match self {
            ListOp::PushFront { value } => format!("push {value} at the front"),
            ListOp::PushBack { value } => format!("push {value} at the back"),
            ListOp::InsertAt { index, value } => format!("insert {value} at index {index}"),
            ListOp::RemoveAt { index } => format!("remove the node at index {index}"),
            ListOp::RemoveValue { value } => format!("remove the first {value}"),
            ListOp::Search { value } => format!("search for {value}"),
        }
    }
}

/// One frame of a linked list trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListStep {
    pub action: ListAction,
    /// List contents after this action, head first
    pub nodes: Vec<i64>,
    /// Node the traversal pointer is on, if any
    pub cursor: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListAction {
    OpStart { op_index: usize },
    Visit { index: usize },
    InsertNode { index: usize },
    RemoveNode { index: usize },
    Found { index: usize },
    NotFound,
    OpFailed { reason: String },
    Done,
}

/// Applies `input.ops` to `input.initial`, one frame per pointer move
pub fn linked_list_steps(
    input: &ListInput,
    limits: &TraceLimits,
) -> Result<TraceEnvelope<ListStep>, TraceError> {
    if input.initial.len() > limits.max_list_len {
        return Err(TraceError::limit_exceeded(
            "initial list length",
            input.initial.len(),
            limits.max_list_len,
        ));
    }
    if input.ops.len() > limits.max_list_ops {
        return Err(TraceError::limit_exceeded(
            "operation count",
            input.ops.len(),
            limits.max_list_ops,
        ));
    }

    let mut nodes = input.initial.clone();
    let mut buf = StepBuffer::new(limits.max_trace_steps);

    for (op_index, op) in input.ops.iter().enumerate() {
        buf.push(frame(
            ListAction::OpStart { op_index },
            &nodes,
            None,
            format!("Operation {}: {}", op_index + 1, op.describe()),
        ))?;
        apply_op(op, &mut nodes, limits.max_list_len, &mut buf)?;
    }

    buf.push(frame(
        ListAction::Done,
        &nodes,
        None,
        format!("Script complete; the list has {} nodes", nodes.len()),
    ))?;

    Ok(TraceEnvelope::new(
        AlgorithmKind::LinkedList,
        TraceOutcome::Completed,
        buf.into_steps(),
    ))
}

fn apply_op(
    op: &ListOp,
    nodes: &mut Vec<i64>,
    max_len: usize,
    buf: &mut StepBuffer<ListStep>,
) -> Result<(), TraceError> {
    match op {
        ListOp::PushFront { value } => {
            if fail_if_full(nodes, max_len, buf)? {
                return Ok(());
            }
            nodes.insert(0, *value);
            buf.push(frame(
                ListAction::InsertNode { index: 0 },
                nodes,
                Some(0),
                format!("{value} becomes the new head"),
            ))?;
        }

        ListOp::PushBack { value } => {
            if fail_if_full(nodes, max_len, buf)? {
                return Ok(());
            }
            walk(nodes, nodes.len(), buf)?;
            nodes.push(*value);
            let index = nodes.len() - 1;
            buf.push(frame(
                ListAction::InsertNode { index },
                nodes,
                Some(index),
                format!("{value} appended as the new tail"),
            ))?;
        }

        ListOp::InsertAt { index, value } => {
            if fail_if_full(nodes, max_len, buf)? {
                return Ok(());
            }
            if *index > nodes.len() {
                return fail(
                    buf,
                    nodes,
                    format!("index {index} is out of range for length {}", nodes.len()),
                );
            }
            walk(nodes, *index, buf)?;
            nodes.insert(*index, *value);
            buf.push(frame(
                ListAction::InsertNode { index: *index },
                nodes,
                Some(*index),
                format!("{value} spliced in at index {index}"),
            ))?;
        }

        ListOp::RemoveAt { index } => {
            if *index >= nodes.len() {
                return fail(
                    buf,
                    nodes,
                    format!("index {index} is out of range for length {}", nodes.len()),
                );
            }
            walk(nodes, *index + 1, buf)?;
            let removed = nodes.remove(*index);
            buf.push(frame(
                ListAction::RemoveNode { index: *index },
                nodes,
                None,
                format!("Removed {removed} from index {index}"),
            ))?;
        }

        ListOp::RemoveValue { value } => {
            for i in 0..nodes.len() {
                buf.push(visit_frame(nodes, i))?;
                if nodes[i] == *value {
                    nodes.remove(i);
                    buf.push(frame(
                        ListAction::RemoveNode { index: i },
                        nodes,
                        None,
                        format!("Removed {value} from index {i}"),
                    ))?;
                    return Ok(());
                }
            }
            buf.push(frame(
                ListAction::NotFound,
                nodes,
                None,
                format!("{value} is not in the list"),
            ))?;
        }

        ListOp::Search { value } => {
            for i in 0..nodes.len() {
                buf.push(visit_frame(nodes, i))?;
                if nodes[i] == *value {
                    buf.push(frame(
                        ListAction::Found { index: i },
                        nodes,
                        Some(i),
                        format!("Found {value} at index {i}"),
                    ))?;
                    return Ok(());
                }
            }
            buf.push(frame(
                ListAction::NotFound,
                nodes,
                None,
                format!("{value} is not in the list"),
            ))?;
        }
    }

    Ok(())
}

/// Emits visit frames for indexes `0..until`
fn walk(nodes: &[i64], until: usize, buf: &mut StepBuffer<ListStep>) -> Result<(), TraceError> {
    for i in 0..until {
        buf.push(visit_frame(nodes, i))?;
    }
    Ok(())
}

fn visit_frame(nodes: &[i64], i: usize) -> ListStep {
    frame(
        ListAction::Visit { index: i },
        nodes,
        Some(i),
        format!("Visit {} at index {i}", nodes[i]),
    )
}

/// Emits an `op_failed` frame when the list cannot take another node
fn fail_if_full(
    nodes: &[i64],
    max_len: usize,
    buf: &mut StepBuffer<ListStep>,
) -> Result<bool, TraceError> {
    if nodes.len() >= max_len {
        buf.push(frame(
            ListAction::OpFailed {
                reason: format!("list is full at {max_len} nodes"),
            },
            nodes,
            None,
            format!("List already holds {max_len} nodes; insert refused"),
        ))?;
        return Ok(true);
    }
    Ok(false)
}

fn fail(
    buf: &mut StepBuffer<ListStep>,
    nodes: &[i64],
    reason: String,
) -> Result<(), TraceError> {
    buf.push(frame(
        ListAction::OpFailed {
            reason: reason.clone(),
        },
        nodes,
        None,
        format!("Operation failed: {reason}"),
    ))
}

fn frame(action: ListAction, nodes: &[i64], cursor: Option<usize>, message: String) -> ListStep {
    ListStep {
        action,
        nodes: nodes.to_vec(),
        cursor,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(initial: Vec<i64>, ops: Vec<ListOp>) -> TraceEnvelope<ListStep> {
        linked_list_steps(&ListInput { initial, ops }, &TraceLimits::default()).unwrap()
    }

    fn final_nodes(trace: &TraceEnvelope<ListStep>) -> Vec<i64> {
        trace.steps.last().map(|s| s.nodes.clone()).unwrap_or_default()
    }

    #[test]
    fn test_script_builds_expected_list() {
        let trace = run(
            vec![3, 1, 4],
            vec![
                ListOp::PushFront { value: 0 },
                ListOp::PushBack { value: 9 },
                ListOp::InsertAt { index: 2, value: 7 },
                ListOp::RemoveAt { index: 0 },
                ListOp::RemoveValue { value: 4 },
            ],
        );

        assert_eq!(trace.outcome, TraceOutcome::Completed);
        assert_eq!(final_nodes(&trace), vec![3, 7, 1, 9]);
        assert!(matches!(
            trace.steps.last().unwrap().action,
            ListAction::Done
        ));
    }

    #[test]
    fn test_push_back_walks_to_the_tail() {
        let trace = run(vec![1, 2, 3], vec![ListOp::PushBack { value: 4 }]);

        let visits: Vec<usize> = trace
            .steps
            .iter()
            .filter_map(|s| match s.action {
                ListAction::Visit { index } => Some(index),
                _ => None,
            })
            .collect();
        assert_eq!(visits, vec![0, 1, 2]);

        let insert = trace
            .steps
            .iter()
            .find(|s| matches!(s.action, ListAction::InsertNode { .. }))
            .unwrap();
        assert_eq!(insert.nodes, vec![1, 2, 3, 4]);
        assert_eq!(insert.cursor, Some(3));
    }

    #[test]
    fn test_search_found_and_not_found() {
        let trace = run(
            vec![5, 8, 13],
            vec![ListOp::Search { value: 8 }, ListOp::Search { value: 99 }],
        );

        assert!(trace
            .steps
            .iter()
            .any(|s| matches!(s.action, ListAction::Found { index: 1 })));
        assert!(trace
            .steps
            .iter()
            .any(|s| matches!(s.action, ListAction::NotFound)));
    }

    #[test]
    fn test_failed_op_is_a_frame_not_an_error() {
        let trace = run(
            vec![1],
            vec![
                ListOp::RemoveAt { index: 5 },
                ListOp::PushBack { value: 2 },
            ],
        );

        assert!(trace
            .steps
            .iter()
            .any(|s| matches!(s.action, ListAction::OpFailed { .. })));
        // the script keeps going after the failure
        assert_eq!(final_nodes(&trace), vec![1, 2]);
    }

    #[test]
    fn test_insert_past_capacity_fails_as_a_frame() {
        let limits = TraceLimits {
            max_list_len: 3,
            ..TraceLimits::default()
        };
        let input = ListInput {
            initial: vec![1, 2, 3],
            ops: vec![ListOp::PushFront { value: 0 }],
        };

        let trace = linked_list_steps(&input, &limits).unwrap();
        assert!(trace
            .steps
            .iter()
            .any(|s| matches!(s.action, ListAction::OpFailed { .. })));
        assert_eq!(final_nodes(&trace), vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_value_only_removes_first_match() {
        let trace = run(vec![7, 7, 7], vec![ListOp::RemoveValue { value: 7 }]);
        assert_eq!(final_nodes(&trace), vec![7, 7]);

        let removes = trace
            .steps
            .iter()
            .filter(|s| matches!(s.action, ListAction::RemoveNode { .. }))
            .count();
        assert_eq!(removes, 1);
    }

    #[test]
    fn test_empty_script_is_just_done() {
        let trace = run(vec![], vec![]);
        assert_eq!(trace.step_count, 1);
        assert!(matches!(trace.steps[0].action, ListAction::Done));
    }

    #[test]
    fn test_input_limits() {
        let limits = TraceLimits::default();

        let too_long = ListInput {
            initial: vec![0; limits.max_list_len + 1],
            ops: vec![],
        };
        assert!(matches!(
            linked_list_steps(&too_long, &limits),
            Err(TraceError::LimitExceeded { what: "initial list length", .. })
        ));

        let too_many_ops = ListInput {
            initial: vec![],
            ops: vec![ListOp::PushFront { value: 1 }; limits.max_list_ops + 1],
        };
        assert!(matches!(
            linked_list_steps(&too_many_ops, &limits),
            Err(TraceError::LimitExceeded { what: "operation count", .. })
        ));
    }

    #[test]
    fn test_every_frame_has_message_and_consistent_cursor() {
        let trace = run(
            vec![2, 4, 6],
            vec![
                ListOp::Search { value: 6 },
                ListOp::InsertAt { index: 1, value: 3 },
                ListOp::RemoveValue { value: 2 },
            ],
        );

        for step in &trace.steps {
            assert!(!step.message.is_empty());
            if let Some(cursor) = step.cursor {
                assert!(cursor < step.nodes.len(), "cursor must point at a node");
            }
        }
    }
}
