//! Bellman-Ford single-source shortest paths with a full relaxation trace
//!
//! Each frame snapshots the distance and predecessor arrays after one edge
//! relaxation, so the frontend can show exactly which edge improved which
//! node. A reachable negative cycle ends the trace with a dedicated frame
//! and the `negative_cycle_detected` outcome instead of an error.

use crate::catalog::AlgorithmKind;
use crate::config::TraceLimits;
use crate::trace::{StepBuffer, TraceEnvelope, TraceError, TraceOutcome};
use serde::{Deserialize, Serialize};

/// Hard cap on graph size; the SVG board renders at most this many nodes
pub const MAX_GRAPH_NODES: usize = 15;

/// Per-edge weight bound so 15 relaxation passes can never overflow i64
pub const MAX_EDGE_WEIGHT_ABS: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInput {
    pub from: usize,
    pub to: usize,
    pub weight: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInput {
    pub node_count: usize,
    pub edges: Vec<EdgeInput>,
    pub source: usize,
}

/// One frame of a Bellman-Ford trace
///
/// `None` in `distances` renders as infinity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BellmanFordStep {
    pub action: BellmanFordAction,
    pub distances: Vec<Option<i64>>,
    pub predecessors: Vec<Option<usize>>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BellmanFordAction {
    Init,
    RelaxEdge {
        edge_index: usize,
        from: usize,
        to: usize,
        relaxed: bool,
    },
    PassEnd {
        pass: usize,
        changed: bool,
    },
    NegativeCycle {
        edge_index: usize,
    },
    Done,
}

/// Runs Bellman-Ford from `input.source`, recording every relaxation
pub fn bellman_ford_steps(
    input: &GraphInput,
    limits: &TraceLimits,
) -> Result<TraceEnvelope<BellmanFordStep>, TraceError> {
    validate(input)?;

    let n = input.node_count;
    let mut distances: Vec<Option<i64>> = vec![None; n];
    let mut predecessors: Vec<Option<usize>> = vec![None; n];
    distances[input.source] = Some(0);

    let mut buf = StepBuffer::new(limits.max_trace_steps);
    buf.push(BellmanFordStep {
        action: BellmanFordAction::Init,
        distances: distances.clone(),
        predecessors: predecessors.clone(),
        message: format!(
            "Distances start at infinity; source node {} starts at 0",
            input.source
        ),
    })?;

    let mut settled_early = false;
    for pass in 1..n {
        let mut changed = false;

        for (edge_index, edge) in input.edges.iter().enumerate() {
            let mut improved: Option<i64> = None;
            if let Some(du) = distances[edge.from] {
                let candidate = du + edge.weight;
                if distances[edge.to].map_or(true, |dv| candidate < dv) {
                    distances[edge.to] = Some(candidate);
                    predecessors[edge.to] = Some(edge.from);
                    improved = Some(candidate);
                    changed = true;
                }
            }

            let (relaxed, message) = match improved {
                Some(d) => (
                    true,
                    format!(
                        "Relaxed edge {} -> {} (weight {}): node {} now at distance {d}",
                        edge.from, edge.to, edge.weight, edge.to
                    ),
                ),
                None => (
                    false,
                    format!(
                        "Edge {} -> {} (weight {}) gives no improvement",
                        edge.from, edge.to, edge.weight
                    ),
                ),
            };

            buf.push(BellmanFordStep {
                action: BellmanFordAction::RelaxEdge {
                    edge_index,
                    from: edge.from,
                    to: edge.to,
                    relaxed,
                },
                distances: distances.clone(),
                predecessors: predecessors.clone(),
                message,
            })?;
        }

        buf.push(BellmanFordStep {
            action: BellmanFordAction::PassEnd { pass, changed },
            distances: distances.clone(),
            predecessors: predecessors.clone(),
            message: if changed {
                format!("Pass {pass} of {} complete", n - 1)
            } else {
                format!("Pass {pass} made no change; distances have settled")
            },
        })?;

        if !changed {
            settled_early = true;
            break;
        }
    }

    // One more scan over the edges: anything still relaxable after n-1
    // passes sits on a negative cycle. Skipped when a pass already found
    // the fixed point.
    if !settled_early {
        for (edge_index, edge) in input.edges.iter().enumerate() {
            if let Some(du) = distances[edge.from] {
                let candidate = du + edge.weight;
                if distances[edge.to].map_or(true, |dv| candidate < dv) {
                    buf.push(BellmanFordStep {
                        action: BellmanFordAction::NegativeCycle { edge_index },
                        distances: distances.clone(),
                        predecessors: predecessors.clone(),
                        message: format!(
                            "Edge {} -> {} can still relax after {} passes: negative cycle reachable from node {}",
                            edge.from,
                            edge.to,
                            n - 1,
                            input.source
                        ),
                    })?;

                    return Ok(TraceEnvelope::new(
                        AlgorithmKind::BellmanFord,
                        TraceOutcome::NegativeCycleDetected,
                        buf.into_steps(),
                    ));
                }
            }
        }
    }

    buf.push(BellmanFordStep {
        action: BellmanFordAction::Done,
        distances: distances.clone(),
        predecessors: predecessors.clone(),
        message: "Shortest distances are final".to_string(),
    })?;

    Ok(TraceEnvelope::new(
        AlgorithmKind::BellmanFord,
        TraceOutcome::Completed,
        buf.into_steps(),
    ))
}

fn validate(input: &GraphInput) -> Result<(), TraceError> {
    if input.node_count == 0 {
        return Err(TraceError::invalid_input("graph needs at least one node"));
    }
    if input.node_count > MAX_GRAPH_NODES {
        return Err(TraceError::limit_exceeded(
            "node count",
            input.node_count,
            MAX_GRAPH_NODES,
        ));
    }
    if input.source >= input.node_count {
        return Err(TraceError::invalid_input(format!(
            "source node {} is out of range for {} nodes",
            input.source, input.node_count
        )));
    }

    let max_edges = input.node_count * input.node_count;
    if input.edges.len() > max_edges {
        return Err(TraceError::limit_exceeded(
            "edge count",
            input.edges.len(),
            max_edges,
        ));
    }

    for (i, edge) in input.edges.iter().enumerate() {
        if edge.from >= input.node_count || edge.to >= input.node_count {
            return Err(TraceError::invalid_input(format!(
                "edge {i} ({} -> {}) has an endpoint out of range for {} nodes",
                edge.from, edge.to, input.node_count
            )));
        }
        if edge.weight.abs() > MAX_EDGE_WEIGHT_ABS {
            return Err(TraceError::invalid_input(format!(
                "edge {i} weight {} is out of range",
                edge.weight
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn edge(from: usize, to: usize, weight: i64) -> EdgeInput {
        EdgeInput { from, to, weight }
    }

    fn final_distances(trace: &TraceEnvelope<BellmanFordStep>) -> Vec<Option<i64>> {
        trace.steps.last().map(|s| s.distances.clone()).unwrap_or_default()
    }

    #[test]
    fn test_shortest_paths_on_small_graph() {
        let input = GraphInput {
            node_count: 4,
            edges: vec![
                edge(0, 1, 4),
                edge(0, 2, 1),
                edge(2, 1, 2),
                edge(1, 3, 1),
                edge(2, 3, 5),
            ],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();

        assert_eq!(trace.outcome, TraceOutcome::Completed);
        assert_eq!(
            final_distances(&trace),
            vec![Some(0), Some(3), Some(1), Some(4)]
        );

        let last = trace.steps.last().unwrap();
        assert!(matches!(last.action, BellmanFordAction::Done));
        assert_eq!(last.predecessors[1], Some(2));
        assert_eq!(last.predecessors[3], Some(1));
    }

    #[test]
    fn test_negative_edges_without_cycle() {
        let input = GraphInput {
            node_count: 3,
            edges: vec![edge(0, 1, 5), edge(0, 2, 2), edge(2, 1, -4)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();
        assert_eq!(trace.outcome, TraceOutcome::Completed);
        assert_eq!(final_distances(&trace)[1], Some(-2));
    }

    #[test]
    fn test_negative_cycle_is_a_terminal_frame() {
        let input = GraphInput {
            node_count: 3,
            edges: vec![edge(0, 1, 1), edge(1, 2, -1), edge(2, 1, -1)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();

        assert_eq!(trace.outcome, TraceOutcome::NegativeCycleDetected);
        let last = trace.steps.last().unwrap();
        assert!(matches!(
            last.action,
            BellmanFordAction::NegativeCycle { .. }
        ));
        assert!(last.message.contains("negative cycle"));
    }

    #[test]
    fn test_negative_self_loop() {
        let input = GraphInput {
            node_count: 1,
            edges: vec![edge(0, 0, -1)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();
        assert_eq!(trace.outcome, TraceOutcome::NegativeCycleDetected);
    }

    #[test]
    fn test_early_exit_skips_remaining_passes() {
        // Chain relaxes fully in the first pass because edges are in path order
        let input = GraphInput {
            node_count: 5,
            edges: vec![edge(0, 1, 1), edge(1, 2, 1), edge(2, 3, 1), edge(3, 4, 1)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();

        let passes: Vec<bool> = trace
            .steps
            .iter()
            .filter_map(|s| match s.action {
                BellmanFordAction::PassEnd { changed, .. } => Some(changed),
                _ => None,
            })
            .collect();
        assert_eq!(passes, vec![true, false]);
        assert_eq!(trace.outcome, TraceOutcome::Completed);
    }

    #[test]
    fn test_unreachable_nodes_stay_at_infinity() {
        let input = GraphInput {
            node_count: 3,
            edges: vec![edge(0, 1, 7)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();
        assert_eq!(final_distances(&trace)[2], None);
    }

    #[test]
    fn test_validation_errors() {
        let limits = TraceLimits::default();

        let too_big = GraphInput {
            node_count: MAX_GRAPH_NODES + 1,
            edges: vec![],
            source: 0,
        };
        assert!(matches!(
            bellman_ford_steps(&too_big, &limits),
            Err(TraceError::LimitExceeded { limit: 15, .. })
        ));

        let bad_source = GraphInput {
            node_count: 3,
            edges: vec![],
            source: 3,
        };
        assert!(matches!(
            bellman_ford_steps(&bad_source, &limits),
            Err(TraceError::InvalidInput { .. })
        ));

        let bad_endpoint = GraphInput {
            node_count: 2,
            edges: vec![edge(0, 5, 1)],
            source: 0,
        };
        assert!(matches!(
            bellman_ford_steps(&bad_endpoint, &limits),
            Err(TraceError::InvalidInput { .. })
        ));

        let empty = GraphInput {
            node_count: 0,
            edges: vec![],
            source: 0,
        };
        assert!(matches!(
            bellman_ford_steps(&empty, &limits),
            Err(TraceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_every_frame_snapshots_all_nodes() {
        let input = GraphInput {
            node_count: 4,
            edges: vec![edge(0, 1, 2), edge(1, 2, 2), edge(2, 3, 2), edge(3, 0, 2)],
            source: 0,
        };

        let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();
        for step in &trace.steps {
            assert_eq!(step.distances.len(), 4);
            assert_eq!(step.predecessors.len(), 4);
            assert!(!step.message.is_empty());
        }
    }

    proptest! {
        /// At a completed fixed point no edge can improve its target, and
        /// the source still sits at distance zero.
        #[test]
        fn prop_completed_traces_are_fixed_points(
            node_count in 1usize..8,
            edge_seeds in proptest::collection::vec((0usize..8, 0usize..8, -20i64..20), 0..20),
            source_seed in 0usize..8,
        ) {
            let source = source_seed % node_count;
            let edges: Vec<EdgeInput> = edge_seeds
                .into_iter()
                .take(node_count * node_count)
                .map(|(f, t, w)| edge(f % node_count, t % node_count, w))
                .collect();
            let input = GraphInput { node_count, edges: edges.clone(), source };

            let trace = bellman_ford_steps(&input, &TraceLimits::default()).unwrap();
            if trace.outcome == TraceOutcome::Completed {
                let dist = final_distances(&trace);
                prop_assert_eq!(dist[source], Some(0));
                for e in &edges {
                    if let Some(du) = dist[e.from] {
                        let dv = dist[e.to];
                        prop_assert!(dv.is_some());
                        prop_assert!(dv.map_or(false, |dv| dv <= du + e.weight));
                    }
                }
            }
        }
    }
}
