//! Algorithm catalog for the visualizer
//!
//! Identifies the six algorithms the engine can trace and carries the
//! display metadata served to the frontend catalog endpoint. The same
//! metadata doubles as the knowledge base of the rule-based tutor fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Algorithms the engine can trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    BubbleSort,
    MergeSort,
    BellmanFord,
    NQueens,
    #[serde(rename = "knapsack")]
    Knapsack01,
    LinkedList,
}

/// Category shown in the frontend catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmCategory {
    Sorting,
    Graph,
    DynamicProgramming,
    Backtracking,
    DataStructure,
}

impl AlgorithmCategory {
    /// Human-readable label for prose answers
    pub fn label(&self) -> &'static str {
        match self {
            AlgorithmCategory::Sorting => "sorting",
            AlgorithmCategory::Graph => "graph",
            AlgorithmCategory::DynamicProgramming => "dynamic programming",
            AlgorithmCategory::Backtracking => "backtracking",
            AlgorithmCategory::DataStructure => "data structure",
        }
    }
}

/// Display metadata for one algorithm
///
/// Every field is frontend-facing copy; `how_it_works` and `use_cases` are
/// also quoted verbatim by the fallback tutor.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmInfo {
    pub kind: AlgorithmKind,
    pub name: &'static str,
    pub category: AlgorithmCategory,
    pub description: &'static str,
    pub time_complexity: &'static str,
    pub space_complexity: &'static str,
    pub how_it_works: &'static str,
    pub use_cases: &'static str,
}

/// Error for unrecognized algorithm names in URLs or CLI arguments
#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl AlgorithmKind {
    /// All supported algorithms in stable catalog order
    pub fn all() -> [AlgorithmKind; 6] {
        [
            AlgorithmKind::BubbleSort,
            AlgorithmKind::MergeSort,
            AlgorithmKind::BellmanFord,
            AlgorithmKind::NQueens,
            AlgorithmKind::Knapsack01,
            AlgorithmKind::LinkedList,
        ]
    }

    /// Wire name used in URL paths, JSON bodies and the CLI
    pub fn wire_name(&self) -> &'static str {
        match self {
            AlgorithmKind::BubbleSort => "bubble-sort",
            AlgorithmKind::MergeSort => "merge-sort",
            AlgorithmKind::BellmanFord => "bellman-ford",
            AlgorithmKind::NQueens => "n-queens",
            AlgorithmKind::Knapsack01 => "knapsack",
            AlgorithmKind::LinkedList => "linked-list",
        }
    }

    /// Static display metadata for this algorithm
    pub fn info(&self) -> &'static AlgorithmInfo {
        match self {
            AlgorithmKind::BubbleSort => &BUBBLE_SORT_INFO,
            AlgorithmKind::MergeSort => &MERGE_SORT_INFO,
            AlgorithmKind::BellmanFord => &BELLMAN_FORD_INFO,
            AlgorithmKind::NQueens => &N_QUEENS_INFO,
            AlgorithmKind::Knapsack01 => &KNAPSACK_INFO,
            AlgorithmKind::LinkedList => &LINKED_LIST_INFO,
        }
    }

    /// Catalog entries for every algorithm, stable order
    pub fn catalog() -> Vec<&'static AlgorithmInfo> {
        Self::all().iter().map(|kind| kind.info()).collect()
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bubble-sort" => Ok(AlgorithmKind::BubbleSort),
            "merge-sort" => Ok(AlgorithmKind::MergeSort),
            "bellman-ford" => Ok(AlgorithmKind::BellmanFord),
            "n-queens" => Ok(AlgorithmKind::NQueens),
            "knapsack" => Ok(AlgorithmKind::Knapsack01),
            "linked-list" => Ok(AlgorithmKind::LinkedList),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

static BUBBLE_SORT_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::BubbleSort,
    name: "Bubble Sort",
    category: AlgorithmCategory::Sorting,
    description: "Repeatedly steps through the array, swapping adjacent elements that are out of order until a full pass makes no swap.",
    time_complexity: "O(n^2) worst and average case, O(n) on already-sorted input",
    space_complexity: "O(1) extra space",
    how_it_works: "Each pass compares neighbours left to right and swaps them when the left one is larger; after pass k the k largest values have bubbled to the end, and the sort stops early once a pass makes no swap.",
    use_cases: "Teaching comparison sorting and as a near-no-op pass over nearly sorted data; rarely the right choice in production.",
};

static MERGE_SORT_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::MergeSort,
    name: "Merge Sort",
    category: AlgorithmCategory::Sorting,
    description: "Divide-and-conquer sort that splits the array in halves, sorts each half, and merges the sorted halves.",
    time_complexity: "O(n log n) in every case",
    space_complexity: "O(n) auxiliary space for the merge buffers",
    how_it_works: "The array is split recursively until runs of one element remain, then pairs of sorted runs are merged by repeatedly taking the smaller head element; the merge is stable.",
    use_cases: "Stable sorting, external sorting of data that does not fit in memory, and as the backbone of standard-library sorts.",
};

static BELLMAN_FORD_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::BellmanFord,
    name: "Bellman-Ford",
    category: AlgorithmCategory::Graph,
    description: "Single-source shortest paths on a directed graph that tolerates negative edge weights and reports negative cycles.",
    time_complexity: "O(V * E) relaxation passes",
    space_complexity: "O(V) for distances and predecessors",
    how_it_works: "Distances start at infinity (zero at the source) and every edge is relaxed V-1 times; if an edge can still be relaxed afterwards the graph contains a negative cycle reachable from the source.",
    use_cases: "Routing protocols such as RIP, currency-arbitrage detection, and any shortest-path problem where edge weights may be negative.",
};

static N_QUEENS_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::NQueens,
    name: "N-Queens",
    category: AlgorithmCategory::Backtracking,
    description: "Places N queens on an N x N board so that no two attack each other, exploring candidate columns row by row and backtracking out of dead ends.",
    time_complexity: "O(N!) in the worst case; pruning cuts most branches",
    space_complexity: "O(N) for the partial placement",
    how_it_works: "One queen is placed per row; each candidate column is checked against earlier rows for column and diagonal attacks, and when a row has no safe column the search backtracks to move the previous queen.",
    use_cases: "The canonical introduction to backtracking and constraint propagation; the same skeleton solves sudoku and exam-timetabling style problems.",
};

static KNAPSACK_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::Knapsack01,
    name: "0/1 Knapsack",
    category: AlgorithmCategory::DynamicProgramming,
    description: "Chooses a subset of items maximizing total value under a weight capacity by filling a dynamic-programming table over items and capacities.",
    time_complexity: "O(n * W) table cells for n items and capacity W",
    space_complexity: "O(n * W) for the full memo table",
    how_it_works: "Cell (i, w) holds the best value using the first i items within weight w: either the item is excluded (value above) or included (value up-left plus the item's value); tracing back from the final cell recovers the chosen items.",
    use_cases: "Budgeted selection problems: cargo loading, cutting stock, and capital budgeting; the table build is the standard first example of dynamic programming.",
};

static LINKED_LIST_INFO: AlgorithmInfo = AlgorithmInfo {
    kind: AlgorithmKind::LinkedList,
    name: "Linked List",
    category: AlgorithmCategory::DataStructure,
    description: "Singly linked list operations - insert, remove and search - shown as pointer walks from the head node.",
    time_complexity: "O(1) at the head, O(n) walks elsewhere",
    space_complexity: "O(n) nodes, one link each",
    how_it_works: "Every operation except a head insert walks node to node from the head following next pointers; inserts splice a node by rewiring one link, removals bypass the victim node.",
    use_cases: "Queues and free lists where cheap splicing matters more than random access; the visual pointer walk is why caches dislike it.",
};
