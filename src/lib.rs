//! Algoscope - step-trace backend for an algorithm visualizer
//!
//! # Overview
//!
//! This crate generates eagerly materialized step traces that a frontend can
//! scrub through frame by frame, plus an LLM-backed tutor for questions about
//! the algorithm on screen:
//! - Trace generators for six classic algorithms behind one envelope type
//! - Input validation with per-algorithm size limits and a global step budget
//! - Tutor service with Anthropic/OpenAI providers and a rule-based fallback
//! - Bounded in-memory chat sessions with idle expiry
//! - Warp HTTP API exposing traces, tutoring, sessions and health probes
//!
//! # Quick Start
//!
//! ```rust
//! use algoscope::algorithms::sorting::{bubble_sort_steps, SortInput};
//! use algoscope::config::TraceLimits;
//!
//! let input = SortInput {
//!     values: vec![5, 1, 4, 2],
//! };
//! let trace = bubble_sort_steps(&input, &TraceLimits::default()).unwrap();
//!
//! // Every frame carries a full snapshot, so the last one is the sorted array
//! let last = trace.steps.last().unwrap();
//! assert_eq!(last.values, vec![1, 2, 4, 5]);
//!
//! // The envelope serializes to the wire format served by the HTTP API
//! let json = serde_json::to_string(&trace).unwrap();
//! assert!(json.contains("\"bubble-sort\""));
//! ```

pub mod algorithms;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod observability;
pub mod server;
pub mod session;
pub mod testing;
pub mod trace;
pub mod tutor;

// Re-export the types most callers touch
pub use catalog::{AlgorithmCategory, AlgorithmInfo, AlgorithmKind};
pub use config::*;
pub use error::{AppError, AppResult, ErrorBody};
pub use session::{SessionSnapshot, SessionStore};
pub use trace::{TraceEnvelope, TraceError, TraceOutcome};
pub use tutor::{ReplySource, TutorReply, TutorService, TutorSettings};
