//! Step generators for every algorithm in the catalog
//!
//! Each submodule owns one input type, one step type and one generator
//! function. Generators validate their input against
//! [`TraceLimits`](crate::config::TraceLimits), materialize the full frame
//! list eagerly and wrap it in a [`TraceEnvelope`](crate::trace::TraceEnvelope).

pub mod graph;
pub mod knapsack;
pub mod list;
pub mod queens;
pub mod sorting;
