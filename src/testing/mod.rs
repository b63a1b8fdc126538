//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the tutor and API
//! layers without requiring a live LLM provider.

pub mod mocks;

pub use mocks::*;
