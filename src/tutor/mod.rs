//! Algorithm tutor
//!
//! LLM-backed chat and explanations with a deterministic rule-based
//! fallback, so the service answers even with no provider configured.

pub mod fallback;
pub mod service;

pub use service::{ReplySource, TutorError, TutorReply, TutorService, TutorSettings};
