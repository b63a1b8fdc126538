//! Chat Session Store
//!
//! Keeps tutor conversations in memory so follow-up questions have context.
//! Implements a thread-safe store with per-session message caps, TTL-based
//! cleanup of idle sessions, and least-recently-active eviction when the
//! store is full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::llm::provider::{Message, MessageRole};
use crate::observability::metrics::metrics;

/// Maximum accepted length of a client-supplied session id
const MAX_SESSION_ID_LEN: usize = 128;

/// Minimum gap between idle-session sweeps
const SWEEP_INTERVAL_SECONDS: u64 = 30;

/// Errors for session id and message validation
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid session id: {reason}")]
    InvalidSessionId { reason: String },

    #[error("message must not be empty")]
    EmptyMessage,
}

/// A single chat message with its capture time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Capture timestamp (ISO 8601)
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new<S: Into<String>>(role: MessageRole, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// One conversation held in the store
#[derive(Debug, Clone)]
struct Session {
    messages: Vec<ChatMessage>,
    created_at: String,
    last_active: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            created_at: Utc::now().to_rfc3339(),
            last_active: Utc::now(),
        }
    }

    fn is_idle(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        let age = now.signed_duration_since(self.last_active);
        age.num_seconds() > ttl_secs as i64
    }
}

/// Read-only view of a session returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub created_at: String,
    pub last_active: String,
    pub message_count: usize,
    pub messages: Vec<ChatMessage>,
}

/// Validate a client-supplied session id
///
/// Ids are capped at 128 characters and restricted to ASCII alphanumerics
/// plus `.`, `_` and `-` so they can appear in URL paths and log lines
/// without escaping.
pub fn validate_session_id(session_id: &str) -> Result<(), SessionError> {
    if session_id.is_empty() {
        return Err(SessionError::InvalidSessionId {
            reason: "id must not be empty".to_string(),
        });
    }

    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(SessionError::InvalidSessionId {
            reason: format!(
                "id is {} characters, maximum is {}",
                session_id.len(),
                MAX_SESSION_ID_LEN
            ),
        });
    }

    if let Some(bad) = session_id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-'))
    {
        return Err(SessionError::InvalidSessionId {
            reason: format!("character {bad:?} is not allowed"),
        });
    }

    Ok(())
}

/// Thread-safe store of tutor chat sessions
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Map of session_id to conversation state
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    /// Last sweep time for idle-session cleanup
    last_sweep: Arc<RwLock<SystemTime>>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create an empty store with the given limits
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            last_sweep: Arc::new(RwLock::new(SystemTime::now())),
            config,
        }
    }

    /// Append a message to a session, creating the session on first use
    ///
    /// Histories are capped at `max_messages` per session; once full, the
    /// oldest messages are dropped to make room. Returns a snapshot of the
    /// session after the append.
    pub fn append(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        validate_session_id(session_id)?;
        if content.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.sweep_idle_sessions();

        let snapshot = {
            let mut sessions = self.sessions.write().unwrap();

            if !sessions.contains_key(session_id) {
                Self::evict_if_full(&mut sessions, self.config.max_sessions);
                metrics().session_created();
                info!("Created session: {}", session_id);
            }

            let session = sessions
                .entry(session_id.to_string())
                .or_insert_with(Session::new);
            session.messages.push(ChatMessage::new(role, content));
            session.last_active = Utc::now();

            let max = self.config.max_messages;
            if session.messages.len() > max {
                let excess = session.messages.len() - max;
                session.messages.drain(..excess);
                metrics().messages_trimmed(excess as u64);
                debug!(
                    "Trimmed {} oldest messages from session {}",
                    excess, session_id
                );
            }

            Self::snapshot_of(session_id, session)
        };

        Ok(snapshot)
    }

    /// Get a snapshot of a session, or None if it does not exist
    pub fn history(&self, session_id: &str) -> Result<Option<SessionSnapshot>, SessionError> {
        validate_session_id(session_id)?;
        let sessions = self.sessions.read().unwrap();
        Ok(sessions
            .get(session_id)
            .map(|s| Self::snapshot_of(session_id, s)))
    }

    /// Delete a session; returns true if it existed
    pub fn remove(&self, session_id: &str) -> Result<bool, SessionError> {
        validate_session_id(session_id)?;
        let mut sessions = self.sessions.write().unwrap();
        let removed = sessions.remove(session_id).is_some();
        if removed {
            debug!("Removed session: {}", session_id);
        }
        Ok(removed)
    }

    /// Last `limit` messages of a session as LLM conversation messages
    pub fn recent_messages(&self, session_id: &str, limit: usize) -> Vec<Message> {
        let sessions = self.sessions.read().unwrap();
        let Some(session) = sessions.get(session_id) else {
            return Vec::new();
        };

        let skip = session.messages.len().saturating_sub(limit);
        session.messages[skip..]
            .iter()
            .map(|m| Message {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions.len()
    }

    /// Remove sessions idle past the TTL
    ///
    /// Sweeps are rate limited so hot paths pay the full scan at most once
    /// per interval.
    pub fn sweep_idle_sessions(&self) {
        let now = SystemTime::now();

        // Check and update sweep timestamp atomically to prevent races
        let should_sweep = {
            let mut last_sweep = self.last_sweep.write().unwrap();
            let elapsed = now
                .duration_since(*last_sweep)
                .unwrap_or(Duration::from_secs(0));

            if elapsed >= Duration::from_secs(SWEEP_INTERVAL_SECONDS) {
                *last_sweep = now;
                true
            } else {
                false
            }
        };

        if !should_sweep {
            return;
        }

        self.remove_idle_sessions();
    }

    fn remove_idle_sessions(&self) {
        let now = Utc::now();
        let ttl = self.config.idle_ttl_secs;

        let removed_count = {
            let mut sessions = self.sessions.write().unwrap();
            let before = sessions.len();

            sessions.retain(|session_id, session| {
                if session.is_idle(now, ttl) {
                    debug!("Expiring idle session: {}", session_id);
                    false
                } else {
                    true
                }
            });

            before - sessions.len()
        };

        if removed_count > 0 {
            metrics().sessions_expired(removed_count as u64);
            info!("Expired {} idle sessions", removed_count);
        }
    }

    /// Evict the least-recently-active session when the store is full
    fn evict_if_full(sessions: &mut HashMap<String, Session>, max_sessions: usize) {
        if sessions.len() < max_sessions {
            return;
        }

        // Tie-break by id for deterministic eviction
        let victim = sessions
            .iter()
            .min_by(|a, b| {
                a.1.last_active
                    .cmp(&b.1.last_active)
                    .then_with(|| a.0.cmp(b.0))
            })
            .map(|(id, _)| id.clone());

        if let Some(victim) = victim {
            sessions.remove(&victim);
            metrics().session_evicted();
            info!("Evicted least-recently-active session: {}", victim);
        }
    }

    fn snapshot_of(session_id: &str, session: &Session) -> SessionSnapshot {
        SessionSnapshot {
            session_id: session_id.to_string(),
            created_at: session.created_at.clone(),
            last_active: session.last_active.to_rfc3339(),
            message_count: session.messages.len(),
            messages: session.messages.clone(),
        }
    }

    /// Backdate a session's activity time (for testing TTL expiration only)
    ///
    /// WARNING: This method bypasses the normal activity tracking and should
    /// ONLY be used in tests to verify idle expiration. Production code
    /// updates `last_active` through `append()`.
    #[doc(hidden)]
    pub fn backdate_session_for_test(&self, session_id: &str, idle_secs: i64) {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(session) = sessions.get_mut(session_id) {
            session.last_active = Utc::now() - chrono::Duration::seconds(idle_secs);
        }
    }

    /// Force an idle sweep (for testing, bypasses rate limit)
    ///
    /// WARNING: This method bypasses the normal sweep interval and should
    /// ONLY be used in tests. Production code calls `sweep_idle_sessions()`
    /// which includes rate limiting.
    #[doc(hidden)]
    pub fn force_sweep_for_test(&self) {
        self.remove_idle_sessions();
    }
}
