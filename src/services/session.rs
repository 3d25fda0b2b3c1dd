use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Conversation memory for multi-turn matching
///
/// Keeps the most recent user inputs per session. Sessions expire after
/// `ttl_secs` without activity.
pub struct SessionStore {
    turns: Cache<String, Arc<Vec<String>>>,
    max_turns: usize,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(max_sessions: u64, ttl_secs: u64, max_turns: usize) -> Self {
        let turns = moka::future::CacheBuilder::new(max_sessions)
            .time_to_idle(Duration::from_secs(ttl_secs))
            .build();

        Self {
            turns,
            max_turns: max_turns.max(1),
        }
    }

    /// Generate an identifier for a new session
    pub fn new_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Prior inputs of a session joined into one context string
    ///
    /// Returns `None` for unknown or empty sessions.
    pub async fn context(&self, session_id: &str) -> Option<String> {
        let turns = self.turns.get(session_id).await?;
        if turns.is_empty() {
            return None;
        }
        Some(turns.join(" "))
    }

    /// Append a user input to a session, dropping the oldest beyond the limit
    ///
    /// The read-modify-write runs as one upsert, so concurrent turns on the
    /// same session are all kept.
    pub async fn record_turn(&self, session_id: &str, input: &str) {
        let max_turns = self.max_turns;
        let input = input.to_string();

        let entry = self
            .turns
            .entry_by_ref(session_id)
            .and_upsert_with(|existing| {
                let mut turns = existing
                    .map(|e| e.into_value().as_ref().clone())
                    .unwrap_or_default();

                turns.push(input);
                if turns.len() > max_turns {
                    let excess = turns.len() - max_turns;
                    turns.drain(..excess);
                }

                std::future::ready(Arc::new(turns))
            })
            .await;

        tracing::trace!("Session {} now has {} turns", session_id, entry.value().len());
    }

    /// Forget a session
    pub async fn clear(&self, session_id: &str) {
        self.turns.invalidate(session_id).await;
    }
}
