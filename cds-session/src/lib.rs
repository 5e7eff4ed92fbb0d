//! # cds-session
//!
//! Per-conversation message history. Sessions are created implicitly on
//! first append, messages are append-only, and the only destructive
//! operation is whole-session deletion.

use std::collections::HashMap;
use std::sync::Arc;

use cds_core::ChatMessage;
use tokio::sync::RwLock;

/// A process-wide mapping from session id to its ordered message list.
///
/// Cloning is cheap and shares the underlying map. Creation of a new entry
/// under a previously-unseen id is race-free (get-or-insert under the write
/// lock). Concurrent turns on the *same* session id are not a supported use
/// case: appends are individually atomic but may interleave between turns,
/// so history order across racing turns is unspecified.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Vec<ChatMessage>>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a session, creating the session on first use.
    pub async fn append(&self, session_id: &str, message: ChatMessage) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string()).or_default().push(message);
    }

    /// The full ordered history of a session, or `None` if the session was
    /// never created (or has been cleared).
    pub async fn history(&self, session_id: &str) -> Option<Vec<ChatMessage>> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    /// Delete a session entirely. Returns whether one existed.
    pub async fn clear(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_creates_session_on_first_use() {
        let store = SessionStore::new();
        assert!(store.history("s1").await.is_none());

        store.append("s1", ChatMessage::user("hello")).await;
        let history = store.history("s1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "hello");
    }

    #[tokio::test]
    async fn history_preserves_append_order() {
        let store = SessionStore::new();
        for i in 0..5 {
            store.append("s1", ChatMessage::user(format!("turn {i}"))).await;
        }
        let history = store.history("s1").await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["turn 0", "turn 1", "turn 2", "turn 3", "turn 4"]);
    }

    #[tokio::test]
    async fn clear_reports_whether_a_session_existed() {
        let store = SessionStore::new();
        store.append("s1", ChatMessage::user("hello")).await;

        assert!(store.clear("s1").await);
        assert!(!store.clear("s1").await);
        assert!(store.history("s1").await.is_none());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        store.append("a", ChatMessage::user("for a")).await;
        store.append("b", ChatMessage::user("for b")).await;

        assert_eq!(store.history("a").await.unwrap().len(), 1);
        store.clear("a").await;
        assert_eq!(store.history("b").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_to_distinct_sessions_are_race_free() {
        let store = SessionStore::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(&format!("session-{i}"), ChatMessage::user("hi")).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        for i in 0..16 {
            assert_eq!(store.history(&format!("session-{i}")).await.unwrap().len(), 1);
        }
    }
}
