use super::conversation::Conversation;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Storage for conversations keyed by session id
///
/// Callers hold the returned conversation lock for the whole exchange, so two
/// requests on the same session never interleave their history updates.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the conversation for `session_id`, creating it if needed, and mark it active
    async fn checkout(&self, session_id: &str) -> Arc<Mutex<Conversation>>;

    /// Drop conversations idle for longer than `max_idle`; returns how many were dropped
    async fn purge_idle(&self, max_idle: Duration) -> usize;

    async fn len(&self) -> usize;
}

/// Process-local session store
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn checkout(&self, session_id: &str) -> Arc<Mutex<Conversation>> {
        let existing = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).cloned()
        };

        let conversation = match existing {
            Some(conversation) => conversation,
            None => {
                let mut sessions = self.sessions.write().await;
                Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
                    info!("Created session: {}", session_id);
                    Arc::new(Mutex::new(Conversation::new()))
                }))
            }
        };

        // Busy conversations are touched by their holder when it records the exchange
        if let Ok(mut guard) = conversation.try_lock() {
            guard.touch();
        }

        conversation
    }

    async fn purge_idle(&self, max_idle: Duration) -> usize {
        let max_idle = match chrono::Duration::from_std(max_idle) {
            Ok(d) => d,
            Err(_) => return 0,
        };
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, conversation| match conversation.try_lock() {
            Ok(guard) => {
                let keep = now.signed_duration_since(guard.last_activity) <= max_idle;
                if !keep {
                    debug!("Expiring idle session: {}", id);
                }
                keep
            }
            // In use by a request right now
            Err(_) => true,
        });

        before - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
