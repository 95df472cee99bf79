use crate::llm::ChatTurn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// History and activity for one session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Role-tagged turns, oldest first
    pub turns: Vec<ChatTurn>,

    /// When a request last touched this conversation
    pub last_activity: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Record one completed exchange
    pub fn record_exchange(&mut self, user_text: &str, reply: &str) {
        self.turns.push(ChatTurn::user(user_text));
        self.turns.push(ChatTurn::assistant(reply));
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
