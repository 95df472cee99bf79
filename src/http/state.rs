use crate::llm::ChatCompletion;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::tts::SpeechSynthesisOrchestrator;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Conversation history per session id
    pub sessions: Arc<dyn SessionStore>,

    pub chat: Arc<dyn ChatCompletion>,

    pub speech: Arc<SpeechSynthesisOrchestrator>,

    /// Size of the pieces the response envelope is streamed in
    pub response_chunk_bytes: usize,
}

impl AppState {
    pub fn new(chat: Arc<dyn ChatCompletion>, speech: Arc<SpeechSynthesisOrchestrator>) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            chat,
            speech,
            response_chunk_bytes: 8192,
        }
    }

    pub fn with_response_chunk_bytes(mut self, bytes: usize) -> Self {
        self.response_chunk_bytes = bytes.max(1);
        self
    }
}
