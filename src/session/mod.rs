//! Conversation session management
//!
//! This module provides the session store the `/generate` handler uses to:
//! - Create a conversation lazily on the first request for a session id
//! - Hand out a per-session lock so requests on one session run one at a time
//! - Track last activity and drop idle conversations

mod conversation;
mod store;

pub use conversation::Conversation;
pub use store::{InMemorySessionStore, SessionStore};
