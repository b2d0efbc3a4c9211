//! SessionPool - one agent per conversation, one turn at a time.
//!
//! Each conversation's agent sits behind a fair async mutex: concurrent turns
//! on the same conversation run in the order they asked, different
//! conversations do not wait on each other.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use tokio::sync::Mutex;

use super::conversation::{AgentError, ConversationAgent, TurnOutcome};
use crate::llm::Message;

/// Whether a turn is in flight on a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Processing,
}

type AgentFactory = Box<dyn Fn() -> ConversationAgent + Send + Sync>;

/// Conversation agents keyed by conversation id
pub struct SessionPool {
    sessions: Mutex<HashMap<String, Arc<Mutex<ConversationAgent>>>>,
    factory: AgentFactory,
}

impl SessionPool {
    /// Pool creating agents on first use with `factory`
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> ConversationAgent + Send + Sync + 'static,
    {
        Self {
            sessions: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    /// The agent for `conversation_id`, created if missing
    pub async fn session(&self, conversation_id: &str) -> Arc<Mutex<ConversationAgent>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", conversation_id);
                Arc::new(Mutex::new((self.factory)()))
            })
            .clone()
    }

    /// Run one turn, queued behind any turn already running on the conversation
    pub async fn respond_to(&self, conversation_id: &str, user_message: &str) -> Result<TurnOutcome, AgentError> {
        let session = self.session(conversation_id).await;
        let mut agent = session.lock().await;
        agent.respond_to(user_message).await
    }

    /// `Processing` while a turn holds the conversation's agent
    pub async fn state(&self, conversation_id: &str) -> Option<AgentState> {
        let session = self.sessions.lock().await.get(conversation_id).cloned()?;
        Some(match session.try_lock() {
            Ok(_) => AgentState::Idle,
            Err(_) => AgentState::Processing,
        })
    }

    /// Snapshot of a conversation's history
    pub async fn history(&self, conversation_id: &str) -> Option<Vec<Message>> {
        let session = self.sessions.lock().await.get(conversation_id).cloned()?;
        let agent = session.lock().await;
        Some(agent.history().to_vec())
    }

    /// Drop a conversation, returning whether it existed
    pub async fn close(&self, conversation_id: &str) -> bool {
        self.sessions.lock().await.remove(conversation_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
