use std::sync::Arc;

use async_trait::async_trait;

use super::ChatError;

/// Result of delivering one user turn to the agent, including the single
/// reconnect attempt made when the session has expired remotely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied(String),
    /// The session had expired, a new one was opened and the turn was
    /// resent as its first message.
    Reconnected {
        session_id: String,
        reply: Result<String, ChatError>,
    },
    Failed(ChatError),
    /// The session expired and could not be replaced. Terminal for the
    /// conversation.
    Expired(ChatError),
}

#[async_trait]
pub trait Agent {
    /// Used before opening a session to verify all configuration is present.
    /// Must not touch the network.
    fn validate(&self) -> Result<(), ChatError>;

    /// Opens a new remote session and returns its id.
    async fn open_session(&self) -> Result<String, ChatError>;

    /// Sends one text message and returns the agent's reply text. A session
    /// the agent no longer knows about is reported as
    /// [`ChatError::SessionNotFound`].
    async fn send_message(
        &self,
        session_id: &str,
        sequence_id: u64,
        text: &str,
    ) -> Result<String, ChatError>;

    /// Ends the remote session. A session that is already gone is not an
    /// error.
    async fn close_session(&self, session_id: &str) -> Result<(), ChatError>;
}

pub type AgentBox = Arc<dyn Agent + Send + Sync>;
