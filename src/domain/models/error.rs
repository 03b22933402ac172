use thiserror::Error;

/// Failures surfaced by the agent, auth, and speech layers. Every variant is
/// cheap to clone so errors can ride along inside [`super::Event`]s back to the
/// conversation controller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    /// Required configuration is blank. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    Session(String),

    /// The remote agent no longer knows the session (HTTP 404 on send).
    #[error("The agent session no longer exists")]
    SessionNotFound,

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Speech synthesis failed: {0}")]
    Tts(String),

    #[error("Speech recognition failed: {0}")]
    Recognition(String),
}

impl ChatError {
    pub fn is_retryable(&self) -> bool {
        return matches!(self, ChatError::Timeout(_));
    }

    /// Maps a transport level reqwest failure, keeping timeouts distinct so
    /// the user is told to retry.
    pub fn from_request(what: &str, err: reqwest::Error, wrap: fn(String) -> ChatError) -> ChatError {
        if err.is_timeout() {
            return ChatError::Timeout(what.to_string());
        }

        return wrap(format!("{what} failed: {err}"));
    }
}
