#[cfg(test)]
#[path = "turns_test.rs"]
mod tests;

use crate::domain::models::AgentBox;
use crate::domain::models::ChatError;
use crate::domain::models::TurnOutcome;

/// Delivers one user turn. When the agent reports the session as gone, a
/// replacement session is opened once and the turn is resent as its first
/// message. A second miss is terminal rather than retried again.
pub async fn deliver(
    agent: AgentBox,
    session_id: String,
    sequence_id: u64,
    text: String,
) -> TurnOutcome {
    match agent.send_message(&session_id, sequence_id, &text).await {
        Ok(reply) => return TurnOutcome::Replied(reply),
        Err(ChatError::SessionNotFound) => {
            tracing::warn!(
                session_id = session_id,
                sequence_id = sequence_id,
                "Session expired, reopening"
            );
        }
        Err(err) => return TurnOutcome::Failed(err),
    }

    let new_session_id = match agent.open_session().await {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(error = ?err, "Failed to reopen expired session");
            return TurnOutcome::Expired(err);
        }
    };

    match agent.send_message(&new_session_id, 1, &text).await {
        Err(ChatError::SessionNotFound) => {
            tracing::error!(session_id = new_session_id, "Reopened session expired immediately");
            return TurnOutcome::Expired(ChatError::SessionNotFound);
        }
        reply => {
            return TurnOutcome::Reconnected {
                session_id: new_session_id,
                reply,
            };
        }
    }
}
