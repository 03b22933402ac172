#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::Sender;
use crate::domain::services::annotations;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub is_typing: bool,
    pub is_error: bool,
    pub has_raw_html: bool,
    pub thinking_process: Option<String>,
}

impl Message {
    pub fn new(sender: Sender, text: &str) -> Message {
        return Message {
            id: Uuid::new_v4().to_string(),
            sender,
            text: text.trim().to_string(),
            timestamp: Utc::now(),
            is_typing: false,
            is_error: false,
            has_raw_html: false,
            thinking_process: None,
        };
    }

    /// Builds an agent message, lifting the first thinking annotation out of
    /// the displayed text.
    pub fn from_agent(text: &str) -> Message {
        let (display, thinking) = annotations::extract_thinking(text);
        let mut msg = Message::new(Sender::Agent, &display);
        msg.has_raw_html = annotations::contains_markup(&msg.text);
        msg.thinking_process = thinking;

        return msg;
    }

    pub fn system_error(text: &str) -> Message {
        let mut msg = Message::new(Sender::System, text);
        msg.is_error = true;

        return msg;
    }

    pub fn typing() -> Message {
        let mut msg = Message::new(Sender::System, "Typing...");
        msg.is_typing = true;

        return msg;
    }

    /// System messages are the only ones ever removed from the log.
    pub fn is_transient(&self) -> bool {
        return self.sender == Sender::System && self.is_typing;
    }
}
