#[cfg(test)]
#[path = "rest_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Agent;
use crate::domain::models::ChatError;
use crate::domain::services::TokenCache;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceConfig {
    endpoint: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamingCapabilities {
    chunk_types: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenSessionRequest {
    external_session_key: String,
    instance_config: InstanceConfig,
    streaming_capabilities: StreamingCapabilities,
    bypass_user: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenSessionResponse {
    session_id: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextMessage {
    sequence_id: u64,
    #[serde(rename = "type")]
    _type: String,
    text: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SendMessageRequest {
    message: TextMessage,
    variables: Vec<serde_json::Value>,
}

/// Pulls the first reply text out of a messages response. Shapes that do not
/// match yield an empty reply.
fn first_reply_text(body: &serde_json::Value) -> String {
    let message = &body["messages"][0]["message"];
    if let Some(text) = message.as_str() {
        return text.to_string();
    }

    return message["text"].as_str().unwrap_or_default().to_string();
}

pub struct RestAgent {
    url: String,
    agent_id: String,
    instance_url: String,
    client_id: String,
    client_secret: String,
    timeout: Duration,
    token_cache: Arc<TokenCache>,
}

impl RestAgent {
    pub fn new(token_cache: Arc<TokenCache>) -> RestAgent {
        return RestAgent {
            url: Config::get(ConfigKey::AgentApiURL),
            agent_id: Config::get(ConfigKey::AgentId),
            instance_url: Config::get(ConfigKey::InstanceURL),
            client_id: Config::get(ConfigKey::ClientId),
            client_secret: Config::get(ConfigKey::ClientSecret),
            timeout: Duration::from_millis(Config::get_number::<u64>(ConfigKey::AgentTimeout)),
            token_cache,
        };
    }

    async fn token(&self) -> Result<String, ChatError> {
        return self
            .token_cache
            .get_token(&self.client_id, &self.client_secret)
            .await;
    }

    async fn on_unauthorized(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Agent API rejected the access token, dropping it");
            self.token_cache.invalidate().await;
        }
    }

    fn request_error(&self, what: &str, err: reqwest::Error) -> ChatError {
        tracing::error!(error = ?err, "{what} failed");
        return ChatError::from_request(what, err, ChatError::Session);
    }
}

#[async_trait]
impl Agent for RestAgent {
    fn validate(&self) -> Result<(), ChatError> {
        let auth_url = self.token_cache.url().to_string();
        let required = [
            (ConfigKey::AgentId, &self.agent_id),
            (ConfigKey::AgentApiURL, &self.url),
            (ConfigKey::AuthURL, &auth_url),
            (ConfigKey::ClientId, &self.client_id),
            (ConfigKey::ClientSecret, &self.client_secret),
        ];

        let missing = required
            .iter()
            .filter(|(_, val)| return val.trim().is_empty())
            .map(|(key, _)| return key.to_string())
            .collect::<Vec<String>>();

        if !missing.is_empty() {
            return Err(ChatError::Validation(format!(
                "The chat is not configured correctly. Missing: {}",
                missing.join(", ")
            )));
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open_session(&self) -> Result<String, ChatError> {
        let token = self.token().await?;
        let req = OpenSessionRequest {
            external_session_key: Uuid::new_v4().to_string(),
            instance_config: InstanceConfig {
                endpoint: self.instance_url.to_string(),
            },
            streaming_capabilities: StreamingCapabilities {
                chunk_types: vec!["Text".to_string()],
            },
            bypass_user: true,
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/agents/{agent_id}/sessions",
                url = self.url,
                agent_id = self.agent_id
            ))
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|err| return self.request_error("Opening the session", err))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| return self.request_error("Opening the session", err))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = text, "Failed to open agent session");
            self.on_unauthorized(status).await;
            return Err(ChatError::Session(format!(
                "Failed to start the chat session ({}): {text}",
                status.as_u16()
            )));
        }

        let body: OpenSessionResponse = serde_json::from_str(&text).unwrap_or_default();
        match body.session_id {
            Some(session_id) if !session_id.is_empty() => {
                tracing::debug!(session_id = session_id, "Opened agent session");
                return Ok(session_id);
            }
            _ => {
                return Err(ChatError::Session(
                    "The agent did not return a session id".to_string(),
                ));
            }
        }
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(
        &self,
        session_id: &str,
        sequence_id: u64,
        text: &str,
    ) -> Result<String, ChatError> {
        let token = self.token().await?;
        let req = SendMessageRequest {
            message: TextMessage {
                sequence_id,
                _type: "Text".to_string(),
                text: text.to_string(),
            },
            variables: vec![],
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/sessions/{session_id}/messages",
                url = self.url
            ))
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|err| return self.request_error("Waiting for the agent", err))?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            tracing::warn!(session_id = session_id, "Agent session no longer exists");
            return Err(ChatError::SessionNotFound);
        }

        let body = res
            .text()
            .await
            .map_err(|err| return self.request_error("Waiting for the agent", err))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = body, "Failed to send message to agent");
            self.on_unauthorized(status).await;
            return Err(ChatError::Session(format!(
                "The agent could not process your message ({}): {body}",
                status.as_u16()
            )));
        }

        let json = serde_json::from_str::<serde_json::Value>(&body).unwrap_or_default();
        tracing::debug!(body = ?json, "Agent reply");

        return Ok(first_reply_text(&json));
    }

    #[allow(clippy::implicit_return)]
    async fn close_session(&self, session_id: &str) -> Result<(), ChatError> {
        let token = self.token().await?;
        let res = reqwest::Client::new()
            .delete(format!("{url}/sessions/{session_id}", url = self.url))
            .bearer_auth(token)
            .header("x-session-end-reason", "UserRequest")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| return self.request_error("Closing the session", err))?;

        let status = res.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            tracing::debug!(session_id = session_id, status = status.as_u16(), "Closed agent session");
            return Ok(());
        }

        let body = res.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = body, "Failed to close agent session");
        return Err(ChatError::Session(format!(
            "Failed to close the chat session ({}): {body}",
            status.as_u16()
        )));
    }
}
