#[cfg(test)]
#[path = "token_cache_test.rs"]
mod tests;

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::sync::Mutex;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatError;

/// Tokens this close to expiry are treated as already expired.
const EXPIRY_MARGIN_SECS: u64 = 60;
const DEFAULT_EXPIRES_IN_SECS: u64 = 1800;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub expires_at: u64,
}

impl Token {
    pub fn is_fresh(&self, now: u64) -> bool {
        return self.expires_at > now + EXPIRY_MARGIN_SECS;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ClientCredentialsRequest {
    grant_type: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

fn now_secs() -> u64 {
    return SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|e| return e.as_secs())
        .unwrap_or_default();
}

fn parse_expires_in(val: &Option<serde_json::Value>) -> u64 {
    let parsed = match val {
        Some(serde_json::Value::Number(num)) => num.as_u64(),
        Some(serde_json::Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    return parsed.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
}

/// Bearer token shared by every session for the lifetime of the process.
/// Refreshed through a client credentials exchange when missing or about to
/// expire.
pub struct TokenCache {
    token: Mutex<Option<Token>>,
    url: String,
    timeout: Duration,
}

impl Default for TokenCache {
    fn default() -> TokenCache {
        return TokenCache::new(
            &Config::get(ConfigKey::AuthURL),
            Duration::from_millis(Config::get_number::<u64>(ConfigKey::AuthTimeout)),
        );
    }
}

impl TokenCache {
    pub fn new(url: &str, timeout: Duration) -> TokenCache {
        return TokenCache {
            token: Mutex::new(None),
            url: url.to_string(),
            timeout,
        };
    }

    pub async fn get_token(&self, client_id: &str, client_secret: &str) -> Result<String, ChatError> {
        // Held across the exchange so concurrent callers share one refresh.
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh(now_secs()) {
                return Ok(token.value.to_string());
            }
        }

        let token = self.exchange(client_id, client_secret).await?;
        let value = token.value.to_string();
        *cached = Some(token);

        return Ok(value);
    }

    pub fn url(&self) -> &str {
        return &self.url;
    }

    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn exchange(&self, client_id: &str, client_secret: &str) -> Result<Token, ChatError> {
        if client_id.trim().is_empty() || client_secret.trim().is_empty() {
            return Err(ChatError::Auth(
                "Client id and client secret must be configured".to_string(),
            ));
        }
        if self.url.is_empty() {
            return Err(ChatError::Auth("Auth URL is not defined".to_string()));
        }

        let req = ClientCredentialsRequest {
            grant_type: "client_credentials".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        };

        let res = reqwest::Client::new()
            .post(&self.url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .form(&req)
            .send()
            .await
            .map_err(|err| return ChatError::from_request("Token request", err, ChatError::Auth))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|err| return ChatError::from_request("Token request", err, ChatError::Auth))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = text, "Token request failed");
            let description = serde_json::from_str::<TokenErrorResponse>(&text)
                .ok()
                .and_then(|e| return e.error_description.or(e.error))
                .unwrap_or_else(|| return format!("status {}", status.as_u16()));
            return Err(ChatError::Auth(description));
        }

        let token_result: TokenResponse = serde_json::from_str(&text)
            .map_err(|err| return ChatError::Auth(format!("Unexpected token response: {err}")))?;
        let expires_in = parse_expires_in(&token_result.expires_in);
        tracing::debug!(expires_in = expires_in, "Fetched access token");

        return Ok(Token {
            value: token_result.access_token,
            expires_at: now_secs().saturating_add(expires_in),
        });
    }
}
