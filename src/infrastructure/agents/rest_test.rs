use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use mockito::Mock;
use mockito::ServerGuard;
use test_utils::messages_response_fixture;

use super::first_reply_text;
use super::RestAgent;
use crate::domain::models::Agent;
use crate::domain::models::ChatError;
use crate::domain::services::TokenCache;

impl RestAgent {
    pub fn with_url(url: String) -> RestAgent {
        return RestAgent {
            url: url.to_string(),
            agent_id: "agent-1".to_string(),
            instance_url: "https://example.my.salesforce.com".to_string(),
            client_id: "id123".to_string(),
            client_secret: "shh".to_string(),
            timeout: Duration::from_millis(500),
            token_cache: Arc::new(TokenCache::new(
                &format!("{url}/token"),
                Duration::from_millis(500),
            )),
        };
    }
}

async fn mock_token(server: &mut ServerGuard, hits: usize) -> Mock {
    return server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(r#"{"access_token":"tok","expires_in":3600}"#)
        .expect(hits)
        .create_async()
        .await;
}

#[test]
fn it_validates_required_configuration() {
    let mut agent = RestAgent::with_url("http://localhost".to_string());
    assert!(agent.validate().is_ok());

    agent.agent_id = "".to_string();
    agent.client_secret = " ".to_string();
    let err = agent.validate().unwrap_err();

    assert!(matches!(err, ChatError::Validation(_)));
    insta::assert_snapshot!(err.to_string(), @"The chat is not configured correctly. Missing: agent-id, client-secret");
}

#[test]
fn it_requires_an_auth_url() {
    let mut agent = RestAgent::with_url("http://localhost".to_string());
    agent.token_cache = Arc::new(TokenCache::new("", Duration::from_millis(500)));

    let err = agent.validate().unwrap_err();
    assert_eq!(
        err,
        ChatError::Validation("The chat is not configured correctly. Missing: auth-url".to_string())
    );
}

#[test]
fn it_reads_reply_text_from_known_shapes() {
    let nested: serde_json::Value =
        serde_json::from_str(&messages_response_fixture("Hello!")).unwrap();
    assert_eq!(first_reply_text(&nested), "Hello!");

    let flat = serde_json::json!({ "messages": [{ "message": "Flat hello" }] });
    assert_eq!(first_reply_text(&flat), "Flat hello");

    let empty = serde_json::json!({ "messages": [] });
    assert_eq!(first_reply_text(&empty), "");

    let other = serde_json::json!({ "unexpected": true });
    assert_eq!(first_reply_text(&other), "");
}

#[tokio::test]
async fn it_opens_a_session() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let token_mock = mock_token(&mut server, 1).await;
    let mock = server
        .mock("POST", "/agents/agent-1/sessions")
        .match_header("authorization", "Bearer tok")
        .match_header("content-type", "application/json")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#""externalSessionKey":"[0-9a-f-]{36}""#.to_string()),
            Matcher::PartialJsonString(
                r#"{"instanceConfig":{"endpoint":"https://example.my.salesforce.com"},"streamingCapabilities":{"chunkTypes":["Text"]},"bypassUser":true}"#.to_string(),
            ),
        ]))
        .with_status(200)
        .with_body(r#"{"sessionId":"sess-1","messages":[]}"#)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let session_id = agent.open_session().await?;

    token_mock.assert_async().await;
    mock.assert_async().await;
    assert_eq!(session_id, "sess-1");

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_open_without_a_session_id() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("POST", "/agents/agent-1/sessions")
        .with_status(201)
        .with_body(r#"{"messages":[]}"#)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.open_session().await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"The agent did not return a session id");
}

#[tokio::test]
async fn it_propagates_open_failures() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("POST", "/agents/agent-1/sessions")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.open_session().await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Failed to start the chat session (500): boom");
}

#[tokio::test]
async fn it_surfaces_auth_failures_before_opening() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/token")
        .with_status(401)
        .with_body(r#"{"error":"invalid_client"}"#)
        .create_async()
        .await;
    let mock = server
        .mock("POST", "/agents/agent-1/sessions")
        .expect(0)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.open_session().await.unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, ChatError::Auth("invalid_client".to_string()));
}

#[tokio::test]
async fn it_sends_messages_with_sequence_ids() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let token_mock = mock_token(&mut server, 1).await;
    let first = server
        .mock("POST", "/sessions/sess-1/messages")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(serde_json::json!({
            "message": { "sequenceId": 1, "type": "Text", "text": "Hello" },
            "variables": []
        })))
        .with_status(200)
        .with_body(messages_response_fixture("Hi! How can I help?"))
        .create_async()
        .await;
    let second = server
        .mock("POST", "/sessions/sess-1/messages")
        .match_body(Matcher::Json(serde_json::json!({
            "message": { "sequenceId": 2, "type": "Text", "text": "Thanks" },
            "variables": []
        })))
        .with_status(200)
        .with_body(messages_response_fixture("You're welcome."))
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let first_reply = agent.send_message("sess-1", 1, "Hello").await?;
    let second_reply = agent.send_message("sess-1", 2, "Thanks").await?;

    token_mock.assert_async().await;
    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(first_reply, "Hi! How can I help?");
    assert_eq!(second_reply, "You're welcome.");

    return Ok(());
}

#[tokio::test]
async fn it_returns_empty_text_for_unexpected_replies() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(200)
        .with_body(r#"{"messages":[{"type":"Inform"}]}"#)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    assert_eq!(agent.send_message("sess-1", 1, "Hello").await?, "");

    return Ok(());
}

#[tokio::test]
async fn it_distinguishes_expired_sessions() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(404)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.send_message("sess-1", 3, "Hello").await.unwrap_err();

    assert_eq!(err, ChatError::SessionNotFound);
}

#[tokio::test]
async fn it_reports_send_failures() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(400)
        .with_body("bad sequence")
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.send_message("sess-1", 1, "Hello").await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"The agent could not process your message (400): bad sequence");
}

#[tokio::test]
async fn it_drops_the_token_when_unauthorized() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let token_mock = mock_token(&mut server, 2).await;
    let _mock = server
        .mock("POST", "/sessions/sess-1/messages")
        .with_status(401)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    assert!(agent.send_message("sess-1", 1, "Hello").await.is_err());
    assert!(agent.send_message("sess-1", 2, "Hello").await.is_err());

    // The second call had to exchange credentials again.
    token_mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_closes_sessions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let mock = server
        .mock("DELETE", "/sessions/sess-1")
        .match_header("authorization", "Bearer tok")
        .match_header("x-session-end-reason", "UserRequest")
        .with_status(204)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    agent.close_session("sess-1").await?;
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_treats_missing_sessions_as_closed() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("DELETE", "/sessions/sess-1")
        .with_status(404)
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    agent.close_session("sess-1").await?;

    return Ok(());
}

#[tokio::test]
async fn it_reports_close_failures() {
    let mut server = mockito::Server::new_async().await;
    let _token = mock_token(&mut server, 1).await;
    let _mock = server
        .mock("DELETE", "/sessions/sess-1")
        .with_status(500)
        .with_body("nope")
        .create_async()
        .await;

    let agent = RestAgent::with_url(server.url());
    let err = agent.close_session("sess-1").await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"Failed to close the chat session (500): nope");
}
