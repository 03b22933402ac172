use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Agent;
use crate::domain::models::AudioPlayer;
use crate::domain::models::ChatError;
use crate::domain::models::SpeechRecognizer;
use crate::domain::models::Synthesizer;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AgentCalls {
    pub opens: usize,
    pub sends: Vec<(String, u64, String)>,
    pub closes: Vec<String>,
}

/// Scripted agent. Queued results are consumed in order, falling back to a
/// fresh `sess-N` id on open and an echo reply on send.
#[derive(Default)]
pub struct FakeAgent {
    pub calls: Mutex<AgentCalls>,
    invalid: Option<ChatError>,
    open_results: Mutex<VecDeque<Result<String, ChatError>>>,
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    close_result: Option<ChatError>,
}

impl FakeAgent {
    pub fn invalid(mut self, err: ChatError) -> FakeAgent {
        self.invalid = Some(err);
        return self;
    }

    pub fn open_results(self, results: Vec<Result<String, ChatError>>) -> FakeAgent {
        *self.open_results.lock().unwrap() = results.into();
        return self;
    }

    pub fn replies(self, replies: Vec<Result<String, ChatError>>) -> FakeAgent {
        *self.replies.lock().unwrap() = replies.into();
        return self;
    }

    pub fn failing_close(mut self, err: ChatError) -> FakeAgent {
        self.close_result = Some(err);
        return self;
    }

    pub fn calls(&self) -> AgentCalls {
        return self.calls.lock().unwrap().clone();
    }
}

#[async_trait]
impl Agent for FakeAgent {
    fn validate(&self) -> Result<(), ChatError> {
        if let Some(err) = &self.invalid {
            return Err(err.clone());
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn open_session(&self) -> Result<String, ChatError> {
        let opens = {
            let mut calls = self.calls.lock().unwrap();
            calls.opens += 1;
            calls.opens
        };

        return self
            .open_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(format!("sess-{opens}")));
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(
        &self,
        session_id: &str,
        sequence_id: u64,
        text: &str,
    ) -> Result<String, ChatError> {
        self.calls.lock().unwrap().sends.push((
            session_id.to_string(),
            sequence_id,
            text.to_string(),
        ));

        return self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| return Ok(format!("Reply to {text}")));
    }

    #[allow(clippy::implicit_return)]
    async fn close_session(&self, session_id: &str) -> Result<(), ChatError> {
        self.calls.lock().unwrap().closes.push(session_id.to_string());
        if let Some(err) = &self.close_result {
            return Err(err.clone());
        }

        return Ok(());
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    pub texts: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    #[allow(clippy::implicit_return)]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ChatError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(ChatError::Tts("status 401".to_string()));
        }

        return Ok(text.as_bytes().to_vec());
    }
}

/// Plays instantly, or never finishes when `hang` is set so interruption can
/// be observed.
#[derive(Default)]
pub struct FakePlayer {
    pub plays: AtomicUsize,
    pub hang: bool,
}

#[async_trait]
impl AudioPlayer for FakePlayer {
    #[allow(clippy::implicit_return)]
    async fn play(&self, _clip: Vec<u8>) -> Result<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }

        return Ok(());
    }
}

#[derive(Default)]
pub struct FakeRecognizer {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail: Option<ChatError>,
}

impl FakeRecognizer {
    pub fn starts(&self) -> usize {
        return self.starts.load(Ordering::SeqCst);
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&self) -> Result<(), ChatError> {
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }

        self.starts.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}
