#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use tokio::sync::mpsc;

use super::deliver;
use super::Heard;
use super::SpeechInput;
use super::SpeechOutput;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AgentBox;
use crate::domain::models::ChatError;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::RecognitionEvent;
use crate::domain::models::Sender;
use crate::domain::models::Session;
use crate::domain::models::SessionContext;
use crate::domain::models::TurnOutcome;
use crate::domain::models::VoiceState;
use crate::domain::models::WidgetState;

/// Sent in place of a user message to have the agent introduce itself when no
/// welcome message is configured.
pub const GREETING_TURN: &str = "Hello";

pub const SESSION_EXPIRED_TEXT: &str = "Your session has expired. Please start a new chat.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetSettings {
    pub welcome_message: String,
    pub voice_enabled: bool,
}

impl Default for WidgetSettings {
    fn default() -> WidgetSettings {
        return WidgetSettings {
            welcome_message: Config::get(ConfigKey::WelcomeMessage),
            voice_enabled: Config::get_bool(ConfigKey::VoiceEnabled),
        };
    }
}

/// The widget controller. All state lives here and is only mutated from
/// [`Conversation::handle`], which the host calls for user actions and for
/// completions of the work spawned by earlier events. Completions carry the
/// session version they were issued under and are dropped once it is stale.
pub struct Conversation {
    agent: AgentBox,
    settings: WidgetSettings,
    tx: mpsc::UnboundedSender<Event>,
    state: WidgetState,
    messages: Vec<Message>,
    session: SessionContext,
    awaiting_reply: bool,
    voice_active: bool,
    speech_output: SpeechOutput,
    speech_input: SpeechInput,
}

impl Conversation {
    pub fn new(
        agent: AgentBox,
        settings: WidgetSettings,
        speech_output: SpeechOutput,
        speech_input: SpeechInput,
        tx: mpsc::UnboundedSender<Event>,
    ) -> Conversation {
        return Conversation {
            agent,
            settings,
            tx,
            state: WidgetState::default(),
            messages: vec![],
            session: SessionContext::default(),
            awaiting_reply: false,
            voice_active: false,
            speech_output,
            speech_input,
        };
    }

    pub fn state(&self) -> WidgetState {
        return self.state;
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn voice_state(&self) -> VoiceState {
        return VoiceState {
            active: self.voice_active,
            listening: self.speech_input.is_listening(),
            speaking: self.speech_output.is_speaking(),
        };
    }

    pub fn voice_enabled(&self) -> bool {
        return self.settings.voice_enabled;
    }

    /// Typed input is accepted only in an active chat with no reply pending
    /// and voice mode off.
    pub fn is_input_enabled(&self) -> bool {
        return self.state == WidgetState::Active && !self.awaiting_reply && !self.voice_active;
    }

    pub fn is_awaiting_reply(&self) -> bool {
        return self.awaiting_reply;
    }

    pub fn session_id(&self) -> Option<String> {
        return self.session.session().map(|e| return e.id.to_string());
    }

    /// Thinking process attached to the most recent agent reply, if any.
    pub fn last_thinking(&self) -> Option<String> {
        return self
            .messages
            .iter()
            .rev()
            .find(|e| return e.sender == Sender::Agent)
            .and_then(|e| return e.thinking_process.clone());
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::WidgetOpen() => self.open(),
            Event::WidgetMinimize() => self.end(false),
            Event::ChatEnd() => self.end(true),
            Event::UserInput(text) => self.submit(&text),
            Event::VoiceToggle() => self.toggle_voice(),
            Event::SessionOpened { version, result } => self.on_session_opened(version, result),
            Event::TurnCompleted { version, outcome } => self.on_turn_completed(version, outcome),
            Event::SessionClosed { session_id, result } => {
                if let Err(err) = result {
                    tracing::warn!(session_id = session_id, error = ?err, "Remote session close failed");
                } else {
                    tracing::debug!(session_id = session_id, "Remote session closed");
                }
            }
            Event::SpeechFinished { generation, error } => {
                self.on_speech_finished(generation, error)
            }
            Event::Recognition(recognition) => self.on_recognition(recognition),
            Event::ListenRetry { generation } => self.on_listen_retry(generation),
        }
    }

    /// Opens the window. From the bubble or the ended screen this starts a
    /// fresh session. An already open window is left as it is.
    pub fn open(&mut self) {
        if self.state.is_window_open() {
            return;
        }

        self.start_session();
    }

    /// Ends the current chat and opens a new one in its place.
    pub fn new_chat(&mut self) {
        self.end(true);
        self.start_session();
    }

    /// Stops voice activity, asks the agent to close the session and clears
    /// local state whether or not that close succeeds.
    pub fn end(&mut self, user_requested: bool) {
        self.voice_off();

        if let Some(session) = self.session.take() {
            self.spawn_close(session.id);
        }

        self.messages.clear();
        self.awaiting_reply = false;
        self.state = if user_requested {
            WidgetState::Ended
        } else {
            WidgetState::Minimized
        };
        tracing::debug!(state = self.state.to_string(), "Chat ended");
    }

    pub fn submit(&mut self, text: &str) {
        if self.voice_active {
            tracing::debug!("Ignoring typed input while voice mode is on");
            return;
        }

        self.send_user_turn(text);
    }

    pub fn toggle_voice(&mut self) {
        if self.voice_active {
            self.voice_off();
            return;
        }

        if self.state != WidgetState::Active {
            return;
        }

        if !self.settings.voice_enabled {
            self.messages
                .push(Message::system_error("Voice mode is not enabled for this chat."));
            return;
        }

        self.voice_active = true;
        if !self.awaiting_reply {
            self.resume_listening();
        }
    }

    fn start_session(&mut self) {
        self.voice_off();
        self.messages.clear();
        self.awaiting_reply = false;
        let version = self.session.reset();

        if let Err(err) = self.agent.validate() {
            tracing::error!(error = ?err, "Chat is not configured");
            self.fail(err);
            return;
        }

        self.state = WidgetState::Initializing;

        let agent = self.agent.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = agent.open_session().await;
            tx.send(Event::SessionOpened { version, result }).ok();
        });
    }

    fn on_session_opened(&mut self, version: u64, result: Result<String, ChatError>) {
        if !self.session.is_current(version) {
            tracing::debug!(version = version, "Dropping stale session open");
            if let Ok(session_id) = result {
                self.spawn_close(session_id);
            }
            return;
        }

        let session_id = match result {
            Ok(session_id) => session_id,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to open session");
                self.fail(err);
                return;
            }
        };

        self.session.attach(version, Session::new(&session_id));
        self.state = WidgetState::Active;

        if self.settings.welcome_message.trim().is_empty() {
            self.dispatch(GREETING_TURN);
        } else {
            let welcome = self.settings.welcome_message.to_string();
            self.messages.push(Message::from_agent(&welcome));
        }
    }

    fn send_user_turn(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if self.state != WidgetState::Active {
            tracing::debug!(state = self.state.to_string(), "Ignoring input outside of an active chat");
            return;
        }

        if self.awaiting_reply {
            tracing::debug!("Ignoring input while a reply is pending");
            return;
        }

        self.messages.push(Message::new(Sender::User, text));
        self.dispatch(text);
    }

    fn dispatch(&mut self, text: &str) {
        let (session_id, sequence_id) = match self.session.next_message() {
            Some(next) => next,
            None => {
                self.fail(ChatError::Session("There is no open chat session.".to_string()));
                return;
            }
        };

        self.awaiting_reply = true;
        self.messages.push(Message::typing());

        let version = self.session.version();
        let agent = self.agent.clone();
        let tx = self.tx.clone();
        let text = text.to_string();
        tracing::debug!(session_id = session_id, sequence_id = sequence_id, "Sending turn");

        tokio::spawn(async move {
            let outcome = deliver(agent, session_id, sequence_id, text).await;
            tx.send(Event::TurnCompleted { version, outcome }).ok();
        });
    }

    fn on_turn_completed(&mut self, version: u64, outcome: TurnOutcome) {
        if !self.session.is_current(version) {
            tracing::debug!(version = version, "Dropping reply for a discarded session");
            if let TurnOutcome::Reconnected { session_id, .. } = outcome {
                self.spawn_close(session_id);
            }
            return;
        }

        self.awaiting_reply = false;
        self.messages.retain(|e| return !e.is_transient());

        match outcome {
            TurnOutcome::Replied(reply) => self.on_reply(&reply),
            TurnOutcome::Reconnected { session_id, reply } => {
                // The turn was resent as the first message of the new session.
                let mut session = Session::new(&session_id);
                session.next_sequence();
                self.session.attach(version, session);

                match reply {
                    Ok(reply) => self.on_reply(&reply),
                    Err(err) => self.on_turn_failed(err),
                }
            }
            TurnOutcome::Failed(err) => self.on_turn_failed(err),
            TurnOutcome::Expired(err) => {
                tracing::error!(error = ?err, "Session expired and could not be replaced");
                self.session.reset();
                self.voice_off();
                self.state = WidgetState::Error;
                self.messages.push(Message::system_error(SESSION_EXPIRED_TEXT));
            }
        }
    }

    fn on_reply(&mut self, reply: &str) {
        if reply.trim().is_empty() {
            tracing::debug!("Agent replied with no text");
            self.resume_listening();
            return;
        }

        self.messages.push(Message::from_agent(reply));

        if self.voice_active {
            self.speech_input.stop();
            self.speech_output.speak(reply);
        }
    }

    fn on_turn_failed(&mut self, err: ChatError) {
        if matches!(err, ChatError::Auth(_) | ChatError::Validation(_)) {
            self.fail(err);
            return;
        }

        let mut text = err.to_string();
        if err.is_retryable() {
            text = format!("{text}. Please try again.");
        }
        self.messages.push(Message::system_error(&text));
        self.resume_listening();
    }

    fn on_speech_finished(&mut self, generation: u64, error: Option<ChatError>) {
        if !self.speech_output.on_finished(generation) {
            return;
        }

        if let Some(err) = error {
            tracing::warn!(error = ?err, "Reply was not spoken");
        }

        self.resume_listening();
    }

    fn on_recognition(&mut self, recognition: RecognitionEvent) {
        if !self.voice_active {
            return;
        }

        match self.speech_input.handle(recognition) {
            Some(Heard::Transcript(transcript)) => {
                tracing::debug!(transcript = transcript, "Heard transcript");
                self.send_user_turn(&transcript);
            }
            Some(Heard::Fatal(err)) => self.voice_failed(err),
            None => {}
        }
    }

    fn on_listen_retry(&mut self, generation: u64) {
        if !self.can_listen() {
            return;
        }

        if let Err(err) = self.speech_input.retry(generation) {
            self.voice_failed(err);
        }
    }

    fn can_listen(&self) -> bool {
        return self.voice_active
            && self.state == WidgetState::Active
            && !self.awaiting_reply
            && !self.speech_output.is_speaking();
    }

    fn resume_listening(&mut self) {
        if !self.can_listen() {
            return;
        }

        if let Err(err) = self.speech_input.start() {
            self.voice_failed(err);
        }
    }

    fn voice_off(&mut self) {
        self.voice_active = false;
        self.speech_output.stop();
        self.speech_input.stop();
    }

    fn voice_failed(&mut self, err: ChatError) {
        tracing::warn!(error = ?err, "Turning voice mode off");
        self.voice_off();
        self.messages
            .push(Message::system_error(&format!("{err}. Voice mode was turned off.")));
    }

    /// Blocking failure. The session is dropped and a new chat is required.
    fn fail(&mut self, err: ChatError) {
        self.voice_off();
        self.session.reset();
        self.awaiting_reply = false;
        self.messages.retain(|e| return !e.is_transient());
        self.messages.push(Message::system_error(&err.to_string()));
        self.state = WidgetState::Error;
    }

    fn spawn_close(&self, session_id: String) {
        let agent = self.agent.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = agent.close_session(&session_id).await;
            tx.send(Event::SessionClosed { session_id, result }).ok();
        });
    }
}
