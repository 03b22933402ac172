#[cfg(test)]
#[path = "speech_input_test.rs"]
mod tests;

use std::time::Duration;

use tokio::sync::mpsc;

use crate::domain::models::ChatError;
use crate::domain::models::Event;
use crate::domain::models::RecognitionEvent;
use crate::domain::models::RecognizerBox;

pub const RESTART_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Heard {
    Transcript(String),
    /// Recognition cannot continue. Voice mode has to be turned off.
    Fatal(ChatError),
}

/// Drives single utterance listening attempts over a [`RecognizerBox`].
/// Recoverable endings schedule a [`Event::ListenRetry`] after a short
/// delay. Retries belong to a generation that [`SpeechInput::stop`] bumps, so
/// a stop cancels every restart still pending.
pub struct SpeechInput {
    recognizer: RecognizerBox,
    tx: mpsc::UnboundedSender<Event>,
    restart_delay: Duration,
    listening: bool,
    generation: u64,
}

impl SpeechInput {
    pub fn new(recognizer: RecognizerBox, tx: mpsc::UnboundedSender<Event>) -> SpeechInput {
        return SpeechInput {
            recognizer,
            tx,
            restart_delay: RESTART_DELAY,
            listening: false,
            generation: 0,
        };
    }

    pub fn with_restart_delay(mut self, restart_delay: Duration) -> SpeechInput {
        self.restart_delay = restart_delay;
        return self;
    }

    pub fn is_listening(&self) -> bool {
        return self.listening;
    }

    /// Begins a listening attempt. A no-op while one is already running.
    pub fn start(&mut self) -> Result<(), ChatError> {
        if self.listening {
            return Ok(());
        }

        self.recognizer.start()?;
        self.listening = true;
        tracing::debug!("Listening");

        return Ok(());
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        if self.listening {
            self.listening = false;
            self.recognizer.stop();
            tracing::debug!("Stopped listening");
        }
    }

    /// Resumes listening for a scheduled restart, unless it was cancelled.
    pub fn retry(&mut self, generation: u64) -> Result<(), ChatError> {
        if generation != self.generation {
            tracing::debug!(generation = generation, "Dropping cancelled listen retry");
            return Ok(());
        }

        return self.start();
    }

    pub fn handle(&mut self, event: RecognitionEvent) -> Option<Heard> {
        if !self.listening {
            tracing::debug!(event = ?event, "Ignoring recognition event while not listening");
            return None;
        }

        match event {
            RecognitionEvent::Result {
                transcript,
                is_final,
            } => {
                if !is_final {
                    return None;
                }

                self.listening = false;
                self.recognizer.stop();

                let transcript = transcript.trim();
                if transcript.is_empty() {
                    self.schedule_restart();
                    return None;
                }

                return Some(Heard::Transcript(transcript.to_string()));
            }
            RecognitionEvent::NoSpeech | RecognitionEvent::Ended | RecognitionEvent::Aborted => {
                self.listening = false;
                self.schedule_restart();
                return None;
            }
            RecognitionEvent::PermissionDenied => {
                self.listening = false;
                return Some(Heard::Fatal(ChatError::Recognition(
                    "microphone permission denied".to_string(),
                )));
            }
            RecognitionEvent::DeviceError(reason) => {
                self.listening = false;
                return Some(Heard::Fatal(ChatError::Recognition(reason)));
            }
        }
    }

    fn schedule_restart(&self) {
        let generation = self.generation;
        let restart_delay = self.restart_delay;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(restart_delay).await;
            tx.send(Event::ListenRetry { generation }).ok();
        });
    }
}
