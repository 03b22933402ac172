#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;

use crate::domain::models::ChatError;
use crate::domain::models::Event;
use crate::domain::models::RecognitionEvent;
use crate::domain::models::SpeechRecognizer;

/// Stands in for a microphone in the terminal host. While a listening attempt
/// is open, the next line typed is taken as what was said.
pub struct ConsoleRecognizer {
    listening: AtomicBool,
    tx: mpsc::UnboundedSender<Event>,
}

impl ConsoleRecognizer {
    pub fn new(tx: mpsc::UnboundedSender<Event>) -> ConsoleRecognizer {
        return ConsoleRecognizer {
            listening: AtomicBool::new(false),
            tx,
        };
    }

    pub fn is_listening(&self) -> bool {
        return self.listening.load(Ordering::SeqCst);
    }

    /// Delivers a typed line as the result of the open attempt. An empty line
    /// counts as silence. Returns false when nothing was listening.
    pub fn hear(&self, line: &str) -> bool {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return false;
        }

        let event = if line.trim().is_empty() {
            RecognitionEvent::NoSpeech
        } else {
            RecognitionEvent::Result {
                transcript: line.trim().to_string(),
                is_final: true,
            }
        };

        self.tx.send(Event::Recognition(event)).ok();
        return true;
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&self) -> Result<(), ChatError> {
        if self.tx.is_closed() {
            return Err(ChatError::Recognition("console input is closed".to_string()));
        }

        self.listening.store(true, Ordering::SeqCst);
        return Ok(());
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }
}
