#[cfg(test)]
#[path = "speech_output_test.rs"]
mod tests;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::annotations;
use crate::domain::models::ChatError;
use crate::domain::models::Event;
use crate::domain::models::PlayerBox;
use crate::domain::models::SynthesizerBox;

/// Speaks agent replies. Every call to [`SpeechOutput::speak`] starts a new
/// generation, and its completion is reported as
/// [`Event::SpeechFinished`] carrying that generation. Completions from an
/// interrupted generation are stale and must be passed through
/// [`SpeechOutput::on_finished`] to be recognised as such.
pub struct SpeechOutput {
    synthesizer: SynthesizerBox,
    player: PlayerBox,
    tx: mpsc::UnboundedSender<Event>,
    generation: u64,
    speaking: bool,
    worker: Option<JoinHandle<()>>,
}

impl SpeechOutput {
    pub fn new(
        synthesizer: SynthesizerBox,
        player: PlayerBox,
        tx: mpsc::UnboundedSender<Event>,
    ) -> SpeechOutput {
        return SpeechOutput {
            synthesizer,
            player,
            tx,
            generation: 0,
            speaking: false,
            worker: None,
        };
    }

    pub fn is_speaking(&self) -> bool {
        return self.speaking;
    }

    /// Synthesizes and plays `text` with markup and thinking annotations
    /// removed. Text with nothing left to say completes straight away without
    /// reaching the synthesizer.
    pub fn speak(&mut self, text: &str) -> u64 {
        self.stop();
        self.generation += 1;
        self.speaking = true;

        let generation = self.generation;
        let speakable = annotations::speakable_text(text);
        if speakable.is_empty() {
            tracing::debug!(generation = generation, "Nothing to speak");
            self.tx
                .send(Event::SpeechFinished {
                    generation,
                    error: None,
                })
                .ok();
            return generation;
        }

        let synthesizer = self.synthesizer.clone();
        let player = self.player.clone();
        let tx = self.tx.clone();
        self.worker = Some(tokio::spawn(async move {
            let error = match synthesizer.synthesize(&speakable).await {
                Ok(clip) => player
                    .play(clip)
                    .await
                    .err()
                    .map(|err| return ChatError::Tts(err.to_string())),
                Err(err) => Some(err),
            };

            if let Some(err) = &error {
                tracing::warn!(error = ?err, "Speech output failed, continuing with text only");
            }

            tx.send(Event::SpeechFinished { generation, error }).ok();
        }));

        return generation;
    }

    /// Interrupts playback. The in-flight clip is discarded and its
    /// completion, should it still arrive, is ignored.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }

        if self.speaking {
            tracing::debug!(generation = self.generation, "Interrupted speech output");
            self.generation += 1;
            self.speaking = false;
        }
    }

    /// Returns whether a completion belongs to the current generation, in
    /// which case speaking has now ended.
    pub fn on_finished(&mut self, generation: u64) -> bool {
        if !self.speaking || generation != self.generation {
            tracing::debug!(generation = generation, "Dropping stale speech completion");
            return false;
        }

        self.speaking = false;
        self.worker = None;
        return true;
    }
}

impl Drop for SpeechOutput {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
