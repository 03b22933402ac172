use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::ChatError;

#[derive(Clone, Debug, PartialEq)]
pub struct VoiceParams {
    pub voice_id: String,
    pub model_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

#[async_trait]
pub trait Synthesizer {
    /// Returns an encoded audio clip for `text`.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ChatError>;
}

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PlayerName {
    Command,
    None,
}

impl PlayerName {
    pub fn parse(text: String) -> Option<PlayerName> {
        return PlayerName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait AudioPlayer {
    /// Plays a clip, resolving once playback ends naturally. Dropping the
    /// future stops playback.
    async fn play(&self, clip: Vec<u8>) -> Result<()>;
}

/// Raw signals from a platform speech recogniser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result { transcript: String, is_final: bool },
    NoSpeech,
    /// The capture attempt ended on its own.
    Ended,
    /// The attempt was cancelled by a stop request.
    Aborted,
    PermissionDenied,
    DeviceError(String),
}

/// One listening attempt at a time. Signals are delivered as
/// [`super::Event::Recognition`] through the channel the recogniser was
/// built with.
pub trait SpeechRecognizer {
    fn start(&self) -> Result<(), ChatError>;
    fn stop(&self);
}

pub type SynthesizerBox = Arc<dyn Synthesizer + Send + Sync>;
pub type PlayerBox = Arc<dyn AudioPlayer + Send + Sync>;
pub type RecognizerBox = Arc<dyn SpeechRecognizer + Send + Sync>;
