#[cfg(test)]
#[path = "elevenlabs_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatError;
use crate::domain::models::Synthesizer;
use crate::domain::models::VoiceParams;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TextToSpeechRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

pub struct ElevenLabs {
    url: String,
    api_key: String,
    voice: VoiceParams,
    timeout: Duration,
}

impl Default for ElevenLabs {
    fn default() -> ElevenLabs {
        return ElevenLabs {
            url: Config::get(ConfigKey::TtsURL),
            api_key: Config::get(ConfigKey::TtsApiKey),
            voice: VoiceParams {
                voice_id: Config::get(ConfigKey::TtsVoiceId),
                model_id: Config::get(ConfigKey::TtsModelId),
                stability: Config::get_number::<f32>(ConfigKey::TtsStability),
                similarity_boost: Config::get_number::<f32>(ConfigKey::TtsSimilarityBoost),
            },
            timeout: Duration::from_millis(Config::get_number::<u64>(ConfigKey::TtsTimeout)),
        };
    }
}

#[async_trait]
impl Synthesizer for ElevenLabs {
    #[allow(clippy::implicit_return)]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ChatError> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::Tts("API key is not defined".to_string()));
        }
        if self.voice.voice_id.trim().is_empty() {
            return Err(ChatError::Tts("voice id is not defined".to_string()));
        }

        let req = TextToSpeechRequest {
            text: text.to_string(),
            model_id: self.voice.model_id.to_string(),
            voice_settings: VoiceSettings {
                stability: self.voice.stability,
                similarity_boost: self.voice.similarity_boost,
            },
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}/text-to-speech/{voice_id}",
                url = self.url,
                voice_id = self.voice.voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .timeout(self.timeout)
            .json(&req)
            .send()
            .await
            .map_err(|err| return ChatError::from_request("Speech synthesis", err, ChatError::Tts))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = body, "Speech synthesis failed");
            return Err(ChatError::Tts(format!("status {}", status.as_u16())));
        }

        let clip = res
            .bytes()
            .await
            .map_err(|err| return ChatError::from_request("Speech synthesis", err, ChatError::Tts))?;
        tracing::debug!(bytes = clip.len(), "Synthesized speech");

        return Ok(clip.to_vec());
    }
}
