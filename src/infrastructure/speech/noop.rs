#[cfg(test)]
#[path = "noop_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::AudioPlayer;

/// Text-only output. Clips are discarded and playback ends immediately.
#[derive(Default)]
pub struct NoopPlayer {}

#[async_trait]
impl AudioPlayer for NoopPlayer {
    #[allow(clippy::implicit_return)]
    async fn play(&self, clip: Vec<u8>) -> Result<()> {
        tracing::debug!(bytes = clip.len(), "Discarding speech clip");
        return Ok(());
    }
}
