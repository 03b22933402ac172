#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

use std::env;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

use crate::domain::models::AudioPlayer;

/// Removes the clip from disk once playback ends or is interrupted.
struct ClipFile {
    path: PathBuf,
}

impl ClipFile {
    fn new() -> ClipFile {
        return ClipFile {
            path: env::temp_dir().join(format!("agentchat-{}.mp3", Uuid::new_v4())),
        };
    }
}

impl Drop for ClipFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::debug!(error = ?err, path = ?self.path, "Failed to remove speech clip");
        }
    }
}

/// Plays clips through an external program, such as `ffplay` or `mpv`, which
/// receives the clip's file path as its last argument.
#[derive(Debug)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: &str) -> Result<CommandPlayer> {
        let mut parts = command.split_whitespace().map(|e| return e.to_string());
        let program = match parts.next() {
            Some(program) => program,
            None => bail!("audio-player-command must be set when using the command audio player"),
        };

        return Ok(CommandPlayer {
            program,
            args: parts.collect(),
        });
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    #[allow(clippy::implicit_return)]
    async fn play(&self, clip: Vec<u8>) -> Result<()> {
        let clip_file = ClipFile::new();
        fs::write(&clip_file.path, clip).await?;

        // Dropping this future kills the player.
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&clip_file.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            bail!(format!("{} exited with {status}", self.program));
        }

        return Ok(());
    }
}
