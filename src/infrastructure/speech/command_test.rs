use std::time::Duration;

use anyhow::Result;

use super::CommandPlayer;
use crate::domain::models::AudioPlayer;

#[test]
fn it_splits_the_command_line() -> Result<()> {
    let player = CommandPlayer::new("ffplay -nodisp -autoexit  -loglevel quiet")?;
    assert_eq!(player.program, "ffplay");
    assert_eq!(player.args, vec!["-nodisp", "-autoexit", "-loglevel", "quiet"]);

    return Ok(());
}

#[test]
fn it_requires_a_command() {
    let err = CommandPlayer::new("  ").unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"audio-player-command must be set when using the command audio player");
}

#[cfg(unix)]
#[tokio::test]
async fn it_hands_the_clip_file_to_the_player() -> Result<()> {
    // `test -s` only succeeds for a file that exists and is not empty.
    let player = CommandPlayer::new("test -s")?;
    player.play(vec![0x49, 0x44, 0x33]).await?;

    assert!(player.play(vec![]).await.is_err());

    return Ok(());
}

#[cfg(unix)]
#[tokio::test]
async fn it_fails_when_the_player_fails() {
    let err = CommandPlayer::new("false")
        .unwrap()
        .play(vec![0x49])
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("false exited with"));
}

#[cfg(unix)]
#[tokio::test]
async fn it_stops_playback_when_dropped() {
    let player = CommandPlayer::new("tail -f").unwrap();
    let res = tokio::time::timeout(Duration::from_millis(100), player.play(vec![0x49])).await;

    assert!(res.is_err());
}
