pub mod command;
pub mod console;
pub mod elevenlabs;
pub mod noop;

use std::sync::Arc;

use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::PlayerBox;
use crate::domain::models::PlayerName;

pub struct PlayerManager {}

impl PlayerManager {
    pub fn get(name: PlayerName) -> Result<PlayerBox> {
        if name == PlayerName::Command {
            return Ok(Arc::new(command::CommandPlayer::new(&Config::get(
                ConfigKey::AudioPlayerCommand,
            ))?));
        }

        return Ok(Arc::<noop::NoopPlayer>::default());
    }
}
