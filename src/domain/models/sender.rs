use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
    System,
}

impl ToString for Sender {
    fn to_string(&self) -> String {
        match self {
            Sender::User => return Config::get(ConfigKey::Username),
            Sender::Agent => return Config::get(ConfigKey::HeaderText),
            Sender::System => return String::from("System"),
        }
    }
}
