#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::PlayerName;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    AgentApiURL,
    AgentId,
    AgentTimeout,
    AudioPlayer,
    AudioPlayerCommand,
    AuthTimeout,
    AuthURL,
    ClientId,
    ClientSecret,
    ConfigFile,
    HeaderText,
    InstanceURL,
    Position,
    Theme,
    TtsApiKey,
    TtsModelId,
    TtsSimilarityBoost,
    TtsStability,
    TtsTimeout,
    TtsURL,
    TtsVoiceId,
    Username,
    VoiceEnabled,
    WelcomeMessage,
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Reads a numeric key, falling back to its default when the stored value
    /// does not parse.
    pub fn get_number<T: std::str::FromStr + Default>(key: ConfigKey) -> T {
        if let Ok(val) = Config::get(key).trim().parse::<T>() {
            return val;
        }

        tracing::warn!(key = key.to_string(), "Config value is not numeric, using default");
        return Config::default(key).parse::<T>().unwrap_or_default();
    }

    pub fn get_bool(key: ConfigKey) -> bool {
        return Config::get(key).trim().eq_ignore_ascii_case("true");
    }

    pub fn default(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        let default_player = PlayerName::None.to_string();

        #[cfg(not(target_os = "macos"))]
        let config_path = dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("agentchat/config.toml");
        #[cfg(target_os = "macos")]
        let config_path = path::PathBuf::from(env::var("HOME").unwrap_or_default())
            .join(".config/agentchat/config.toml");

        let res = match key {
            ConfigKey::AgentApiURL => "https://api.salesforce.com/einstein/ai-agent/v1",
            ConfigKey::AgentId => "",
            ConfigKey::AgentTimeout => "120000",
            ConfigKey::AudioPlayer => &default_player,
            ConfigKey::AudioPlayerCommand => "ffplay -nodisp -autoexit -loglevel quiet",
            ConfigKey::AuthTimeout => "30000",
            ConfigKey::AuthURL => "",
            ConfigKey::ClientId => "",
            ConfigKey::ClientSecret => "",
            ConfigKey::HeaderText => "Agent",
            ConfigKey::InstanceURL => "",
            ConfigKey::Position => "bottom-right",
            ConfigKey::Theme => "light",
            ConfigKey::TtsApiKey => "",
            ConfigKey::TtsModelId => "eleven_monolingual_v1",
            ConfigKey::TtsSimilarityBoost => "0.75",
            ConfigKey::TtsStability => "0.5",
            ConfigKey::TtsTimeout => "30000",
            ConfigKey::TtsURL => "https://api.elevenlabs.io/v1",
            ConfigKey::TtsVoiceId => "21m00Tcm4TlvDq8ikWAM",
            ConfigKey::VoiceEnabled => "false",
            ConfigKey::WelcomeMessage => "",

            // Special
            ConfigKey::ConfigFile => config_path.to_str().unwrap_or_default(),
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if let Some(val) = doc.get(&key.to_string()) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key.to_string().as_str()))
                    {
                        if !arg.get_possible_values().is_empty() {
                            possible_values = arg
                                .get_possible_values()
                                .iter()
                                .map(|e| return e.get_name().to_string())
                                .collect::<Vec<String>>();
                        }
                    }

                    if let Some(val_int) = val.as_integer() {
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_float) = val.as_float() {
                        Config::set(key, &val_float.to_string());
                    } else if let Some(val_bool) = val.as_bool() {
                        Config::set(key, &val_bool.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            agent_id = Config::get(ConfigKey::AgentId),
            agent_api_url = Config::get(ConfigKey::AgentApiURL),
            auth_url = Config::get(ConfigKey::AuthURL),
            tts_url = Config::get(ConfigKey::TtsURL),
            audio_player = Config::get(ConfigKey::AudioPlayer),
            voice_enabled = Config::get(ConfigKey::VoiceEnabled),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your user name displayed on your own messages.\n# username = \"\""
                            .to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let mut description = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default();

                description = description
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name())
                        .collect::<Vec<_>>()
                        .join(", ");
                    description = format!("{description} [possible values: {}]", possible_values);
                }

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() || val.parse::<f64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
