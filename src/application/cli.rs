use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::repl::help_text;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::PlayerName;

const THEMES: [&str; 2] = ["light", "dark"];
const POSITIONS: [&str; 2] = ["bottom-right", "bottom-left"];

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("AGENTCHAT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("agentchat");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for agentchat")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running agentchat with environment variable RUST_LOG=agentchat")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn subcommand_chat() -> Command {
    return Command::new("chat").about("Open the chat widget and start a conversation.");
}

fn env_name(key: ConfigKey) -> String {
    return format!(
        "AGENTCHAT_{}",
        key.to_string().to_uppercase().replace('-', "_")
    );
}

/// Global flag backed by a config key, documenting its default the way
/// [`Config::serialize_default`] expects.
fn arg_config(key: ConfigKey, help: &str) -> Arg {
    let default = Config::default(key);
    let help = if default.is_empty() {
        help.to_string()
    } else {
        format!("{help} [default: {default}]")
    };

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env_name(key))
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("agentchat")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_chat())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            arg_config(ConfigKey::ConfigFile, "Path to configuration file")
                .short('c')
        )
        .arg(
            arg_config(ConfigKey::AgentId, "Identifier of the agent to converse with.")
                .short('a')
        )
        .arg(arg_config(ConfigKey::AgentApiURL, "Agent API base URL."))
        .arg(arg_config(
            ConfigKey::AgentTimeout,
            "Time to wait in milliseconds for the agent to reply before timing out.",
        ))
        .arg(arg_config(
            ConfigKey::InstanceURL,
            "URL of the instance hosting the agent, sent when opening a session.",
        ))
        .arg(arg_config(
            ConfigKey::AuthURL,
            "OAuth token endpoint used for the client credentials exchange.",
        ))
        .arg(arg_config(
            ConfigKey::AuthTimeout,
            "Time to wait in milliseconds for an access token before timing out.",
        ))
        .arg(arg_config(ConfigKey::ClientId, "OAuth client id."))
        .arg(arg_config(ConfigKey::ClientSecret, "OAuth client secret."))
        .arg(arg_config(ConfigKey::TtsURL, "Text to speech API base URL."))
        .arg(arg_config(
            ConfigKey::TtsApiKey,
            "Text to speech API key. Replies are not spoken without one.",
        ))
        .arg(arg_config(ConfigKey::TtsVoiceId, "Voice used to speak replies."))
        .arg(arg_config(ConfigKey::TtsModelId, "Speech synthesis model."))
        .arg(arg_config(ConfigKey::TtsStability, "Voice stability, between 0 and 1."))
        .arg(arg_config(
            ConfigKey::TtsSimilarityBoost,
            "Voice similarity boost, between 0 and 1.",
        ))
        .arg(arg_config(
            ConfigKey::TtsTimeout,
            "Time to wait in milliseconds for synthesized speech before timing out.",
        ))
        .arg(
            arg_config(ConfigKey::AudioPlayer, "How spoken replies are played.")
                .value_parser(PossibleValuesParser::new(PlayerName::VARIANTS)),
        )
        .arg(arg_config(
            ConfigKey::AudioPlayerCommand,
            "Program used by the command audio player. The clip path is appended as the last argument.",
        ))
        .arg(
            arg_config(ConfigKey::VoiceEnabled, "Offer voice mode in the chat.")
                .value_parser(PossibleValuesParser::new(["true", "false"])),
        )
        .arg(arg_config(
            ConfigKey::WelcomeMessage,
            "Message shown when a chat starts. The agent is asked to greet the user when unset.",
        ))
        .arg(arg_config(ConfigKey::HeaderText, "Title shown in the chat header and on agent replies."))
        .arg(
            arg_config(ConfigKey::Theme, "Widget colour theme.")
                .short('t')
                .value_parser(PossibleValuesParser::new(THEMES)),
        )
        .arg(
            arg_config(ConfigKey::Position, "Corner of the screen the widget is anchored to.")
                .value_parser(PossibleValuesParser::new(POSITIONS)),
        );
}

pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(build(), vec![&matches]).await?;
        }
    }

    return Ok(true);
}
