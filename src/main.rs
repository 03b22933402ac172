#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

use crate::application::cli;
use crate::application::repl;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AgentBox;
use crate::domain::models::Event;
use crate::domain::models::PlayerName;
use crate::domain::services::Conversation;
use crate::domain::services::SpeechInput;
use crate::domain::services::SpeechOutput;
use crate::domain::services::TokenCache;
use crate::domain::services::WidgetSettings;
use crate::infrastructure::agents::rest::RestAgent;
use crate::infrastructure::speech::console::ConsoleRecognizer;
use crate::infrastructure::speech::elevenlabs::ElevenLabs;
use crate::infrastructure::speech::PlayerManager;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! agentchat has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
        eprintln!(
            "\nDebug logs can be captured with RUST_LOG=agentchat, and are written to {}",
            cli::log_dir().join("debug.log").to_string_lossy()
        );
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn run() -> Result<()> {
    let player_name = Config::get(ConfigKey::AudioPlayer);
    let player = match PlayerName::parse(player_name.to_string()) {
        Some(name) => PlayerManager::get(name)?,
        None => bail!(format!("Unknown audio player {player_name}")),
    };

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let recognizer = Arc::new(ConsoleRecognizer::new(tx.clone()));
    let agent: AgentBox = Arc::new(RestAgent::new(Arc::new(TokenCache::default())));

    let conversation = Conversation::new(
        agent,
        WidgetSettings::default(),
        SpeechOutput::new(Arc::new(ElevenLabs::default()), player, tx.clone()),
        SpeechInput::new(recognizer.clone(), tx.clone()),
        tx,
    );

    return repl::start(conversation, recognizer, rx).await;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(cli::log_dir(), "debug.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("agentchat")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => {}
        Ok(false) => process::exit(0),
        Err(err) => handle_error(err),
    }

    if let Err(err) = run().await {
        handle_error(err);
    }

    drop(guard);
    process::exit(0);
}
