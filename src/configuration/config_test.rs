use anyhow::Result;

use super::Config;
use super::ConfigKey;
use crate::application::cli;

#[test]
fn it_serializes_to_valid_toml() {
    let res = Config::serialize_default(cli::build());
    let toml_res = res.parse::<toml_edit::Document>();
    assert!(toml_res.is_ok());

    let doc = toml_res.unwrap();
    assert_eq!(doc["agent-timeout"].as_integer(), Some(120000));
    assert_eq!(doc["tts-stability"].as_float(), Some(0.5));
    assert_eq!(doc["theme"].as_str(), Some("light"));
    assert!(doc.get("agent-id").is_none());
    assert!(doc.get("config-file").is_none());
}

#[test]
fn it_documents_possible_values() {
    let res = Config::serialize_default(cli::build());
    insta::assert_snapshot!(res.lines().find(|e| return e.contains("[possible values: light")).unwrap(), @"# Widget colour theme. [possible values: light, dark]");
}

#[test]
fn it_falls_back_to_default_numbers() {
    assert_eq!(Config::default(ConfigKey::AgentTimeout).parse::<u64>().unwrap(), 120000);
    assert_eq!(Config::default(ConfigKey::AuthTimeout).parse::<u64>().unwrap(), 30000);
    assert_eq!(Config::default(ConfigKey::TtsTimeout).parse::<u64>().unwrap(), 30000);
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let matches = cli::build().try_get_matches_from(vec!["chat", "-c", "./config.example.toml"])?;
    Config::load(cli::build(), vec![&matches]).await?;

    assert_eq!(Config::get(ConfigKey::AgentId), "0XxKa000000abcdEAA");
    assert_eq!(Config::get(ConfigKey::Theme), "dark");
    assert!(Config::get_bool(ConfigKey::VoiceEnabled));
    assert_eq!(Config::get_number::<f32>(ConfigKey::TtsStability), 0.4);
    assert_eq!(Config::get_number::<u64>(ConfigKey::AgentTimeout), 90000);

    // Both loads share the global config, so they run in one test.
    let matches =
        cli::build().try_get_matches_from(vec!["chat", "-c", "./test/bad-config.toml"])?;
    let res = Config::load(cli::build(), vec![&matches]).await;
    assert!(res.is_err());

    return Ok(());
}
