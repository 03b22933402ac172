use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_plain_chat_text() {
    assert!(SlashCommand::parse("Book a demo").is_none());
    assert!(SlashCommand::parse("/not-a-command").is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}
#[test]
fn it_keeps_args() {
    let cmd = SlashCommand::parse("/open now please").unwrap();
    assert!(cmd.is_open());
    assert_eq!(cmd.args, vec!["now".to_string(), "please".to_string()]);
}

#[test]
fn it_is_quit() {
    for text in ["/q", "/quit", "/exit"] {
        assert!(SlashCommand::parse(text).unwrap().is_quit());
    }
}

#[test]
fn it_is_open() {
    for text in ["/o", "/open"] {
        assert!(SlashCommand::parse(text).unwrap().is_open());
    }
}

#[test]
fn it_is_minimize() {
    for text in ["/m", "/min", "/minimize"] {
        assert!(SlashCommand::parse(text).unwrap().is_minimize());
    }
}

#[test]
fn it_is_end() {
    for text in ["/e", "/end"] {
        assert!(SlashCommand::parse(text).unwrap().is_end());
    }
}

#[test]
fn it_is_new_chat() {
    for text in ["/n", "/new"] {
        assert!(SlashCommand::parse(text).unwrap().is_new_chat());
    }
}

#[test]
fn it_is_voice() {
    for text in ["/v", "/voice"] {
        assert!(SlashCommand::parse(text).unwrap().is_voice());
    }
}

#[test]
fn it_is_thinking() {
    for text in ["/t", "/thinking"] {
        assert!(SlashCommand::parse(text).unwrap().is_thinking());
    }
}

#[test]
fn it_is_help() {
    let cmd = SlashCommand::parse("/help").unwrap();
    assert!(cmd.is_help());
    assert!(!cmd.is_quit());
}
