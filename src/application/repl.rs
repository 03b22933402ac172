#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Sender;
use crate::domain::models::SlashCommand;
use crate::domain::models::VoiceState;
use crate::domain::models::WidgetState;
use crate::domain::services::annotations;
use crate::domain::services::Conversation;
use crate::infrastructure::speech::console::ConsoleRecognizer;

const WIDGET_WIDTH: usize = 72;
const CLOSE_GRACE: Duration = Duration::from_secs(3);

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /open (/o) - Open the chat window, starting a new chat if none is running.
- /minimize (/m) - Close the chat window back to the bubble. Ends the running chat.
- /end (/e) - End the chat and show the ended screen.
- /new (/n) - End the running chat and start a new one.
- /voice (/v) - Toggle voice mode. While listening, the next line typed is what you say. An empty line is silence.
- /thinking (/t) - Show the thinking process behind the last reply.
- /quit /exit (/q) - End the chat and exit.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

/// Terminal rendition of a message. Markup is flattened to plain text.
pub fn display_text(message: &Message) -> String {
    if message.has_raw_html {
        return annotations::speakable_text(&message.text);
    }

    return message.text.to_string();
}

/// Prints what changed in the conversation since the last call.
struct Renderer {
    printed: HashSet<String>,
    state: Option<WidgetState>,
    voice: VoiceState,
    dark: bool,
    right_aligned: bool,
}

impl Default for Renderer {
    fn default() -> Renderer {
        return Renderer {
            printed: HashSet::new(),
            state: None,
            voice: VoiceState::default(),
            dark: Config::get(ConfigKey::Theme) == "dark",
            right_aligned: Config::get(ConfigKey::Position) != "bottom-left",
        };
    }
}

impl Renderer {
    fn align(&self, text: &str) -> String {
        if self.right_aligned {
            return format!("{text:>WIDGET_WIDTH$}");
        }

        return text.to_string();
    }

    fn render(&mut self, conversation: &Conversation) {
        let state = conversation.state();
        if self.state != Some(state) {
            self.state = Some(state);
            self.render_state(state, conversation);
        }

        for message in conversation.messages() {
            if !self.printed.insert(message.id.to_string()) {
                continue;
            }
            self.render_message(message);
        }

        let voice = conversation.voice_state();
        if voice != self.voice {
            if voice.listening && !self.voice.listening {
                println!("{}", "Listening... type what you say.".dimmed());
            }
            if voice.speaking && !self.voice.speaking {
                println!("{}", "Speaking...".dimmed());
            }
            if !voice.active && self.voice.active {
                println!("{}", "Voice mode off.".dimmed());
            }
            self.voice = voice;
        }
    }

    fn render_state(&self, state: WidgetState, conversation: &Conversation) {
        let header = Config::get(ConfigKey::HeaderText);
        match state {
            WidgetState::Minimized => {
                println!("{}", self.align(&format!("( {header} ) /open to chat")).bold());
            }
            WidgetState::Initializing => {
                println!("{}", "Connecting...".dimmed());
            }
            WidgetState::Active => {
                let mut title = format!("== {header} ==");
                if conversation.voice_enabled() {
                    title = format!("{title}  (/voice to talk)");
                }
                if self.dark {
                    println!("{}", title.bold().cyan());
                } else {
                    println!("{}", title.bold().blue());
                }
            }
            WidgetState::Error => {
                println!("{}", "Type /new to start a new chat.".dimmed());
            }
            WidgetState::Ended => {
                println!("{}", "Chat ended. Type /open to start a new one.".bold());
            }
        }
    }

    fn render_message(&self, message: &Message) {
        let text = display_text(message);
        if message.is_typing {
            println!("{}", text.dimmed().italic());
            return;
        }

        if message.is_error {
            println!("{}", text.red());
            return;
        }

        let name = message.sender.to_string();
        match message.sender {
            Sender::User => println!("{} {text}", format!("{name}:").bold()),
            Sender::Agent if self.dark => println!("{} {text}", format!("{name}:").bold().cyan()),
            Sender::Agent => println!("{} {text}", format!("{name}:").bold().blue()),
            Sender::System => println!("{}", text.dimmed()),
        }
    }
}

/// Returns false when the host should exit.
fn handle_line(
    conversation: &mut Conversation,
    recognizer: &ConsoleRecognizer,
    line: &str,
) -> bool {
    if let Some(command) = SlashCommand::parse(line) {
        if command.is_quit() {
            return false;
        }

        if command.is_open() {
            conversation.handle(Event::WidgetOpen());
        } else if command.is_minimize() {
            conversation.handle(Event::WidgetMinimize());
        } else if command.is_end() {
            conversation.handle(Event::ChatEnd());
        } else if command.is_new_chat() {
            conversation.new_chat();
        } else if command.is_voice() {
            conversation.handle(Event::VoiceToggle());
        } else if command.is_thinking() {
            match conversation.last_thinking() {
                Some(thinking) => println!("{}", thinking.italic()),
                None => println!("{}", "The last reply has no thinking process.".dimmed()),
            }
        } else if command.is_help() {
            println!("{}", help_text());
        }

        return true;
    }

    if recognizer.hear(line) {
        return true;
    }

    if !conversation.state().is_window_open() {
        if line.trim().is_empty() {
            conversation.handle(Event::WidgetOpen());
        }
        return true;
    }

    if conversation.is_awaiting_reply() {
        println!("{}", "Waiting for the agent to reply...".dimmed());
        return true;
    }

    conversation.handle(Event::UserInput(line.to_string()));
    return true;
}

/// Runs the widget against stdin until the user quits or input closes. The
/// chat is ended on the way out, waiting briefly for the agent to confirm the
/// session was closed.
pub async fn start(
    mut conversation: Conversation,
    recognizer: Arc<ConsoleRecognizer>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut renderer = Renderer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    conversation.handle(Event::WidgetOpen());

    loop {
        renderer.render(&conversation);

        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(&mut conversation, &recognizer, &line) {
                            break;
                        }
                    }
                    None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Some(event) => conversation.handle(event),
                    None => break,
                }
            }
        }
    }

    let closing = conversation.session_id();
    conversation.handle(Event::WidgetMinimize());

    if let Some(session_id) = closing {
        let wait = async {
            while let Some(event) = rx.recv().await {
                let closed = matches!(&event, Event::SessionClosed { session_id: id, .. } if id == &session_id);
                conversation.handle(event);
                if closed {
                    return;
                }
            }
        };

        if tokio::time::timeout(CLOSE_GRACE, wait).await.is_err() {
            tracing::warn!(session_id = session_id, "Exited before the session close completed");
        }
    }

    return Ok(());
}
