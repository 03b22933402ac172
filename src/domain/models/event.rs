use super::ChatError;
use super::RecognitionEvent;
use super::TurnOutcome;

/// Everything the conversation controller reacts to: user actions from the
/// host, and completions of work it spawned earlier.
#[derive(Debug)]
pub enum Event {
    WidgetOpen(),
    WidgetMinimize(),
    ChatEnd(),
    UserInput(String),
    VoiceToggle(),

    SessionOpened {
        version: u64,
        result: Result<String, ChatError>,
    },
    TurnCompleted {
        version: u64,
        outcome: TurnOutcome,
    },
    SessionClosed {
        session_id: String,
        result: Result<(), ChatError>,
    },
    SpeechFinished {
        generation: u64,
        error: Option<ChatError>,
    },
    Recognition(RecognitionEvent),
    ListenRetry {
        generation: u64,
    },
}
