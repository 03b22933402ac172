use strum::EnumIter;
use strum::EnumVariantNames;

/// Which surface the widget shows. Exactly one holds at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum WidgetState {
    /// Only the chat bubble is visible.
    #[default]
    Minimized,
    /// The window is open and a session is being opened.
    Initializing,
    Active,
    /// A blocking failure. The user has to start a new chat.
    Error,
    /// The user ended the chat. Shows the ended screen.
    Ended,
}

impl WidgetState {
    pub fn is_window_open(&self) -> bool {
        return matches!(self, WidgetState::Initializing | WidgetState::Active | WidgetState::Error);
    }
}

/// Voice mode status, independent of [`WidgetState`]. `listening` and
/// `speaking` are never both set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceState {
    pub active: bool,
    pub listening: bool,
    pub speaking: bool,
}
