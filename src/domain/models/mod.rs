mod agent;
mod error;
mod event;
mod message;
mod sender;
mod session;
mod slash_commands;
mod speech;
mod widget_state;

pub use agent::*;
pub use error::*;
pub use event::*;
pub use message::*;
pub use sender::*;
pub use session::*;
pub use slash_commands::*;
pub use speech::*;
pub use widget_state::*;
