pub mod annotations;
mod conversation;
#[cfg(test)]
pub mod fakes;
mod speech_input;
mod speech_output;
mod token_cache;
mod turns;

pub use conversation::*;
pub use speech_input::*;
pub use speech_output::*;
pub use token_cache::*;
pub use turns::*;
