pub mod agents;
pub mod speech;
