//! Domain and API payload types for the session coordinator

mod payloads;
mod tally;

pub use payloads::*;
pub use tally::ParticipantTally;
