pub mod envelope;
pub mod game;
pub mod time;
pub mod types;

pub use envelope::ActionEnvelope;
pub use game::{Game, TerminalOutcome};
pub use time::Micros;
pub use types::{ActionId, PlayerId, Tick};
