//! Real-time hosting for a [`sim_core::Game`]: a shared match handle, a
//! bounded event stream and a fixed-rate tick loop.

pub mod errors;
pub mod events;
pub mod match_handle;
pub mod tick_loop;
pub mod types;

pub use errors::{JoinError, SubmitError, UnknownSession};
pub use events::EventBuffer;
pub use match_handle::MatchHandle;
pub use tick_loop::{run_tick_loop, spawn_tick_loop};
pub use types::{EventCursor, MatchStatus, ServerConfig, ServerEvent, SessionToken};
