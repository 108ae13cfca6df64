use sim_core::{TerminalOutcome, Tick};
use std::fmt;

/// Identifies a player session within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(pub u64);

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Position in a match's event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EventCursor(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStatus {
    WaitingForPlayers { current: u8, required: u8 },
    Running,
    Finished(TerminalOutcome),
    Terminated,
}

impl MatchStatus {
    /// No more ticks will run.
    pub fn is_over(self) -> bool {
        matches!(self, MatchStatus::Finished(_) | MatchStatus::Terminated)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::WaitingForPlayers { current, required } => {
                write!(f, "waiting for players ({current}/{required})")
            }
            MatchStatus::Running => write!(f, "running"),
            MatchStatus::Finished(TerminalOutcome::Win) => write!(f, "won"),
            MatchStatus::Finished(TerminalOutcome::Lose) => write!(f, "lost"),
            MatchStatus::Terminated => write!(f, "terminated"),
        }
    }
}

/// A game event stamped with its place in the stream.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerEvent<E> {
    pub sequence: u64,
    pub tick: Tick,
    pub event: E,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Events kept per match before the oldest are overwritten.
    pub event_buffer_capacity: usize,
    /// The match starts once this many players have joined.
    pub required_players: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_buffer_capacity: 1024,
            required_players: 1,
        }
    }
}
