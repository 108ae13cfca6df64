use crate::types::{MatchStatus, SessionToken};
use std::fmt;

/// Why a player could not take a seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// All `seats` are taken and the match is already running.
    SeatsTaken { seats: u8 },
    /// The match has finished or was terminated.
    MatchOver(MatchStatus),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::SeatsTaken { seats } => write!(f, "all {seats} seats are taken"),
            JoinError::MatchOver(status) => write!(f, "cannot join, match is {status}"),
        }
    }
}

impl std::error::Error for JoinError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    UnknownSession(SessionToken),
    MatchOver(MatchStatus),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::UnknownSession(token) => write!(f, "unknown session {token}"),
            SubmitError::MatchOver(status) => write!(f, "action rejected, match is {status}"),
        }
    }
}

impl std::error::Error for SubmitError {}

/// Reading observations or events with a token the match never issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSession(pub SessionToken);

impl fmt::Display for UnknownSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session {}", self.0)
    }
}

impl std::error::Error for UnknownSession {}
