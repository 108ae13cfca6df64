use crate::errors::{JoinError, SubmitError, UnknownSession};
use crate::events::EventBuffer;
use crate::types::{EventCursor, MatchStatus, ServerConfig, ServerEvent, SessionToken};
use sim_core::{ActionEnvelope, ActionId, Game, PlayerId, TerminalOutcome, Tick};
use sim_host::MatchHost;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

struct MatchInner<G: Game> {
    host: MatchHost<G>,
    events: EventBuffer<G::Event>,
    sessions: HashMap<SessionToken, PlayerId>,
    next_session_id: u64,
    next_action_id: ActionId,
    required_players: u8,
    status: MatchStatus,
}

impl<G: Game> MatchInner<G> {
    fn new(host: MatchHost<G>, config: &ServerConfig) -> Self {
        let required = config.required_players.max(1);
        Self {
            host,
            events: EventBuffer::new(config.event_buffer_capacity),
            sessions: HashMap::new(),
            next_session_id: 1,
            next_action_id: 1,
            required_players: required,
            status: MatchStatus::WaitingForPlayers { current: 0, required },
        }
    }

    fn player_count(&self) -> u8 {
        self.sessions.len() as u8
    }
}

/// Shared handle to a running match. Clones refer to the same match.
pub struct MatchHandle<G: Game> {
    inner: Arc<Mutex<MatchInner<G>>>,
    shutdown: Arc<AtomicBool>,
    tick_hz: u32,
}

impl<G: Game> Clone for MatchHandle<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            shutdown: Arc::clone(&self.shutdown),
            tick_hz: self.tick_hz,
        }
    }
}

impl<G: Game> MatchHandle<G> {
    pub fn new(host: MatchHost<G>, config: &ServerConfig) -> Self {
        let tick_hz = host.tick_hz();
        Self {
            inner: Arc::new(Mutex::new(MatchInner::new(host, config))),
            shutdown: Arc::new(AtomicBool::new(false)),
            tick_hz,
        }
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    pub fn should_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Join a player. The match starts running once enough have joined.
    pub async fn join_player(&self) -> Result<(SessionToken, PlayerId), JoinError> {
        let mut inner = self.inner.lock().await;

        let MatchStatus::WaitingForPlayers { current, required } = inner.status else {
            return Err(if inner.status.is_over() {
                JoinError::MatchOver(inner.status)
            } else {
                JoinError::SeatsTaken {
                    seats: inner.required_players,
                }
            });
        };

        let player_id = inner.host.join_player();
        let session = SessionToken(inner.next_session_id);
        inner.next_session_id += 1;
        inner.sessions.insert(session, player_id);

        let current = current + 1;
        inner.status = if current >= required {
            MatchStatus::Running
        } else {
            MatchStatus::WaitingForPlayers { current, required }
        };
        tracing::info!(%session, player_id, status = %inner.status, "player joined");

        Ok((session, player_id))
    }

    pub async fn leave_player(&self, session: SessionToken) -> bool {
        let mut inner = self.inner.lock().await;
        let left = inner.sessions.remove(&session).is_some();
        if left {
            tracing::info!(%session, "player left");
        }
        left
    }

    /// Schedule an action. Returns the action id and the tick it will run on;
    /// ticks already past are moved to the next tick.
    pub async fn submit_action(
        &self,
        session: SessionToken,
        action: G::Action,
        intended_tick: Tick,
    ) -> Result<(ActionId, Tick), SubmitError> {
        let mut inner = self.inner.lock().await;

        let player_id = inner
            .sessions
            .get(&session)
            .copied()
            .ok_or(SubmitError::UnknownSession(session))?;

        if inner.status.is_over() {
            return Err(SubmitError::MatchOver(inner.status));
        }

        let action_id = inner.next_action_id;
        inner.next_action_id += 1;

        let scheduled = inner.host.submit(ActionEnvelope {
            player_id,
            action_id,
            intended_tick,
            payload: action,
        });
        tracing::trace!(%session, action_id, scheduled, "action queued");

        Ok((action_id, scheduled))
    }

    /// Schedule an action for the next tick.
    pub async fn submit_now(&self, session: SessionToken, action: G::Action) -> Result<(ActionId, Tick), SubmitError> {
        self.submit_action(session, action, 0).await
    }

    pub async fn observe(&self, session: SessionToken) -> Result<G::Observation, UnknownSession> {
        let inner = self.inner.lock().await;
        let player_id = inner
            .sessions
            .get(&session)
            .copied()
            .ok_or(UnknownSession(session))?;
        Ok(inner.host.observe(player_id))
    }

    pub async fn poll_events(
        &self,
        session: SessionToken,
        cursor: EventCursor,
    ) -> Result<(Vec<ServerEvent<G::Event>>, EventCursor), UnknownSession> {
        let inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&session) {
            return Err(UnknownSession(session));
        }
        Ok(inner.events.get_from_cursor(cursor))
    }

    pub async fn current_tick(&self) -> Tick {
        self.inner.lock().await.host.current_tick()
    }

    pub async fn status(&self) -> MatchStatus {
        self.inner.lock().await.status
    }

    pub async fn player_count(&self) -> u8 {
        self.inner.lock().await.player_count()
    }

    pub async fn is_valid_session(&self, session: SessionToken) -> bool {
        self.inner.lock().await.sessions.contains_key(&session)
    }

    /// Step one tick if the match is running. Returns true once the match
    /// is over, whether by outcome or termination.
    pub async fn step_one_tick(&self) -> bool {
        let mut inner = self.inner.lock().await;

        if inner.status != MatchStatus::Running {
            return inner.status.is_over();
        }

        if let Some(events) = inner.host.step_one_tick() {
            let tick = inner.host.current_tick();
            for event in events {
                inner.events.push(tick, event);
            }
        }

        if let Some(outcome) = inner.host.is_terminal() {
            inner.status = MatchStatus::Finished(outcome);
            tracing::info!(tick = inner.host.current_tick(), ?outcome, "match finished");
            return true;
        }

        false
    }

    pub async fn outcome(&self) -> Option<TerminalOutcome> {
        match self.inner.lock().await.status {
            MatchStatus::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Stop the match; the tick loop exits on its next tick.
    pub async fn terminate(&self) {
        let mut inner = self.inner.lock().await;
        if !inner.status.is_over() {
            inner.status = MatchStatus::Terminated;
            tracing::info!(tick = inner.host.current_tick(), "match terminated");
        }
        drop(inner);
        self.request_shutdown();
    }
}
