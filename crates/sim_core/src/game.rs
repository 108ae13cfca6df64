use crate::envelope::ActionEnvelope;
use crate::types::{PlayerId, Tick};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalOutcome {
    Win,
    Lose,
}

/// A frame-stepped simulation driven by a host.
///
/// Each call to [`Game::step`] is one frame: the actions scheduled for the
/// tick are applied first, then the world advances by one fixed timestep.
pub trait Game: Sized {
    type Config: Clone + Send + Sync + 'static;
    type Action: Clone + Send + Sync + 'static;
    type Observation: Clone + Send + Sync + 'static;
    type Event: Clone + Send + Sync + 'static;

    fn new(config: Self::Config, seed: u64) -> Self;

    fn step(
        &mut self,
        tick: Tick,
        actions: &[ActionEnvelope<Self::Action>],
        out_events: &mut Vec<Self::Event>,
    );

    fn observe(&self, tick: Tick, player: PlayerId) -> Self::Observation;

    fn is_terminal(&self) -> Option<TerminalOutcome>;
}
