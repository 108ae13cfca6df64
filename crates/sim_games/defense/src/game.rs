use crate::actions::DefenseAction;
use crate::commands;
use crate::config::DefenseConfig;
use crate::events::DefenseEvent;
use crate::fallback;
use crate::observe::{self, DefenseObservation};
use crate::rules::Rulebook;
use crate::systems;
use crate::world::DefenseState;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_core::{ActionEnvelope, Game, PlayerId, TerminalOutcome, Tick};

/// New match state with the economy taken from `rules`.
pub(crate) fn fresh_state(config: DefenseConfig, rules: &dyn Rulebook) -> DefenseState {
    let money = fallback::starting_money(rules, &config);
    let health = fallback::base_health(rules, &config);
    let commander = fallback::commander_name(rules, &config);

    let mut state = DefenseState::new(config, money, health, commander);
    state.set_message(format!("Welcome, {}! Click to place towers.", state.commander));
    state
}

pub struct DefenseGame {
    state: DefenseState,
    rules: Box<dyn Rulebook>,
    rng: ChaCha8Rng,
    seed: u64,
}

impl DefenseGame {
    /// Builds a match around a caller-supplied ruleset instead of the one
    /// named in the config.
    pub fn with_rules(config: DefenseConfig, seed: u64, rules: Box<dyn Rulebook>) -> Self {
        let state = fresh_state(config, rules.as_ref());
        tracing::info!(seed, money = state.money, commander = %state.commander, "defense match created");
        Self {
            state,
            rules,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn state(&self) -> &DefenseState {
        &self.state
    }

    pub fn rules(&self) -> &dyn Rulebook {
        self.rules.as_ref()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn update(&mut self, events: &mut Vec<DefenseEvent>) {
        let dt = self.state.config.frame_secs();
        let rules = self.rules.as_ref();

        systems::tick_message(&mut self.state);
        systems::update_spawning(&mut self.state, events);
        systems::advance_enemies(&mut self.state, dt, events);
        if self.state.game_over {
            return;
        }
        systems::towers_fire(&mut self.state, rules, &mut self.rng, events);
        systems::advance_projectiles(&mut self.state, dt);
    }
}

impl Game for DefenseGame {
    type Config = DefenseConfig;
    type Action = DefenseAction;
    type Observation = DefenseObservation;
    type Event = DefenseEvent;

    fn new(config: Self::Config, seed: u64) -> Self {
        let rules = config.ruleset.build(config.commander.as_deref());
        Self::with_rules(config, seed, rules)
    }

    fn step(
        &mut self,
        tick: Tick,
        actions: &[ActionEnvelope<Self::Action>],
        out_events: &mut Vec<Self::Event>,
    ) {
        self.state.tick = tick;

        for action in actions {
            commands::apply(&mut self.state, self.rules.as_ref(), &action.payload, out_events);
        }

        if self.state.paused || self.state.game_over || self.state.is_victory() {
            return;
        }
        self.update(out_events);
    }

    fn observe(&self, _tick: Tick, _player: PlayerId) -> Self::Observation {
        observe::observe(&self.state, self.rules.as_ref())
    }

    fn is_terminal(&self) -> Option<TerminalOutcome> {
        if self.state.game_over && self.state.config.end_on_loss {
            Some(TerminalOutcome::Lose)
        } else if self.state.is_victory() {
            Some(TerminalOutcome::Win)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{BlankRules, ReferenceRules};

    fn envelope(action: DefenseAction) -> ActionEnvelope<DefenseAction> {
        ActionEnvelope {
            player_id: 0,
            action_id: 0,
            intended_tick: 0,
            payload: action,
        }
    }

    #[test]
    fn new_match_greets_commander() {
        let mut config = DefenseConfig::default();
        config.commander = Some("Vega".into());
        let game = DefenseGame::new(config, 1);
        assert_eq!(game.state().money, 500);
        assert_eq!(game.state().base_health, 100);
        assert_eq!(
            game.state().active_message(),
            Some("Welcome, Vega! Click to place towers.")
        );
        assert!(game.is_terminal().is_none());
    }

    #[test]
    fn blank_rules_use_fallback_economy() {
        let game = DefenseGame::with_rules(DefenseConfig::default(), 1, Box::new(BlankRules));
        assert_eq!(game.state().money, 500);
        assert_eq!(game.state().commander, "Commander");
        assert_eq!(game.rules().tower_cost(), 0);
    }

    #[test]
    fn paused_match_does_not_advance() {
        let mut game = DefenseGame::with_rules(DefenseConfig::default(), 1, Box::new(ReferenceRules::new()));
        let mut events = Vec::new();
        game.step(0, &[envelope(DefenseAction::TogglePause)], &mut events);
        let timer = game.state().spawn_timer_ticks;
        for tick in 1..200 {
            game.step(tick, &[], &mut events);
        }
        assert_eq!(game.state().spawn_timer_ticks, timer);
        assert!(game.state().enemies.is_empty());
        assert_eq!(game.state().tick, 199);
    }

    #[test]
    fn game_over_is_a_loss_only_when_configured() {
        let mut game = DefenseGame::new(DefenseConfig::default(), 1);
        game.state.game_over = true;
        assert!(game.is_terminal().is_none());

        let config = DefenseConfig {
            end_on_loss: true,
            ..DefenseConfig::default()
        };
        let mut game = DefenseGame::new(config, 1);
        game.state.game_over = true;
        assert_eq!(game.is_terminal(), Some(TerminalOutcome::Lose));
    }

    #[test]
    fn restart_clears_game_over() {
        let mut game = DefenseGame::new(DefenseConfig::default(), 1);
        game.state.game_over = true;
        game.state.base_health = 0;

        let mut events = Vec::new();
        game.step(10, &[envelope(DefenseAction::Restart)], &mut events);
        assert!(events.contains(&DefenseEvent::Restarted));
        assert!(!game.state().game_over);
        assert_eq!(game.state().base_health, 100);
        assert!(game.is_terminal().is_none());
    }

    #[test]
    fn clearing_target_wave_is_a_win() {
        let mut config = DefenseConfig::default();
        config.victory_wave = Some(1);
        let mut game = DefenseGame::new(config, 1);
        assert!(game.is_terminal().is_none());
        game.state.wave = 2;
        assert_eq!(game.is_terminal(), Some(TerminalOutcome::Win));
    }
}
