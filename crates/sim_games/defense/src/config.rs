use crate::rules::RulesetKind;
use serde::{Deserialize, Serialize};
use sim_core::Micros;
use std::fmt;
use std::path::Path;

/// Values used when a rule answers with something unusable, e.g. a
/// non-positive price or damage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackEconomy {
    pub starting_money: i32,
    pub base_health: i32,
    pub tower_cost: i32,
    pub tower_base_damage: i32,
    pub tower_range: f64,
    pub kill_bonus: i32,
    pub commander_name: String,
}

impl Default for FallbackEconomy {
    fn default() -> Self {
        Self {
            starting_money: 500,
            base_health: 100,
            tower_cost: 100,
            tower_base_damage: 10,
            tower_range: 3.0,
            kill_bonus: 25,
            commander_name: "Commander".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    pub tick_hz: u32,

    // Grid
    pub grid_size: i32,
    pub cell_size: f32,
    /// Rows of the last column occupied by the base.
    pub base_rows: (i32, i32),

    // Capacities
    pub max_towers: usize,
    pub max_enemies: usize,
    pub max_projectiles: usize,

    // Timers
    pub first_spawn_delay_ms: u32,
    pub spawn_interval_ms: u32,
    pub spawn_interval_step_ms: u32,
    pub min_spawn_interval_ms: u32,
    pub message_duration_ms: u32,
    pub base_fire_period_ms: u32,

    // Enemies
    pub enemy_base_health: i32,
    pub enemy_health_per_wave: i32,
    pub enemy_base_speed: f32,
    pub enemy_speed_per_wave: f32,
    pub breach_damage: i32,

    // Combat
    pub projectile_speed: f32,
    pub projectile_hit_radius: f32,
    pub kill_score: i32,
    /// One shot in this many is a critical hit.
    pub crit_chance_denominator: u32,
    pub crit_multiplier: i32,
    pub max_tower_level: i32,

    // HUD probes
    pub radar_close_range: f64,
    pub flying_range: f64,
    pub danger_threshold: i32,
    pub mass_attack_enemies: i32,

    pub ruleset: RulesetKind,
    /// Commander name override for the reference ruleset.
    pub commander: Option<String>,
    /// The match is won once this wave has been cleared. `None` plays forever.
    pub victory_wave: Option<i32>,
    /// A destroyed base ends the match as a loss. When off, the game-over
    /// screen waits for a restart.
    pub end_on_loss: bool,
    pub fallback: FallbackEconomy,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60,

            grid_size: 10,
            cell_size: 50.0,
            base_rows: (4, 5),

            max_towers: 10,
            max_enemies: 20,
            max_projectiles: 50,

            first_spawn_delay_ms: 2_000,
            spawn_interval_ms: 3_000,
            spawn_interval_step_ms: 100,
            min_spawn_interval_ms: 1_000,
            message_duration_ms: 3_000,
            base_fire_period_ms: 500,

            enemy_base_health: 50,
            enemy_health_per_wave: 10,
            enemy_base_speed: 30.0,
            enemy_speed_per_wave: 2.0,
            breach_damage: 20,

            projectile_speed: 500.0,
            projectile_hit_radius: 10.0,
            kill_score: 50,
            crit_chance_denominator: 5,
            crit_multiplier: 2,
            max_tower_level: 5,

            radar_close_range: 5.0,
            flying_range: 5.0,
            danger_threshold: 75,
            mass_attack_enemies: 20,

            ruleset: RulesetKind::Reference,
            commander: None,
            victory_wave: None,
            end_on_loss: false,
            fallback: FallbackEconomy::default(),
        }
    }
}

impl DefenseConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_hz == 0 {
            return Err(ConfigError::Invalid("tick_hz must be positive".into()));
        }
        if self.grid_size <= 0 || self.cell_size <= 0.0 {
            return Err(ConfigError::Invalid("grid must have a positive size".into()));
        }
        let (a, b) = self.base_rows;
        if !(0..self.grid_size).contains(&a) || !(0..self.grid_size).contains(&b) {
            return Err(ConfigError::Invalid("base rows must lie inside the grid".into()));
        }
        if self.max_towers == 0 || self.max_enemies == 0 {
            return Err(ConfigError::Invalid("entity capacities must be positive".into()));
        }
        if self.crit_chance_denominator == 0 {
            return Err(ConfigError::Invalid("crit_chance_denominator must be positive".into()));
        }
        if self.max_tower_level < 1 {
            return Err(ConfigError::Invalid("max_tower_level must be at least 1".into()));
        }
        if self.fallback.tower_base_damage <= 0 || self.fallback.tower_cost <= 0 {
            return Err(ConfigError::Invalid("fallback prices and damage must be positive".into()));
        }
        Ok(())
    }

    pub fn ms_to_ticks(&self, millis: u32) -> u64 {
        Micros::from_millis(millis).to_ticks(self.tick_hz)
    }

    /// Frame time in seconds.
    pub fn frame_secs(&self) -> f32 {
        Micros::tick_period(self.tick_hz).as_secs_f32()
    }

    /// Ticks until the next spawn once a spawn happened during `wave`.
    pub fn spawn_interval_ticks(&self, wave: i32) -> u64 {
        let step = i64::from(self.spawn_interval_step_ms) * i64::from(wave.max(0));
        let interval = (i64::from(self.spawn_interval_ms) - step).max(i64::from(self.min_spawn_interval_ms));
        Micros::from_millis_clamped(interval).to_ticks(self.tick_hz)
    }

    pub fn enemy_health(&self, wave: i32) -> i32 {
        self.enemy_base_health + self.enemy_health_per_wave * wave
    }

    pub fn enemy_speed(&self, wave: i32) -> f32 {
        self.enemy_base_speed + self.enemy_speed_per_wave * wave as f32
    }
}

/// Error when loading a game config.
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file is not valid config JSON.
    Parse(serde_json::Error),
    /// The config parsed but describes an unplayable game.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
