//! The rule library the engine consults every frame.
//!
//! Every rule is a small pure function. The engine never computes economy
//! values, targeting math or upgrade prices itself: it asks a [`Rulebook`]
//! and falls back to safe values when the answer is unusable.
//!
//! The default body of each trait method behaves like an exercise nobody
//! has solved yet (zero, `false`, empty, `None`). [`BlankRules`] keeps all
//! of them, [`ReferenceRules`] overrides all of them, and anything in
//! between is a partially solved ruleset.

pub mod economy;
pub mod radar;
pub mod shop;
pub mod targeting;
pub mod upgrades;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use radar::RadarEnemy;
pub use upgrades::{UpgradePlayer, UpgradeTower};

/// Weapon family of a tower. Cosmetic apart from its name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    #[default]
    Laser,
    Missile,
    Plasma,
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TowerKind::Laser => write!(f, "laser"),
            TowerKind::Missile => write!(f, "missile"),
            TowerKind::Plasma => write!(f, "plasma"),
        }
    }
}

/// Best tower tier a budget can buy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TowerTier {
    #[default]
    None,
    Basic,
    Advanced,
    Super,
}

impl TowerTier {
    pub fn code(self) -> i32 {
        match self {
            TowerTier::None => 0,
            TowerTier::Basic => 1,
            TowerTier::Advanced => 2,
            TowerTier::Super => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TowerTier::None => "NONE",
            TowerTier::Basic => "BASIC",
            TowerTier::Advanced => "ADVANCED",
            TowerTier::Super => "SUPER",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Rank {
    Cadet,
    Lieutenant,
    Captain,
    Admiral,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Cadet => write!(f, "Cadet"),
            Rank::Lieutenant => write!(f, "Lieutenant"),
            Rank::Captain => write!(f, "Captain"),
            Rank::Admiral => write!(f, "Admiral"),
        }
    }
}

/// The full set of rules the engine calls into.
pub trait Rulebook: Send + Sync {
    // --- economy ---

    fn starting_money(&self) -> i32 {
        0
    }

    fn base_health(&self) -> i32 {
        0
    }

    fn commander_name(&self) -> String {
        String::new()
    }

    fn tower_cost(&self) -> i32 {
        0
    }

    fn tower_base_damage(&self) -> i32 {
        0
    }

    /// Tower reach in grid cells.
    fn tower_range(&self) -> f64 {
        0.0
    }

    fn kill_bonus(&self) -> i32 {
        0
    }

    fn wave_bonus(&self, _wave: i32) -> i32 {
        0
    }

    // --- shop ---

    fn can_afford_tower(&self, _money: i32, _tower_cost: i32) -> bool {
        false
    }

    fn tower_type(&self, _money: i32) -> TowerTier {
        TowerTier::None
    }

    fn can_build_tower_at(&self, _grid_x: i32, _grid_y: i32, _cell_is_empty: bool) -> bool {
        false
    }

    fn is_base_in_danger(&self, _base_health: i32, _enemies_near_base: usize) -> bool {
        false
    }

    fn is_vip_player(&self, _score: i32, _waves_completed: i32, _has_premium: bool) -> bool {
        false
    }

    /// Discount percentage.
    fn calculate_discount(&self, _total_purchases: i32, _is_weekend: bool) -> i32 {
        0
    }

    fn should_show_warning(&self, _has_enough_money: bool, _tower_slot_available: bool) -> bool {
        false
    }

    // --- targeting ---

    fn is_enemy_in_range(&self, _distance: f64, _range: f64) -> bool {
        false
    }

    fn calculate_damage(&self, _base_damage: i32, _level: i32) -> i32 {
        0
    }

    fn calculate_total_damage(&self, _base_damage: i32, _level: i32, _crit_multiplier: i32) -> i32 {
        0
    }

    /// Milliseconds between shots.
    fn calculate_fire_rate(&self, _base_speed_ms: i32, _upgrade_level: i32) -> i32 {
        0
    }

    fn calculate_grid_distance(&self, _x1: i32, _y1: i32, _x2: i32, _y2: i32) -> f64 {
        0.0
    }

    /// 1-based position of the chosen candidate; anything else is invalid.
    fn select_target(&self, _enemy1: f64, _enemy2: f64, _enemy3: f64) -> u8 {
        0
    }

    fn calculate_bonus_damage(&self, _base_damage: i32, _enemy_health: i32, _tower_level: i32) -> i32 {
        0
    }

    /// An unsolved prediction does not lead the shot.
    fn predict_enemy_position(&self, current_x: f64, _speed: f64, _time: f64) -> f64 {
        current_x
    }

    // --- radar ---

    fn count_all_enemies(&self, _enemies: &[RadarEnemy]) -> usize {
        0
    }

    fn count_close_enemies(&self, _enemies: &[RadarEnemy], _max_distance: f64) -> usize {
        0
    }

    fn total_enemy_health(&self, _enemies: &[RadarEnemy]) -> i32 {
        0
    }

    fn find_closest_enemy(&self, _enemies: &[RadarEnemy]) -> Option<f64> {
        None
    }

    /// Health of the strongest enemy.
    fn find_strongest_enemy(&self, _enemies: &[RadarEnemy]) -> Option<i32> {
        None
    }

    fn count_flying_enemies_in_range(&self, _enemies: &[RadarEnemy], _range: f64) -> usize {
        0
    }

    fn simulate_waiting(&self, _start_wave: i32, _target_enemies: i32) -> i32 {
        0
    }

    fn find_first_dangerous_enemy(&self, _enemies: &[RadarEnemy], _danger_threshold: i32) -> Option<usize> {
        None
    }

    fn countdown_sum(&self, _start: i32) -> i32 {
        0
    }

    fn count_grid_cells(&self, _width: i32, _height: i32) -> i32 {
        0
    }

    // --- upgrades ---

    fn upgrade_cost(&self, _tower: &UpgradeTower) -> i32 {
        0
    }

    fn can_upgrade(&self, _tower: &UpgradeTower, _player_money: i32) -> bool {
        false
    }

    fn upgraded_damage(&self, _tower: &UpgradeTower) -> i32 {
        0
    }

    fn upgraded_range(&self, _tower: &UpgradeTower) -> f64 {
        0.0
    }

    fn bonus_damage_from_kills(&self, _tower: &UpgradeTower) -> i32 {
        0
    }

    fn total_fleet_damage(&self, _towers: &[UpgradeTower]) -> i32 {
        0
    }

    fn find_mvp_tower(&self, _towers: &[UpgradeTower]) -> Option<usize> {
        None
    }

    fn player_rank(&self, _player: &UpgradePlayer) -> Option<Rank> {
        None
    }

    fn daily_bonus(&self, _player: &UpgradePlayer, _day_number: i32) -> i32 {
        0
    }

    fn recommend_tower(&self, _money: i32, _has_air_enemies: bool, _wave: i32) -> Option<TowerKind> {
        None
    }

    /// Spends `budget` on upgrades in place and returns what is left.
    fn auto_upgrade_all(&self, _towers: &mut [UpgradeTower], budget: i32) -> i32 {
        budget
    }
}

/// A ruleset where nothing is solved yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlankRules;

impl Rulebook for BlankRules {}

/// The solved ruleset.
#[derive(Clone, Debug)]
pub struct ReferenceRules {
    commander: String,
}

impl ReferenceRules {
    pub fn new() -> Self {
        Self {
            commander: economy::COMMANDER_NAME.to_string(),
        }
    }

    pub fn with_commander(name: impl Into<String>) -> Self {
        Self {
            commander: name.into(),
        }
    }
}

impl Default for ReferenceRules {
    fn default() -> Self {
        Self::new()
    }
}

impl Rulebook for ReferenceRules {
    fn starting_money(&self) -> i32 {
        economy::starting_money()
    }

    fn base_health(&self) -> i32 {
        economy::base_health()
    }

    fn commander_name(&self) -> String {
        self.commander.clone()
    }

    fn tower_cost(&self) -> i32 {
        economy::tower_cost()
    }

    fn tower_base_damage(&self) -> i32 {
        economy::tower_base_damage()
    }

    fn tower_range(&self) -> f64 {
        economy::tower_range()
    }

    fn kill_bonus(&self) -> i32 {
        economy::kill_bonus()
    }

    fn wave_bonus(&self, wave: i32) -> i32 {
        economy::wave_bonus(wave)
    }

    fn can_afford_tower(&self, money: i32, tower_cost: i32) -> bool {
        shop::can_afford_tower(money, tower_cost)
    }

    fn tower_type(&self, money: i32) -> TowerTier {
        shop::tower_type(money)
    }

    fn can_build_tower_at(&self, grid_x: i32, grid_y: i32, cell_is_empty: bool) -> bool {
        shop::can_build_tower_at(grid_x, grid_y, cell_is_empty)
    }

    fn is_base_in_danger(&self, base_health: i32, enemies_near_base: usize) -> bool {
        shop::is_base_in_danger(base_health, enemies_near_base)
    }

    fn is_vip_player(&self, score: i32, waves_completed: i32, has_premium: bool) -> bool {
        shop::is_vip_player(score, waves_completed, has_premium)
    }

    fn calculate_discount(&self, total_purchases: i32, is_weekend: bool) -> i32 {
        shop::calculate_discount(total_purchases, is_weekend)
    }

    fn should_show_warning(&self, has_enough_money: bool, tower_slot_available: bool) -> bool {
        shop::should_show_warning(has_enough_money, tower_slot_available)
    }

    fn is_enemy_in_range(&self, distance: f64, range: f64) -> bool {
        targeting::is_enemy_in_range(distance, range)
    }

    fn calculate_damage(&self, base_damage: i32, level: i32) -> i32 {
        targeting::calculate_damage(base_damage, level)
    }

    fn calculate_total_damage(&self, base_damage: i32, level: i32, crit_multiplier: i32) -> i32 {
        targeting::calculate_total_damage(base_damage, level, crit_multiplier)
    }

    fn calculate_fire_rate(&self, base_speed_ms: i32, upgrade_level: i32) -> i32 {
        targeting::calculate_fire_rate(base_speed_ms, upgrade_level)
    }

    fn calculate_grid_distance(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
        targeting::calculate_grid_distance(x1, y1, x2, y2)
    }

    fn select_target(&self, enemy1: f64, enemy2: f64, enemy3: f64) -> u8 {
        targeting::select_target(enemy1, enemy2, enemy3)
    }

    fn calculate_bonus_damage(&self, base_damage: i32, enemy_health: i32, tower_level: i32) -> i32 {
        targeting::calculate_bonus_damage(base_damage, enemy_health, tower_level)
    }

    fn predict_enemy_position(&self, current_x: f64, speed: f64, time: f64) -> f64 {
        targeting::predict_enemy_position(current_x, speed, time)
    }

    fn count_all_enemies(&self, enemies: &[RadarEnemy]) -> usize {
        radar::count_all_enemies(enemies)
    }

    fn count_close_enemies(&self, enemies: &[RadarEnemy], max_distance: f64) -> usize {
        radar::count_close_enemies(enemies, max_distance)
    }

    fn total_enemy_health(&self, enemies: &[RadarEnemy]) -> i32 {
        radar::total_enemy_health(enemies)
    }

    fn find_closest_enemy(&self, enemies: &[RadarEnemy]) -> Option<f64> {
        radar::find_closest_enemy(enemies)
    }

    fn find_strongest_enemy(&self, enemies: &[RadarEnemy]) -> Option<i32> {
        radar::find_strongest_enemy(enemies)
    }

    fn count_flying_enemies_in_range(&self, enemies: &[RadarEnemy], range: f64) -> usize {
        radar::count_flying_enemies_in_range(enemies, range)
    }

    fn simulate_waiting(&self, start_wave: i32, target_enemies: i32) -> i32 {
        radar::simulate_waiting(start_wave, target_enemies)
    }

    fn find_first_dangerous_enemy(&self, enemies: &[RadarEnemy], danger_threshold: i32) -> Option<usize> {
        radar::find_first_dangerous_enemy(enemies, danger_threshold)
    }

    fn countdown_sum(&self, start: i32) -> i32 {
        radar::countdown_sum(start)
    }

    fn count_grid_cells(&self, width: i32, height: i32) -> i32 {
        radar::count_grid_cells(width, height)
    }

    fn upgrade_cost(&self, tower: &UpgradeTower) -> i32 {
        upgrades::upgrade_cost(tower)
    }

    fn can_upgrade(&self, tower: &UpgradeTower, player_money: i32) -> bool {
        upgrades::can_upgrade(tower, player_money)
    }

    fn upgraded_damage(&self, tower: &UpgradeTower) -> i32 {
        upgrades::upgraded_damage(tower)
    }

    fn upgraded_range(&self, tower: &UpgradeTower) -> f64 {
        upgrades::upgraded_range(tower)
    }

    fn bonus_damage_from_kills(&self, tower: &UpgradeTower) -> i32 {
        upgrades::bonus_damage_from_kills(tower)
    }

    fn total_fleet_damage(&self, towers: &[UpgradeTower]) -> i32 {
        upgrades::total_fleet_damage(towers)
    }

    fn find_mvp_tower(&self, towers: &[UpgradeTower]) -> Option<usize> {
        upgrades::find_mvp_tower(towers)
    }

    fn player_rank(&self, player: &UpgradePlayer) -> Option<Rank> {
        Some(upgrades::player_rank(player))
    }

    fn daily_bonus(&self, player: &UpgradePlayer, day_number: i32) -> i32 {
        upgrades::daily_bonus(player, day_number)
    }

    fn recommend_tower(&self, money: i32, has_air_enemies: bool, wave: i32) -> Option<TowerKind> {
        upgrades::recommend_tower(money, has_air_enemies, wave)
    }

    fn auto_upgrade_all(&self, towers: &mut [UpgradeTower], budget: i32) -> i32 {
        upgrades::auto_upgrade_all(towers, budget)
    }
}

/// Which built-in ruleset a config asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesetKind {
    #[default]
    Reference,
    Blank,
}

impl RulesetKind {
    pub fn build(self, commander: Option<&str>) -> Box<dyn Rulebook> {
        match self {
            RulesetKind::Reference => match commander {
                Some(name) => Box::new(ReferenceRules::with_commander(name)),
                None => Box::new(ReferenceRules::new()),
            },
            RulesetKind::Blank => Box::new(BlankRules),
        }
    }
}

impl std::str::FromStr for RulesetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(RulesetKind::Reference),
            "blank" => Ok(RulesetKind::Blank),
            other => Err(format!("unknown ruleset: {other}")),
        }
    }
}
