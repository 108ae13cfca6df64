//! Rule answers with safe substitutes.
//!
//! A rule that returns a non-positive price, damage or range (or an empty
//! name) is treated as unsolved and the configured fallback is used, so a
//! partially solved ruleset still produces a playable match.

use crate::config::DefenseConfig;
use crate::rules::{Rulebook, UpgradeTower};
use crate::world::Tower;

fn positive_or(value: i32, fallback: i32) -> i32 {
    if value > 0 {
        value
    } else {
        fallback
    }
}

pub fn starting_money(rules: &dyn Rulebook, config: &DefenseConfig) -> i32 {
    positive_or(rules.starting_money(), config.fallback.starting_money)
}

pub fn base_health(rules: &dyn Rulebook, config: &DefenseConfig) -> i32 {
    positive_or(rules.base_health(), config.fallback.base_health)
}

pub fn commander_name(rules: &dyn Rulebook, config: &DefenseConfig) -> String {
    let name = rules.commander_name();
    if name.trim().is_empty() {
        config.fallback.commander_name.clone()
    } else {
        name
    }
}

pub fn tower_cost(rules: &dyn Rulebook, config: &DefenseConfig) -> i32 {
    positive_or(rules.tower_cost(), config.fallback.tower_cost)
}

pub fn tower_base_damage(rules: &dyn Rulebook, config: &DefenseConfig) -> i32 {
    positive_or(rules.tower_base_damage(), config.fallback.tower_base_damage)
}

/// Base reach in grid cells.
pub fn tower_range(rules: &dyn Rulebook, config: &DefenseConfig) -> f64 {
    let range = rules.tower_range();
    if range.is_finite() && range > 0.0 {
        range
    } else {
        config.fallback.tower_range
    }
}

pub fn kill_bonus(rules: &dyn Rulebook, config: &DefenseConfig) -> i32 {
    positive_or(rules.kill_bonus(), config.fallback.kill_bonus)
}

/// Wave payouts are a reward on top of play, so an unsolved rule pays nothing.
pub fn wave_bonus(rules: &dyn Rulebook, wave: i32) -> i32 {
    rules.wave_bonus(wave).max(0)
}

/// The view of a live tower that upgrade rules work on.
pub fn upgrade_record(rules: &dyn Rulebook, config: &DefenseConfig, tower: &Tower) -> UpgradeTower {
    UpgradeTower {
        level: tower.level,
        damage: tower_base_damage(rules, config),
        range: tower_range(rules, config),
        kind: tower.kind,
        kills: tower.kills,
    }
}

/// Reach of a tower at its level: never shorter than the base range.
pub fn effective_range(rules: &dyn Rulebook, config: &DefenseConfig, tower: &Tower) -> f64 {
    let record = upgrade_record(rules, config, tower);
    let upgraded = rules.upgraded_range(&record);
    if upgraded.is_finite() && upgraded > record.range {
        upgraded
    } else {
        record.range
    }
}

/// Fire period in ticks at the tower's level.
pub fn fire_period_ticks(rules: &dyn Rulebook, config: &DefenseConfig, level: i32) -> u64 {
    let base_ms = i32::try_from(config.base_fire_period_ms).unwrap_or(i32::MAX);
    let period_ms = positive_or(rules.calculate_fire_rate(base_ms, level - 1), base_ms);
    sim_core::Micros::from_millis_clamped(i64::from(period_ms)).to_ticks(config.tick_hz)
}
