use crate::events::DefenseEvent;
use crate::fallback;
use crate::rules::Rulebook;
use crate::world::{DefenseState, Enemy, Projectile};
use glam::Vec2;
use rand::Rng;

/// Distance reported for a missing target candidate.
pub const NO_CANDIDATE: f64 = 9999.0;

/// Targeting looks at this many live enemies, in slot order.
const MAX_CANDIDATES: usize = 3;

pub fn tick_message(state: &mut DefenseState) {
    if let Some(message) = state.message.as_mut() {
        message.remaining_ticks = message.remaining_ticks.saturating_sub(1);
    }
}

pub fn update_spawning(state: &mut DefenseState, events: &mut Vec<DefenseEvent>) {
    state.spawn_timer_ticks = state.spawn_timer_ticks.saturating_sub(1);
    if state.spawn_timer_ticks > 0 {
        return;
    }

    spawn_enemy(state, events);
    state.spawn_timer_ticks = state.config.spawn_interval_ticks(state.wave).max(1);
}

/// Spawns one enemy at the left edge if a slot is free.
pub fn spawn_enemy(state: &mut DefenseState, events: &mut Vec<DefenseEvent>) -> Option<usize> {
    let health = state.config.enemy_health(state.wave);
    let enemy = Enemy {
        position: Vec2::new(0.0, state.grid.spawn_lane_y(state.wave)),
        health,
        speed: state.config.enemy_speed(state.wave),
    };
    let slot = state.enemies.insert(enemy)?;
    events.push(DefenseEvent::EnemySpawned { slot, health });
    Some(slot)
}

pub fn advance_enemies(state: &mut DefenseState, dt: f32, events: &mut Vec<DefenseEvent>) {
    let base_x = state.grid.base_line_x();

    for slot in state.enemies.occupied() {
        let Some(enemy) = state.enemies.get_mut(slot) else {
            continue;
        };
        enemy.position.x += enemy.speed * dt;
        if enemy.position.x < base_x {
            continue;
        }

        state.enemies.remove(slot);
        let damage = state.config.breach_damage;
        state.base_health -= damage;
        state.set_message(format!("ALERT: Enemy breached defenses! -{damage} HP"));
        events.push(DefenseEvent::BaseBreached {
            slot,
            damage,
            base_health: state.base_health,
        });

        if state.base_health <= 0 && !state.game_over {
            state.game_over = true;
            state.set_message("GAME OVER - Base Destroyed!");
            tracing::info!(wave = state.wave, score = state.score, "base destroyed");
            events.push(DefenseEvent::GameOver {
                wave: state.wave,
                score: state.score,
            });
        }
    }
}

/// Up to three live enemies in slot order with their grid distance to `tower_slot`.
fn target_candidates(state: &DefenseState, rules: &dyn Rulebook, tower_slot: usize) -> Vec<(usize, f64)> {
    let Some(tower) = state.towers.get(tower_slot) else {
        return Vec::new();
    };
    let tower_pos = state.grid.cell_center(tower.cell);

    state
        .enemies
        .iter()
        .take(MAX_CANDIDATES)
        .map(|(slot, enemy)| {
            let cell = state.grid.cell_of(enemy.position);
            let mut dist = rules.calculate_grid_distance(tower.cell.x, tower.cell.y, cell.x, cell.y);
            if dist == 0.0 || !dist.is_finite() {
                dist = f64::from(tower_pos.distance(enemy.position) / state.grid.cell_size);
            }
            (slot, dist)
        })
        .collect()
}

/// Resolves the rule's 1-based pick, falling back to the first candidate.
fn choose_target(rules: &dyn Rulebook, candidates: &[(usize, f64)]) -> Option<usize> {
    let first = candidates.first()?.0;
    let dist = |i: usize| candidates.get(i).map_or(NO_CANDIDATE, |c| c.1);
    let pick = rules.select_target(dist(0), dist(1), dist(2));

    let chosen = match pick {
        1..=3 => candidates.get(usize::from(pick) - 1).map(|c| c.0),
        _ => None,
    };
    Some(chosen.unwrap_or(first))
}

/// Damage of one shot after bonus and critical-hit rules.
fn shot_damage(
    state: &DefenseState,
    rules: &dyn Rulebook,
    tower_slot: usize,
    enemy_health: i32,
    critical: bool,
) -> i32 {
    let Some(tower) = state.towers.get(tower_slot) else {
        return 0;
    };
    let base = fallback::tower_base_damage(rules, &state.config);

    let mut damage = rules.calculate_damage(base, tower.level);
    if damage <= 0 {
        damage = base;
    }

    let bonus = rules.calculate_bonus_damage(base, enemy_health, tower.level);
    if bonus > damage {
        damage = bonus;
    }

    if critical {
        let total = rules.calculate_total_damage(base, tower.level, state.config.crit_multiplier);
        if total > 0 {
            damage = total;
        }
    }

    damage
}

pub fn towers_fire<R: Rng>(
    state: &mut DefenseState,
    rules: &dyn Rulebook,
    rng: &mut R,
    events: &mut Vec<DefenseEvent>,
) {
    let cell_size = state.grid.cell_size;

    for tower_slot in state.towers.occupied() {
        let Some(tower) = state.towers.get_mut(tower_slot) else {
            continue;
        };
        if tower.cooldown_ticks > 0 {
            tower.cooldown_ticks -= 1;
            continue;
        }
        let tower_cell = tower.cell;
        let tower_level = tower.level;

        let candidates = target_candidates(state, rules, tower_slot);
        let Some(enemy_slot) = choose_target(rules, &candidates) else {
            continue;
        };
        let Some(enemy) = state.enemies.get(enemy_slot) else {
            continue;
        };
        let (enemy_pos, enemy_speed, enemy_health) = (enemy.position, enemy.speed, enemy.health);

        let tower_pos = state.grid.cell_center(tower_cell);
        let dist = tower_pos.distance(enemy_pos);
        let range = state
            .towers
            .get(tower_slot)
            .map_or(0.0, |t| fallback::effective_range(rules, &state.config, t));
        if !rules.is_enemy_in_range(f64::from(dist / cell_size), range) {
            continue;
        }

        let critical = rng.gen_range(0..state.config.crit_chance_denominator) == 0;
        let damage = shot_damage(state, rules, tower_slot, enemy_health, critical);

        // Aim where the enemy will be when the shot lands.
        let flight_time = f64::from(dist / state.config.projectile_speed);
        let predicted = rules.predict_enemy_position(f64::from(enemy_pos.x), f64::from(enemy_speed), flight_time);
        let aim_x = if predicted.is_finite() {
            predicted as f32
        } else {
            enemy_pos.x
        };
        fire_projectile(state, tower_pos, Vec2::new(aim_x, enemy_pos.y));

        events.push(DefenseEvent::TowerFired {
            tower: tower_slot,
            enemy: enemy_slot,
            damage,
            critical,
        });

        let killed = match state.enemies.get_mut(enemy_slot) {
            Some(enemy) => {
                enemy.health = enemy.health.saturating_sub(damage);
                enemy.health <= 0
            }
            None => false,
        };
        if killed {
            record_kill(state, rules, tower_slot, enemy_slot, events);
        }

        let cooldown = fallback::fire_period_ticks(rules, &state.config, tower_level);
        if let Some(tower) = state.towers.get_mut(tower_slot) {
            tower.cooldown_ticks = cooldown;
        }
    }
}

fn record_kill(
    state: &mut DefenseState,
    rules: &dyn Rulebook,
    tower_slot: usize,
    enemy_slot: usize,
    events: &mut Vec<DefenseEvent>,
) {
    state.enemies.remove(enemy_slot);
    state.score += state.config.kill_score;
    state.total_kills += 1;
    if let Some(tower) = state.towers.get_mut(tower_slot) {
        tower.kills += 1;
    }

    let bounty = fallback::kill_bonus(rules, &state.config);
    state.money = state.money.saturating_add(bounty);
    events.push(DefenseEvent::EnemyKilled {
        slot: enemy_slot,
        tower: tower_slot,
        bounty,
    });

    if state.enemies.is_empty() {
        advance_wave(state, rules, events);
    }
}

fn advance_wave(state: &mut DefenseState, rules: &dyn Rulebook, events: &mut Vec<DefenseEvent>) {
    state.wave += 1;
    let bonus = fallback::wave_bonus(rules, state.wave);
    state.money += bonus;
    state.set_message(format!("Wave {} incoming! Bonus: ${bonus}", state.wave));
    tracing::info!(wave = state.wave, bonus, money = state.money, "wave advanced");
    events.push(DefenseEvent::WaveAdvanced {
        wave: state.wave,
        bonus,
    });

    if state.is_victory() {
        tracing::info!(wave = state.wave, score = state.score, "victory");
        events.push(DefenseEvent::Victory {
            wave: state.wave,
            score: state.score,
        });
    }
}

pub fn fire_projectile(state: &mut DefenseState, from: Vec2, to: Vec2) -> Option<usize> {
    state.projectiles.insert(Projectile {
        position: from,
        target: to,
        speed: state.config.projectile_speed,
    })
}

pub fn advance_projectiles(state: &mut DefenseState, dt: f32) {
    let hit_radius = state.config.projectile_hit_radius;
    state.projectiles.retain(|p| {
        let to_target = p.target - p.position;
        let dist = to_target.length();
        if dist < hit_radius {
            return false;
        }
        let step = (p.speed * dt).min(dist);
        p.position += to_target / dist * step;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefenseConfig;
    use crate::rules::{BlankRules, ReferenceRules, TowerKind, UpgradeTower};
    use crate::world::{Cell, Tower};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state() -> DefenseState {
        DefenseState::new(DefenseConfig::default(), 500, 100, "Test".into())
    }

    fn enemy_at(state: &mut DefenseState, x: f32, y: f32, health: i32) -> usize {
        state
            .enemies
            .insert(Enemy {
                position: Vec2::new(x, y),
                health,
                speed: 30.0,
            })
            .expect("free enemy slot")
    }

    /// Solves only what is needed for a tower to shoot.
    struct TriggerHappy;

    impl Rulebook for TriggerHappy {
        fn is_enemy_in_range(&self, distance: f64, range: f64) -> bool {
            distance <= range
        }
    }

    #[test]
    fn first_spawn_after_delay() {
        let mut state = state();
        let mut events = Vec::new();
        for _ in 0..119 {
            update_spawning(&mut state, &mut events);
        }
        assert!(events.is_empty());
        update_spawning(&mut state, &mut events);
        assert_eq!(events, vec![DefenseEvent::EnemySpawned { slot: 0, health: 60 }]);
        assert_eq!(state.spawn_timer_ticks, 174);

        let enemy = state.enemies.get(0).expect("spawned");
        assert_eq!(enemy.position, Vec2::new(0.0, 225.0));
        assert_eq!(enemy.speed, 32.0);
    }

    #[test]
    fn spawn_skipped_when_full() {
        let mut config = DefenseConfig::default();
        config.max_enemies = 1;
        let mut state = DefenseState::new(config, 500, 100, "Test".into());
        let mut events = Vec::new();
        assert_eq!(spawn_enemy(&mut state, &mut events), Some(0));
        assert_eq!(spawn_enemy(&mut state, &mut events), None);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn breach_costs_health_and_ends_game() {
        let mut state = state();
        state.base_health = 20;
        enemy_at(&mut state, 449.9, 225.0, 60);
        let mut events = Vec::new();
        advance_enemies(&mut state, 1.0, &mut events);

        assert!(state.enemies.is_empty());
        assert_eq!(state.base_health, 0);
        assert!(state.game_over);
        assert_eq!(state.active_message(), Some("GAME OVER - Base Destroyed!"));
        assert!(matches!(events[0], DefenseEvent::BaseBreached { damage: 20, .. }));
        assert!(matches!(events[1], DefenseEvent::GameOver { wave: 1, .. }));
    }

    #[test]
    fn grid_distance_falls_back_to_pixels() {
        let mut state = state();
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 25.0, 225.0, 60);

        let blank = target_candidates(&state, &BlankRules, 0);
        assert_eq!(blank, vec![(0, 2.0)]);

        let solved = target_candidates(&state, &ReferenceRules::new(), 0);
        assert_eq!(solved, vec![(0, 2.0)]);
    }

    #[test]
    fn invalid_target_pick_uses_first_candidate() {
        let candidates = vec![(4, 3.0), (7, 1.0)];
        assert_eq!(choose_target(&BlankRules, &candidates), Some(4));
        assert_eq!(choose_target(&ReferenceRules::new(), &candidates), Some(7));
        assert_eq!(choose_target(&BlankRules, &[]), None);
    }

    #[test]
    fn only_three_candidates_considered() {
        let mut state = state();
        state.towers.insert(Tower::new(Cell::new(0, 0), TowerKind::Laser));
        for x in [100.0, 200.0, 300.0, 10.0] {
            enemy_at(&mut state, x, 25.0, 60);
        }
        let candidates = target_candidates(&state, &ReferenceRules::new(), 0);
        assert_eq!(candidates.iter().map(|c| c.0).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn tower_kills_and_pays_out() {
        let mut state = state();
        let rules = ReferenceRules::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 150.0, 225.0, 5);

        let mut events = Vec::new();
        towers_fire(&mut state, &rules, &mut rng, &mut events);

        assert!(state.enemies.is_empty());
        assert_eq!(state.score, 50);
        assert_eq!(state.total_kills, 1);
        assert_eq!(state.towers.get(0).map(|t| t.kills), Some(1));
        // kill bounty plus the wave 2 payout
        assert_eq!(state.money, 500 + 25 + 70);
        assert_eq!(state.wave, 2);
        assert_eq!(state.towers.get(0).map(|t| t.cooldown_ticks), Some(30));
        assert_eq!(state.projectiles.len(), 1);
        assert!(events.iter().any(|e| matches!(e, DefenseEvent::WaveAdvanced { wave: 2, bonus: 70 })));
    }

    #[test]
    fn cooldown_blocks_fire() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let slot = state
            .towers
            .insert(Tower::new(Cell::new(2, 4), TowerKind::Laser))
            .expect("slot");
        if let Some(t) = state.towers.get_mut(slot) {
            t.cooldown_ticks = 2;
        }
        enemy_at(&mut state, 150.0, 225.0, 500);

        let mut events = Vec::new();
        towers_fire(&mut state, &ReferenceRules::new(), &mut rng, &mut events);
        assert!(events.is_empty());
        assert_eq!(state.towers.get(slot).map(|t| t.cooldown_ticks), Some(1));
    }

    #[test]
    fn out_of_range_holds_fire() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        state.towers.insert(Tower::new(Cell::new(8, 0), TowerKind::Laser));
        enemy_at(&mut state, 10.0, 475.0, 60);

        let mut events = Vec::new();
        towers_fire(&mut state, &ReferenceRules::new(), &mut rng, &mut events);
        assert!(events.is_empty());
        assert_eq!(state.towers.get(0).map(|t| t.cooldown_ticks), Some(0));
    }

    #[test]
    fn partial_rules_still_shoot_with_fallback_damage() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 150.0, 225.0, 60);

        let mut events = Vec::new();
        towers_fire(&mut state, &TriggerHappy, &mut rng, &mut events);
        assert!(matches!(events[0], DefenseEvent::TowerFired { damage: 10, .. }));
        assert_eq!(state.enemies.get(0).map(|e| e.health), Some(50));
    }

    /// Answers every damage question with the largest possible hit.
    struct Overkill;

    impl Rulebook for Overkill {
        fn is_enemy_in_range(&self, distance: f64, range: f64) -> bool {
            distance <= range
        }

        fn calculate_damage(&self, _base_damage: i32, _level: i32) -> i32 {
            i32::MAX
        }

        fn bonus_damage_from_kills(&self, _tower: &UpgradeTower) -> i32 {
            1
        }
    }

    fn config_with_crit_odds(denominator: u32) -> DefenseConfig {
        DefenseConfig {
            crit_chance_denominator: denominator,
            ..DefenseConfig::default()
        }
    }

    #[test]
    fn critical_hit_uses_total_damage() {
        let mut state = DefenseState::new(config_with_crit_odds(1), 500, 100, "Test".into());
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 150.0, 225.0, 500);

        let mut events = Vec::new();
        towers_fire(&mut state, &ReferenceRules::new(), &mut rng, &mut events);
        assert_eq!(
            events,
            vec![DefenseEvent::TowerFired {
                tower: 0,
                enemy: 0,
                damage: 20,
                critical: true,
            }]
        );
        assert_eq!(state.enemies.get(0).map(|e| e.health), Some(480));
    }

    #[test]
    fn veteran_tower_hits_for_plain_damage() {
        let mut state = DefenseState::new(config_with_crit_odds(u32::MAX), 500, 100, "Test".into());
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let slot = state
            .towers
            .insert(Tower::new(Cell::new(2, 4), TowerKind::Laser))
            .expect("slot");
        if let Some(t) = state.towers.get_mut(slot) {
            t.kills = 5;
        }
        enemy_at(&mut state, 150.0, 225.0, 500);

        let mut events = Vec::new();
        towers_fire(&mut state, &ReferenceRules::new(), &mut rng, &mut events);
        assert!(matches!(
            events[0],
            DefenseEvent::TowerFired {
                damage: 10,
                critical: false,
                ..
            }
        ));
    }

    #[test]
    fn huge_rule_damage_does_not_overflow() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let slot = state
            .towers
            .insert(Tower::new(Cell::new(2, 4), TowerKind::Laser))
            .expect("slot");
        if let Some(t) = state.towers.get_mut(slot) {
            t.kills = 10;
        }
        enemy_at(&mut state, 150.0, 225.0, 60);

        let mut events = Vec::new();
        towers_fire(&mut state, &Overkill, &mut rng, &mut events);
        assert!(matches!(events[0], DefenseEvent::TowerFired { damage: i32::MAX, .. }));
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn shot_leads_the_enemy() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 150.0, 225.0, 500);

        let mut events = Vec::new();
        towers_fire(&mut state, &ReferenceRules::new(), &mut rng, &mut events);

        // 25 units away at 500 units/s is 0.05 s of flight; 30 units/s moves 1.5
        let p = state.projectiles.get(0).expect("shot fired");
        assert_eq!(p.position, Vec2::new(125.0, 225.0));
        assert!((p.target.x - 151.5).abs() < 1e-4);
        assert_eq!(p.target.y, 225.0);
    }

    #[test]
    fn blank_prediction_aims_at_current_position() {
        let mut state = state();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        state.towers.insert(Tower::new(Cell::new(2, 4), TowerKind::Laser));
        enemy_at(&mut state, 150.0, 225.0, 500);

        let mut events = Vec::new();
        towers_fire(&mut state, &TriggerHappy, &mut rng, &mut events);
        let p = state.projectiles.get(0).expect("shot fired");
        assert_eq!(p.target, Vec2::new(150.0, 225.0));
    }

    #[test]
    fn projectiles_expire_near_target() {
        let mut state = state();
        fire_projectile(&mut state, Vec2::ZERO, Vec2::new(100.0, 0.0));
        advance_projectiles(&mut state, 0.1);
        let p = state.projectiles.get(0).expect("still flying");
        assert!((p.position.x - 50.0).abs() < 1e-3);

        advance_projectiles(&mut state, 0.1);
        advance_projectiles(&mut state, 0.1);
        assert!(state.projectiles.is_empty());
    }
}
