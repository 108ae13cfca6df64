//! Loop exercises over the radar contact list.

use serde::Serialize;

/// One radar contact. `distance` is measured to the base in grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RadarEnemy {
    pub distance: f64,
    pub health: i32,
    pub is_flying: bool,
}

pub fn count_all_enemies(enemies: &[RadarEnemy]) -> usize {
    enemies.len()
}

pub fn count_close_enemies(enemies: &[RadarEnemy], max_distance: f64) -> usize {
    enemies.iter().filter(|e| e.distance <= max_distance).count()
}

pub fn total_enemy_health(enemies: &[RadarEnemy]) -> i32 {
    enemies.iter().map(|e| e.health).sum()
}

pub fn find_closest_enemy(enemies: &[RadarEnemy]) -> Option<f64> {
    enemies.iter().map(|e| e.distance).reduce(f64::min)
}

pub fn find_strongest_enemy(enemies: &[RadarEnemy]) -> Option<i32> {
    enemies.iter().map(|e| e.health).max()
}

pub fn count_flying_enemies_in_range(enemies: &[RadarEnemy], range: f64) -> usize {
    enemies
        .iter()
        .filter(|e| e.is_flying && e.distance <= range)
        .count()
}

/// Waves that pass before a wave of `2 * wave` enemies reaches `target_enemies`.
pub fn simulate_waiting(start_wave: i32, target_enemies: i32) -> i32 {
    let mut wave = start_wave.max(1);
    let mut waited = 0;
    while wave * 2 < target_enemies {
        wave += 1;
        waited += 1;
    }
    waited
}

pub fn find_first_dangerous_enemy(enemies: &[RadarEnemy], danger_threshold: i32) -> Option<usize> {
    enemies.iter().position(|e| e.health > danger_threshold)
}

pub fn countdown_sum(start: i32) -> i32 {
    let mut sum = 0;
    let mut n = start;
    while n > 0 {
        sum += n;
        n -= 1;
    }
    sum
}

pub fn count_grid_cells(width: i32, height: i32) -> i32 {
    let mut cells = 0;
    for _ in 0..height.max(0) {
        for _ in 0..width.max(0) {
            cells += 1;
        }
    }
    cells
}
