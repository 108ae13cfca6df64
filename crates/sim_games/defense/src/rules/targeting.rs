//! Damage, range and aiming math for a single shot.

pub fn is_enemy_in_range(distance: f64, range: f64) -> bool {
    distance <= range
}

pub fn calculate_damage(base_damage: i32, level: i32) -> i32 {
    base_damage * level.max(1)
}

pub fn calculate_total_damage(base_damage: i32, level: i32, crit_multiplier: i32) -> i32 {
    calculate_damage(base_damage, level) * crit_multiplier.max(1)
}

/// Each upgrade level shaves 100 ms off the period, down to 100 ms.
pub fn calculate_fire_rate(base_speed_ms: i32, upgrade_level: i32) -> i32 {
    (base_speed_ms - 100 * upgrade_level.max(0)).max(100)
}

pub fn calculate_grid_distance(x1: i32, y1: i32, x2: i32, y2: i32) -> f64 {
    let dx = f64::from(x2 - x1);
    let dy = f64::from(y2 - y1);
    (dx * dx + dy * dy).sqrt()
}

/// Returns 1, 2 or 3 for the closest candidate. Ties go to the earlier one.
pub fn select_target(enemy1: f64, enemy2: f64, enemy3: f64) -> u8 {
    let mut best = 1;
    let mut best_dist = enemy1;
    if enemy2 < best_dist {
        best = 2;
        best_dist = enemy2;
    }
    if enemy3 < best_dist {
        best = 3;
    }
    best
}

/// Weak enemies (under 30 health) take double damage.
pub fn calculate_bonus_damage(base_damage: i32, enemy_health: i32, tower_level: i32) -> i32 {
    let damage = calculate_damage(base_damage, tower_level);
    if enemy_health < 30 {
        damage * 2
    } else {
        damage
    }
}

pub fn predict_enemy_position(current_x: f64, speed: f64, time: f64) -> f64 {
    current_x + speed * time
}
