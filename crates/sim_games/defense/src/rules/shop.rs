use super::TowerTier;

/// Side length of the build grid the shop sells cells on.
pub const GRID_SIZE: i32 = 10;

pub fn can_afford_tower(money: i32, tower_cost: i32) -> bool {
    money >= tower_cost
}

pub fn tower_type(money: i32) -> TowerTier {
    if money >= 300 {
        TowerTier::Super
    } else if money >= 200 {
        TowerTier::Advanced
    } else if money >= 100 {
        TowerTier::Basic
    } else {
        TowerTier::None
    }
}

pub fn can_build_tower_at(grid_x: i32, grid_y: i32, cell_is_empty: bool) -> bool {
    let in_grid = (0..GRID_SIZE).contains(&grid_x) && (0..GRID_SIZE).contains(&grid_y);
    in_grid && cell_is_empty
}

pub fn is_base_in_danger(base_health: i32, enemies_near_base: usize) -> bool {
    base_health < 30 || enemies_near_base > 5
}

pub fn is_vip_player(score: i32, waves_completed: i32, has_premium: bool) -> bool {
    has_premium || (score >= 1000 && waves_completed >= 5)
}

/// Percentage off. Weekends add 5 to an existing discount.
pub fn calculate_discount(total_purchases: i32, is_weekend: bool) -> i32 {
    let base = if total_purchases >= 1000 {
        20
    } else if total_purchases >= 500 {
        10
    } else {
        0
    };

    if is_weekend && base > 0 {
        base + 5
    } else {
        base
    }
}

pub fn should_show_warning(has_enough_money: bool, tower_slot_available: bool) -> bool {
    !has_enough_money || !tower_slot_available
}
