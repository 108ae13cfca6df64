//! Fixed economy values and the wave payout.

pub const COMMANDER_NAME: &str = "Commander";

pub fn starting_money() -> i32 {
    500
}

pub fn base_health() -> i32 {
    100
}

pub fn tower_cost() -> i32 {
    100
}

pub fn tower_base_damage() -> i32 {
    10
}

/// In grid cells.
pub fn tower_range() -> f64 {
    3.0
}

pub fn kill_bonus() -> i32 {
    25
}

pub fn wave_bonus(wave: i32) -> i32 {
    if wave <= 0 {
        return 0;
    }
    50 + 10 * wave
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_money_buys_several_towers() {
        assert!(starting_money() >= tower_cost() * 3);
    }

    #[test]
    fn wave_bonus_grows() {
        assert_eq!(wave_bonus(0), 0);
        assert_eq!(wave_bonus(-3), 0);
        assert_eq!(wave_bonus(1), 60);
        assert_eq!(wave_bonus(5), 100);
        assert!(wave_bonus(6) > wave_bonus(5));
    }
}
