//! Upgrade pricing and the rules that combine everything else.

use super::{Rank, TowerKind};
use serde::Serialize;

pub const MAX_LEVEL: i32 = 5;

/// The upgrade-relevant view of a tower.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpgradeTower {
    pub level: i32,
    pub damage: i32,
    pub range: f64,
    pub kind: TowerKind,
    pub kills: i32,
}

impl UpgradeTower {
    pub fn new(level: i32, damage: i32, range: f64, kind: TowerKind, kills: i32) -> Self {
        Self {
            level,
            damage,
            range,
            kind,
            kills,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpgradePlayer {
    pub name: String,
    pub money: i32,
    pub total_kills: i32,
    pub waves_completed: i32,
    pub is_premium: bool,
}

pub fn upgrade_cost(tower: &UpgradeTower) -> i32 {
    100 * tower.level.max(1)
}

pub fn can_upgrade(tower: &UpgradeTower, player_money: i32) -> bool {
    tower.level < MAX_LEVEL && player_money >= upgrade_cost(tower)
}

/// Damage at the tower's current level.
pub fn upgraded_damage(tower: &UpgradeTower) -> i32 {
    tower.damage + 5 * (tower.level - 1).max(0)
}

/// Range at the tower's current level.
pub fn upgraded_range(tower: &UpgradeTower) -> f64 {
    tower.range + 0.5 * f64::from((tower.level - 1).max(0))
}

pub fn bonus_damage_from_kills(tower: &UpgradeTower) -> i32 {
    2 * (tower.kills.max(0) / 5)
}

pub fn total_fleet_damage(towers: &[UpgradeTower]) -> i32 {
    towers
        .iter()
        .map(|t| upgraded_damage(t) + bonus_damage_from_kills(t))
        .sum()
}

/// Index of the tower with the most kills. Towers without kills never win.
pub fn find_mvp_tower(towers: &[UpgradeTower]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, tower) in towers.iter().enumerate() {
        if tower.kills <= 0 {
            continue;
        }
        match best {
            Some((_, kills)) if kills >= tower.kills => {}
            _ => best = Some((i, tower.kills)),
        }
    }
    best.map(|(i, _)| i)
}

pub fn player_rank(player: &UpgradePlayer) -> Rank {
    match player.total_kills {
        k if k >= 100 => Rank::Admiral,
        k if k >= 50 => Rank::Captain,
        k if k >= 10 => Rank::Lieutenant,
        _ => Rank::Cadet,
    }
}

pub fn daily_bonus(player: &UpgradePlayer, day_number: i32) -> i32 {
    let mut bonus = 50 + 10 * day_number.max(0);
    if player.is_premium {
        bonus *= 2;
    }
    bonus.min(500)
}

pub fn recommend_tower(money: i32, has_air_enemies: bool, wave: i32) -> Option<TowerKind> {
    if money < 100 {
        None
    } else if has_air_enemies {
        Some(TowerKind::Missile)
    } else if wave >= 5 && money >= 300 {
        Some(TowerKind::Plasma)
    } else {
        Some(TowerKind::Laser)
    }
}

/// Upgrades towers round-robin, one level per tower per pass, until no
/// tower can be afforded. Returns the unspent budget.
pub fn auto_upgrade_all(towers: &mut [UpgradeTower], budget: i32) -> i32 {
    let mut budget = budget;
    loop {
        let mut upgraded = false;
        for tower in towers.iter_mut() {
            if can_upgrade(tower, budget) {
                budget -= upgrade_cost(tower);
                tower.level += 1;
                upgraded = true;
            }
        }
        if !upgraded {
            return budget;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower(level: i32, kills: i32) -> UpgradeTower {
        UpgradeTower::new(level, 10, 3.0, TowerKind::Laser, kills)
    }

    fn player(total_kills: i32, is_premium: bool) -> UpgradePlayer {
        UpgradePlayer {
            name: "Nova".to_string(),
            money: 0,
            total_kills,
            waves_completed: 0,
            is_premium,
        }
    }

    #[test]
    fn cost_scales_with_level() {
        assert_eq!(upgrade_cost(&tower(1, 0)), 100);
        assert_eq!(upgrade_cost(&tower(4, 0)), 400);
    }

    #[test]
    fn cannot_upgrade_past_max() {
        assert!(can_upgrade(&tower(4, 0), 400));
        assert!(!can_upgrade(&tower(5, 0), 10_000));
        assert!(!can_upgrade(&tower(2, 0), 199));
    }

    #[test]
    fn stats_at_level() {
        assert_eq!(upgraded_damage(&tower(1, 0)), 10);
        assert_eq!(upgraded_damage(&tower(3, 0)), 20);
        assert_eq!(upgraded_range(&tower(1, 0)), 3.0);
        assert_eq!(upgraded_range(&tower(5, 0)), 5.0);
    }

    #[test]
    fn kill_bonus_every_five() {
        assert_eq!(bonus_damage_from_kills(&tower(1, 4)), 0);
        assert_eq!(bonus_damage_from_kills(&tower(1, 12)), 4);
    }

    #[test]
    fn fleet_damage_sums_everything() {
        let fleet = vec![tower(1, 0), tower(2, 5)];
        assert_eq!(total_fleet_damage(&fleet), 10 + 15 + 2);
        assert_eq!(total_fleet_damage(&[]), 0);
    }

    #[test]
    fn mvp_prefers_first_on_tie() {
        let fleet = vec![tower(1, 3), tower(1, 7), tower(1, 7)];
        assert_eq!(find_mvp_tower(&fleet), Some(1));
        assert_eq!(find_mvp_tower(&[tower(1, 0)]), None);
        assert_eq!(find_mvp_tower(&[]), None);
    }

    #[test]
    fn ranks() {
        assert_eq!(player_rank(&player(0, false)), Rank::Cadet);
        assert_eq!(player_rank(&player(10, false)), Rank::Lieutenant);
        assert_eq!(player_rank(&player(50, false)), Rank::Captain);
        assert_eq!(player_rank(&player(150, false)), Rank::Admiral);
    }

    #[test]
    fn daily_bonus_caps() {
        assert_eq!(daily_bonus(&player(0, false), 1), 60);
        assert_eq!(daily_bonus(&player(0, true), 1), 120);
        assert_eq!(daily_bonus(&player(0, true), 100), 500);
        assert_eq!(daily_bonus(&player(0, false), -5), 50);
    }

    #[test]
    fn recommendations() {
        assert_eq!(recommend_tower(50, true, 9), None);
        assert_eq!(recommend_tower(150, true, 1), Some(TowerKind::Missile));
        assert_eq!(recommend_tower(300, false, 5), Some(TowerKind::Plasma));
        assert_eq!(recommend_tower(300, false, 4), Some(TowerKind::Laser));
    }

    #[test]
    fn auto_upgrade_spreads_budget() {
        let mut fleet = vec![tower(1, 0), tower(1, 0)];
        // first pass spends 100 + 100, the second pass cannot afford 200
        let left = auto_upgrade_all(&mut fleet, 350);
        assert_eq!(left, 150);
        assert_eq!(fleet[0].level, 2);
        assert_eq!(fleet[1].level, 2);

        let mut solo = vec![tower(1, 0)];
        assert_eq!(auto_upgrade_all(&mut solo, 1000), 0);
        assert_eq!(solo[0].level, MAX_LEVEL);
    }
}
