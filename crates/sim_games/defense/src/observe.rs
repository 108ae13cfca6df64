//! The snapshot a player sees each frame: everything the HUD would show,
//! computed through the rulebook.

use crate::fallback;
use crate::rules::{Rank, RadarEnemy, Rulebook, TowerKind, TowerTier, UpgradePlayer, UpgradeTower};
use crate::world::{Cell, DefenseState};
use glam::Vec2;
use serde::Serialize;
use sim_core::Tick;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RadarReport {
    pub total: usize,
    pub close: usize,
    pub total_health: i32,
    /// Distance to the base of the nearest enemy, in cells.
    pub nearest: Option<f64>,
    pub strongest: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShopReport {
    pub tier: TowerTier,
    pub vip: bool,
    pub weekend: bool,
    /// Percent.
    pub discount: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CommandPanel {
    pub rank: Option<Rank>,
    pub fleet_damage: i32,
    /// Tower slot with the most kills.
    pub mvp: Option<usize>,
    pub recommended: Option<TowerKind>,
    /// Enemy slot of the first enemy above the danger threshold.
    pub threat: Option<usize>,
    pub threat_health: Option<i32>,
    pub flying_in_range: usize,
    pub grid_cells: i32,
    pub waves_to_mass_attack: i32,
    pub daily_bonus: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TowerView {
    pub slot: usize,
    pub cell: Cell,
    pub kind: TowerKind,
    pub level: i32,
    pub kills: i32,
    pub range: f64,
    pub kill_bonus: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnemyView {
    pub slot: usize,
    pub position: Vec2,
    pub health: i32,
    /// Health against a fresh enemy of the current wave, clamped to 0..=1.
    pub health_fraction: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProjectileView {
    pub position: Vec2,
    pub target: Vec2,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionPanel {
    pub slot: usize,
    pub kind: TowerKind,
    pub level: i32,
    pub upgrade_cost: i32,
    pub can_upgrade: bool,
    pub max_level: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DefenseObservation {
    pub tick: Tick,
    pub wave: i32,
    pub money: i32,
    pub base_health: i32,
    pub score: i32,
    pub total_kills: i32,
    pub paused: bool,
    pub game_over: bool,
    pub message: Option<String>,
    pub commander: String,
    pub tower_cost: i32,
    pub wave_points: i32,
    pub base_in_danger: bool,

    pub radar: RadarReport,
    pub shop: ShopReport,
    pub command: CommandPanel,
    pub auto_upgrade_solved: bool,

    pub towers: Vec<TowerView>,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub selection: Option<SelectionPanel>,
}

/// Enemies as the radar sees them, in slot order.
pub fn radar_contacts(state: &DefenseState) -> Vec<(usize, RadarEnemy)> {
    let base_x = state.grid.base_line_x();
    state
        .enemies
        .iter()
        .map(|(slot, e)| {
            let contact = RadarEnemy {
                distance: f64::from((base_x - e.position.x) / state.grid.cell_size),
                health: e.health,
                is_flying: false,
            };
            (slot, contact)
        })
        .collect()
}

/// True when the rules spend money on a lone level-1 tower.
pub fn auto_upgrade_solved(rules: &dyn Rulebook) -> bool {
    let mut probe = [UpgradeTower::new(1, 10, 2.0, TowerKind::Laser, 0)];
    rules.auto_upgrade_all(&mut probe, 1_000) < 1_000
}

fn radar_report(state: &DefenseState, rules: &dyn Rulebook, contacts: &[RadarEnemy]) -> RadarReport {
    RadarReport {
        total: rules.count_all_enemies(contacts),
        close: rules.count_close_enemies(contacts, state.config.radar_close_range),
        total_health: rules.total_enemy_health(contacts),
        nearest: rules.find_closest_enemy(contacts),
        strongest: rules.find_strongest_enemy(contacts),
    }
}

fn shop_report(state: &DefenseState, rules: &dyn Rulebook) -> ShopReport {
    let weekend = state.wave > 0 && state.wave % 5 == 0;
    ShopReport {
        tier: rules.tower_type(state.money),
        vip: rules.is_vip_player(state.score, state.wave, false),
        weekend,
        discount: rules.calculate_discount(state.score, weekend),
    }
}

fn command_panel(
    state: &DefenseState,
    rules: &dyn Rulebook,
    contacts: &[(usize, RadarEnemy)],
    fleet: &[(usize, UpgradeTower)],
) -> CommandPanel {
    let player = UpgradePlayer {
        name: state.commander.clone(),
        money: state.money,
        total_kills: state.total_kills,
        waves_completed: state.waves_completed(),
        is_premium: false,
    };
    let records: Vec<UpgradeTower> = fleet.iter().map(|(_, t)| t.clone()).collect();
    let radar: Vec<RadarEnemy> = contacts.iter().map(|(_, e)| *e).collect();

    let threat = rules
        .find_first_dangerous_enemy(&radar, state.config.danger_threshold)
        .and_then(|i| contacts.get(i));

    CommandPanel {
        rank: rules.player_rank(&player),
        fleet_damage: rules.total_fleet_damage(&records),
        mvp: rules
            .find_mvp_tower(&records)
            .and_then(|i| fleet.get(i))
            .map(|(slot, _)| *slot),
        recommended: rules.recommend_tower(state.money, false, state.wave),
        threat: threat.map(|(slot, _)| *slot),
        threat_health: threat.map(|(_, e)| e.health),
        flying_in_range: rules.count_flying_enemies_in_range(&radar, state.config.flying_range),
        grid_cells: rules.count_grid_cells(state.grid.size, state.grid.size),
        waves_to_mass_attack: rules.simulate_waiting(state.wave, state.config.mass_attack_enemies),
        daily_bonus: rules.daily_bonus(&player, state.wave),
    }
}

fn selection_panel(state: &DefenseState, rules: &dyn Rulebook) -> Option<SelectionPanel> {
    let slot = state.selected?;
    let tower = state.towers.get(slot)?;
    let record = fallback::upgrade_record(rules, &state.config, tower);
    Some(SelectionPanel {
        slot,
        kind: tower.kind,
        level: tower.level,
        upgrade_cost: rules.upgrade_cost(&record),
        can_upgrade: rules.can_upgrade(&record, state.money),
        max_level: tower.level >= state.config.max_tower_level,
    })
}

pub fn observe(state: &DefenseState, rules: &dyn Rulebook) -> DefenseObservation {
    let contacts = radar_contacts(state);
    let radar: Vec<RadarEnemy> = contacts.iter().map(|(_, e)| *e).collect();
    let fleet: Vec<(usize, UpgradeTower)> = state
        .towers
        .iter()
        .map(|(slot, t)| (slot, fallback::upgrade_record(rules, &state.config, t)))
        .collect();

    let towers = state
        .towers
        .iter()
        .zip(&fleet)
        .map(|((slot, t), (_, record))| TowerView {
            slot,
            cell: t.cell,
            kind: t.kind,
            level: t.level,
            kills: t.kills,
            range: fallback::effective_range(rules, &state.config, t),
            kill_bonus: rules.bonus_damage_from_kills(record),
        })
        .collect();

    let full_health = state.config.enemy_health(state.wave).max(1) as f32;
    let enemies = state
        .enemies
        .iter()
        .map(|(slot, e)| EnemyView {
            slot,
            position: e.position,
            health: e.health,
            health_fraction: (e.health as f32 / full_health).clamp(0.0, 1.0),
        })
        .collect();

    let projectiles = state
        .projectiles
        .iter()
        .map(|(_, p)| ProjectileView {
            position: p.position,
            target: p.target,
        })
        .collect();

    DefenseObservation {
        tick: state.tick,
        wave: state.wave,
        money: state.money,
        base_health: state.base_health,
        score: state.score,
        total_kills: state.total_kills,
        paused: state.paused,
        game_over: state.game_over,
        message: state.active_message().map(str::to_owned),
        commander: state.commander.clone(),
        tower_cost: fallback::tower_cost(rules, &state.config),
        wave_points: rules.countdown_sum(state.wave),
        base_in_danger: rules.is_base_in_danger(state.base_health, state.enemies.len()),

        radar: radar_report(state, rules, &radar),
        shop: shop_report(state, rules),
        command: command_panel(state, rules, &contacts, &fleet),
        auto_upgrade_solved: auto_upgrade_solved(rules),

        towers,
        enemies,
        projectiles,
        selection: selection_panel(state, rules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefenseConfig;
    use crate::rules::{BlankRules, ReferenceRules};
    use crate::world::{Enemy, Tower};

    fn busy_state() -> DefenseState {
        let mut state = DefenseState::new(DefenseConfig::default(), 400, 25, "Ada".into());
        state.wave = 5;
        state.score = 1_000;
        state.total_kills = 12;

        let mut veteran = Tower::new(Cell::new(3, 3), TowerKind::Plasma);
        veteran.kills = 10;
        veteran.level = 2;
        state.towers.insert(Tower::new(Cell::new(1, 1), TowerKind::Laser));
        state.towers.insert(veteran);
        state.selected = Some(1);

        for (x, health) in [(400.0, 50), (250.0, 100), (100.0, 80)] {
            state.enemies.insert(Enemy {
                position: Vec2::new(x, 225.0),
                health,
                speed: 40.0,
            });
        }
        state
    }

    #[test]
    fn reference_hud() {
        let state = busy_state();
        let obs = observe(&state, &ReferenceRules::new());

        assert_eq!(obs.radar.total, 3);
        assert_eq!(obs.radar.close, 2);
        assert_eq!(obs.radar.total_health, 230);
        assert_eq!(obs.radar.nearest, Some(1.0));
        assert_eq!(obs.radar.strongest, Some(100));
        assert!(obs.base_in_danger);
        assert_eq!(obs.wave_points, 15);

        assert_eq!(obs.shop.tier, TowerTier::Super);
        assert!(obs.shop.vip);
        assert!(obs.shop.weekend);
        assert_eq!(obs.shop.discount, 25);

        assert_eq!(obs.command.rank, Some(Rank::Lieutenant));
        // (10 + 0) + (15 + 4)
        assert_eq!(obs.command.fleet_damage, 29);
        assert_eq!(obs.command.mvp, Some(1));
        assert_eq!(obs.command.recommended, Some(TowerKind::Plasma));
        assert_eq!(obs.command.threat, Some(1));
        assert_eq!(obs.command.threat_health, Some(100));
        assert_eq!(obs.command.grid_cells, 100);
        assert_eq!(obs.command.daily_bonus, 100);
        assert!(obs.auto_upgrade_solved);

        assert_eq!(obs.towers[1].range, 3.5);
        assert_eq!(obs.towers[1].kill_bonus, 4);
        assert_eq!(obs.enemies[1].health_fraction, 1.0);
        assert_eq!(obs.enemies[0].health_fraction, 0.5);

        let selection = obs.selection.expect("tower selected");
        assert_eq!(selection.upgrade_cost, 200);
        assert!(selection.can_upgrade);
        assert!(!selection.max_level);
    }

    #[test]
    fn blank_hud_still_renders() {
        let state = busy_state();
        let obs = observe(&state, &BlankRules);
        assert_eq!(obs.radar.total, 0);
        assert_eq!(obs.radar.nearest, None);
        assert_eq!(obs.command.rank, None);
        assert_eq!(obs.command.mvp, None);
        assert_eq!(obs.tower_cost, 100);
        assert!(!obs.auto_upgrade_solved);
        assert_eq!(obs.towers.len(), 2);
        assert_eq!(obs.towers[0].range, 3.0);
    }

    #[test]
    fn observation_serializes() {
        let obs = observe(&busy_state(), &ReferenceRules::new());
        let json = serde_json::to_value(&obs).expect("serializable");
        assert_eq!(json["money"], 400);
        assert_eq!(json["shop"]["tier"], "super");
        assert_eq!(json["command"]["rank"], "Lieutenant");
    }
}
