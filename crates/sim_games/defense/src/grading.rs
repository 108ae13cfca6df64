//! Scores a rulebook against the solved rules, one check per rule.

use crate::rules::{
    economy, radar, shop, targeting, upgrades, RadarEnemy, Rulebook, TowerKind, UpgradePlayer, UpgradeTower,
};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ExerciseGroup {
    Economy,
    Shop,
    Targeting,
    Radar,
    Upgrades,
}

impl ExerciseGroup {
    pub const ALL: [ExerciseGroup; 5] = [
        ExerciseGroup::Economy,
        ExerciseGroup::Shop,
        ExerciseGroup::Targeting,
        ExerciseGroup::Radar,
        ExerciseGroup::Upgrades,
    ];
}

impl fmt::Display for ExerciseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExerciseGroup::Economy => "economy",
            ExerciseGroup::Shop => "shop",
            ExerciseGroup::Targeting => "targeting",
            ExerciseGroup::Radar => "radar",
            ExerciseGroup::Upgrades => "upgrades",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleCheck {
    pub group: ExerciseGroup,
    pub rule: &'static str,
    pub passed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GradeReport {
    pub checks: Vec<RuleCheck>,
}

impl GradeReport {
    fn record(&mut self, group: ExerciseGroup, rule: &'static str, passed: bool) {
        self.checks.push(RuleCheck { group, rule, passed });
    }

    /// `(passed, total)` over every check.
    pub fn summary(&self) -> (usize, usize) {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        (passed, self.checks.len())
    }

    pub fn group_summary(&self, group: ExerciseGroup) -> (usize, usize) {
        let in_group = self.checks.iter().filter(|c| c.group == group);
        let total = in_group.clone().count();
        let passed = in_group.filter(|c| c.passed).count();
        (passed, total)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}

impl fmt::Display for GradeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in ExerciseGroup::ALL {
            let (passed, total) = self.group_summary(group);
            writeln!(f, "{group}: {passed}/{total}")?;
            for check in self.checks.iter().filter(|c| c.group == group) {
                let mark = if check.passed { "ok" } else { "FAIL" };
                writeln!(f, "  [{mark}] {}", check.rule)?;
            }
        }
        let (passed, total) = self.summary();
        write!(f, "total: {passed}/{total}")
    }
}

pub fn grade(rules: &dyn Rulebook) -> GradeReport {
    let mut report = GradeReport::default();
    grade_economy(rules, &mut report);
    grade_shop(rules, &mut report);
    grade_targeting(rules, &mut report);
    grade_radar(rules, &mut report);
    grade_upgrades(rules, &mut report);

    let (passed, total) = report.summary();
    tracing::debug!(passed, total, "rulebook graded");
    report
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn grade_economy(rules: &dyn Rulebook, report: &mut GradeReport) {
    use ExerciseGroup::Economy as G;
    report.record(G, "starting_money", rules.starting_money() == economy::starting_money());
    report.record(G, "base_health", rules.base_health() == economy::base_health());
    report.record(G, "commander_name", !rules.commander_name().trim().is_empty());
    report.record(G, "tower_cost", rules.tower_cost() == economy::tower_cost());
    report.record(G, "tower_base_damage", rules.tower_base_damage() == economy::tower_base_damage());
    report.record(G, "tower_range", close(rules.tower_range(), economy::tower_range()));
    report.record(G, "kill_bonus", rules.kill_bonus() == economy::kill_bonus());
    report.record(
        G,
        "wave_bonus",
        [0, 1, 4, 12].iter().all(|&w| rules.wave_bonus(w) == economy::wave_bonus(w)),
    );
}

fn grade_shop(rules: &dyn Rulebook, report: &mut GradeReport) {
    use ExerciseGroup::Shop as G;
    let budgets = [0, 99, 100, 150, 200, 299, 300, 1_000];

    report.record(
        G,
        "can_afford_tower",
        budgets
            .iter()
            .all(|&m| rules.can_afford_tower(m, 100) == shop::can_afford_tower(m, 100)),
    );
    report.record(
        G,
        "tower_type",
        budgets.iter().all(|&m| rules.tower_type(m) == shop::tower_type(m)),
    );
    let cells = [(0, 0, true), (9, 9, true), (10, 3, true), (-1, 0, true), (4, 4, false)];
    report.record(
        G,
        "can_build_tower_at",
        cells
            .iter()
            .all(|&(x, y, e)| rules.can_build_tower_at(x, y, e) == shop::can_build_tower_at(x, y, e)),
    );
    let danger = [(100, 0), (29, 0), (30, 5), (80, 6)];
    report.record(
        G,
        "is_base_in_danger",
        danger
            .iter()
            .all(|&(h, n)| rules.is_base_in_danger(h, n) == shop::is_base_in_danger(h, n)),
    );
    let players = [(0, 0, true), (1_000, 5, false), (999, 9, false), (5_000, 4, false)];
    report.record(
        G,
        "is_vip_player",
        players
            .iter()
            .all(|&(s, w, p)| rules.is_vip_player(s, w, p) == shop::is_vip_player(s, w, p)),
    );
    let purchases = [(0, true), (500, false), (500, true), (1_000, true), (2_000, false)];
    report.record(
        G,
        "calculate_discount",
        purchases
            .iter()
            .all(|&(p, w)| rules.calculate_discount(p, w) == shop::calculate_discount(p, w)),
    );
    let flags = [(true, true), (true, false), (false, true), (false, false)];
    report.record(
        G,
        "should_show_warning",
        flags
            .iter()
            .all(|&(m, s)| rules.should_show_warning(m, s) == shop::should_show_warning(m, s)),
    );
}

fn grade_targeting(rules: &dyn Rulebook, report: &mut GradeReport) {
    use ExerciseGroup::Targeting as G;

    let ranges = [(1.0, 3.0), (3.0, 3.0), (3.5, 3.0)];
    report.record(
        G,
        "is_enemy_in_range",
        ranges
            .iter()
            .all(|&(d, r)| rules.is_enemy_in_range(d, r) == targeting::is_enemy_in_range(d, r)),
    );
    let levels = [(10, 1), (10, 3), (15, 0)];
    report.record(
        G,
        "calculate_damage",
        levels
            .iter()
            .all(|&(b, l)| rules.calculate_damage(b, l) == targeting::calculate_damage(b, l)),
    );
    report.record(
        G,
        "calculate_total_damage",
        levels.iter().all(|&(b, l)| {
            rules.calculate_total_damage(b, l, 2) == targeting::calculate_total_damage(b, l, 2)
                && rules.calculate_total_damage(b, l, 0) == targeting::calculate_total_damage(b, l, 0)
        }),
    );
    report.record(
        G,
        "calculate_fire_rate",
        [0, 1, 3, 10]
            .iter()
            .all(|&u| rules.calculate_fire_rate(500, u) == targeting::calculate_fire_rate(500, u)),
    );
    let points = [(0, 0, 3, 4), (2, 2, 2, 2), (5, 1, 1, 1)];
    report.record(
        G,
        "calculate_grid_distance",
        points.iter().all(|&(a, b, c, d)| {
            close(
                rules.calculate_grid_distance(a, b, c, d),
                targeting::calculate_grid_distance(a, b, c, d),
            )
        }),
    );
    let trios = [(1.0, 2.0, 3.0), (3.0, 1.0, 2.0), (3.0, 2.0, 1.0), (2.0, 2.0, 2.0)];
    report.record(
        G,
        "select_target",
        trios
            .iter()
            .all(|&(a, b, c)| rules.select_target(a, b, c) == targeting::select_target(a, b, c)),
    );
    let bonus = [(10, 20, 1), (10, 30, 2), (10, 100, 1)];
    report.record(
        G,
        "calculate_bonus_damage",
        bonus.iter().all(|&(b, h, l)| {
            rules.calculate_bonus_damage(b, h, l) == targeting::calculate_bonus_damage(b, h, l)
        }),
    );
    report.record(
        G,
        "predict_enemy_position",
        close(
            rules.predict_enemy_position(100.0, 30.0, 0.5),
            targeting::predict_enemy_position(100.0, 30.0, 0.5),
        ),
    );
}

fn grade_radar(rules: &dyn Rulebook, report: &mut GradeReport) {
    use ExerciseGroup::Radar as G;
    let contacts = [
        RadarEnemy { distance: 6.0, health: 40, is_flying: false },
        RadarEnemy { distance: 2.5, health: 90, is_flying: true },
        RadarEnemy { distance: 5.0, health: 75, is_flying: true },
        RadarEnemy { distance: 8.0, health: 120, is_flying: false },
    ];
    let lists: [&[RadarEnemy]; 2] = [&contacts, &[]];

    report.record(
        G,
        "count_all_enemies",
        lists.iter().all(|l| rules.count_all_enemies(l) == radar::count_all_enemies(l)),
    );
    report.record(
        G,
        "count_close_enemies",
        lists
            .iter()
            .all(|l| rules.count_close_enemies(l, 5.0) == radar::count_close_enemies(l, 5.0)),
    );
    report.record(
        G,
        "total_enemy_health",
        lists.iter().all(|l| rules.total_enemy_health(l) == radar::total_enemy_health(l)),
    );
    report.record(
        G,
        "find_closest_enemy",
        lists.iter().all(|l| rules.find_closest_enemy(l) == radar::find_closest_enemy(l)),
    );
    report.record(
        G,
        "find_strongest_enemy",
        lists.iter().all(|l| rules.find_strongest_enemy(l) == radar::find_strongest_enemy(l)),
    );
    report.record(
        G,
        "count_flying_enemies_in_range",
        lists.iter().all(|l| {
            rules.count_flying_enemies_in_range(l, 5.0) == radar::count_flying_enemies_in_range(l, 5.0)
        }),
    );
    let waits = [(1, 20), (5, 20), (0, 4), (12, 20)];
    report.record(
        G,
        "simulate_waiting",
        waits
            .iter()
            .all(|&(w, t)| rules.simulate_waiting(w, t) == radar::simulate_waiting(w, t)),
    );
    report.record(
        G,
        "find_first_dangerous_enemy",
        [75, 100, 200].iter().all(|&t| {
            rules.find_first_dangerous_enemy(&contacts, t) == radar::find_first_dangerous_enemy(&contacts, t)
        }),
    );
    report.record(
        G,
        "countdown_sum",
        [0, 1, 5, 10]
            .iter()
            .all(|&n| rules.countdown_sum(n) == radar::countdown_sum(n)),
    );
    report.record(
        G,
        "count_grid_cells",
        [(10, 10), (3, 7), (0, 5)]
            .iter()
            .all(|&(w, h)| rules.count_grid_cells(w, h) == radar::count_grid_cells(w, h)),
    );
}

fn grade_upgrades(rules: &dyn Rulebook, report: &mut GradeReport) {
    use ExerciseGroup::Upgrades as G;
    let fleet = vec![
        UpgradeTower::new(1, 10, 3.0, TowerKind::Laser, 0),
        UpgradeTower::new(3, 10, 3.0, TowerKind::Missile, 7),
        UpgradeTower::new(5, 10, 3.0, TowerKind::Plasma, 12),
        UpgradeTower::new(2, 10, 3.0, TowerKind::Laser, 12),
    ];

    report.record(
        G,
        "upgrade_cost",
        fleet.iter().all(|t| rules.upgrade_cost(t) == upgrades::upgrade_cost(t)),
    );
    report.record(
        G,
        "can_upgrade",
        fleet.iter().all(|t| {
            [0, 150, 1_000]
                .iter()
                .all(|&m| rules.can_upgrade(t, m) == upgrades::can_upgrade(t, m))
        }),
    );
    report.record(
        G,
        "upgraded_damage",
        fleet.iter().all(|t| rules.upgraded_damage(t) == upgrades::upgraded_damage(t)),
    );
    report.record(
        G,
        "upgraded_range",
        fleet
            .iter()
            .all(|t| close(rules.upgraded_range(t), upgrades::upgraded_range(t))),
    );
    report.record(
        G,
        "bonus_damage_from_kills",
        fleet
            .iter()
            .all(|t| rules.bonus_damage_from_kills(t) == upgrades::bonus_damage_from_kills(t)),
    );
    report.record(
        G,
        "total_fleet_damage",
        rules.total_fleet_damage(&fleet) == upgrades::total_fleet_damage(&fleet)
            && rules.total_fleet_damage(&[]) == 0,
    );
    report.record(
        G,
        "find_mvp_tower",
        rules.find_mvp_tower(&fleet) == upgrades::find_mvp_tower(&fleet)
            && rules.find_mvp_tower(&fleet[..1]).is_none(),
    );

    let players: Vec<UpgradePlayer> = [(5, false), (10, false), (75, true), (150, false)]
        .iter()
        .map(|&(kills, premium)| UpgradePlayer {
            name: "Grader".to_string(),
            money: 300,
            total_kills: kills,
            waves_completed: 3,
            is_premium: premium,
        })
        .collect();
    report.record(
        G,
        "player_rank",
        players
            .iter()
            .all(|p| rules.player_rank(p) == Some(upgrades::player_rank(p))),
    );
    report.record(
        G,
        "daily_bonus",
        players.iter().all(|p| {
            [1, 10, 40]
                .iter()
                .all(|&d| rules.daily_bonus(p, d) == upgrades::daily_bonus(p, d))
        }),
    );
    let advice = [(50, false, 1), (150, true, 1), (400, false, 6), (400, false, 2), (250, false, 9)];
    report.record(
        G,
        "recommend_tower",
        advice
            .iter()
            .all(|&(m, a, w)| rules.recommend_tower(m, a, w) == upgrades::recommend_tower(m, a, w)),
    );

    let mut theirs = fleet.clone();
    let mut ours = fleet;
    let left = rules.auto_upgrade_all(&mut theirs, 700);
    let expected = upgrades::auto_upgrade_all(&mut ours, 700);
    report.record(G, "auto_upgrade_all", left == expected && theirs == ours);
}
