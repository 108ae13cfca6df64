use crate::actions::DefenseAction;
use crate::events::{BuildRefusal, DefenseEvent, UpgradeRefusal};
use crate::fallback;
use crate::game::fresh_state;
use crate::rules::Rulebook;
use crate::world::{Cell, DefenseState, Tower};

/// Applies one player action. Building and upgrading are ignored once the
/// base has fallen; pause, restart and deselect always work.
pub fn apply(state: &mut DefenseState, rules: &dyn Rulebook, action: &DefenseAction, events: &mut Vec<DefenseEvent>) {
    match *action {
        DefenseAction::TogglePause => {
            state.paused = !state.paused;
            events.push(DefenseEvent::PauseToggled { paused: state.paused });
        }
        DefenseAction::Restart => restart(state, rules, events),
        DefenseAction::Deselect => deselect(state, events),
        _ if state.game_over => {}
        DefenseAction::ClickCell { x, y } => click_cell(state, rules, Cell::new(x, y), events),
        DefenseAction::UpgradeSelected => {
            if let Some(slot) = state.selected.filter(|&s| state.towers.get(s).is_some()) {
                upgrade_tower(state, rules, slot, events);
            }
        }
        DefenseAction::UpgradeAt { x, y } => {
            let cell = Cell::new(x, y);
            if !state.grid.contains(cell) {
                return;
            }
            if let Some(slot) = state.tower_at(cell) {
                upgrade_tower(state, rules, slot, events);
            }
        }
        DefenseAction::AutoUpgrade => auto_upgrade(state, rules, events),
    }
}

fn deselect(state: &mut DefenseState, events: &mut Vec<DefenseEvent>) {
    if state.selected.take().is_some() {
        events.push(DefenseEvent::SelectionCleared);
    }
}

fn restart(state: &mut DefenseState, rules: &dyn Rulebook, events: &mut Vec<DefenseEvent>) {
    let tick = state.tick;
    *state = fresh_state(state.config.clone(), rules);
    state.tick = tick;
    tracing::info!(tick, money = state.money, "match restarted");
    events.push(DefenseEvent::Restarted);
}

fn click_cell(state: &mut DefenseState, rules: &dyn Rulebook, cell: Cell, events: &mut Vec<DefenseEvent>) {
    if !state.grid.contains(cell) {
        deselect(state, events);
        return;
    }

    if let Some(slot) = state.tower_at(cell) {
        state.selected = Some(slot);
        state.set_message("Tower selected! Upgrade it or right-click");
        events.push(DefenseEvent::TowerSelected { slot });
        return;
    }

    deselect(state, events);
    build_tower(state, rules, cell, events);
}

fn build_tower(state: &mut DefenseState, rules: &dyn Rulebook, cell: Cell, events: &mut Vec<DefenseEvent>) {
    if state.grid.is_base(cell) {
        state.set_message("Cannot build on the base!");
        events.push(DefenseEvent::BuildRefused {
            cell,
            reason: BuildRefusal::Base,
        });
        return;
    }

    let cost = fallback::tower_cost(rules, &state.config);
    let can_buy = rules.can_afford_tower(state.money, cost) && state.money >= cost;
    let slot_free = !state.towers.is_full();
    let warn = rules.should_show_warning(can_buy, slot_free);

    if !(can_buy && slot_free) {
        if warn {
            state.set_message("WARNING: Not enough credits or no slots!");
        } else {
            state.set_message(format!("Not enough credits! Need ${cost}"));
        }
        let reason = if slot_free {
            BuildRefusal::InsufficientFunds { cost }
        } else {
            BuildRefusal::NoSlot
        };
        events.push(DefenseEvent::BuildRefused { cell, reason });
        return;
    }

    if !rules.can_build_tower_at(cell.x, cell.y, true) {
        state.set_message("Cannot build here!");
        events.push(DefenseEvent::BuildRefused {
            cell,
            reason: BuildRefusal::Forbidden,
        });
        return;
    }

    let kind = rules
        .recommend_tower(state.money, false, state.wave)
        .unwrap_or_default();
    let Some(slot) = state.towers.insert(Tower::new(cell, kind)) else {
        return;
    };
    state.money -= cost;

    let next = rules.tower_type(state.money);
    state.set_message(format!("Tower ({kind}) deployed! Next: {}", next.label()));
    tracing::debug!(slot, x = cell.x, y = cell.y, %kind, cost, "tower placed");
    events.push(DefenseEvent::TowerPlaced { slot, cell, kind, cost });
}

fn upgrade_tower(state: &mut DefenseState, rules: &dyn Rulebook, slot: usize, events: &mut Vec<DefenseEvent>) {
    let Some(tower) = state.towers.get(slot) else {
        return;
    };
    let record = fallback::upgrade_record(rules, &state.config, tower);
    let cost = rules.upgrade_cost(&record);
    let max_level = state.config.max_tower_level;

    let allowed = record.level < max_level
        && rules.can_upgrade(&record, state.money)
        && cost > 0
        && state.money >= cost;
    if !allowed {
        let reason = if record.level >= max_level {
            state.set_message("Tower already at MAX LEVEL!");
            UpgradeRefusal::MaxLevel
        } else {
            state.set_message(format!("Need ${cost} to upgrade!"));
            UpgradeRefusal::InsufficientFunds { cost }
        };
        events.push(DefenseEvent::UpgradeRefused { slot, reason });
        return;
    }

    state.money -= cost;
    let Some(tower) = state.towers.get_mut(slot) else {
        return;
    };
    tower.level += 1;
    let (kind, level) = (tower.kind, tower.level);

    // DMG shows what the tower deals from now on, at the level just reached.
    let mut upgraded = record;
    upgraded.level = level;
    let damage = match rules.upgraded_damage(&upgraded) {
        d if d > 0 => d,
        _ => upgraded.damage,
    };
    state.set_message(format!("{kind} upgraded to Lv{level}! DMG: {damage}"));
    events.push(DefenseEvent::TowerUpgraded { slot, level, cost });
}

fn auto_upgrade(state: &mut DefenseState, rules: &dyn Rulebook, events: &mut Vec<DefenseEvent>) {
    let slots = state.towers.occupied();
    let mut records: Vec<_> = state
        .towers
        .iter()
        .map(|(_, t)| fallback::upgrade_record(rules, &state.config, t))
        .collect();

    let budget = state.money;
    let remaining = rules.auto_upgrade_all(&mut records, budget).clamp(0, budget.max(0));

    let max_level = state.config.max_tower_level;
    let mut upgrades = 0;
    for (slot, record) in slots.into_iter().zip(&records) {
        let Some(tower) = state.towers.get_mut(slot) else {
            continue;
        };
        let level = record.level.min(max_level);
        if level > tower.level {
            tower.level = level;
            upgrades += 1;
        }
    }

    let spent = if upgrades > 0 { budget - remaining } else { 0 };
    state.money -= spent;

    if upgrades > 0 {
        state.set_message(format!("AUTO-UPGRADE: {upgrades} towers upgraded! Spent ${spent}"));
    } else {
        state.set_message("AUTO-UPGRADE: No upgrades possible");
    }
    tracing::debug!(upgrades, spent, "auto-upgrade");
    events.push(DefenseEvent::AutoUpgraded { upgrades, spent });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefenseConfig;
    use crate::rules::{BlankRules, ReferenceRules, TowerKind, UpgradeTower};

    fn setup() -> (DefenseState, ReferenceRules) {
        let rules = ReferenceRules::new();
        (fresh_state(DefenseConfig::default(), &rules), rules)
    }

    fn click(state: &mut DefenseState, rules: &dyn Rulebook, x: i32, y: i32) -> Vec<DefenseEvent> {
        let mut events = Vec::new();
        apply(state, rules, &DefenseAction::ClickCell { x, y }, &mut events);
        events
    }

    /// Claims every upgrade is affordable while asking a price of nothing.
    struct FreeLunch;

    impl Rulebook for FreeLunch {
        fn can_upgrade(&self, _tower: &UpgradeTower, _money: i32) -> bool {
            true
        }

        fn auto_upgrade_all(&self, towers: &mut [UpgradeTower], _budget: i32) -> i32 {
            for t in towers.iter_mut() {
                t.level = 99;
            }
            -1_000
        }
    }

    #[test]
    fn build_charges_and_reports_next_tier() {
        let (mut state, rules) = setup();
        let events = click(&mut state, &rules, 2, 3);

        assert_eq!(state.money, 400);
        assert_eq!(state.active_message(), Some("Tower (laser) deployed! Next: SUPER"));
        assert_eq!(
            events,
            vec![DefenseEvent::TowerPlaced {
                slot: 0,
                cell: Cell::new(2, 3),
                kind: TowerKind::Laser,
                cost: 100
            }]
        );
    }

    #[test]
    fn late_rich_builds_get_plasma() {
        let (mut state, rules) = setup();
        state.wave = 5;
        click(&mut state, &rules, 1, 1);
        assert_eq!(state.towers.get(0).map(|t| t.kind), Some(TowerKind::Plasma));
    }

    #[test]
    fn click_on_tower_selects_then_empty_cell_deselects() {
        let (mut state, rules) = setup();
        click(&mut state, &rules, 2, 3);
        let events = click(&mut state, &rules, 2, 3);
        assert_eq!(events, vec![DefenseEvent::TowerSelected { slot: 0 }]);
        assert_eq!(state.selected, Some(0));

        let events = click(&mut state, &rules, 20, 20);
        assert_eq!(events, vec![DefenseEvent::SelectionCleared]);
        assert_eq!(state.selected, None);
    }

    #[test]
    fn base_cells_are_refused() {
        let (mut state, rules) = setup();
        let events = click(&mut state, &rules, 9, 4);
        assert_eq!(state.active_message(), Some("Cannot build on the base!"));
        assert!(matches!(events[0], DefenseEvent::BuildRefused { reason: BuildRefusal::Base, .. }));
        assert_eq!(state.money, 500);
    }

    #[test]
    fn broke_player_gets_warning() {
        let (mut state, rules) = setup();
        state.money = 50;
        let events = click(&mut state, &rules, 0, 0);
        assert_eq!(state.active_message(), Some("WARNING: Not enough credits or no slots!"));
        assert!(matches!(
            events[0],
            DefenseEvent::BuildRefused { reason: BuildRefusal::InsufficientFunds { cost: 100 }, .. }
        ));
    }

    #[test]
    fn full_tower_table_refuses() {
        let (mut state, rules) = setup();
        state.money = 10_000;
        for x in 0..10 {
            click(&mut state, &rules, x, 0);
        }
        let events = click(&mut state, &rules, 0, 1);
        assert!(matches!(events[0], DefenseEvent::BuildRefused { reason: BuildRefusal::NoSlot, .. }));
        assert_eq!(state.towers.len(), 10);
    }

    #[test]
    fn blank_rules_cannot_buy_without_warning() {
        let rules = BlankRules;
        let mut state = fresh_state(DefenseConfig::default(), &rules);
        click(&mut state, &rules, 0, 0);
        assert_eq!(state.active_message(), Some("Not enough credits! Need $100"));
        assert!(state.towers.is_empty());
    }

    #[test]
    fn upgrade_selected_tower() {
        let (mut state, rules) = setup();
        click(&mut state, &rules, 2, 3);
        click(&mut state, &rules, 2, 3);

        let mut events = Vec::new();
        apply(&mut state, &rules, &DefenseAction::UpgradeSelected, &mut events);
        assert_eq!(events, vec![DefenseEvent::TowerUpgraded { slot: 0, level: 2, cost: 100 }]);
        assert_eq!(state.money, 300);
        assert_eq!(state.active_message(), Some("laser upgraded to Lv2! DMG: 15"));

        events.clear();
        apply(&mut state, &rules, &DefenseAction::UpgradeAt { x: 2, y: 3 }, &mut events);
        assert_eq!(events, vec![DefenseEvent::TowerUpgraded { slot: 0, level: 3, cost: 200 }]);
        assert_eq!(state.money, 100);

        events.clear();
        apply(&mut state, &rules, &DefenseAction::UpgradeAt { x: 2, y: 3 }, &mut events);
        assert_eq!(state.active_message(), Some("Need $300 to upgrade!"));
        assert_eq!(state.money, 100);
    }

    #[test]
    fn max_level_is_refused() {
        let (mut state, rules) = setup();
        click(&mut state, &rules, 2, 3);
        if let Some(t) = state.towers.get_mut(0) {
            t.level = 5;
        }
        let mut events = Vec::new();
        apply(&mut state, &rules, &DefenseAction::UpgradeAt { x: 2, y: 3 }, &mut events);
        assert_eq!(
            events,
            vec![DefenseEvent::UpgradeRefused { slot: 0, reason: UpgradeRefusal::MaxLevel }]
        );
        assert_eq!(state.active_message(), Some("Tower already at MAX LEVEL!"));
    }

    #[test]
    fn free_upgrades_are_refused() {
        let (mut state, _) = setup();
        state.towers.insert(Tower::new(Cell::new(1, 1), TowerKind::Laser));
        let mut events = Vec::new();
        apply(&mut state, &FreeLunch, &DefenseAction::UpgradeAt { x: 1, y: 1 }, &mut events);
        assert!(matches!(events[0], DefenseEvent::UpgradeRefused { .. }));
        assert_eq!(state.towers.get(0).map(|t| t.level), Some(1));
    }

    #[test]
    fn auto_upgrade_spreads_budget() {
        let (mut state, rules) = setup();
        click(&mut state, &rules, 0, 0);
        click(&mut state, &rules, 1, 0);
        assert_eq!(state.money, 300);

        let mut events = Vec::new();
        apply(&mut state, &rules, &DefenseAction::AutoUpgrade, &mut events);
        assert_eq!(events, vec![DefenseEvent::AutoUpgraded { upgrades: 2, spent: 200 }]);
        assert_eq!(state.money, 100);
        assert_eq!(state.active_message(), Some("AUTO-UPGRADE: 2 towers upgraded! Spent $200"));
    }

    #[test]
    fn auto_upgrade_clamps_bogus_results() {
        let (mut state, _) = setup();
        state.towers.insert(Tower::new(Cell::new(1, 1), TowerKind::Laser));
        let mut events = Vec::new();
        apply(&mut state, &FreeLunch, &DefenseAction::AutoUpgrade, &mut events);

        assert_eq!(state.towers.get(0).map(|t| t.level), Some(5));
        assert_eq!(state.money, 0);
        assert_eq!(events, vec![DefenseEvent::AutoUpgraded { upgrades: 1, spent: 500 }]);
    }

    #[test]
    fn unsolved_auto_upgrade_changes_nothing() {
        let (mut state, _) = setup();
        state.towers.insert(Tower::new(Cell::new(1, 1), TowerKind::Laser));
        let mut events = Vec::new();
        apply(&mut state, &BlankRules, &DefenseAction::AutoUpgrade, &mut events);
        assert_eq!(state.money, 500);
        assert_eq!(state.active_message(), Some("AUTO-UPGRADE: No upgrades possible"));
    }

    #[test]
    fn game_over_blocks_building_but_not_restart() {
        let (mut state, rules) = setup();
        state.game_over = true;
        assert!(click(&mut state, &rules, 0, 0).is_empty());

        let mut events = Vec::new();
        apply(&mut state, &rules, &DefenseAction::TogglePause, &mut events);
        apply(&mut state, &rules, &DefenseAction::Restart, &mut events);
        assert_eq!(events, vec![DefenseEvent::PauseToggled { paused: true }, DefenseEvent::Restarted]);
        assert!(!state.game_over);
        assert!(!state.paused);
        assert_eq!(state.money, 500);
        assert_eq!(state.active_message(), Some("Welcome, Commander! Click to place towers."));
    }
}
