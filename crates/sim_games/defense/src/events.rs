use crate::rules::TowerKind;
use crate::world::Cell;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BuildRefusal {
    Base,
    Forbidden,
    NoSlot,
    InsufficientFunds { cost: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum UpgradeRefusal {
    MaxLevel,
    InsufficientFunds { cost: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum DefenseEvent {
    EnemySpawned {
        slot: usize,
        health: i32,
    },
    BaseBreached {
        slot: usize,
        damage: i32,
        base_health: i32,
    },
    TowerFired {
        tower: usize,
        enemy: usize,
        damage: i32,
        critical: bool,
    },
    EnemyKilled {
        slot: usize,
        tower: usize,
        bounty: i32,
    },
    WaveAdvanced {
        wave: i32,
        bonus: i32,
    },
    TowerPlaced {
        slot: usize,
        cell: Cell,
        kind: TowerKind,
        cost: i32,
    },
    BuildRefused {
        cell: Cell,
        reason: BuildRefusal,
    },
    TowerSelected {
        slot: usize,
    },
    SelectionCleared,
    TowerUpgraded {
        slot: usize,
        level: i32,
        cost: i32,
    },
    UpgradeRefused {
        slot: usize,
        reason: UpgradeRefusal,
    },
    AutoUpgraded {
        upgrades: usize,
        spent: i32,
    },
    PauseToggled {
        paused: bool,
    },
    Restarted,
    GameOver {
        wave: i32,
        score: i32,
    },
    Victory {
        wave: i32,
        score: i32,
    },
}
