use crate::config::DefenseConfig;
use crate::rules::TowerKind;
use glam::Vec2;
use serde::Serialize;
use sim_core::Tick;

/// Fixed-capacity table of entities addressed by slot position.
///
/// `insert` always takes the lowest free slot, so slot numbers are stable
/// for the lifetime of an entity and get reused after removal.
#[derive(Clone, Debug)]
pub struct SlotPool<T> {
    slots: Vec<Option<T>>,
}

impl<T> SlotPool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    /// Returns the slot used, or `None` when the table is full.
    pub fn insert(&mut self, value: T) -> Option<usize> {
        let slot = self.slots.iter().position(Option::is_none)?;
        self.slots[slot] = Some(value);
        Some(slot)
    }

    pub fn remove(&mut self, slot: usize) -> Option<T> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn get(&self, slot: usize) -> Option<&T> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    /// Occupied slot numbers in ascending order.
    pub fn occupied(&self) -> Vec<usize> {
        self.iter().map(|(i, _)| i).collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&mut T) -> bool) {
        for slot in &mut self.slots {
            let discard = match slot.as_mut() {
                Some(value) => !keep(value),
                None => false,
            };
            if discard {
                *slot = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Square build grid with the base in its last column. World units match
/// the cell size, origin at the top-left corner of cell (0, 0).
#[derive(Clone, Debug)]
pub struct Grid {
    pub size: i32,
    pub cell_size: f32,
    pub base_rows: (i32, i32),
}

impl Grid {
    pub fn from_config(config: &DefenseConfig) -> Self {
        Self {
            size: config.grid_size,
            cell_size: config.cell_size,
            base_rows: config.base_rows,
        }
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.x) && (0..self.size).contains(&cell.y)
    }

    pub fn is_base(&self, cell: Cell) -> bool {
        cell.x == self.size - 1 && (cell.y == self.base_rows.0 || cell.y == self.base_rows.1)
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        let half = self.cell_size / 2.0;
        Vec2::new(
            cell.x as f32 * self.cell_size + half,
            cell.y as f32 * self.cell_size + half,
        )
    }

    /// Cell containing a world position, truncating toward zero.
    pub fn cell_of(&self, position: Vec2) -> Cell {
        Cell::new(
            (position.x / self.cell_size) as i32,
            (position.y / self.cell_size) as i32,
        )
    }

    /// Enemies crossing this x have breached the base.
    pub fn base_line_x(&self) -> f32 {
        (self.size - 1) as f32 * self.cell_size
    }

    /// Center y of the lane enemies use during `wave`.
    pub fn spawn_lane_y(&self, wave: i32) -> f32 {
        let row = (3 + wave.rem_euclid(5)).min(self.size - 1);
        row as f32 * self.cell_size + self.cell_size / 2.0
    }
}

#[derive(Clone, Debug)]
pub struct Tower {
    pub cell: Cell,
    pub cooldown_ticks: u64,
    pub kills: i32,
    pub level: i32,
    pub kind: TowerKind,
}

impl Tower {
    pub fn new(cell: Cell, kind: TowerKind) -> Self {
        Self {
            cell,
            cooldown_ticks: 0,
            kills: 0,
            level: 1,
            kind,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub position: Vec2,
    pub health: i32,
    /// World units per second along +x.
    pub speed: f32,
}

/// Purely visual shot travelling toward where the target was aimed.
#[derive(Clone, Debug)]
pub struct Projectile {
    pub position: Vec2,
    pub target: Vec2,
    pub speed: f32,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub text: String,
    pub remaining_ticks: u64,
}

#[derive(Clone, Debug)]
pub struct DefenseState {
    pub config: DefenseConfig,
    pub grid: Grid,
    pub tick: Tick,

    pub towers: SlotPool<Tower>,
    pub enemies: SlotPool<Enemy>,
    pub projectiles: SlotPool<Projectile>,

    pub money: i32,
    pub base_health: i32,
    pub score: i32,
    pub wave: i32,
    pub total_kills: i32,
    pub commander: String,

    pub spawn_timer_ticks: u64,
    pub paused: bool,
    pub game_over: bool,
    pub message: Option<StatusMessage>,
    pub selected: Option<usize>,
}

impl DefenseState {
    /// Fresh match state. Economy values are resolved by the caller so the
    /// world stays independent of any ruleset.
    pub fn new(config: DefenseConfig, money: i32, base_health: i32, commander: String) -> Self {
        Self {
            grid: Grid::from_config(&config),
            tick: 0,
            towers: SlotPool::with_capacity(config.max_towers),
            enemies: SlotPool::with_capacity(config.max_enemies),
            projectiles: SlotPool::with_capacity(config.max_projectiles),
            money,
            base_health,
            score: 0,
            wave: 1,
            total_kills: 0,
            commander,
            spawn_timer_ticks: config.ms_to_ticks(config.first_spawn_delay_ms),
            paused: false,
            game_over: false,
            message: None,
            selected: None,
            config,
        }
    }

    pub fn tower_at(&self, cell: Cell) -> Option<usize> {
        self.towers
            .iter()
            .find(|(_, t)| t.cell == cell)
            .map(|(slot, _)| slot)
    }

    pub fn set_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!(tick = self.tick, message = %text, "status message");
        self.message = Some(StatusMessage {
            text,
            remaining_ticks: self.config.ms_to_ticks(self.config.message_duration_ms),
        });
    }

    /// Text of the message if it has not expired.
    pub fn active_message(&self) -> Option<&str> {
        self.message
            .as_ref()
            .filter(|m| m.remaining_ticks > 0)
            .map(|m| m.text.as_str())
    }

    /// Cleared waves are every wave before the current one.
    pub fn waves_completed(&self) -> i32 {
        self.wave - 1
    }

    pub fn is_victory(&self) -> bool {
        self.config
            .victory_wave
            .is_some_and(|target| self.waves_completed() >= target)
    }
}
