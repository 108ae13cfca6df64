//! Single-player grid tower defense driven by a pluggable rulebook.

pub mod actions;
pub mod commands;
pub mod config;
pub mod events;
pub mod fallback;
pub mod game;
pub mod grading;
pub mod observe;
pub mod rules;
pub mod systems;
pub mod world;

pub use actions::DefenseAction;
pub use config::{ConfigError, DefenseConfig, FallbackEconomy};
pub use events::{BuildRefusal, DefenseEvent, UpgradeRefusal};
pub use game::DefenseGame;
pub use grading::{grade, ExerciseGroup, GradeReport, RuleCheck};
pub use observe::DefenseObservation;
pub use rules::{BlankRules, Rank, ReferenceRules, Rulebook, RulesetKind, TowerKind, TowerTier};
pub use world::{Cell, DefenseState};
