//! Game simulation modules

pub mod arena;
pub mod boss;
pub mod combat;
pub mod draw;
pub mod entity;
pub mod physics;
pub mod schedule;
pub mod tuning;
pub mod world;

pub use arena::{ArenaCommand, ArenaError, ArenaHandle, ArenaLoop, ArenaSettings, Connection};
pub use boss::{BossConfig, BossController, Mood};
pub use entity::{Entity, EntityId, EntityKind, Team};
pub use tuning::ArenaTuning;
pub use world::{Game, GameError, StepOutcome, TeamTally};
