//! GRIDTAC Core - Grid tactics simulation engine
//!
//! This crate provides the core logic for a turn-based grid tactics game:
//! - Layered tile grid with elevation-aware adjacency
//! - Movement range by hop count
//! - A* pathfinding with per-search scratch storage
//! - Arrow codes for drawing paths
//! - Speed-ordered turn queue and turn phase state machine
//! - Encounter setup: areas, deployment zones, enemy spawning

pub mod config;
pub mod creature;
pub mod direction;
pub mod encounter;
pub mod error;
pub mod grid;
pub mod pathfinder;
pub mod range;
pub mod turn;

// Re-exports for convenient access
pub use config::{EncounterConfig, MapConfig};
pub use creature::{Creature, CreatureId, CreatureStats, DamageOutcome, Faction, Roster};
pub use direction::{path_directions, translate, Direction};
pub use encounter::{
    deployment_zone, spawn_plan, AreaCatalog, Encounter, EncounterOutcome, MovePlan, StrengthTable,
    StrengthTier,
};
pub use error::{ConfigError, EncounterError, GridError, TurnError};
pub use grid::{GridBounds, GridMap, GridPos, LayeredSource, Tile, TileLayer};
pub use pathfinder::{find_path, Pathfinder};
pub use range::{tiles_in_range, TileRange};
pub use turn::{
    build_turn_order, CreatureOwner, NoHooks, TurnHooks, TurnPhase, TurnQueue, TurnScheduler,
};
