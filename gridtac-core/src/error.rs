//! Error types for the tactics core
//!
//! Every failure the core can report is a typed value. Unreachable goals
//! are not errors: the pathfinder returns an empty path for those.

use crate::creature::{CreatureId, Faction};
use crate::grid::GridPos;
use crate::turn::TurnPhase;

/// Grid lookups against positions the active map does not contain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("No tile at position {0}")]
    UnknownPosition(GridPos),
}

/// Turn order and turn phase failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("Cannot build a turn order from empty rosters")]
    EmptyRoster,

    #[error("Turn queue is empty")]
    EmptyQueue,

    #[error("Turn command not valid in phase {phase:?}")]
    PhaseMismatch { phase: TurnPhase },
}

/// Encounter setup and play failures
#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error("Area index {index} out of bounds ({len} areas loaded)")]
    AreaIndexOutOfBounds { index: usize, len: usize },

    #[error("No deployment tiles for {0:?}")]
    EmptyDeploymentZone(Faction),

    #[error("Not enough space to spawn {needed} creatures ({available} tiles free)")]
    NotEnoughSpace { needed: usize, available: usize },

    #[error("No creatures registered for strength level {0}")]
    UnknownStrength(u32),

    #[error("Unknown creature {0:?}")]
    UnknownCreature(CreatureId),

    #[error("Creature {0:?} has not been placed on the map")]
    NotPlaced(CreatureId),

    #[error("Position {0} is outside the {1:?} deployment zone")]
    OutsideDeploymentZone(GridPos, Faction),

    #[error("Position {0} is already occupied")]
    Occupied(GridPos),

    #[error("Position {0} is not reachable")]
    Unreachable(GridPos),

    #[error("It is not {0:?}'s turn")]
    NotActive(CreatureId),

    #[error("Encounter already started")]
    AlreadyStarted,

    #[error("Encounter has not started")]
    NotStarted,

    #[error("Not enough action points: need {needed}, have {available}")]
    NotEnoughActionPoints { needed: u32, available: u32 },

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Failures while loading JSON configuration or data files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Position {0} is outside the addressable grid range")]
    CoordinateOutOfRange(GridPos),
}
