//! Combatants and their stats

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::read_json;
use crate::error::{ConfigError, EncounterError};
use crate::grid::GridPos;

/// Opaque creature handle, unique within an encounter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

/// Side a creature fights for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }
}

/// Stat block a creature is spawned from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureStats {
    pub name: String,
    pub max_health: u32,
    #[serde(default)]
    pub armor: u32,
    pub max_ap: u32,
    /// Turn order key, lower acts first
    pub speed: i32,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub kind: String,
}

impl CreatureStats {
    pub fn new(name: &str, max_health: u32, max_ap: u32, speed: i32) -> Self {
        Self {
            name: name.to_string(),
            max_health,
            armor: 0,
            max_ap,
            speed,
            class: String::new(),
            kind: String::new(),
        }
    }

    /// Load a list of stat blocks from a JSON file
    pub fn load_list(path: &Path) -> Result<Vec<Self>, ConfigError> {
        read_json(path)
    }
}

/// Both sides of a fight, as stat blocks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<CreatureStats>,
    #[serde(default)]
    pub enemies: Vec<CreatureStats>,
}

impl Roster {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    /// Spawn both sides, players first in id order
    pub fn spawn(&self) -> (Vec<Creature>, Vec<Creature>) {
        let mut next_id = 0u32;
        let mut spawn_all = |list: &[CreatureStats]| -> Vec<Creature> {
            list.iter()
                .map(|stats| {
                    let id = CreatureId(next_id);
                    next_id += 1;
                    Creature::spawn(id, stats.clone())
                })
                .collect()
        };
        let players = spawn_all(&self.players);
        let enemies = spawn_all(&self.enemies);
        (players, enemies)
    }
}

/// Result of taking damage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    Survived { remaining: u32 },
    Defeated,
}

/// A creature taking part in an encounter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    id: CreatureId,
    stats: CreatureStats,
    health: u32,
    ap: u32,
    /// Set once damage drives health below zero
    #[serde(default)]
    defeated: bool,
    /// Tile the creature stands on; the map owns the tile
    tile: Option<GridPos>,
}

impl Creature {
    /// New creature at full health and action points, not yet placed
    pub fn spawn(id: CreatureId, stats: CreatureStats) -> Self {
        Self {
            id,
            health: stats.max_health,
            ap: stats.max_ap,
            stats,
            defeated: false,
            tile: None,
        }
    }

    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.stats.name
    }

    pub fn stats(&self) -> &CreatureStats {
        &self.stats
    }

    pub fn speed(&self) -> i32 {
        self.stats.speed
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn action_points(&self) -> u32 {
        self.ap
    }

    pub fn tile(&self) -> Option<GridPos> {
        self.tile
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub(crate) fn set_tile(&mut self, tile: Option<GridPos>) {
        self.tile = tile;
    }

    /// Subtract raw damage, saturating at zero
    ///
    /// Only damage beyond the remaining health defeats; a creature can be
    /// left standing on exactly 0 health.
    pub fn receive_damage(&mut self, amount: u32) -> DamageOutcome {
        let overkill = amount > self.health;
        self.health = self.health.saturating_sub(amount);
        if overkill {
            self.defeated = true;
            tracing::debug!("{} ({:?}) defeated", self.stats.name, self.id);
            DamageOutcome::Defeated
        } else {
            DamageOutcome::Survived {
                remaining: self.health,
            }
        }
    }

    /// Pay an action cost, leaving the creature untouched if it cannot
    pub fn spend_ap(&mut self, cost: u32) -> Result<(), EncounterError> {
        if cost > self.ap {
            return Err(EncounterError::NotEnoughActionPoints {
                needed: cost,
                available: self.ap,
            });
        }
        self.ap -= cost;
        Ok(())
    }

    /// Refill action points at the start of the creature's turn
    pub fn restore_ap(&mut self) {
        self.ap = self.stats.max_ap;
    }
}
