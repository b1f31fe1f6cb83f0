//! Encounter setup and play
//!
//! Ties the grid, range finder, pathfinder, direction codes and turn
//! scheduler together: load an area, deploy both sides, then move and
//! damage creatures while turns advance.

use std::path::Path;

use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::config::{read_json, EncounterConfig, MapConfig};
use crate::creature::{Creature, CreatureId, CreatureStats, DamageOutcome, Faction};
use crate::direction::{path_directions, Direction};
use crate::error::{ConfigError, EncounterError, TurnError};
use crate::grid::{GridMap, GridPos, LayeredSource};
use crate::pathfinder::Pathfinder;
use crate::range::{tiles_in_range, TileRange};
use crate::turn::{build_turn_order, CreatureOwner, TurnHooks, TurnScheduler};

// ============================================================================
// AREAS
// ============================================================================

/// Every area a run can load, addressed by index
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AreaCatalog {
    pub areas: Vec<LayeredSource>,
}

impl AreaCatalog {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let catalog: Self = serde_json::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let catalog: Self = read_json(path)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.areas.iter().try_for_each(LayeredSource::validate)
    }

    /// Build a fresh map for the area at `index`
    pub fn load_area(&self, index: usize, config: &MapConfig) -> Result<GridMap, EncounterError> {
        let source = self.areas.get(index).ok_or_else(|| {
            tracing::warn!("Area index {} out of bounds, cannot load map", index);
            EncounterError::AreaIndexOutOfBounds {
                index,
                len: self.areas.len(),
            }
        })?;

        let map = GridMap::build(source, config);
        tracing::info!(
            "Loaded area {} ({}): {} tiles",
            index,
            source.name.as_deref().unwrap_or("unnamed"),
            map.len()
        );
        Ok(map)
    }
}

// ============================================================================
// DEPLOYMENT ZONES
// ============================================================================

/// Columns each side may deploy into: `ceil(width * percent / 200)`
pub fn deployment_depth(width: i32, fraction_percent: u32) -> i32 {
    let scaled = i64::from(width.max(0)) * i64::from(fraction_percent);
    ((scaled + 199) / 200) as i32
}

/// Tiles a faction may start on, sorted by position
///
/// Players deploy on the low-x edge of the map, enemies on the high-x edge.
pub fn deployment_zone(
    map: &GridMap,
    faction: Faction,
    fraction_percent: u32,
) -> Result<Vec<GridPos>, EncounterError> {
    let Some(bounds) = map.bounds() else {
        return Err(EncounterError::EmptyDeploymentZone(faction));
    };
    let depth = deployment_depth(bounds.width(), fraction_percent);

    let zone: Vec<GridPos> = map
        .positions()
        .into_iter()
        .filter(|pos| match faction {
            Faction::Player => pos.x < bounds.min_x + depth,
            Faction::Enemy => pos.x >= bounds.max_x - depth,
        })
        .collect();

    if zone.is_empty() {
        tracing::warn!("No deployment tiles for {:?}", faction);
        return Err(EncounterError::EmptyDeploymentZone(faction));
    }
    Ok(zone)
}

// ============================================================================
// ENEMY SPAWNING
// ============================================================================

/// Creatures available at one difficulty level
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StrengthTier {
    pub level: u32,
    pub creatures: Vec<CreatureStats>,
}

/// Spawnable creatures grouped by difficulty
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StrengthTable {
    pub tiers: Vec<StrengthTier>,
}

impl StrengthTable {
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn tier(&self, level: u32) -> Option<&StrengthTier> {
        self.tiers.iter().find(|tier| tier.level == level)
    }
}

/// (strength level, amount) pairs to spawn for a room on a floor
pub fn spawn_plan(room: u32, floor: u32) -> Vec<(u32, usize)> {
    let f = floor;
    match room {
        1 => vec![(f, 2)],
        2 => vec![(f, 3)],
        3 => vec![(f, 2), (f + 1, 1)],
        4 => vec![(f, 2), (f + 1, 2)],
        5 => vec![(f, 1), (f + 1, 3)],
        6 => vec![(f, 2), (f + 1, 2), (f + 2, 1)],
        _ => Vec::new(),
    }
}

/// Draw random stat blocks following [`spawn_plan`]
pub fn pick_enemies<R: Rng>(
    table: &StrengthTable,
    room: u32,
    floor: u32,
    rng: &mut R,
) -> Result<Vec<CreatureStats>, EncounterError> {
    let mut picked = Vec::new();
    for (level, amount) in spawn_plan(room, floor) {
        let tier = table
            .tier(level)
            .filter(|tier| !tier.creatures.is_empty())
            .ok_or(EncounterError::UnknownStrength(level))?;
        for _ in 0..amount {
            let idx = rng.gen_range(0..tier.creatures.len());
            picked.push(tier.creatures[idx].clone());
        }
    }
    Ok(picked)
}

// ============================================================================
// ENCOUNTER
// ============================================================================

/// A computed move, ready to render or commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan {
    pub origin: GridPos,
    pub path: Vec<GridPos>,
    pub directions: Vec<Direction>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncounterOutcome {
    Ongoing,
    PlayerVictory,
    EnemyVictory,
}

/// One fight on one loaded area
#[derive(Debug)]
pub struct Encounter {
    map: GridMap,
    config: EncounterConfig,
    players: Vec<Creature>,
    enemies: Vec<Creature>,
    next_id: u32,
    scheduler: Option<TurnScheduler>,
}

impl Encounter {
    // ========================================================================
    // SETUP
    // ========================================================================

    /// Start an encounter with the player's roster, nobody placed yet
    pub fn new(
        map: GridMap,
        roster: Vec<CreatureStats>,
        config: EncounterConfig,
    ) -> Result<Self, EncounterError> {
        if roster.is_empty() {
            tracing::warn!("Player roster is empty");
            return Err(TurnError::EmptyRoster.into());
        }

        let mut encounter = Self {
            map,
            config,
            players: Vec::new(),
            enemies: Vec::new(),
            next_id: 0,
            scheduler: None,
        };
        for stats in roster {
            let id = encounter.allocate_id();
            encounter.players.push(Creature::spawn(id, stats));
        }
        Ok(encounter)
    }

    fn allocate_id(&mut self) -> CreatureId {
        let id = CreatureId(self.next_id);
        self.next_id += 1;
        id
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn map(&self) -> &GridMap {
        &self.map
    }

    pub fn config(&self) -> &EncounterConfig {
        &self.config
    }

    pub fn players(&self) -> &[Creature] {
        &self.players
    }

    pub fn enemies(&self) -> &[Creature] {
        &self.enemies
    }

    pub fn scheduler(&self) -> Option<&TurnScheduler> {
        self.scheduler.as_ref()
    }

    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.players
            .iter()
            .chain(self.enemies.iter())
            .find(|c| c.id() == id)
    }

    fn creature_mut(&mut self, id: CreatureId) -> Result<&mut Creature, EncounterError> {
        self.players
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|c| c.id() == id)
            .ok_or(EncounterError::UnknownCreature(id))
    }

    pub fn faction_of(&self, id: CreatureId) -> Option<Faction> {
        if self.players.iter().any(|c| c.id() == id) {
            Some(Faction::Player)
        } else if self.enemies.iter().any(|c| c.id() == id) {
            Some(Faction::Enemy)
        } else {
            None
        }
    }

    /// Creature standing on `pos`
    pub fn occupant(&self, pos: GridPos) -> Option<CreatureId> {
        self.players
            .iter()
            .chain(self.enemies.iter())
            .find(|c| c.tile() == Some(pos))
            .map(Creature::id)
    }

    fn occupied(&self) -> FxHashSet<GridPos> {
        self.players
            .iter()
            .chain(self.enemies.iter())
            .filter_map(Creature::tile)
            .collect()
    }

    pub fn deployment_zone(&self, faction: Faction) -> Result<Vec<GridPos>, EncounterError> {
        deployment_zone(&self.map, faction, self.config.deployment_fraction_percent)
    }

    // ========================================================================
    // DEPLOYMENT
    // ========================================================================

    /// Spawn the enemies for a room on random free tiles of the enemy zone
    ///
    /// Nothing is spawned if there is not enough room for all of them.
    pub fn spawn_enemies<R: Rng>(
        &mut self,
        table: &StrengthTable,
        room: u32,
        floor: u32,
        rng: &mut R,
    ) -> Result<&[Creature], EncounterError> {
        if self.scheduler.is_some() {
            return Err(EncounterError::AlreadyStarted);
        }

        let picked = pick_enemies(table, room, floor, rng)?;
        let occupied = self.occupied();
        let mut free: Vec<GridPos> = self
            .deployment_zone(Faction::Enemy)?
            .into_iter()
            .filter(|pos| !occupied.contains(pos))
            .filter(|pos| self.map.lookup(*pos).is_some_and(|t| !t.is_blocked()))
            .collect();

        if picked.len() > free.len() {
            tracing::warn!(
                "Not enough space to spawn enemies: {} needed, {} free",
                picked.len(),
                free.len()
            );
            return Err(EncounterError::NotEnoughSpace {
                needed: picked.len(),
                available: free.len(),
            });
        }

        let first_new = self.enemies.len();
        for stats in picked {
            let tile = free.swap_remove(rng.gen_range(0..free.len()));
            let id = self.allocate_id();
            let mut creature = Creature::spawn(id, stats);
            creature.set_tile(Some(tile));
            self.enemies.push(creature);
        }

        tracing::info!("Spawned {} enemies for room {} floor {}", self.enemies.len() - first_new, room, floor);
        Ok(&self.enemies[first_new..])
    }

    /// Put a player creature on a free tile of the player zone
    pub fn place_player(&mut self, id: CreatureId, pos: GridPos) -> Result<(), EncounterError> {
        if self.scheduler.is_some() {
            return Err(EncounterError::AlreadyStarted);
        }
        if self.faction_of(id) != Some(Faction::Player) {
            return Err(EncounterError::UnknownCreature(id));
        }
        if !self.deployment_zone(Faction::Player)?.contains(&pos) {
            return Err(EncounterError::OutsideDeploymentZone(pos, Faction::Player));
        }
        let blocked = self.map.lookup(pos).is_some_and(|t| t.is_blocked());
        if blocked || self.occupant(pos).is_some_and(|other| other != id) {
            return Err(EncounterError::Occupied(pos));
        }

        self.creature_mut(id)?.set_tile(Some(pos));
        Ok(())
    }

    /// Every player creature stands on a tile
    pub fn placement_complete(&self) -> bool {
        self.players.iter().all(|c| c.tile().is_some())
    }

    /// Build the turn order and hand it to a fresh scheduler
    pub fn start(&mut self) -> Result<(), EncounterError> {
        if self.scheduler.is_some() {
            return Err(EncounterError::AlreadyStarted);
        }
        if let Some(unplaced) = self.players.iter().find(|c| c.tile().is_none()) {
            return Err(EncounterError::NotPlaced(unplaced.id()));
        }

        let queue = build_turn_order(&self.enemies, &self.players)?;
        self.scheduler = Some(TurnScheduler::begin(queue)?);
        tracing::info!(
            "Encounter started: {} players vs {} enemies",
            self.players.len(),
            self.enemies.len()
        );
        Ok(())
    }

    // ========================================================================
    // TURNS
    // ========================================================================

    /// Begin the next actor's turn and refill its action points
    pub fn advance_turn<H: TurnHooks>(&mut self, hooks: &mut H) -> Result<CreatureOwner, EncounterError> {
        let scheduler = self.scheduler.as_mut().ok_or(EncounterError::NotStarted)?;
        let actor = scheduler.advance_turn(hooks)?;
        self.creature_mut(actor.creature)?.restore_ap();
        Ok(actor)
    }

    pub fn end_turn<H: TurnHooks>(&mut self, hooks: &mut H) -> Result<(), EncounterError> {
        let scheduler = self.scheduler.as_mut().ok_or(EncounterError::NotStarted)?;
        scheduler.end_turn(hooks)?;
        Ok(())
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Tiles a creature could reach this action, blocked ones included
    pub fn movement_range(&self, id: CreatureId) -> Result<TileRange, EncounterError> {
        let creature = self.creature(id).ok_or(EncounterError::UnknownCreature(id))?;
        let origin = creature.tile().ok_or(EncounterError::NotPlaced(id))?;
        Ok(tiles_in_range(&self.map, origin, self.config.movement_range)?)
    }

    /// Path and arrow codes for moving a creature to `goal` within its range
    pub fn plan_move(&self, id: CreatureId, goal: GridPos) -> Result<MovePlan, EncounterError> {
        let range = self.movement_range(id)?;
        let origin = range.origin();

        if self.occupant(goal).is_some() {
            return Err(EncounterError::Occupied(goal));
        }

        let path = Pathfinder::new(&self.map).find_path(origin, goal, range.positions())?;
        if path.is_empty() {
            return Err(EncounterError::Unreachable(goal));
        }

        let directions = path_directions(origin, &path);
        Ok(MovePlan {
            origin,
            path,
            directions,
        })
    }

    /// Move the active creature to `goal`, paying the move cost
    pub fn commit_move(&mut self, id: CreatureId, goal: GridPos) -> Result<MovePlan, EncounterError> {
        let scheduler = self.scheduler.as_ref().ok_or(EncounterError::NotStarted)?;
        if scheduler.active().map(|a| a.creature) != Some(id) {
            return Err(EncounterError::NotActive(id));
        }

        let plan = self.plan_move(id, goal)?;
        let move_cost = self.config.move_cost;
        let creature = self.creature_mut(id)?;
        creature.spend_ap(move_cost)?;
        creature.set_tile(Some(goal));
        Ok(plan)
    }

    // ========================================================================
    // COMBAT
    // ========================================================================

    /// Deal damage; a defeated creature leaves the roster and the turn queue
    pub fn apply_damage(&mut self, id: CreatureId, amount: u32) -> Result<DamageOutcome, EncounterError> {
        let outcome = self.creature_mut(id)?.receive_damage(amount);
        if outcome == DamageOutcome::Defeated {
            self.players.retain(|c| c.id() != id);
            self.enemies.retain(|c| c.id() != id);
            if let Some(scheduler) = self.scheduler.as_mut() {
                scheduler.remove(id);
            }
        }
        Ok(outcome)
    }

    pub fn outcome(&self) -> EncounterOutcome {
        if self.players.is_empty() {
            EncounterOutcome::EnemyVictory
        } else if self.enemies.is_empty() && self.scheduler.is_some() {
            EncounterOutcome::PlayerVictory
        } else {
            EncounterOutcome::Ongoing
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn::NoHooks;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn p(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn table() -> StrengthTable {
        StrengthTable {
            tiers: vec![
                StrengthTier {
                    level: 1,
                    creatures: vec![
                        CreatureStats::new("Slime", 4, 2, 6),
                        CreatureStats::new("Bat", 3, 3, 2),
                    ],
                },
                StrengthTier {
                    level: 2,
                    creatures: vec![CreatureStats::new("Ogre", 12, 2, 8)],
                },
            ],
        }
    }

    fn encounter(width: i32) -> Encounter {
        let map = GridMap::build(&LayeredSource::flat(width, 4), &MapConfig::default());
        let roster = vec![
            CreatureStats::new("Knight", 10, 2, 3),
            CreatureStats::new("Archer", 6, 2, 1),
        ];
        Encounter::new(map, roster, EncounterConfig::default()).unwrap()
    }

    #[test]
    fn test_load_area_bounds() {
        let catalog = AreaCatalog {
            areas: vec![LayeredSource::flat(2, 2)],
        };
        assert_eq!(catalog.load_area(0, &MapConfig::default()).unwrap().len(), 4);
        assert!(matches!(
            catalog.load_area(3, &MapConfig::default()),
            Err(EncounterError::AreaIndexOutOfBounds { index: 3, len: 1 })
        ));
    }

    #[test]
    fn test_deployment_depth() {
        // ceil(10 * 0.7 / 2) = 4
        assert_eq!(deployment_depth(10, 70), 4);
        assert_eq!(deployment_depth(8, 70), 3);
        assert_eq!(deployment_depth(1, 70), 1);
        assert_eq!(deployment_depth(0, 70), 0);
    }

    #[test]
    fn test_deployment_zones() {
        let map = GridMap::build(&LayeredSource::flat(10, 2), &MapConfig::default());
        let players = deployment_zone(&map, Faction::Player, 70).unwrap();
        let enemies = deployment_zone(&map, Faction::Enemy, 70).unwrap();
        assert!(players.iter().all(|pos| pos.x < 4));
        assert!(enemies.iter().all(|pos| pos.x >= 6));
        assert_eq!(players.len(), 8);
        assert_eq!(enemies.len(), 8);
    }

    #[test]
    fn test_empty_map_has_no_zone() {
        assert!(matches!(
            deployment_zone(&GridMap::default(), Faction::Enemy, 70),
            Err(EncounterError::EmptyDeploymentZone(Faction::Enemy))
        ));
    }

    #[test]
    fn test_spawn_plan() {
        assert_eq!(spawn_plan(1, 1), vec![(1, 2)]);
        assert_eq!(spawn_plan(6, 2), vec![(2, 2), (3, 2), (4, 1)]);
        assert!(spawn_plan(9, 1).is_empty());
    }

    #[test]
    fn test_pick_unknown_strength() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            pick_enemies(&table(), 3, 2, &mut rng),
            Err(EncounterError::UnknownStrength(3))
        ));
    }

    #[test]
    fn test_spawn_enemies_in_zone() {
        let mut enc = encounter(10);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let spawned = enc.spawn_enemies(&table(), 3, 1, &mut rng).unwrap().to_vec();
        assert_eq!(spawned.len(), 3);

        let zone = enc.deployment_zone(Faction::Enemy).unwrap();
        let tiles: FxHashSet<GridPos> = spawned.iter().filter_map(Creature::tile).collect();
        assert_eq!(tiles.len(), 3);
        assert!(tiles.iter().all(|t| zone.contains(t)));
    }

    #[test]
    fn test_spawn_is_seeded() {
        let mut a = encounter(10);
        let mut b = encounter(10);
        a.spawn_enemies(&table(), 2, 1, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        b.spawn_enemies(&table(), 2, 1, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a.enemies(), b.enemies());
    }

    #[test]
    fn test_not_enough_space() {
        // Width 1 map: the enemy zone is a single column of 4 tiles
        let mut enc = encounter(1);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        enc.spawn_enemies(&table(), 2, 1, &mut rng).unwrap();
        let err = enc.spawn_enemies(&table(), 2, 1, &mut rng).unwrap_err();
        assert!(matches!(err, EncounterError::NotEnoughSpace { needed: 3, available: 1 }));
        assert_eq!(enc.enemies().len(), 3);
    }

    #[test]
    fn test_place_player() {
        let mut enc = encounter(10);
        let knight = enc.players()[0].id();
        let archer = enc.players()[1].id();

        assert!(matches!(
            enc.place_player(knight, p(9, 0)),
            Err(EncounterError::OutsideDeploymentZone(..))
        ));
        enc.place_player(knight, p(0, 0)).unwrap();
        assert!(!enc.placement_complete());
        assert!(matches!(enc.place_player(archer, p(0, 0)), Err(EncounterError::Occupied(_))));
        enc.place_player(archer, p(1, 0)).unwrap();
        assert!(enc.placement_complete());
        assert_eq!(enc.occupant(p(1, 0)), Some(archer));
    }

    #[test]
    fn test_start_requires_placement() {
        let mut enc = encounter(10);
        assert!(matches!(enc.start(), Err(EncounterError::NotPlaced(_))));
    }

    #[test]
    fn test_turn_flow_and_movement() {
        let mut enc = encounter(10);
        let knight = enc.players()[0].id();
        let archer = enc.players()[1].id();
        enc.place_player(knight, p(0, 0)).unwrap();
        enc.place_player(archer, p(0, 1)).unwrap();
        enc.start().unwrap();

        // Archer (speed 1) acts before the knight (speed 3)
        let actor = enc.advance_turn(&mut NoHooks).unwrap();
        assert_eq!(actor.creature, archer);
        assert!(matches!(enc.commit_move(knight, p(1, 0)), Err(EncounterError::NotActive(_))));

        let plan = enc.commit_move(archer, p(2, 1)).unwrap();
        assert_eq!(plan.path, vec![p(1, 1), p(2, 1)]);
        assert_eq!(plan.directions, vec![Direction::Right, Direction::RightFinished]);
        assert_eq!(enc.creature(archer).unwrap().tile(), Some(p(2, 1)));
        assert_eq!(enc.creature(archer).unwrap().action_points(), 1);
        enc.end_turn(&mut NoHooks).unwrap();

        let actor = enc.advance_turn(&mut NoHooks).unwrap();
        assert_eq!(actor.creature, knight);
        assert!(matches!(enc.plan_move(knight, p(2, 1)), Err(EncounterError::Occupied(_))));
        assert!(matches!(enc.plan_move(knight, p(9, 3)), Err(EncounterError::Unreachable(_))));
    }

    #[test]
    fn test_defeat_removes_creature() {
        let mut enc = encounter(10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        enc.spawn_enemies(&table(), 1, 1, &mut rng).unwrap();
        for (i, id) in enc.players().iter().map(Creature::id).collect::<Vec<_>>().into_iter().enumerate() {
            enc.place_player(id, p(0, i as i32)).unwrap();
        }
        enc.start().unwrap();
        assert_eq!(enc.scheduler().unwrap().queue().len(), 4);

        let enemy_ids: Vec<CreatureId> = enc.enemies().iter().map(Creature::id).collect();
        for id in &enemy_ids {
            assert_eq!(enc.apply_damage(*id, 100).unwrap(), DamageOutcome::Defeated);
        }
        assert!(enc.enemies().is_empty());
        assert_eq!(enc.scheduler().unwrap().queue().len(), 2);
        assert_eq!(enc.outcome(), EncounterOutcome::PlayerVictory);
    }

    #[test]
    fn test_empty_roster_rejected() {
        let map = GridMap::build(&LayeredSource::flat(2, 2), &MapConfig::default());
        assert!(matches!(
            Encounter::new(map, Vec::new(), EncounterConfig::default()),
            Err(EncounterError::Turn(TurnError::EmptyRoster))
        ));
    }
}
