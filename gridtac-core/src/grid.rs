//! Layered tile grid with elevation-aware adjacency

use std::fmt;
use std::ops::{Add, Sub};
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::{read_json, MapConfig};
use crate::error::{ConfigError, GridError};

/// Largest elevation difference two adjacent tiles may have
pub const MAX_CLIMB: i32 = 1;

/// Largest absolute x or y a map accepts; keeps neighbour and distance
/// arithmetic far from `i32` overflow
pub const MAX_COORD: i32 = 1 << 24;

/// Orthogonal neighbour offsets (dx, dy)
/// Order: right, left, up, down
pub const ORTHOGONAL: [(i32, i32); 4] = [
    (1, 0),   // right
    (-1, 0),  // left
    (0, 1),   // up
    (0, -1),  // down
];

// ============================================================================
// POSITIONS
// ============================================================================

/// Integer grid coordinates, the key of every tile in a map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: GridPos = GridPos::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance; elevation plays no part
    ///
    /// Saturates at `i32::MAX` for positions further apart than that.
    pub fn manhattan(&self, other: GridPos) -> i32 {
        let dist = self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y));
        i32::try_from(dist).unwrap_or(i32::MAX)
    }

    /// Position shifted by an offset, saturating at the `i32` range
    pub fn offset(&self, dx: i32, dy: i32) -> GridPos {
        GridPos::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Whether a map may hold a tile here (see [`MAX_COORD`])
    pub fn is_addressable(&self) -> bool {
        (-MAX_COORD..=MAX_COORD).contains(&self.x) && (-MAX_COORD..=MAX_COORD).contains(&self.y)
    }
}

impl Add for GridPos {
    type Output = GridPos;

    fn add(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPos {
    type Output = GridPos;

    fn sub(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        GridPos::new(x, y)
    }
}

// ============================================================================
// TILES
// ============================================================================

/// A single addressable cell of the active map
///
/// Position and elevation are fixed at construction. Only the blocked flag
/// can change, and only through [`GridMap::set_blocked`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pos: GridPos,
    elevation: i32,
    blocked: bool,
}

impl Tile {
    fn new(pos: GridPos, elevation: i32) -> Self {
        Self {
            pos,
            elevation,
            blocked: false,
        }
    }

    pub fn pos(&self) -> GridPos {
        self.pos
    }

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }
}

// ============================================================================
// LAYERED SOURCE DATA
// ============================================================================

/// Occupied cells of one elevation layer
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TileLayer {
    pub elevation: i32,
    pub cells: Vec<GridPos>,
}

/// Layered cell data an area is built from
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LayeredSource {
    #[serde(default)]
    pub name: Option<String>,
    pub layers: Vec<TileLayer>,
    /// Positions that start out blocked
    #[serde(default)]
    pub blocked: Vec<GridPos>,
}

impl LayeredSource {
    /// Single ground layer covering `0..width` x `0..height`
    pub fn flat(width: i32, height: i32) -> Self {
        let cells = (0..height)
            .flat_map(|y| (0..width).map(move |x| GridPos::new(x, y)))
            .collect();
        Self {
            name: None,
            layers: vec![TileLayer { elevation: 0, cells }],
            blocked: Vec::new(),
        }
    }

    /// Add a layer on top of the existing ones
    pub fn with_layer(mut self, elevation: i32, cells: Vec<GridPos>) -> Self {
        self.layers.push(TileLayer { elevation, cells });
        self
    }

    /// Mark positions as initially blocked
    pub fn with_blocked(mut self, blocked: Vec<GridPos>) -> Self {
        self.blocked.extend(blocked);
        self
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let source: Self = serde_json::from_str(content)?;
        source.validate()?;
        Ok(source)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source: Self = read_json(path)?;
        source.validate()?;
        Ok(source)
    }

    /// Reject cells and blocked markers outside the addressable range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cells = self.layers.iter().flat_map(|layer| layer.cells.iter());
        match cells.chain(self.blocked.iter()).find(|pos| !pos.is_addressable()) {
            Some(&pos) => Err(ConfigError::CoordinateOutOfRange(pos)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// GRID MAP
// ============================================================================

/// Min-inclusive, max-exclusive extent of a map
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl GridBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

/// Injective mapping from grid position to tile for one loaded area
#[derive(Clone, Debug, Default)]
pub struct GridMap {
    tiles: FxHashMap<GridPos, Tile>,
}

impl GridMap {
    /// Build a map from layered source data
    ///
    /// Layers are visited from the highest elevation down; a cell already
    /// claimed by a higher layer is skipped. With `ignore_ground_layer`,
    /// elevation-0 layers contribute nothing.
    pub fn build(source: &LayeredSource, config: &MapConfig) -> Self {
        let mut map = Self::default();
        map.populate(source, config);
        map
    }

    /// Discard every tile and build again from new source data
    pub fn rebuild(&mut self, source: &LayeredSource, config: &MapConfig) {
        self.tiles.clear();
        self.populate(source, config);
    }

    fn populate(&mut self, source: &LayeredSource, config: &MapConfig) {
        let mut layers: Vec<&TileLayer> = source.layers.iter().collect();
        // Stable: equal elevations keep their source order
        layers.sort_by(|a, b| b.elevation.cmp(&a.elevation));

        let mut skipped = 0usize;
        for layer in layers {
            if layer.elevation == 0 && config.ignore_ground_layer {
                continue;
            }
            for &pos in &layer.cells {
                if !pos.is_addressable() {
                    tracing::warn!("Skipping cell {} outside the addressable range", pos);
                    continue;
                }
                if self.tiles.contains_key(&pos) {
                    skipped += 1;
                    continue;
                }
                self.tiles.insert(pos, Tile::new(pos, layer.elevation));
            }
        }

        for &pos in &source.blocked {
            if let Some(tile) = self.tiles.get_mut(&pos) {
                tile.blocked = true;
            }
        }

        if skipped > 0 {
            tracing::debug!("Skipped {} cells already claimed by a higher layer", skipped);
        }
        tracing::debug!("Built grid map with {} tiles", self.tiles.len());
    }

    /// Tile at a position, if the map has one
    pub fn lookup(&self, pos: GridPos) -> Option<&Tile> {
        self.tiles.get(&pos)
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.tiles.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterate tiles in no particular order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// All positions, sorted
    pub fn positions(&self) -> Vec<GridPos> {
        let mut positions: Vec<GridPos> = self.tiles.keys().copied().collect();
        positions.sort();
        positions
    }

    /// Orthogonal neighbours reachable without climbing more than one level
    ///
    /// Returned in right, left, up, down order. An unknown origin has no
    /// neighbours.
    pub fn neighbors(&self, pos: GridPos) -> Vec<&Tile> {
        let Some(origin) = self.tiles.get(&pos) else {
            return Vec::new();
        };

        ORTHOGONAL
            .iter()
            .filter_map(|&(dx, dy)| self.tiles.get(&pos.offset(dx, dy)))
            .filter(|tile| tile.elevation.abs_diff(origin.elevation) <= MAX_CLIMB.unsigned_abs())
            .collect()
    }

    /// Toggle the blocked flag; the only mutation a built map allows
    pub fn set_blocked(&mut self, pos: GridPos, blocked: bool) -> Result<(), GridError> {
        let tile = self
            .tiles
            .get_mut(&pos)
            .ok_or(GridError::UnknownPosition(pos))?;
        tile.blocked = blocked;
        Ok(())
    }

    /// Extent of the map, `None` when empty
    pub fn bounds(&self) -> Option<GridBounds> {
        let mut positions = self.tiles.keys();
        let first = positions.next()?;
        let mut bounds = GridBounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x + 1,
            max_y: first.y + 1,
        };
        for pos in positions {
            bounds.min_x = bounds.min_x.min(pos.x);
            bounds.min_y = bounds.min_y.min(pos.y);
            bounds.max_x = bounds.max_x.max(pos.x + 1);
            bounds.max_y = bounds.max_y.max(pos.y + 1);
        }
        Some(bounds)
    }
}

// ============================================================================
// TESTS
// ============================================================================
