//! Movement range by adjacency hop count
//!
//! Blocked tiles are part of a range. Blocking is enforced by the
//! pathfinder when a route through the range is requested.

use rustc_hash::FxHashSet;

use crate::error::GridError;
use crate::grid::{GridMap, GridPos};

/// Tiles within a number of hops of an origin, in first-seen order
#[derive(Clone, Debug)]
pub struct TileRange {
    origin: GridPos,
    tiles: Vec<GridPos>,
    members: FxHashSet<GridPos>,
}

impl TileRange {
    pub fn origin(&self) -> GridPos {
        self.origin
    }

    /// Positions in the order they were first reached, origin first
    pub fn positions(&self) -> &[GridPos] {
        &self.tiles
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.members.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.tiles.iter().copied()
    }
}

/// Breadth-first expansion over [`GridMap::neighbors`] for exactly `steps` rounds
pub fn tiles_in_range(map: &GridMap, origin: GridPos, steps: u32) -> Result<TileRange, GridError> {
    if !map.contains(origin) {
        return Err(GridError::UnknownPosition(origin));
    }

    let mut range = TileRange {
        origin,
        tiles: vec![origin],
        members: FxHashSet::default(),
    };
    range.members.insert(origin);

    // Tiles whose neighbours are already part of the range
    let mut expanded: FxHashSet<GridPos> = FxHashSet::default();
    let mut frontier = vec![origin];

    for _ in 0..steps {
        let mut next = Vec::new();
        let mut seen: FxHashSet<GridPos> = FxHashSet::default();

        for &pos in &frontier {
            if !expanded.insert(pos) {
                continue;
            }
            for tile in map.neighbors(pos) {
                if seen.insert(tile.pos()) {
                    next.push(tile.pos());
                }
            }
        }

        for &pos in &next {
            if range.members.insert(pos) {
                range.tiles.push(pos);
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::grid::LayeredSource;

    fn p(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn open_map(size: i32) -> GridMap {
        GridMap::build(&LayeredSource::flat(size, size), &MapConfig::default())
    }

    #[test]
    fn test_zero_steps_is_origin() {
        let map = open_map(5);
        let range = tiles_in_range(&map, p(2, 2), 0).unwrap();
        assert_eq!(range.positions(), &[p(2, 2)]);
    }

    #[test]
    fn test_one_step() {
        let map = open_map(5);
        let range = tiles_in_range(&map, p(2, 2), 1).unwrap();
        assert_eq!(range.positions(), &[p(2, 2), p(3, 2), p(1, 2), p(2, 3), p(2, 1)]);
    }

    #[test]
    fn test_diamond_size() {
        let map = open_map(9);
        // Manhattan ball of radius 3 has 1 + 4 + 8 + 12 tiles
        let range = tiles_in_range(&map, p(4, 4), 3).unwrap();
        assert_eq!(range.len(), 25);
        assert!(range.iter().all(|pos| pos.manhattan(p(4, 4)) <= 3));
    }

    #[test]
    fn test_monotonic_growth() {
        let map = open_map(6);
        for steps in 1..6 {
            let smaller = tiles_in_range(&map, p(1, 1), steps - 1).unwrap();
            let larger = tiles_in_range(&map, p(1, 1), steps).unwrap();
            assert!(smaller.iter().all(|pos| larger.contains(pos)));
            assert!(larger.len() >= smaller.len());
        }
    }

    #[test]
    fn test_blocked_tiles_included() {
        let source = LayeredSource::flat(3, 1).with_blocked(vec![p(1, 0)]);
        let map = GridMap::build(&source, &MapConfig::default());
        let range = tiles_in_range(&map, p(0, 0), 2).unwrap();
        assert!(range.contains(p(1, 0)));
        // Hop count ignores blocking, so the far side is reached too
        assert!(range.contains(p(2, 0)));
    }

    #[test]
    fn test_elevation_limits_range() {
        let source = LayeredSource::flat(3, 1).with_layer(2, vec![p(1, 0)]);
        let map = GridMap::build(&source, &MapConfig::default());
        let range = tiles_in_range(&map, p(0, 0), 5).unwrap();
        assert_eq!(range.positions(), &[p(0, 0)]);
    }

    #[test]
    fn test_unknown_origin() {
        let map = open_map(2);
        assert_eq!(
            tiles_in_range(&map, p(7, 7), 1).unwrap_err(),
            GridError::UnknownPosition(p(7, 7))
        );
    }
}
