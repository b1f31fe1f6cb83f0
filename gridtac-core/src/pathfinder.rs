//! A* pathfinding over a grid map
//!
//! Search state lives in a [`SearchArena`] owned by a single call, never on
//! the tiles, so any number of searches may run against one shared map.
//!
//! Costs are absolute Manhattan distances: `g` is the distance from the
//! start and `h` the distance to the goal, both measured on the grid and
//! ignoring elevation. `g` is not accumulated along the route.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::GridError;
use crate::grid::{GridMap, GridPos};

/// Scratch record for one position touched by a search
#[derive(Clone, Copy, Debug)]
struct Node {
    pos: GridPos,
    /// Manhattan distance from the start
    g: i32,
    /// Manhattan distance to the goal
    h: i32,
    /// Arena index of the node this one was discovered from
    previous: Option<usize>,
}

impl Node {
    fn f(&self) -> i32 {
        self.g + self.h
    }
}

/// Per-search storage indexed by position
#[derive(Debug, Default)]
struct SearchArena {
    nodes: Vec<Node>,
    index: FxHashMap<GridPos, usize>,
}

impl SearchArena {
    fn insert(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.pos, idx);
        self.nodes.push(node);
        idx
    }

    fn get(&self, pos: GridPos) -> Option<usize> {
        self.index.get(&pos).copied()
    }

    /// Follow back-links from `goal_idx`, returning the route without the start
    fn reconstruct(&self, goal_idx: usize) -> Vec<GridPos> {
        let mut path = Vec::new();
        let mut current = goal_idx;
        while let Some(prev) = self.nodes[current].previous {
            path.push(self.nodes[current].pos);
            current = prev;
        }
        path.reverse();
        path
    }
}

/// Pathfinder bound to one grid map
#[derive(Clone, Copy, Debug)]
pub struct Pathfinder<'a> {
    map: &'a GridMap,
}

impl<'a> Pathfinder<'a> {
    pub fn new(map: &'a GridMap) -> Self {
        Self { map }
    }

    /// Lowest-cost route from `start` to `goal`
    ///
    /// The result excludes `start` and ends with `goal`. It is empty when
    /// `start == goal` or when no route exists. A non-empty `allowed` limits
    /// the search to those positions plus `start`. Blocked tiles are never
    /// entered, but a blocked `start` is not rejected.
    pub fn find_path(
        &self,
        start: GridPos,
        goal: GridPos,
        allowed: &[GridPos],
    ) -> Result<Vec<GridPos>, GridError> {
        if !self.map.contains(start) {
            return Err(GridError::UnknownPosition(start));
        }
        if !self.map.contains(goal) {
            return Err(GridError::UnknownPosition(goal));
        }
        if start == goal {
            return Ok(Vec::new());
        }

        let universe: Option<FxHashSet<GridPos>> = if allowed.is_empty() {
            None
        } else {
            Some(allowed.iter().copied().collect())
        };
        let searchable = |pos: GridPos| match &universe {
            Some(set) => pos == start || set.contains(&pos),
            None => true,
        };

        if !searchable(goal) {
            return Ok(Vec::new());
        }

        let mut arena = SearchArena::default();
        let start_idx = arena.insert(Node {
            pos: start,
            g: 0,
            h: start.manhattan(goal),
            previous: None,
        });

        // Open list keeps insertion order so equal-f ties resolve to the earliest entry
        let mut open: Vec<usize> = vec![start_idx];
        let mut closed: FxHashSet<GridPos> = FxHashSet::default();

        while let Some(slot) = min_f_slot(&arena, &open) {
            let current_idx = open.remove(slot);
            let current = arena.nodes[current_idx];
            closed.insert(current.pos);

            if current.pos == goal {
                let path = arena.reconstruct(current_idx);
                tracing::debug!(
                    "Path {} -> {}: {} steps, {} nodes touched",
                    start,
                    goal,
                    path.len(),
                    arena.nodes.len()
                );
                return Ok(path);
            }

            for tile in self.map.neighbors(current.pos) {
                let pos = tile.pos();
                if tile.is_blocked() || closed.contains(&pos) || !searchable(pos) {
                    continue;
                }
                // Open entries are re-linked to the latest expanded node,
                // which is always closed, so back-links never form a cycle
                if let Some(idx) = arena.get(pos) {
                    arena.nodes[idx].previous = Some(current_idx);
                    continue;
                }
                let idx = arena.insert(Node {
                    pos,
                    g: start.manhattan(pos),
                    h: pos.manhattan(goal),
                    previous: Some(current_idx),
                });
                open.push(idx);
            }
        }

        tracing::debug!("No path {} -> {} ({} nodes touched)", start, goal, arena.nodes.len());
        Ok(Vec::new())
    }

    /// Answer many queries at once against the shared map
    #[cfg(feature = "parallel")]
    pub fn find_paths(
        &self,
        queries: &[(GridPos, GridPos)],
        allowed: &[GridPos],
    ) -> Vec<Result<Vec<GridPos>, GridError>> {
        use rayon::prelude::*;

        queries
            .par_iter()
            .map(|&(start, goal)| self.find_path(start, goal, allowed))
            .collect()
    }
}

/// Position in `open` of the entry with the lowest f, earliest on ties
fn min_f_slot(arena: &SearchArena, open: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (slot, &idx) in open.iter().enumerate() {
        let f = arena.nodes[idx].f();
        match best {
            Some((_, best_f)) if f >= best_f => {}
            _ => best = Some((slot, f)),
        }
    }
    best.map(|(slot, _)| slot)
}

/// Convenience wrapper around [`Pathfinder::find_path`]
pub fn find_path(
    map: &GridMap,
    start: GridPos,
    goal: GridPos,
    allowed: &[GridPos],
) -> Result<Vec<GridPos>, GridError> {
    Pathfinder::new(map).find_path(start, goal, allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::grid::LayeredSource;
    use crate::range::tiles_in_range;

    fn p(x: i32, y: i32) -> GridPos {
        GridPos::new(x, y)
    }

    fn build(source: LayeredSource) -> GridMap {
        GridMap::build(&source, &MapConfig::default())
    }

    fn assert_valid_path(map: &GridMap, start: GridPos, goal: GridPos, path: &[GridPos]) {
        assert_eq!(path.last(), Some(&goal));
        let mut prev = start;
        for &pos in path {
            let tile = map.lookup(pos).unwrap();
            assert!(!tile.is_blocked(), "{} is blocked", pos);
            assert!(
                map.neighbors(prev).iter().any(|t| t.pos() == pos),
                "{} -> {} is not a neighbour step",
                prev,
                pos
            );
            prev = pos;
        }
    }

    #[test]
    fn test_straight_line() {
        let map = build(LayeredSource::flat(3, 3));
        let path = find_path(&map, p(0, 0), p(2, 0), &[]).unwrap();
        assert_eq!(path, vec![p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_open_tiles_relink_to_latest_expansion() {
        let map = build(LayeredSource::flat(3, 3));
        let path = find_path(&map, p(0, 0), p(2, 2), &[]).unwrap();
        assert_eq!(path, vec![p(0, 1), p(0, 2), p(1, 2), p(2, 2)]);
    }

    #[test]
    fn test_equal_cost_tie_break() {
        let map = build(LayeredSource::flat(2, 2));
        assert_eq!(find_path(&map, p(0, 0), p(1, 1), &[]).unwrap(), vec![p(0, 1), p(1, 1)]);
        assert_eq!(find_path(&map, p(1, 1), p(0, 0), &[]).unwrap(), vec![p(1, 0), p(0, 0)]);
    }

    #[test]
    fn test_start_equals_goal() {
        let map = build(LayeredSource::flat(3, 3));
        assert!(find_path(&map, p(1, 1), p(1, 1), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_routes_around_wall() {
        // Wall at x=2 except at y=4
        let wall = vec![p(2, 0), p(2, 1), p(2, 2), p(2, 3)];
        let map = build(LayeredSource::flat(5, 5).with_blocked(wall));
        let path = find_path(&map, p(0, 0), p(4, 0), &[]).unwrap();
        assert_valid_path(&map, p(0, 0), p(4, 0), &path);
        assert!(path.contains(&p(2, 4)));
    }

    #[test]
    fn test_fully_walled_goal_is_unreachable() {
        let wall = vec![p(1, 0), p(1, 1), p(1, 2)];
        let map = build(LayeredSource::flat(3, 3).with_blocked(wall));
        assert!(find_path(&map, p(0, 0), p(2, 2), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_blocked_goal_is_unreachable() {
        let map = build(LayeredSource::flat(3, 1).with_blocked(vec![p(2, 0)]));
        assert!(find_path(&map, p(0, 0), p(2, 0), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_blocked_start_is_allowed() {
        let map = build(LayeredSource::flat(3, 1).with_blocked(vec![p(0, 0)]));
        assert_eq!(find_path(&map, p(0, 0), p(2, 0), &[]).unwrap(), vec![p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_goal_outside_allowed_set() {
        let map = build(LayeredSource::flat(5, 5));
        let range = tiles_in_range(&map, p(0, 0), 2).unwrap();
        assert!(find_path(&map, p(0, 0), p(4, 4), range.positions()).unwrap().is_empty());
    }

    #[test]
    fn test_allowed_set_restricts_route() {
        // Only the bottom row and right column are searchable
        let map = build(LayeredSource::flat(3, 3));
        let allowed = vec![p(1, 0), p(2, 0), p(2, 1), p(2, 2)];
        let path = find_path(&map, p(0, 0), p(2, 2), &allowed).unwrap();
        assert_eq!(path, allowed);
    }

    #[test]
    fn test_elevation_steps() {
        // A staircase 0 -> 1 -> 2 is walkable, a cliff 0 -> 2 is not
        let source = LayeredSource::flat(3, 2)
            .with_layer(1, vec![p(1, 0)])
            .with_layer(2, vec![p(2, 0), p(1, 1)]);
        let map = build(source);
        let path = find_path(&map, p(0, 0), p(2, 0), &[]).unwrap();
        assert_eq!(path, vec![p(1, 0), p(2, 0)]);
        assert_valid_path(&map, p(0, 0), p(2, 0), &path);
    }

    #[test]
    fn test_deterministic() {
        let wall = vec![p(3, 1), p(3, 2), p(3, 3), p(1, 3)];
        let map = build(LayeredSource::flat(6, 6).with_blocked(wall));
        let first = find_path(&map, p(0, 0), p(5, 5), &[]).unwrap();
        for _ in 0..10 {
            assert_eq!(find_path(&map, p(0, 0), p(5, 5), &[]).unwrap(), first);
        }
        assert_valid_path(&map, p(0, 0), p(5, 5), &first);
    }

    #[test]
    fn test_unknown_positions() {
        let map = build(LayeredSource::flat(2, 2));
        assert_eq!(
            find_path(&map, p(9, 9), p(0, 0), &[]).unwrap_err(),
            GridError::UnknownPosition(p(9, 9))
        );
        assert_eq!(
            find_path(&map, p(0, 0), p(0, 9), &[]).unwrap_err(),
            GridError::UnknownPosition(p(0, 9))
        );
    }

    #[test]
    fn test_reuse_across_blocking_changes() {
        let mut map = build(LayeredSource::flat(3, 1));
        assert_eq!(find_path(&map, p(0, 0), p(2, 0), &[]).unwrap().len(), 2);
        map.set_blocked(p(1, 0), true).unwrap();
        assert!(find_path(&map, p(0, 0), p(2, 0), &[]).unwrap().is_empty());
        map.set_blocked(p(1, 0), false).unwrap();
        assert_eq!(find_path(&map, p(0, 0), p(2, 0), &[]).unwrap().len(), 2);
    }
}
