//! Arrow codes for drawing a path tile by tile

use serde::{Deserialize, Serialize};

use crate::grid::GridPos;

/// Visual direction or turn shape of one path segment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    #[default]
    None = 0,
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
    TopRight = 5,
    BottomRight = 6,
    TopLeft = 7,
    BottomLeft = 8,
    UpFinished = 9,
    DownFinished = 10,
    LeftFinished = 11,
    RightFinished = 12,
}

impl Direction {
    /// Numeric code a renderer indexes its arrow sprites with
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether this code marks the last tile of a path
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Direction::UpFinished
                | Direction::DownFinished
                | Direction::LeftFinished
                | Direction::RightFinished
        )
    }
}

/// Direction code for `current` given its neighbours along the path
///
/// A missing `previous` or `next` contributes a zero delta. When the
/// incoming and outgoing deltas differ they are summed; diagonal sums are
/// turns and the y components of the two deltas pick the corner shape.
pub fn translate(previous: Option<GridPos>, current: GridPos, next: Option<GridPos>) -> Direction {
    let is_final = next.is_none();

    let past = previous.map_or(GridPos::ZERO, |prev| current - prev);
    let future = next.map_or(GridPos::ZERO, |next| next - current);
    let dir = if past != future { past + future } else { future };

    match (dir.x, dir.y) {
        (0, 1) if !is_final => Direction::Up,
        (0, -1) if !is_final => Direction::Down,
        (1, 0) if !is_final => Direction::Right,
        (-1, 0) if !is_final => Direction::Left,
        (1, 1) => {
            if past.y < future.y {
                Direction::BottomLeft
            } else {
                Direction::TopRight
            }
        }
        (-1, 1) => {
            if past.y < future.y {
                Direction::BottomRight
            } else {
                Direction::TopLeft
            }
        }
        (1, -1) => {
            if past.y > future.y {
                Direction::TopLeft
            } else {
                Direction::BottomRight
            }
        }
        (-1, -1) => {
            if past.y > future.y {
                Direction::TopRight
            } else {
                Direction::BottomLeft
            }
        }
        (0, 1) => Direction::UpFinished,
        (0, -1) => Direction::DownFinished,
        (-1, 0) => Direction::LeftFinished,
        (1, 0) => Direction::RightFinished,
        _ => Direction::None,
    }
}

/// Codes for every tile of `path`, walked from `origin`
///
/// `origin` is the tile the mover stands on and is not itself part of the
/// path, matching what the pathfinder returns.
pub fn path_directions(origin: GridPos, path: &[GridPos]) -> Vec<Direction> {
    path.iter()
        .enumerate()
        .map(|(i, &current)| {
            let previous = if i == 0 { origin } else { path[i - 1] };
            translate(Some(previous), current, path.get(i + 1).copied())
        })
        .collect()
}
