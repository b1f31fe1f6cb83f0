//! Plain-text rendering of maps for terminal output

use gridtac_core::{Direction, GridMap, GridPos};

/// Widest or tallest map that is drawn as text
pub const MAX_RENDER_SIDE: i32 = 256;

/// Draw the map row by row, top row (highest y) first
///
/// `glyph` picks the character for each tile; positions without a tile are
/// drawn as blanks. Returns `None` when the bounding box is wider or taller
/// than [`MAX_RENDER_SIDE`].
pub fn render_map<F>(map: &GridMap, mut glyph: F) -> Option<String>
where
    F: FnMut(GridPos) -> char,
{
    let Some(bounds) = map.bounds() else {
        return Some(String::new());
    };
    if bounds.width() > MAX_RENDER_SIDE || bounds.height() > MAX_RENDER_SIDE {
        return None;
    }

    let mut out = String::with_capacity(((bounds.width() + 1) * bounds.height()) as usize);
    for y in (bounds.min_y..bounds.max_y).rev() {
        for x in bounds.min_x..bounds.max_x {
            let pos = GridPos::new(x, y);
            out.push(if map.contains(pos) { glyph(pos) } else { ' ' });
        }
        out.push('\n');
    }
    Some(out)
}

/// Glyph for an unmarked tile
pub fn tile_glyph(map: &GridMap, pos: GridPos) -> char {
    match map.lookup(pos) {
        Some(tile) if tile.is_blocked() => '#',
        Some(_) => '.',
        None => ' ',
    }
}

/// Glyph for a path tile
pub fn arrow_glyph(direction: Direction) -> char {
    match direction {
        Direction::None => '.',
        Direction::Up => '^',
        Direction::Down => 'v',
        Direction::Left => '<',
        Direction::Right => '>',
        Direction::TopRight
        | Direction::BottomRight
        | Direction::TopLeft
        | Direction::BottomLeft => '+',
        Direction::UpFinished
        | Direction::DownFinished
        | Direction::LeftFinished
        | Direction::RightFinished => 'X',
    }
}
