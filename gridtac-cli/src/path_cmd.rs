//! Path command - route between two positions with arrow codes
//!
//! With `--steps`, the search is limited to the range of the start tile,
//! the way a unit's move is previewed in game.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gridtac_core::{path_directions, tiles_in_range, Direction, GridMap, GridPos, MapConfig, Pathfinder};

use crate::display::{arrow_glyph, render_map, tile_glyph};

#[derive(Args)]
pub struct PathArgs {
    /// Area JSON file
    #[arg(long, value_name = "FILE")]
    pub area: PathBuf,

    /// Start position as X,Y
    #[arg(long, value_parser = crate::parse_pos, allow_hyphen_values = true)]
    pub from: GridPos,

    /// Goal position as X,Y
    #[arg(long, value_parser = crate::parse_pos, allow_hyphen_values = true)]
    pub to: GridPos,

    /// Restrict the search to tiles within this many steps of the start
    #[arg(long)]
    pub steps: Option<u32>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run path command
pub fn run(args: PathArgs, map_config: &MapConfig) -> Result<()> {
    let map = crate::load_map(&args.area, map_config)?;

    let allowed = match args.steps {
        Some(steps) => tiles_in_range(&map, args.from, steps)
            .with_context(|| format!("Cannot compute range from {}", args.from))?
            .positions()
            .to_vec(),
        None => Vec::new(),
    };

    let path = Pathfinder::new(&map)
        .find_path(args.from, args.to, &allowed)
        .with_context(|| format!("Cannot search {} -> {}", args.from, args.to))?;
    let directions = path_directions(args.from, &path);

    if path.is_empty() {
        tracing::warn!("No path from {} to {}", args.from, args.to);
    } else {
        tracing::info!("Path from {} to {}: {} steps", args.from, args.to, path.len());
    }

    if args.json {
        print_json(args.from, args.to, &path, &directions)?;
    } else {
        print_text(&map, args.from, &path, &directions);
    }
    Ok(())
}

fn print_json(from: GridPos, to: GridPos, path: &[GridPos], directions: &[Direction]) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonStep {
        pos: GridPos,
        direction: Direction,
        code: u8,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        from: GridPos,
        to: GridPos,
        found: bool,
        steps: Vec<JsonStep>,
    }

    let output = JsonOutput {
        from,
        to,
        found: !path.is_empty(),
        steps: path
            .iter()
            .zip(directions)
            .map(|(&pos, &direction)| JsonStep {
                pos,
                direction,
                code: direction.code(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(map: &GridMap, from: GridPos, path: &[GridPos], directions: &[Direction]) {
    let text = render_map(map, |pos| {
        if pos == from {
            return 'S';
        }
        match path.iter().position(|&p| p == pos) {
            Some(i) => arrow_glyph(directions[i]),
            None => tile_glyph(map, pos),
        }
    });
    match text {
        Some(text) => print!("{}", text),
        None => tracing::warn!("Map is too large to draw, skipping the picture"),
    }

    if path.is_empty() {
        println!("No path");
        return;
    }
    for (pos, direction) in path.iter().zip(directions) {
        println!("  {} {:?}", pos, direction);
    }
}
