//! Range command - tiles reachable within a step budget

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gridtac_core::{tiles_in_range, GridMap, GridPos, MapConfig, TileRange};

use crate::display::{render_map, tile_glyph};

#[derive(Args)]
pub struct RangeArgs {
    /// Area JSON file
    #[arg(long, value_name = "FILE")]
    pub area: PathBuf,

    /// Origin position as X,Y
    #[arg(long, value_parser = crate::parse_pos, allow_hyphen_values = true)]
    pub at: GridPos,

    /// Adjacency hops
    #[arg(long, default_value = "3")]
    pub steps: u32,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run range command
pub fn run(args: RangeArgs, map_config: &MapConfig) -> Result<()> {
    let map = crate::load_map(&args.area, map_config)?;
    let range = tiles_in_range(&map, args.at, args.steps)
        .with_context(|| format!("Cannot compute range from {}", args.at))?;

    tracing::info!("{} tiles within {} steps of {}", range.len(), args.steps, args.at);

    if args.json {
        print_json(&range, args.steps)?;
    } else {
        print_text(&map, &range);
    }
    Ok(())
}

fn print_json(range: &TileRange, steps: u32) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonOutput<'a> {
        origin: GridPos,
        steps: u32,
        tiles: &'a [GridPos],
    }

    let output = JsonOutput {
        origin: range.origin(),
        steps,
        tiles: range.positions(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_text(map: &GridMap, range: &TileRange) {
    let text = render_map(map, |pos| {
        if pos == range.origin() {
            '@'
        } else if range.contains(pos) {
            match tile_glyph(map, pos) {
                '#' => '#',
                _ => '*',
            }
        } else {
            tile_glyph(map, pos)
        }
    });
    match text {
        Some(text) => print!("{}", text),
        None => tracing::warn!("Map is too large to draw, skipping the picture"),
    }
    println!("{} tiles in range", range.len());
}
