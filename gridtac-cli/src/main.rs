//! GRIDTAC CLI - Command-line interface
//!
//! Commands:
//! - range: Show the tiles reachable from a position
//! - path: Find a path and its arrow codes
//! - turns: Print the speed order of a roster
//! - encounter: Load an area, deploy both sides and play out one round

mod display;
mod encounter_cmd;
mod path_cmd;
mod range_cmd;
mod turns_cmd;

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gridtac_core::{GridMap, GridPos, LayeredSource, MapConfig};

#[derive(Parser)]
#[command(name = "gridtac")]
#[command(about = "Grid tactics movement and turn order tools")]
struct Cli {
    /// Skip elevation-0 layers when building maps
    #[arg(long, global = true)]
    ignore_ground: bool,

    /// Random seed for reproducibility
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tiles reachable from a position
    Range(range_cmd::RangeArgs),
    /// Find a path between two positions
    Path(path_cmd::PathArgs),
    /// Print the turn order of a roster
    Turns(turns_cmd::TurnsArgs),
    /// Set up an encounter and play one round
    Encounter(encounter_cmd::EncounterArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let map_config = MapConfig {
        ignore_ground_layer: cli.ignore_ground,
    };

    match cli.command {
        Commands::Range(args) => range_cmd::run(args, &map_config),
        Commands::Path(args) => path_cmd::run(args, &map_config),
        Commands::Turns(args) => turns_cmd::run(args),
        Commands::Encounter(args) => encounter_cmd::run(args, map_config, cli.seed),
    }
}

/// Parse an `X,Y` position argument
pub(crate) fn parse_pos(s: &str) -> Result<GridPos, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<i32>().map_err(|e| format!("bad x in '{}': {}", s, e))?;
    let y = y.trim().parse::<i32>().map_err(|e| format!("bad y in '{}': {}", s, e))?;
    Ok(GridPos::new(x, y))
}

/// Load an area file and build its map
pub(crate) fn load_map(path: &Path, config: &MapConfig) -> Result<GridMap> {
    let source = LayeredSource::load(path)
        .with_context(|| format!("Failed to load area: {}", path.display()))?;
    let map = GridMap::build(&source, config);
    anyhow::ensure!(!map.is_empty(), "Area {} has no tiles", path.display());
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pos() {
        assert_eq!(parse_pos("3,4"), Ok(GridPos::new(3, 4)));
        assert_eq!(parse_pos("-1, 2"), Ok(GridPos::new(-1, 2)));
        assert!(parse_pos("3").is_err());
        assert!(parse_pos("a,1").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["gridtac", "range", "--area", "a.json", "--at", "1,2"]).unwrap();
        assert!(matches!(cli.command, Commands::Range(_)));
        assert!(!cli.ignore_ground);
    }
}
