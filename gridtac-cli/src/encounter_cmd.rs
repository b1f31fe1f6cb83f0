//! Encounter command - set up a fight and play one round
//!
//! ## Architecture
//!
//! - run() - orchestration
//! - load_inputs(), deploy_players(), play_round(), report()
//! - choose_step() - per-actor movement choice

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gridtac_core::{
    AreaCatalog, CreatureId, Encounter, EncounterConfig, Faction, GridPos, MapConfig, NoHooks,
    Roster, StrengthTable,
};

use crate::display::arrow_glyph;

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct EncounterArgs {
    /// Area catalog JSON file
    #[arg(long, value_name = "FILE")]
    pub areas: PathBuf,

    /// Index of the area to load
    #[arg(long, default_value = "0")]
    pub area: usize,

    /// Roster JSON file; its "players" list is deployed
    #[arg(long, value_name = "FILE")]
    pub roster: PathBuf,

    /// Strength table JSON file enemies are drawn from
    #[arg(long, value_name = "FILE")]
    pub strengths: PathBuf,

    #[arg(long, default_value = "1")]
    pub room: u32,

    #[arg(long, default_value = "1")]
    pub floor: u32,

    /// Encounter config JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Run encounter command
pub fn run(args: EncounterArgs, map_config: MapConfig, seed: Option<u64>) -> Result<()> {
    let config = load_config(&args, map_config, seed)?;
    let (catalog, roster, table) = load_inputs(&args)?;

    let map = catalog.load_area(args.area, &config.map)?;
    let mut encounter = Encounter::new(map, roster.players, config.clone())?;

    deploy_players(&mut encounter)?;
    let mut rng = config.rng();
    encounter
        .spawn_enemies(&table, args.room, args.floor, &mut rng)
        .with_context(|| format!("Cannot spawn enemies for room {} floor {}", args.room, args.floor))?;

    encounter.start()?;
    play_round(&mut encounter)?;
    report(&encounter);
    Ok(())
}

// ============================================================================
// PHASES
// ============================================================================

fn load_config(args: &EncounterArgs, map_config: MapConfig, seed: Option<u64>) -> Result<EncounterConfig> {
    let mut config = match &args.config {
        Some(path) => EncounterConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => EncounterConfig::default(),
    };
    config.map.ignore_ground_layer |= map_config.ignore_ground_layer;
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn load_inputs(args: &EncounterArgs) -> Result<(AreaCatalog, Roster, StrengthTable)> {
    let catalog = AreaCatalog::load(&args.areas)
        .with_context(|| format!("Failed to load areas: {}", args.areas.display()))?;
    let roster = Roster::load(&args.roster)
        .with_context(|| format!("Failed to load roster: {}", args.roster.display()))?;
    let table = StrengthTable::load(&args.strengths)
        .with_context(|| format!("Failed to load strength table: {}", args.strengths.display()))?;
    Ok((catalog, roster, table))
}

/// Place each player creature on the next free tile of the player zone
fn deploy_players(encounter: &mut Encounter) -> Result<()> {
    let free: Vec<GridPos> = encounter
        .deployment_zone(Faction::Player)?
        .into_iter()
        .filter(|&pos| encounter.map().lookup(pos).is_some_and(|t| !t.is_blocked()))
        .collect();

    let ids: Vec<CreatureId> = encounter.players().iter().map(|c| c.id()).collect();
    anyhow::ensure!(
        ids.len() <= free.len(),
        "Not enough deployment tiles for the player roster ({} creatures, {} tiles)",
        ids.len(),
        free.len()
    );

    for (id, pos) in ids.into_iter().zip(free) {
        encounter.place_player(id, pos)?;
    }
    tracing::info!("Deployed {} player creatures", encounter.players().len());
    Ok(())
}

/// Give every queued creature one turn
fn play_round(encounter: &mut Encounter) -> Result<()> {
    while encounter.scheduler().is_some_and(|s| s.is_ready_to_advance()) {
        let actor = encounter.advance_turn(&mut NoHooks)?;

        if let Some(goal) = choose_step(encounter, actor.creature)? {
            let plan = encounter.commit_move(actor.creature, goal)?;
            let arrows: String = plan.directions.iter().map(|&d| arrow_glyph(d)).collect();
            let name = encounter
                .creature(actor.creature)
                .map(|c| c.name().to_string())
                .unwrap_or_default();
            println!("{:<16} {:?}: {} -> {}  {}", name, actor.faction, plan.origin, goal, arrows);
        }

        encounter.end_turn(&mut NoHooks)?;
    }
    Ok(())
}

fn report(encounter: &Encounter) {
    println!();
    for creature in encounter.players().iter().chain(encounter.enemies()) {
        let tile = creature
            .tile()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} hp {:>3}  ap {:>2}  at {}",
            creature.name(),
            creature.health(),
            creature.action_points(),
            tile
        );
    }
    println!("Outcome: {:?}", encounter.outcome());
}

// ============================================================================
// STEPS
// ============================================================================

/// Free tile in range that gets closest to the nearest opponent
///
/// Returns `None` when no reachable tile improves on standing still.
fn choose_step(encounter: &Encounter, id: CreatureId) -> Result<Option<GridPos>> {
    let Some(faction) = encounter.faction_of(id) else {
        return Ok(None);
    };
    let can_pay = encounter
        .creature(id)
        .is_some_and(|c| c.action_points() >= encounter.config().move_cost);
    if !can_pay {
        return Ok(None);
    }
    let opponents: Vec<GridPos> = match faction.opponent() {
        Faction::Player => encounter.players(),
        Faction::Enemy => encounter.enemies(),
    }
    .iter()
    .filter_map(|c| c.tile())
    .collect();

    let distance = |pos: GridPos| opponents.iter().map(|&o| pos.manhattan(o)).min();

    let range = encounter.movement_range(id)?;
    let Some(current) = distance(range.origin()) else {
        return Ok(None);
    };

    let mut candidates: Vec<(i32, GridPos)> = range
        .iter()
        .filter(|&pos| encounter.occupant(pos).is_none())
        .filter_map(|pos| distance(pos).map(|d| (d, pos)))
        .filter(|&(d, _)| d < current)
        .collect();
    candidates.sort();

    for (_, pos) in candidates {
        if encounter.plan_move(id, pos).is_ok() {
            return Ok(Some(pos));
        }
    }
    Ok(None)
}
