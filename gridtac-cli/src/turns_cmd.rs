//! Turns command - speed order of a roster file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gridtac_core::{build_turn_order, CreatureId, CreatureOwner, Roster, TurnHooks, TurnScheduler};

#[derive(Args)]
pub struct TurnsArgs {
    /// Roster JSON file with "players" and "enemies" lists
    #[arg(long, value_name = "FILE")]
    pub roster: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Logs every phase change
struct LogHooks;

impl TurnHooks for LogHooks {
    fn start_player_turn(&mut self, actor: &CreatureOwner) {
        tracing::debug!("Starting player turn for {:?}", actor.creature);
    }

    fn start_enemy_turn(&mut self, actor: &CreatureOwner) {
        tracing::debug!("Starting enemy turn for {:?}", actor.creature);
    }

    fn end_player_turn(&mut self, actor: &CreatureOwner) {
        tracing::debug!("Ending player turn for {:?}", actor.creature);
    }

    fn end_enemy_turn(&mut self, actor: &CreatureOwner) {
        tracing::debug!("Ending enemy turn for {:?}", actor.creature);
    }
}

/// Run turns command
pub fn run(args: TurnsArgs) -> Result<()> {
    let roster = Roster::load(&args.roster)
        .with_context(|| format!("Failed to load roster: {}", args.roster.display()))?;
    let (players, enemies) = roster.spawn();

    let queue = build_turn_order(&enemies, &players).context("Cannot build turn order")?;
    let mut scheduler = TurnScheduler::begin(queue)?;

    let mut order = Vec::new();
    while scheduler.is_ready_to_advance() {
        let actor = scheduler.advance_turn(&mut LogHooks)?;
        scheduler.end_turn(&mut LogHooks)?;
        order.push(actor);
    }
    tracing::info!("{} turns in order", order.len());

    let name_of = |id: CreatureId| {
        players
            .iter()
            .chain(enemies.iter())
            .find(|c| c.id() == id)
            .map(|c| c.name().to_string())
            .unwrap_or_default()
    };

    if args.json {
        #[derive(serde::Serialize)]
        struct JsonTurn {
            turn: usize,
            name: String,
            #[serde(flatten)]
            owner: CreatureOwner,
        }

        let turns: Vec<JsonTurn> = order
            .iter()
            .enumerate()
            .map(|(i, owner)| JsonTurn {
                turn: i + 1,
                name: name_of(owner.creature),
                owner: *owner,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&turns)?);
    } else {
        for (i, owner) in order.iter().enumerate() {
            println!(
                "{:>3}. {:<16} {:?} (speed {})",
                i + 1,
                name_of(owner.creature),
                owner.faction,
                owner.speed
            );
        }
    }
    Ok(())
}
