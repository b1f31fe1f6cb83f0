//! Speed-ordered turn queue and the per-actor turn state machine
//!
//! Lower speed acts first. Equal speeds keep roster order, enemies before
//! players.
//!
//! The scheduler never waits on anything. A driver asks
//! [`TurnScheduler::is_ready_to_advance`], then issues
//! [`TurnScheduler::advance_turn`] and [`TurnScheduler::end_turn`] when its
//! own loop decides the current actor is done.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::creature::{Creature, CreatureId, Faction};
use crate::error::TurnError;

// ============================================================================
// TURN QUEUE
// ============================================================================

/// A creature paired with the faction controlling it for one encounter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureOwner {
    pub creature: CreatureId,
    pub faction: Faction,
    /// Speed at the time the order was built
    pub speed: i32,
}

/// Pending actors, consumed front to back
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TurnQueue {
    entries: VecDeque<CreatureOwner>,
}

impl TurnQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next actor without dequeuing it
    pub fn peek(&self) -> Option<&CreatureOwner> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreatureOwner> {
        self.entries.iter()
    }

    /// Dequeue the next actor
    pub fn advance_turn(&mut self) -> Result<CreatureOwner, TurnError> {
        self.entries.pop_front().ok_or(TurnError::EmptyQueue)
    }

    /// Drop a creature's pending turn, e.g. after it is defeated
    pub fn remove(&mut self, id: CreatureId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|owner| owner.creature != id);
        self.entries.len() != before
    }
}

/// Combine both rosters into a queue sorted by ascending speed
pub fn build_turn_order(enemies: &[Creature], players: &[Creature]) -> Result<TurnQueue, TurnError> {
    if enemies.is_empty() && players.is_empty() {
        tracing::warn!("Refusing to build a turn order without creatures");
        return Err(TurnError::EmptyRoster);
    }

    let tagged = enemies
        .iter()
        .map(|c| (c, Faction::Enemy))
        .chain(players.iter().map(|c| (c, Faction::Player)));

    let mut entries: Vec<CreatureOwner> = tagged
        .map(|(creature, faction)| CreatureOwner {
            creature: creature.id(),
            faction,
            speed: creature.speed(),
        })
        .collect();

    // sort_by_key is stable, ties keep insertion order
    entries.sort_by_key(|owner| owner.speed);

    Ok(TurnQueue {
        entries: entries.into(),
    })
}

// ============================================================================
// TURN PHASES
// ============================================================================

/// Where the scheduler is within the current actor's turn
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn taken yet
    Idle,
    /// An actor of this faction is acting
    Start(Faction),
    /// The last actor of this faction finished
    End(Faction),
    /// Every queued actor has had its turn
    Exhausted,
}

/// Callbacks fired as turns start and end
///
/// All methods default to doing nothing.
pub trait TurnHooks {
    fn start_player_turn(&mut self, _actor: &CreatureOwner) {}
    fn start_enemy_turn(&mut self, _actor: &CreatureOwner) {}
    fn end_player_turn(&mut self, _actor: &CreatureOwner) {}
    fn end_enemy_turn(&mut self, _actor: &CreatureOwner) {}
}

/// Hooks that ignore every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl TurnHooks for NoHooks {}

/// Drives a turn queue through start/end phases
#[derive(Clone, Debug)]
pub struct TurnScheduler {
    queue: TurnQueue,
    phase: TurnPhase,
    active: Option<CreatureOwner>,
    turns_taken: u32,
}

impl TurnScheduler {
    /// Take ownership of a freshly built queue
    pub fn begin(queue: TurnQueue) -> Result<Self, TurnError> {
        if queue.is_empty() {
            tracing::warn!("Turn order is empty");
            return Err(TurnError::EmptyQueue);
        }
        Ok(Self {
            queue,
            phase: TurnPhase::Idle,
            active: None,
            turns_taken: 0,
        })
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Actor whose turn started last
    pub fn active(&self) -> Option<&CreatureOwner> {
        self.active.as_ref()
    }

    pub fn queue(&self) -> &TurnQueue {
        &self.queue
    }

    pub fn turns_taken(&self) -> u32 {
        self.turns_taken
    }

    /// True when no actor is mid-turn and another is waiting
    pub fn is_ready_to_advance(&self) -> bool {
        matches!(self.phase, TurnPhase::Idle | TurnPhase::End(_)) && !self.queue.is_empty()
    }

    /// Dequeue the next actor and enter its start phase
    pub fn advance_turn<H: TurnHooks>(&mut self, hooks: &mut H) -> Result<CreatureOwner, TurnError> {
        match self.phase {
            TurnPhase::Idle | TurnPhase::End(_) => {}
            phase => return Err(TurnError::PhaseMismatch { phase }),
        }

        let actor = self.queue.advance_turn()?;
        self.phase = TurnPhase::Start(actor.faction);
        self.active = Some(actor);
        self.turns_taken += 1;

        match actor.faction {
            Faction::Player => hooks.start_player_turn(&actor),
            Faction::Enemy => hooks.start_enemy_turn(&actor),
        }
        tracing::debug!("Turn {}: {:?} ({:?})", self.turns_taken, actor.creature, actor.faction);
        Ok(actor)
    }

    /// Leave the active actor's turn
    pub fn end_turn<H: TurnHooks>(&mut self, hooks: &mut H) -> Result<(), TurnError> {
        let TurnPhase::Start(faction) = self.phase else {
            return Err(TurnError::PhaseMismatch { phase: self.phase });
        };

        if let Some(actor) = self.active.as_ref() {
            match faction {
                Faction::Player => hooks.end_player_turn(actor),
                Faction::Enemy => hooks.end_enemy_turn(actor),
            }
        }

        self.phase = if self.queue.is_empty() {
            TurnPhase::Exhausted
        } else {
            TurnPhase::End(faction)
        };
        Ok(())
    }

    /// Drop a creature's pending turn
    pub fn remove(&mut self, id: CreatureId) -> bool {
        let removed = self.queue.remove(id);
        if self.queue.is_empty() && matches!(self.phase, TurnPhase::Idle | TurnPhase::End(_)) {
            self.phase = TurnPhase::Exhausted;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureStats;

    fn creature(id: u32, speed: i32) -> Creature {
        Creature::spawn(CreatureId(id), CreatureStats::new(&format!("c{}", id), 10, 2, speed))
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl TurnHooks for Recorder {
        fn start_player_turn(&mut self, actor: &CreatureOwner) {
            self.events.push(format!("start player {}", actor.creature.0));
        }
        fn start_enemy_turn(&mut self, actor: &CreatureOwner) {
            self.events.push(format!("start enemy {}", actor.creature.0));
        }
        fn end_player_turn(&mut self, actor: &CreatureOwner) {
            self.events.push(format!("end player {}", actor.creature.0));
        }
        fn end_enemy_turn(&mut self, actor: &CreatureOwner) {
            self.events.push(format!("end enemy {}", actor.creature.0));
        }
    }

    #[test]
    fn test_ascending_speed_order() {
        let enemies = vec![creature(1, 5), creature(2, 1)];
        let players = vec![creature(3, 3)];
        let mut queue = build_turn_order(&enemies, &players).unwrap();

        let order: Vec<(u32, Faction)> = std::iter::from_fn(|| queue.advance_turn().ok())
            .map(|o| (o.creature.0, o.faction))
            .collect();
        assert_eq!(
            order,
            vec![(2, Faction::Enemy), (3, Faction::Player), (1, Faction::Enemy)]
        );
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let enemies = vec![creature(1, 2), creature(2, 2)];
        let players = vec![creature(3, 2), creature(4, 1)];
        let queue = build_turn_order(&enemies, &players).unwrap();
        let ids: Vec<u32> = queue.iter().map(|o| o.creature.0).collect();
        assert_eq!(ids, vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_empty_rosters_rejected() {
        assert_eq!(build_turn_order(&[], &[]), Err(TurnError::EmptyRoster));
        assert!(build_turn_order(&[], &[creature(1, 1)]).is_ok());
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = TurnQueue::default();
        assert_eq!(queue.advance_turn(), Err(TurnError::EmptyQueue));
        assert_eq!(TurnScheduler::begin(queue).unwrap_err(), TurnError::EmptyQueue);
    }

    #[test]
    fn test_remove_pending() {
        let mut queue = build_turn_order(&[creature(1, 1), creature(2, 2)], &[]).unwrap();
        assert!(queue.remove(CreatureId(1)));
        assert!(!queue.remove(CreatureId(1)));
        assert_eq!(queue.peek().map(|o| o.creature), Some(CreatureId(2)));
    }

    #[test]
    fn test_scheduler_phases() {
        let queue = build_turn_order(&[creature(1, 2)], &[creature(2, 1)]).unwrap();
        let mut scheduler = TurnScheduler::begin(queue).unwrap();
        let mut hooks = Recorder::default();

        assert_eq!(scheduler.phase(), TurnPhase::Idle);
        assert!(scheduler.is_ready_to_advance());

        let first = scheduler.advance_turn(&mut hooks).unwrap();
        assert_eq!(first.faction, Faction::Player);
        assert_eq!(scheduler.phase(), TurnPhase::Start(Faction::Player));
        assert!(!scheduler.is_ready_to_advance());

        scheduler.end_turn(&mut hooks).unwrap();
        assert_eq!(scheduler.phase(), TurnPhase::End(Faction::Player));

        scheduler.advance_turn(&mut hooks).unwrap();
        assert_eq!(scheduler.phase(), TurnPhase::Start(Faction::Enemy));
        scheduler.end_turn(&mut hooks).unwrap();
        assert_eq!(scheduler.phase(), TurnPhase::Exhausted);
        assert!(!scheduler.is_ready_to_advance());
        assert_eq!(scheduler.turns_taken(), 2);

        assert_eq!(
            hooks.events,
            vec!["start player 2", "end player 2", "start enemy 1", "end enemy 1"]
        );
    }

    #[test]
    fn test_phase_mismatch() {
        let queue = build_turn_order(&[creature(1, 1), creature(2, 2)], &[]).unwrap();
        let mut scheduler = TurnScheduler::begin(queue).unwrap();

        assert_eq!(
            scheduler.end_turn(&mut NoHooks),
            Err(TurnError::PhaseMismatch { phase: TurnPhase::Idle })
        );
        scheduler.advance_turn(&mut NoHooks).unwrap();
        assert_eq!(
            scheduler.advance_turn(&mut NoHooks),
            Err(TurnError::PhaseMismatch { phase: TurnPhase::Start(Faction::Enemy) })
        );
    }

    #[test]
    fn test_exhausted_rejects_advance() {
        let queue = build_turn_order(&[creature(1, 1)], &[]).unwrap();
        let mut scheduler = TurnScheduler::begin(queue).unwrap();
        scheduler.advance_turn(&mut NoHooks).unwrap();
        scheduler.end_turn(&mut NoHooks).unwrap();
        assert_eq!(
            scheduler.advance_turn(&mut NoHooks),
            Err(TurnError::PhaseMismatch { phase: TurnPhase::Exhausted })
        );
    }
}
