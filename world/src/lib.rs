#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Wumpus World simulator.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};
use wumpus_core::{
    rewards, Action, ConfigError, Coordinate, DeathCause, Event, Orientation, Percept,
    SimulationConfig, StepError, StepOutcome, HORIZON_REACHED_NOTE,
};

mod generation;
mod percepts;

pub use generation::generate;
pub use percepts::{encode, Transients};

const DEFAULT_LAYOUT_HORIZON: u32 = 50;

/// Represents the authoritative state of a single episode.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    width: u32,
    height: u32,
    agent_pos: Coordinate,
    agent_orientation: Orientation,
    has_arrow: bool,
    has_gold: bool,
    hostile_alive: bool,
    pits: BTreeSet<Coordinate>,
    hostile_position: Option<Coordinate>,
    gold_position: Option<Coordinate>,
    exit_position: Coordinate,
    step_count: u32,
    horizon: u32,
    pit_probability: f64,
    terminated: bool,
    last_reward: f64,
    visited: BTreeSet<Coordinate>,
    percept: Percept,
}

/// Hand-authored episode description used to build a [`WorldState`] directly.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Start cell, which doubles as the exit.
    pub start: Coordinate,
    /// Initial facing.
    pub orientation: Orientation,
    /// Cells holding pits.
    pub pits: Vec<Coordinate>,
    /// Cell holding the creature, if any.
    pub hostile: Option<Coordinate>,
    /// Whether the creature starts alive.
    pub hostile_alive: bool,
    /// Cell holding the gold, if any.
    pub gold: Option<Coordinate>,
    /// Whether the agent starts with its arrow.
    pub has_arrow: bool,
    /// Step limit of the episode.
    pub horizon: u32,
}

impl Layout {
    /// Creates an empty, armed layout starting at the origin facing north.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            start: Coordinate::new(0, 0),
            orientation: Orientation::North,
            pits: Vec::new(),
            hostile: None,
            hostile_alive: true,
            gold: None,
            has_arrow: true,
            horizon: DEFAULT_LAYOUT_HORIZON,
        }
    }
}

impl WorldState {
    /// Builds a world from a hand-authored layout.
    pub fn from_layout(layout: Layout) -> Result<Self, ConfigError> {
        let Layout {
            width,
            height,
            start,
            orientation,
            pits,
            hostile,
            hostile_alive,
            gold,
            has_arrow,
            horizon,
        } = layout;

        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        if horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if !start.within(width, height) {
            return Err(ConfigError::StartOutOfBounds {
                position: start,
                width,
                height,
            });
        }
        let placed = pits
            .iter()
            .map(|pit| ("pit", *pit))
            .chain(hostile.map(|cell| ("hostile", cell)))
            .chain(gold.map(|cell| ("gold", cell)));
        for (field, position) in placed {
            if !position.within(width, height) {
                return Err(ConfigError::CellOutOfBounds { field, position });
            }
            if field != "gold" && position == start {
                return Err(ConfigError::HazardAtExit {
                    field,
                    position: start,
                });
            }
        }

        let mut world = Self {
            width,
            height,
            agent_pos: start,
            agent_orientation: orientation,
            has_arrow,
            has_gold: false,
            hostile_alive: hostile_alive && hostile.is_some(),
            pits: pits.into_iter().collect(),
            hostile_position: hostile,
            gold_position: gold,
            exit_position: start,
            step_count: 0,
            horizon,
            pit_probability: 0.0,
            terminated: false,
            last_reward: 0.0,
            visited: BTreeSet::from([start]),
            percept: Percept::default(),
        };
        world.percept = percepts::encode(&world, Transients::default());
        Ok(world)
    }

    fn hazard_at_agent(&self) -> Option<DeathCause> {
        if self.hostile_alive && self.hostile_position == Some(self.agent_pos) {
            Some(DeathCause::Hostile)
        } else if self.pits.contains(&self.agent_pos) {
            Some(DeathCause::Pit)
        } else {
            None
        }
    }

    // The arrow flies from the agent's cell across the longer grid dimension.
    fn arrow_hits_hostile(&self) -> bool {
        let Some(target) = self.hostile_position else {
            return false;
        };
        if !self.hostile_alive {
            return false;
        }

        let reach = self.width.max(self.height) as usize;
        let (orientation, width, height) = (self.agent_orientation, self.width, self.height);
        std::iter::successors(Some(self.agent_pos), |cell| {
            cell.neighbor(orientation, width, height)
        })
        .take(reach)
        .any(|cell| cell == target)
    }
}

/// Applies the provided action to the world, mutating state deterministically.
///
/// A rejected call leaves the world untouched.
pub fn apply(
    world: &mut WorldState,
    action: Action,
    out_events: &mut Vec<Event>,
) -> Result<StepOutcome, StepError> {
    if world.terminated {
        return Err(StepError::AlreadyTerminated);
    }

    let mut reward = rewards::STEP_COST;
    if world.has_gold && world.agent_pos == world.exit_position {
        reward += rewards::GOLD_AT_EXIT;
    }

    let mut transients = Transients::default();
    let mut terminated = false;
    match action {
        Action::Left | Action::Right => {
            world.agent_orientation = if action == Action::Left {
                world.agent_orientation.turn_left()
            } else {
                world.agent_orientation.turn_right()
            };
            out_events.push(Event::Turned {
                orientation: world.agent_orientation,
            });
        }
        Action::Forward => {
            let from = world.agent_pos;
            match from.neighbor(world.agent_orientation, world.width, world.height) {
                Some(to) => {
                    world.agent_pos = to;
                    out_events.push(Event::Moved { from, to });
                }
                None => {
                    transients.bump = true;
                    out_events.push(Event::Bumped { cell: from });
                }
            }
        }
        Action::Grab => {
            if world.gold_position == Some(world.agent_pos) {
                world.has_gold = true;
                world.gold_position = None;
                reward += rewards::GOLD_GRAB;
                out_events.push(Event::GoldGrabbed {
                    cell: world.agent_pos,
                });
            }
        }
        Action::Shoot => {
            if world.has_arrow {
                world.has_arrow = false;
                reward += rewards::ARROW_SHOT;
                out_events.push(Event::ArrowFired {
                    from: world.agent_pos,
                    orientation: world.agent_orientation,
                });
                if world.arrow_hits_hostile() {
                    world.hostile_alive = false;
                    transients.scream = true;
                    if let Some(cell) = world.hostile_position {
                        out_events.push(Event::CreatureSlain { cell });
                    }
                }
            }
        }
        Action::Climb => {
            if world.agent_pos == world.exit_position {
                terminated = true;
                if world.has_gold {
                    reward += rewards::ESCAPE_WITH_GOLD;
                }
                out_events.push(Event::Escaped {
                    with_gold: world.has_gold,
                });
            }
        }
    }

    if let Some(cause) = world.hazard_at_agent() {
        reward += rewards::DEATH;
        terminated = true;
        out_events.push(Event::AgentDied { cause });
    }

    world.percept = percepts::encode(world, transients);

    if world.visited.insert(world.agent_pos) && !world.has_gold {
        reward += rewards::NEW_CELL_EXPLORED;
    }

    world.step_count += 1;
    let mut info = None;
    if !terminated && world.step_count >= world.horizon.saturating_sub(1) {
        reward += rewards::DEATH;
        terminated = true;
        info = Some(HORIZON_REACHED_NOTE.to_owned());
        out_events.push(Event::HorizonExhausted {
            steps: world.step_count,
        });
    }

    world.terminated = terminated;
    world.last_reward = reward;

    trace!(
        step = world.step_count,
        %action,
        position = %world.agent_pos,
        percept = %world.percept,
        reward,
        "action processed"
    );
    if terminated {
        debug!(
            steps = world.step_count,
            has_gold = world.has_gold,
            horizon_reached = info.is_some(),
            "episode terminated"
        );
    }

    Ok(StepOutcome {
        percept: world.percept,
        reward,
        terminated,
        info,
    })
}

/// Owns the random stream and the current episode, exposing reset/step.
#[derive(Debug)]
pub struct Simulator {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    world: Option<WorldState>,
}

impl Simulator {
    /// Creates a simulator after validating `config`. No episode is active
    /// until [`Simulator::reset`] is called.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            rng: seeded_rng(config.seed),
            config,
            world: None,
        })
    }

    /// Replaces the configuration and reseeds the random stream, discarding
    /// the current episode.
    pub fn reconfigure(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.rng = seeded_rng(config.seed);
        self.config = config;
        self.world = None;
        Ok(())
    }

    /// Reconfigures and immediately starts a new episode.
    pub fn reset_with(&mut self, config: SimulationConfig) -> Result<Percept, ConfigError> {
        self.reconfigure(config)?;
        Ok(self.reset())
    }

    /// Generates the next episode and returns its initial percept.
    pub fn reset(&mut self) -> Percept {
        let world = generation::populate(&self.config, &mut self.rng);
        debug!(
            start = %world.agent_pos,
            orientation = ?world.agent_orientation,
            pits = world.pits.len(),
            hostile_alive = world.hostile_alive,
            horizon = world.horizon,
            "episode generated"
        );
        let percept = world.percept;
        self.world = Some(world);
        percept
    }

    /// Installs a prepared world as the current episode.
    pub fn load(&mut self, world: WorldState) -> Percept {
        let percept = world.percept;
        self.world = Some(world);
        percept
    }

    /// Processes one action in the current episode.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, StepError> {
        let mut events = Vec::new();
        self.step_with_events(action, &mut events)
    }

    /// Processes one action, appending the resulting events to `out_events`.
    pub fn step_with_events(
        &mut self,
        action: Action,
        out_events: &mut Vec<Event>,
    ) -> Result<StepOutcome, StepError> {
        let world = self.world.as_mut().ok_or(StepError::AlreadyTerminated)?;
        apply(world, action, out_events)
    }

    /// The current episode, if one was started.
    #[must_use]
    pub fn world(&self) -> Option<&WorldState> {
        self.world.as_ref()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::collections::BTreeSet;

    use wumpus_core::{Coordinate, Orientation, Percept};

    use super::WorldState;

    /// Grid dimensions as `(width, height)`.
    #[must_use]
    pub fn dimensions(world: &WorldState) -> (u32, u32) {
        (world.width, world.height)
    }

    /// Current cell and facing of the agent.
    #[must_use]
    pub fn agent_pose(world: &WorldState) -> (Coordinate, Orientation) {
        (world.agent_pos, world.agent_orientation)
    }

    /// Cell where the episode began and where climbing out succeeds.
    #[must_use]
    pub fn exit(world: &WorldState) -> Coordinate {
        world.exit_position
    }

    /// Whether the agent still carries its arrow.
    #[must_use]
    pub fn has_arrow(world: &WorldState) -> bool {
        world.has_arrow
    }

    /// Whether the agent carries the gold.
    #[must_use]
    pub fn has_gold(world: &WorldState) -> bool {
        world.has_gold
    }

    /// Whether the creature is alive.
    #[must_use]
    pub fn hostile_alive(world: &WorldState) -> bool {
        world.hostile_alive
    }

    /// Cell of the creature, if it was placed.
    #[must_use]
    pub fn hostile_position(world: &WorldState) -> Option<Coordinate> {
        world.hostile_position
    }

    /// Cell of the gold while it lies on the ground.
    #[must_use]
    pub fn gold_position(world: &WorldState) -> Option<Coordinate> {
        world.gold_position
    }

    /// Cells holding pits.
    #[must_use]
    pub fn pits(world: &WorldState) -> &BTreeSet<Coordinate> {
        &world.pits
    }

    /// Cells the agent has occupied during the episode.
    #[must_use]
    pub fn visited(world: &WorldState) -> &BTreeSet<Coordinate> {
        &world.visited
    }

    /// Number of actions processed in the episode.
    #[must_use]
    pub fn step_count(world: &WorldState) -> u32 {
        world.step_count
    }

    /// Step limit of the episode.
    #[must_use]
    pub fn horizon(world: &WorldState) -> u32 {
        world.horizon
    }

    /// Pit probability drawn for the episode.
    #[must_use]
    pub fn pit_probability(world: &WorldState) -> f64 {
        world.pit_probability
    }

    /// Whether the episode has ended.
    #[must_use]
    pub fn terminated(world: &WorldState) -> bool {
        world.terminated
    }

    /// Reward earned by the most recent action.
    #[must_use]
    pub fn last_reward(world: &WorldState) -> f64 {
        world.last_reward
    }

    /// Percept observed after the most recent action, or at reset.
    #[must_use]
    pub fn percept(world: &WorldState) -> Percept {
        world.percept
    }
}
