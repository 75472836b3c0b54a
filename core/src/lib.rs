#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wumpus World simulator.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Policies submit [`Action`] values,
//! the world resolves them via its `apply` entry point and answers with a
//! [`StepOutcome`] carrying the next [`Percept`], while broadcasting [`Event`]
//! values that describe what the action did for systems to react to.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

pub use config::{ConfigError, Sampled, SimulationConfig, StartOrientation, StartPosition};

/// Note attached to a [`StepOutcome`] when the episode ran out of steps.
pub const HORIZON_REACHED_NOTE: &str = "Max steps reached.";

/// Reward terms composing the per-step reward signal.
pub mod rewards {
    /// Cost charged for every processed action.
    pub const STEP_COST: f64 = -0.2;
    /// Bonus for standing on the exit while holding the gold.
    pub const GOLD_AT_EXIT: f64 = 0.5;
    /// Reward for grabbing the gold.
    pub const GOLD_GRAB: f64 = 15.0;
    /// Cost of firing the arrow.
    pub const ARROW_SHOT: f64 = -4.0;
    /// Reward for climbing out of the exit with the gold.
    pub const ESCAPE_WITH_GOLD: f64 = 100.0;
    /// Penalty for dying or running out of steps.
    pub const DEATH: f64 = -80.0;
    /// Bonus for entering a cell for the first time while not holding the gold.
    pub const NEW_CELL_EXPLORED: f64 = 2.0;
}

/// Location of a single grid cell. `x` grows eastwards, `y` grows northwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: u32,
    y: u32,
}

impl Coordinate {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Returns the neighbouring cell in the provided direction, or `None` when
    /// that cell falls outside a `width` x `height` grid.
    #[must_use]
    pub fn neighbor(self, orientation: Orientation, width: u32, height: u32) -> Option<Self> {
        let (dx, dy) = orientation.displacement();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        (x < width && y < height).then_some(Self { x, y })
    }

    /// Reports whether the coordinate lies within a `width` x `height` grid.
    #[must_use]
    pub const fn within(&self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing of the agent. Turning left or right cycles through the variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Facing towards increasing `y`.
    North,
    /// Facing towards increasing `x`.
    East,
    /// Facing towards decreasing `y`.
    South,
    /// Facing towards decreasing `x`.
    West,
}

impl Orientation {
    /// All orientations in turn-right order.
    pub const ALL: [Orientation; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Numeric index of the orientation (`North = 0` through `West = 3`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }

    /// Orientation after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn turn_left(self) -> Self {
        Self::ALL[(self.index() + 3) % 4]
    }

    /// Orientation after a quarter turn clockwise.
    #[must_use]
    pub const fn turn_right(self) -> Self {
        Self::ALL[(self.index() + 1) % 4]
    }

    /// Unit displacement implied by moving forward in this orientation.
    #[must_use]
    pub const fn displacement(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

/// Closed set of actions the agent may take each turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Move one cell in the facing direction, clamped to the grid.
    Forward,
    /// Turn counter-clockwise in place.
    Left,
    /// Turn clockwise in place.
    Right,
    /// Pick up the gold if it lies in the current cell.
    Grab,
    /// Fire the arrow in the facing direction.
    Shoot,
    /// Leave the world through the exit.
    Climb,
}

impl Action {
    /// All actions ordered by their numeric index.
    pub const ALL: [Action; 6] = [
        Self::Forward,
        Self::Left,
        Self::Right,
        Self::Grab,
        Self::Shoot,
        Self::Climb,
    ];

    /// Numeric index of the action (`Forward = 0` through `Climb = 5`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Forward => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Grab => 3,
            Self::Shoot => 4,
            Self::Climb => 5,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = ActionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(ActionError::InvalidAction(value))
    }
}

impl FromStr for Action {
    type Err = ActionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "f" | "forward" => Ok(Self::Forward),
            "l" | "left" => Ok(Self::Left),
            "r" | "right" => Ok(Self::Right),
            "g" | "grab" => Ok(Self::Grab),
            "s" | "shoot" => Ok(Self::Shoot),
            "c" | "climb" => Ok(Self::Climb),
            _ => Err(ActionError::UnrecognizedAction(value.to_owned())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forward => "FORWARD",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Grab => "GRAB",
            Self::Shoot => "SHOOT",
            Self::Climb => "CLIMB",
        };
        f.write_str(name)
    }
}

/// Raised when a value cannot be mapped onto the closed [`Action`] set.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Numeric action outside `0..=5`.
    #[error("action index {0} is outside the action set")]
    InvalidAction(u8),
    /// Textual action that names no known action.
    #[error("unrecognized action `{0}`")]
    UnrecognizedAction(String),
}

/// Entries of the percept vector, in their fixed order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PerceptKind {
    /// The hostile creature is in this or an adjacent cell.
    Stench,
    /// A pit is in an adjacent cell.
    Breeze,
    /// The gold lies in this cell.
    Glitter,
    /// The preceding forward move hit a wall.
    Bump,
    /// The preceding shot killed the creature.
    Scream,
}

impl PerceptKind {
    /// All percept entries in vector order.
    pub const ALL: [PerceptKind; 5] = [
        Self::Stench,
        Self::Breeze,
        Self::Glitter,
        Self::Bump,
        Self::Scream,
    ];

    /// Position of the entry within the percept vector.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Stench => 0,
            Self::Breeze => 1,
            Self::Glitter => 2,
            Self::Bump => 3,
            Self::Scream => 4,
        }
    }

    /// Single-letter tag used when printing a percept.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Stench => 'S',
            Self::Breeze => 'B',
            Self::Glitter => 'G',
            Self::Bump => 'U',
            Self::Scream => 'C',
        }
    }
}

/// Fixed-length sensory vector `[stench, breeze, glitter, bump, scream]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Percept([bool; 5]);

impl Percept {
    /// Number of entries in the percept vector.
    pub const LEN: usize = 5;

    /// Creates a percept from its raw vector.
    #[must_use]
    pub const fn from_array(values: [bool; 5]) -> Self {
        Self(values)
    }

    /// Returns a copy of the percept with `kind` set to `value`.
    #[must_use]
    pub fn with(mut self, kind: PerceptKind, value: bool) -> Self {
        self.0[kind.index()] = value;
        self
    }

    /// Reports whether the entry `kind` is set.
    #[must_use]
    pub const fn is(&self, kind: PerceptKind) -> bool {
        self.0[kind.index()]
    }

    /// Shorthand for [`PerceptKind::Stench`].
    #[must_use]
    pub const fn stench(&self) -> bool {
        self.is(PerceptKind::Stench)
    }

    /// Shorthand for [`PerceptKind::Breeze`].
    #[must_use]
    pub const fn breeze(&self) -> bool {
        self.is(PerceptKind::Breeze)
    }

    /// Shorthand for [`PerceptKind::Glitter`].
    #[must_use]
    pub const fn glitter(&self) -> bool {
        self.is(PerceptKind::Glitter)
    }

    /// Shorthand for [`PerceptKind::Bump`].
    #[must_use]
    pub const fn bump(&self) -> bool {
        self.is(PerceptKind::Bump)
    }

    /// Shorthand for [`PerceptKind::Scream`].
    #[must_use]
    pub const fn scream(&self) -> bool {
        self.is(PerceptKind::Scream)
    }

    /// Raw percept vector.
    #[must_use]
    pub const fn as_array(&self) -> [bool; 5] {
        self.0
    }
}

impl fmt::Display for Percept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for kind in PerceptKind::ALL {
            write!(f, "{}", if self.is(kind) { kind.letter() } else { '-' })?;
        }
        Ok(())
    }
}

/// Hazard responsible for ending an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// The agent shared a cell with the living creature.
    Hostile,
    /// The agent walked into a pit.
    Pit,
}

/// Events broadcast by the world after processing an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// The agent turned in place.
    Turned {
        /// Orientation after the turn.
        orientation: Orientation,
    },
    /// The agent moved between two cells.
    Moved {
        /// Cell occupied before the move.
        from: Coordinate,
        /// Cell occupied after the move.
        to: Coordinate,
    },
    /// A forward move was blocked by the grid boundary.
    Bumped {
        /// Cell the agent stayed in.
        cell: Coordinate,
    },
    /// The agent picked up the gold.
    GoldGrabbed {
        /// Cell the gold was taken from.
        cell: Coordinate,
    },
    /// The agent fired its only arrow.
    ArrowFired {
        /// Cell the arrow left from.
        from: Coordinate,
        /// Direction of flight.
        orientation: Orientation,
    },
    /// The arrow killed the creature.
    CreatureSlain {
        /// Cell the creature occupied.
        cell: Coordinate,
    },
    /// The agent climbed out through the exit.
    Escaped {
        /// Whether the agent carried the gold out.
        with_gold: bool,
    },
    /// The agent died.
    AgentDied {
        /// Hazard that killed the agent.
        cause: DeathCause,
    },
    /// The episode ran out of steps.
    HorizonExhausted {
        /// Number of steps processed in the episode.
        steps: u32,
    },
}

/// Result of processing a single action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    /// Percept observed after the action resolved.
    pub percept: Percept,
    /// Reward earned by the action.
    pub reward: f64,
    /// Whether the episode ended with this action.
    pub terminated: bool,
    /// Human-readable note, set only when the horizon ended the episode.
    pub info: Option<String>,
}

/// Caller errors raised while stepping the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StepError {
    /// No episode is active; the caller must reset first.
    #[error("episode already terminated; reset before taking further actions")]
    AlreadyTerminated,
}
