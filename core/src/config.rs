//! Episode configuration accepted by the simulator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Coordinate, Orientation};

const DEFAULT_WIDTH: u32 = 4;
const DEFAULT_HEIGHT: u32 = 4;
const DEFAULT_PIT_PROBABILITY: f64 = 0.2;
const DEFAULT_HORIZON: u32 = 50;
const DEFAULT_SEED: u64 = 2024;

/// Value that is either fixed or redrawn uniformly from `[low, high)` every episode.
///
/// A degenerate range where `low == high` always yields `low`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sampled<T> {
    /// The same value every episode.
    Fixed(T),
    /// Inclusive lower and exclusive upper bound.
    Range([T; 2]),
}

impl<T: Copy> Sampled<T> {
    /// Lower and upper bound; both equal the value for [`Sampled::Fixed`].
    #[must_use]
    pub fn bounds(&self) -> (T, T) {
        match *self {
            Self::Fixed(value) => (value, value),
            Self::Range([low, high]) => (low, high),
        }
    }
}

/// Where the agent (and therefore the exit) is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartPosition {
    /// Always start at the provided cell.
    Fixed(Coordinate),
    /// Start in one of the four grid corners, chosen uniformly.
    RandomCorner,
}

/// How the agent is facing when the episode starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartOrientation {
    /// Always face the provided direction.
    Fixed(Orientation),
    /// Face one of the four directions, chosen uniformly.
    Random,
}

/// Complete description of how episodes are generated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Probability that any cell other than the exit holds a pit.
    pub pit_probability: Sampled<f64>,
    /// Step limit of an episode.
    pub horizon: Sampled<u32>,
    /// Whether the creature is alive when the episode starts.
    pub with_hostile: bool,
    /// Start position policy.
    pub start_position: StartPosition,
    /// Start orientation policy.
    pub start_orientation: StartOrientation,
    /// Seed of the random stream; `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            pit_probability: Sampled::Fixed(DEFAULT_PIT_PROBABILITY),
            horizon: Sampled::Fixed(DEFAULT_HORIZON),
            with_hostile: true,
            start_position: StartPosition::Fixed(Coordinate::new(0, 0)),
            start_orientation: StartOrientation::Fixed(Orientation::North),
            seed: Some(DEFAULT_SEED),
        }
    }
}

impl SimulationConfig {
    /// Checks every field, reporting the first malformed one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }

        let (low, high) = self.pit_probability.bounds();
        ensure_probability(low)?;
        ensure_probability(high)?;
        if low > high {
            return Err(ConfigError::InvertedRange {
                field: "pit_probability",
                low,
                high,
            });
        }

        let (low, high) = self.horizon.bounds();
        if low > high {
            return Err(ConfigError::InvertedRange {
                field: "horizon",
                low: f64::from(low),
                high: f64::from(high),
            });
        }
        if low == 0 {
            return Err(ConfigError::ZeroHorizon);
        }

        if let StartPosition::Fixed(position) = self.start_position {
            if !position.within(self.width, self.height) {
                return Err(ConfigError::StartOutOfBounds {
                    position,
                    width: self.width,
                    height: self.height,
                });
            }
        }

        Ok(())
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

fn ensure_probability(value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { value })
    }
}

/// Malformed configuration, reported before any episode is generated.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid dimensions {width}x{height} must both be non-zero")]
    EmptyGrid {
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },
    /// A range has its lower bound above its upper bound.
    #[error("{field} range [{low}, {high}) has low above high")]
    InvertedRange {
        /// Name of the offending field.
        field: &'static str,
        /// Configured lower bound.
        low: f64,
        /// Configured upper bound.
        high: f64,
    },
    /// A probability lies outside `[0, 1]` or is not a number.
    #[error("probability {value} must lie within [0, 1]")]
    ProbabilityOutOfRange {
        /// Offending value.
        value: f64,
    },
    /// The horizon could be zero steps.
    #[error("horizon must be at least one step")]
    ZeroHorizon,
    /// The fixed start cell lies outside the grid.
    #[error("start position {position} lies outside the {width}x{height} grid")]
    StartOutOfBounds {
        /// Configured start cell.
        position: Coordinate,
        /// Configured column count.
        width: u32,
        /// Configured row count.
        height: u32,
    },
    /// A hand-placed object lies outside the grid.
    #[error("{field} at {position} lies outside the grid")]
    CellOutOfBounds {
        /// Name of the misplaced object.
        field: &'static str,
        /// Configured cell.
        position: Coordinate,
    },
    /// A hand-placed pit or creature occupies the exit.
    #[error("{field} may not be placed on the exit {position}")]
    HazardAtExit {
        /// Name of the misplaced hazard.
        field: &'static str,
        /// The exit cell.
        position: Coordinate,
    },
}
