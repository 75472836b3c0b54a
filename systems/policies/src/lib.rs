#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Policies that turn percepts into actions.
//!
//! Every policy implements [`Policy`]; the simulator never looks inside one.
//! Policies only see what an agent in the cave would see: the grid size,
//! where they started, the percept stream and the reward stream.

use wumpus_core::{Action, Coordinate, Orientation, Percept};

mod blob;
mod explorer;
mod network;
mod retreat;

pub use blob::{BlobError, Dtype, WeightBlob};
pub use explorer::Explorer;
pub use network::{Network, NetworkPolicy};
pub use retreat::Retreat;

/// Shared interface implemented by all agent policies.
pub trait Policy {
    /// Immutable policy identifier (useful for reports).
    fn kind(&self) -> &'static str;

    /// Forgets everything learned in the previous episode.
    fn new_episode(&mut self, context: &EpisodeContext);

    /// Chooses the next action from the latest percept and the reward earned
    /// by the previous action (zero on the first turn).
    fn decide(&mut self, percept: &Percept, reward: f64) -> Action;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn new_episode(&mut self, context: &EpisodeContext) {
        (**self).new_episode(context);
    }

    fn decide(&mut self, percept: &Percept, reward: f64) -> Action {
        (**self).decide(percept, reward)
    }
}

/// What an agent knows about an episode before its first move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpisodeContext {
    /// Number of grid columns.
    pub width: u32,
    /// Number of grid rows.
    pub height: u32,
    /// Start cell, which is also the exit.
    pub start: Coordinate,
    /// Initial facing.
    pub orientation: Orientation,
}

impl EpisodeContext {
    /// Creates a context for a `width` x `height` grid.
    #[must_use]
    pub const fn new(width: u32, height: u32, start: Coordinate, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            start,
            orientation,
        }
    }
}

impl Default for EpisodeContext {
    fn default() -> Self {
        Self::new(4, 4, Coordinate::new(0, 0), Orientation::North)
    }
}

/// Dead-reckoned pose. Forward moves clamp at the walls exactly like the
/// world does, so the tracked pose never drifts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PoseTracker {
    position: Coordinate,
    orientation: Orientation,
    width: u32,
    height: u32,
}

impl PoseTracker {
    fn new(context: &EpisodeContext) -> Self {
        Self {
            position: context.start,
            orientation: context.orientation,
            width: context.width,
            height: context.height,
        }
    }

    fn record(&mut self, action: Action) -> Action {
        match action {
            Action::Left => self.orientation = self.orientation.turn_left(),
            Action::Right => self.orientation = self.orientation.turn_right(),
            Action::Forward => {
                if let Some(next) = self.position.neighbor(self.orientation, self.width, self.height)
                {
                    self.position = next;
                }
            }
            Action::Grab | Action::Shoot | Action::Climb => {}
        }
        action
    }

    /// Turn that brings the agent closer to facing `heading`, or `Forward`
    /// when it already does.
    fn step_towards(&self, heading: Orientation) -> Action {
        if self.orientation == heading {
            Action::Forward
        } else if self.orientation.turn_right() == heading {
            Action::Right
        } else {
            Action::Left
        }
    }
}

/// Direction of the single-cell step from `from` to an adjacent `to`.
fn heading_between(from: Coordinate, to: Coordinate) -> Option<Orientation> {
    if from.manhattan_distance(to) != 1 {
        return None;
    }
    Some(if to.x() > from.x() {
        Orientation::East
    } else if to.x() < from.x() {
        Orientation::West
    } else if to.y() > from.y() {
        Orientation::North
    } else {
        Orientation::South
    })
}
