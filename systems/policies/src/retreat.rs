use wumpus_core::{Action, Coordinate, Orientation, Percept};

use crate::{EpisodeContext, Policy, PoseTracker};

/// Walks straight ahead until something feels wrong, then walks back and climbs out.
///
/// Grabs the gold whenever it glitters. The first breeze, stench or bump
/// turns the agent around; since it only ever walked a straight line, the way
/// home retraces cells already known to be safe.
#[derive(Clone, Debug)]
pub struct Retreat {
    pose: PoseTracker,
    home: Coordinate,
    has_gold: bool,
    retreating: bool,
}

impl Retreat {
    /// Creates the policy for the default 4x4 episode; call
    /// [`Policy::new_episode`] before every episode.
    #[must_use]
    pub fn new() -> Self {
        let context = EpisodeContext::default();
        Self {
            pose: PoseTracker::new(&context),
            home: context.start,
            has_gold: false,
            retreating: false,
        }
    }

    fn heading_home(&self) -> Orientation {
        let position = self.pose.position;
        if position.y() > self.home.y() {
            Orientation::South
        } else if position.y() < self.home.y() {
            Orientation::North
        } else if position.x() > self.home.x() {
            Orientation::West
        } else {
            Orientation::East
        }
    }
}

impl Default for Retreat {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Retreat {
    fn kind(&self) -> &'static str {
        "retreat"
    }

    fn new_episode(&mut self, context: &EpisodeContext) {
        self.pose = PoseTracker::new(context);
        self.home = context.start;
        self.has_gold = false;
        self.retreating = false;
    }

    fn decide(&mut self, percept: &Percept, _reward: f64) -> Action {
        if percept.glitter() {
            self.has_gold = true;
            return self.pose.record(Action::Grab);
        }

        if !self.retreating && (percept.breeze() || percept.stench() || percept.bump()) {
            self.retreating = true;
        }

        if self.retreating || self.has_gold {
            if self.pose.position == self.home {
                return Action::Climb;
            }
            let action = self.pose.step_towards(self.heading_home());
            return self.pose.record(action);
        }

        self.pose.record(Action::Forward)
    }
}
