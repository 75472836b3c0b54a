use std::collections::{BTreeMap, BTreeSet, VecDeque};

use wumpus_core::{Action, Coordinate, Orientation, Percept};

use crate::{heading_between, EpisodeContext, Policy, PoseTracker};

/// Knowledge-base agent that only ever steps onto cells it has proven safe.
///
/// A cell is safe once a neighbour of it was visited without breeze and
/// without stench (stench stops counting once a scream was heard). The agent
/// walks the shortest safe route to the nearest unvisited safe cell, grabs
/// the gold on glitter and climbs out once it holds the gold or runs out of
/// safe cells. When stench is the only thing blocking progress it fires its
/// arrow straight ahead once.
#[derive(Clone, Debug)]
pub struct Explorer {
    pose: PoseTracker,
    home: Coordinate,
    visited: BTreeSet<Coordinate>,
    safe: BTreeSet<Coordinate>,
    has_gold: bool,
    has_arrow: bool,
    hostile_dead: bool,
    pending_shot: Option<Shot>,
}

#[derive(Clone, Copy, Debug)]
struct Shot {
    from: Coordinate,
    orientation: Orientation,
    breezy: bool,
}

impl Explorer {
    /// Creates the policy for the default 4x4 episode; call
    /// [`Policy::new_episode`] before every episode.
    #[must_use]
    pub fn new() -> Self {
        let context = EpisodeContext::default();
        Self {
            pose: PoseTracker::new(&context),
            home: context.start,
            visited: BTreeSet::new(),
            safe: BTreeSet::new(),
            has_gold: false,
            has_arrow: true,
            hostile_dead: false,
            pending_shot: None,
        }
    }

    fn neighbors(&self, cell: Coordinate) -> impl Iterator<Item = Coordinate> + '_ {
        Orientation::ALL
            .into_iter()
            .filter_map(move |heading| cell.neighbor(heading, self.pose.width, self.pose.height))
    }

    fn absorb(&mut self, percept: &Percept) {
        let position = self.pose.position;
        let _ = self.visited.insert(position);
        let _ = self.safe.insert(position);

        if percept.scream() {
            self.hostile_dead = true;
        }
        if let Some(shot) = self.pending_shot.take() {
            // A miss proves the creature is not in the line of fire, so the
            // first cell ahead is safe unless a pit could be there.
            if !percept.scream() && !shot.breezy {
                if let Some(ahead) =
                    shot.from
                        .neighbor(shot.orientation, self.pose.width, self.pose.height)
                {
                    let _ = self.safe.insert(ahead);
                }
            }
        }

        let threatened = percept.breeze() || (percept.stench() && !self.hostile_dead);
        if !threatened {
            let around: Vec<Coordinate> = self.neighbors(position).collect();
            self.safe.extend(around);
        }
    }

    /// Breadth-first route over safe cells to the closest cell matching
    /// `is_goal`, returning the first hop.
    fn first_hop(&self, is_goal: impl Fn(Coordinate) -> bool) -> Option<Coordinate> {
        let start = self.pose.position;
        let mut parents: BTreeMap<Coordinate, Coordinate> = BTreeMap::new();
        let mut frontier = VecDeque::from([start]);

        while let Some(cell) = frontier.pop_front() {
            if cell != start && is_goal(cell) {
                let mut hop = cell;
                while let Some(&parent) = parents.get(&hop) {
                    if parent == start {
                        return Some(hop);
                    }
                    hop = parent;
                }
                return None;
            }
            for next in self.neighbors(cell) {
                if next != start && self.safe.contains(&next) && !parents.contains_key(&next) {
                    let _ = parents.insert(next, cell);
                    frontier.push_back(next);
                }
            }
        }
        None
    }

    fn walk_to(&mut self, hop: Coordinate) -> Action {
        let action = match heading_between(self.pose.position, hop) {
            Some(heading) => self.pose.step_towards(heading),
            None => Action::Forward,
        };
        self.pose.record(action)
    }

    fn head_home(&mut self) -> Action {
        if self.pose.position == self.home {
            return Action::Climb;
        }
        let home = self.home;
        match self.first_hop(|cell| cell == home) {
            Some(hop) => self.walk_to(hop),
            None => Action::Climb,
        }
    }
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for Explorer {
    fn kind(&self) -> &'static str {
        "explorer"
    }

    fn new_episode(&mut self, context: &EpisodeContext) {
        self.pose = PoseTracker::new(context);
        self.home = context.start;
        self.visited.clear();
        self.safe.clear();
        self.has_gold = false;
        self.has_arrow = true;
        self.hostile_dead = false;
        self.pending_shot = None;
    }

    fn decide(&mut self, percept: &Percept, _reward: f64) -> Action {
        self.absorb(percept);

        if percept.glitter() && !self.has_gold {
            self.has_gold = true;
            return self.pose.record(Action::Grab);
        }
        if self.has_gold {
            return self.head_home();
        }

        let frontier = self.first_hop(|cell| !self.visited.contains(&cell));
        if let Some(hop) = frontier {
            return self.walk_to(hop);
        }

        if self.has_arrow && percept.stench() && !self.hostile_dead {
            self.has_arrow = false;
            self.pending_shot = Some(Shot {
                from: self.pose.position,
                orientation: self.pose.orientation,
                breezy: percept.breeze(),
            });
            return self.pose.record(Action::Shoot);
        }

        self.head_home()
    }
}
