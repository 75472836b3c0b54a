use wumpus_core::{Percept, PerceptKind};

use crate::WorldState;

/// Outcome flags of the action that was just processed.
///
/// Unlike stench, breeze and glitter these are not properties of the agent's
/// cell and are never carried over from one step to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transients {
    /// The forward move was clamped at the grid boundary.
    pub bump: bool,
    /// The arrow killed the creature.
    pub scream: bool,
}

/// Derives the percept observed at the agent's current cell.
#[must_use]
pub fn encode(world: &WorldState, transients: Transients) -> Percept {
    Percept::default()
        .with(PerceptKind::Stench, stench(world))
        .with(PerceptKind::Breeze, breeze(world))
        .with(PerceptKind::Glitter, glitter(world))
        .with(PerceptKind::Bump, transients.bump)
        .with(PerceptKind::Scream, transients.scream)
}

// A dead or absent creature still smells as long as it has a position.
fn stench(world: &WorldState) -> bool {
    world
        .hostile_position
        .is_some_and(|hostile| hostile.manhattan_distance(world.agent_pos) <= 1)
}

fn breeze(world: &WorldState) -> bool {
    world
        .pits
        .iter()
        .any(|pit| pit.manhattan_distance(world.agent_pos) == 1)
}

fn glitter(world: &WorldState) -> bool {
    world.gold_position == Some(world.agent_pos)
}

#[cfg(test)]
mod tests {
    use wumpus_core::Coordinate;

    use super::*;
    use crate::Layout;

    fn world_with(layout: Layout) -> WorldState {
        WorldState::from_layout(layout).expect("layout is valid")
    }

    #[test]
    fn stench_covers_own_and_adjacent_cells_only() {
        let mut layout = Layout::new(4, 4);
        layout.hostile = Some(Coordinate::new(1, 1));
        layout.start = Coordinate::new(0, 1);
        assert!(encode(&world_with(layout.clone()), Transients::default()).stench());

        layout.start = Coordinate::new(0, 0);
        assert!(!encode(&world_with(layout), Transients::default()).stench());
    }

    #[test]
    fn stench_persists_after_creature_dies() {
        let mut layout = Layout::new(4, 4);
        layout.hostile = Some(Coordinate::new(1, 0));
        layout.hostile_alive = false;
        assert!(encode(&world_with(layout), Transients::default()).stench());
    }

    #[test]
    fn breeze_requires_adjacent_pit() {
        let mut layout = Layout::new(4, 4);
        layout.pits = vec![Coordinate::new(2, 0)];
        layout.start = Coordinate::new(0, 0);
        assert!(!encode(&world_with(layout.clone()), Transients::default()).breeze());

        layout.start = Coordinate::new(2, 1);
        assert!(encode(&world_with(layout), Transients::default()).breeze());
    }

    #[test]
    fn glitter_only_on_gold_cell() {
        let mut layout = Layout::new(3, 3);
        layout.gold = Some(Coordinate::new(0, 0));
        assert!(encode(&world_with(layout.clone()), Transients::default()).glitter());

        layout.gold = Some(Coordinate::new(0, 1));
        assert!(!encode(&world_with(layout), Transients::default()).glitter());
    }

    #[test]
    fn transients_pass_through() {
        let world = world_with(Layout::new(2, 2));
        let percept = encode(
            &world,
            Transients {
                bump: true,
                scream: false,
            },
        );
        assert!(percept.bump());
        assert!(!percept.scream());
    }
}
