use proptest::prelude::*;
use wumpus_core::{Action, Sampled, SimulationConfig, StartOrientation, StartPosition};
use wumpus_world::{query, Simulator};

fn randomized_config(seed: u64, width: u32, height: u32) -> SimulationConfig {
    SimulationConfig {
        width,
        height,
        pit_probability: Sampled::Range([0.0, 0.25]),
        horizon: Sampled::Range([15, 100]),
        with_hostile: true,
        start_position: StartPosition::RandomCorner,
        start_orientation: StartOrientation::Random,
        seed: Some(seed),
    }
}

fn action_strategy() -> impl Strategy<Value = Action> {
    (0u8..6).prop_map(|index| Action::try_from(index).expect("index is in range"))
}

#[test]
fn same_seed_replays_identical_episodes() {
    let script = [
        Action::Forward,
        Action::Right,
        Action::Forward,
        Action::Shoot,
        Action::Forward,
        Action::Grab,
        Action::Left,
        Action::Forward,
    ];

    let replay = || {
        let mut simulator =
            Simulator::new(randomized_config(2025, 4, 4)).expect("valid config");
        let mut transcript = Vec::new();
        for _ in 0..5 {
            transcript.push(format!("{:?}", simulator.reset()));
            for action in script {
                match simulator.step(action) {
                    Ok(outcome) => {
                        transcript.push(format!("{outcome:?}"));
                        if outcome.terminated {
                            break;
                        }
                    }
                    Err(error) => panic!("unexpected error {error}"),
                }
            }
        }
        transcript
    };

    assert_eq!(replay(), replay(), "episode replay diverged");
}

proptest! {
    #[test]
    fn agent_never_leaves_the_grid(
        seed in any::<u64>(),
        width in 1u32..7,
        height in 1u32..7,
        actions in prop::collection::vec(action_strategy(), 1..80),
    ) {
        let mut simulator = Simulator::new(randomized_config(seed, width, height))
            .expect("valid config");
        let _ = simulator.reset();
        for action in actions {
            let Ok(outcome) = simulator.step(action) else {
                let _ = simulator.reset();
                continue;
            };
            let world = simulator.world().expect("episode generated");
            let (position, _) = query::agent_pose(world);
            prop_assert!(position.x() < width && position.y() < height);
            prop_assert_eq!(query::last_reward(world), outcome.reward);
            prop_assert!((0.0..0.25).contains(&query::pit_probability(world)));
            prop_assert!((15..100).contains(&query::horizon(world)));
            let exit = query::exit(world);
            prop_assert!(exit.x() == 0 || exit.x() == width - 1);
            prop_assert!(exit.y() == 0 || exit.y() == height - 1);
            prop_assert!(!query::pits(world).contains(&exit));
            prop_assert_ne!(query::hostile_position(world), Some(exit));
            if outcome.terminated {
                let _ = simulator.reset();
            }
        }
    }

    #[test]
    fn step_count_advances_once_per_action(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 1..40),
    ) {
        let mut simulator = Simulator::new(randomized_config(seed, 4, 4)).expect("valid config");
        let _ = simulator.reset();
        for action in actions {
            let before = query::step_count(simulator.world().expect("episode generated"));
            let visited_before = query::visited(simulator.world().expect("episode generated")).len();
            match simulator.step(action) {
                Ok(outcome) => {
                    let world = simulator.world().expect("episode generated");
                    prop_assert_eq!(query::step_count(world), before + 1);
                    prop_assert!(query::visited(world).len() >= visited_before);
                    if query::has_gold(world) {
                        prop_assert_eq!(query::gold_position(world), None);
                    }
                    if outcome.terminated {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    #[test]
    fn arrow_is_spent_at_most_once(
        seed in any::<u64>(),
        shots in 1usize..5,
    ) {
        let mut config = randomized_config(seed, 4, 4);
        config.pit_probability = Sampled::Fixed(0.0);
        config.horizon = Sampled::Fixed(50);
        let mut simulator = Simulator::new(config).expect("valid config");
        let _ = simulator.reset();
        let armed = query::has_arrow(simulator.world().expect("episode generated"));

        let mut arrow_costs = 0;
        for _ in 0..shots {
            let outcome = simulator.step(Action::Shoot).expect("episode is active");
            if (outcome.reward - (-0.2 - 4.0)).abs() < 1e-9 {
                arrow_costs += 1;
            }
        }
        prop_assert_eq!(arrow_costs, usize::from(armed));
        prop_assert!(!query::has_arrow(simulator.world().expect("episode generated")));
    }

    #[test]
    fn bump_always_follows_blocked_forward(
        seed in any::<u64>(),
        turns in 0usize..4,
    ) {
        let mut config = randomized_config(seed, 3, 3);
        config.pit_probability = Sampled::Fixed(0.0);
        config.with_hostile = false;
        config.horizon = Sampled::Fixed(50);
        let mut simulator = Simulator::new(config).expect("valid config");
        let _ = simulator.reset();
        for _ in 0..turns {
            let _ = simulator.step(Action::Left).expect("episode is active");
        }
        // Walking three cells in any direction on a 3x3 grid must hit the wall.
        let mut bumped = false;
        for _ in 0..3 {
            let before = query::agent_pose(simulator.world().expect("episode generated")).0;
            let outcome = simulator.step(Action::Forward).expect("episode is active");
            let after = query::agent_pose(simulator.world().expect("episode generated")).0;
            prop_assert_eq!(outcome.percept.bump(), before == after);
            bumped |= outcome.percept.bump();
        }
        prop_assert!(bumped);
    }
}
