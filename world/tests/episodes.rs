use wumpus_core::{
    rewards, Action, Coordinate, Event, Orientation, Sampled, SimulationConfig, StartOrientation,
    StartPosition, StepError, HORIZON_REACHED_NOTE,
};
use wumpus_world::{query, Layout, Simulator, WorldState};

fn pickup_world() -> WorldState {
    let mut layout = Layout::new(4, 4);
    layout.gold = Some(Coordinate::new(2, 2));
    layout.has_arrow = true;
    WorldState::from_layout(layout).expect("layout is valid")
}

#[test]
fn gold_pickup_round_trip_escapes_with_full_reward() {
    use Action::{Climb, Forward, Grab, Left, Right};

    let mut simulator = Simulator::new(SimulationConfig::default()).expect("valid config");
    let initial = simulator.load(pickup_world());
    assert!(!initial.glitter());
    {
        let world = simulator.world().expect("episode loaded");
        assert_eq!(query::exit(world), Coordinate::new(0, 0));
        assert_eq!(query::horizon(world), 50);
        assert!(query::pits(world).is_empty());
        assert_eq!(query::hostile_position(world), None);
        assert_eq!(query::percept(world), initial);
        assert_eq!(query::last_reward(world), 0.0);
    }

    let script = [
        Forward, Forward, Right, Forward, Forward, Grab, Left, Left, Forward, Forward, Left,
        Forward, Forward, Climb,
    ];

    let mut total = 0.0;
    let mut glitter_steps = Vec::new();
    let mut last = None;
    for (index, action) in script.iter().copied().enumerate() {
        let outcome = simulator.step(action).expect("episode is active");
        assert!(!outcome.percept.bump(), "unexpected bump at step {index}");
        if outcome.percept.glitter() {
            glitter_steps.push(index);
        }
        total += outcome.reward;
        {
            let world = simulator.world().expect("episode loaded");
            assert_eq!(query::last_reward(world), outcome.reward);
            assert_eq!(query::percept(world), outcome.percept);
        }
        if action == Grab {
            let world = simulator.world().expect("episode loaded");
            assert!(query::has_gold(world));
            assert_eq!(query::gold_position(world), None);
        }
        last = Some(outcome);
    }

    // Glitter is seen only after the move onto the gold, right before GRAB.
    assert_eq!(glitter_steps, vec![4]);

    let last = last.expect("script is non-empty");
    assert!(last.terminated);
    assert_eq!(last.info, None);
    assert!(
        (last.reward - (rewards::STEP_COST + rewards::GOLD_AT_EXIT + rewards::ESCAPE_WITH_GOLD))
            .abs()
            < 1e-9
    );

    let expected = 14.0 * rewards::STEP_COST
        + 4.0 * rewards::NEW_CELL_EXPLORED
        + rewards::GOLD_GRAB
        + rewards::GOLD_AT_EXIT
        + rewards::ESCAPE_WITH_GOLD;
    assert!((total - expected).abs() < 1e-9, "total reward {total}");
}

#[test]
fn horizon_of_three_ends_by_third_step() {
    let mut layout = Layout::new(4, 4);
    layout.horizon = 3;
    let mut simulator = Simulator::new(SimulationConfig::default()).expect("valid config");
    let _ = simulator.load(WorldState::from_layout(layout).expect("layout is valid"));

    let mut ended_at = None;
    let mut events = Vec::new();
    for step in 1..=3 {
        let outcome = simulator
            .step_with_events(Action::Right, &mut events)
            .expect("episode is active");
        if outcome.terminated {
            assert_eq!(outcome.info.as_deref(), Some(HORIZON_REACHED_NOTE));
            assert!((outcome.reward - (rewards::STEP_COST + rewards::DEATH)).abs() < 1e-9);
            ended_at = Some(step);
            break;
        }
    }

    assert!(matches!(ended_at, Some(step) if step <= 3));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::HorizonExhausted { .. })));
    assert_eq!(
        simulator.step(Action::Right),
        Err(StepError::AlreadyTerminated)
    );
}

#[test]
fn reset_starts_a_new_episode_after_termination() {
    let config = SimulationConfig {
        pit_probability: Sampled::Fixed(0.0),
        with_hostile: false,
        ..SimulationConfig::default()
    };
    let mut simulator = Simulator::new(config).expect("valid config");
    let _ = simulator.reset();
    let outcome = simulator.step(Action::Climb).expect("episode is active");
    assert!(outcome.terminated);

    let _ = simulator.reset();
    let world = simulator.world().expect("episode generated");
    assert_eq!(query::step_count(world), 0);
    assert!(!query::terminated(world));
}

#[test]
fn reset_with_reseeds_the_stream() {
    let config = SimulationConfig {
        seed: Some(99),
        start_position: StartPosition::RandomCorner,
        start_orientation: StartOrientation::Random,
        ..SimulationConfig::default()
    };
    let mut simulator = Simulator::new(config.clone()).expect("valid config");
    let first = simulator.reset();
    let first_world = simulator.world().cloned().expect("episode generated");
    let _ = simulator.reset();

    let reseeded = SimulationConfig {
        width: 6,
        ..config.clone()
    };
    let _ = simulator.reset_with(reseeded).expect("valid config");
    assert_eq!(simulator.config().width, 6);
    assert_eq!(query::dimensions(simulator.world().expect("episode generated")), (6, 4));

    let again = simulator.reset_with(config.clone()).expect("valid config");
    assert_eq!(simulator.config(), &config);
    assert_eq!(first, again);
    assert_eq!(simulator.world(), Some(&first_world));
}

#[test]
fn unarmed_shot_costs_only_the_step() {
    let mut layout = Layout::new(3, 3);
    layout.has_arrow = false;
    layout.hostile = Some(Coordinate::new(0, 2));
    layout.orientation = Orientation::North;
    let mut simulator = Simulator::new(SimulationConfig::default()).expect("valid config");
    let _ = simulator.load(WorldState::from_layout(layout).expect("layout is valid"));

    let mut events = Vec::new();
    let outcome = simulator
        .step_with_events(Action::Shoot, &mut events)
        .expect("episode is active");
    assert!((outcome.reward - rewards::STEP_COST).abs() < 1e-9);
    assert!(!outcome.percept.scream());
    assert!(events.is_empty());
    let world = simulator.world().expect("episode loaded");
    assert!(query::hostile_alive(world));
}
