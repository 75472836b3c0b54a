use wumpus_core::{Coordinate, Event, SimulationConfig};
use wumpus_system_policies::{EpisodeContext, Explorer, Policy, Retreat};
use wumpus_world::{query, Layout, Simulator, WorldState};

/// Plays the loaded episode to the end and returns every emitted event.
fn play<P: Policy>(simulator: &mut Simulator, policy: &mut P, first_percept: wumpus_core::Percept) -> Vec<Event> {
    let world = simulator.world().expect("episode loaded");
    let (width, height) = query::dimensions(world);
    let (start, orientation) = query::agent_pose(world);
    policy.new_episode(&EpisodeContext::new(width, height, start, orientation));

    let mut events = Vec::new();
    let mut percept = first_percept;
    let mut reward = 0.0;
    loop {
        let action = policy.decide(&percept, reward);
        let outcome = simulator
            .step_with_events(action, &mut events)
            .expect("episode is active");
        if outcome.terminated {
            return events;
        }
        percept = outcome.percept;
        reward = outcome.reward;
    }
}

fn load(layout: Layout) -> (Simulator, wumpus_core::Percept) {
    let mut simulator = Simulator::new(SimulationConfig::default()).expect("default config is valid");
    let percept = simulator.load(WorldState::from_layout(layout).expect("layout is valid"));
    (simulator, percept)
}

fn escaped(events: &[Event]) -> Option<bool> {
    events.iter().find_map(|event| match event {
        Event::Escaped { with_gold } => Some(*with_gold),
        _ => None,
    })
}

#[test]
fn explorer_fetches_gold_from_an_empty_cave() {
    let mut layout = Layout::new(4, 4);
    layout.gold = Some(Coordinate::new(2, 2));
    layout.horizon = 200;
    let (mut simulator, percept) = load(layout);

    let events = play(&mut simulator, &mut Explorer::new(), percept);

    assert!(events.iter().any(|event| matches!(event, Event::GoldGrabbed { .. })));
    assert_eq!(escaped(&events), Some(true));
    assert!(!events.iter().any(|event| matches!(event, Event::Bumped { .. })));
}

#[test]
fn explorer_shoots_its_way_past_the_creature() {
    let mut layout = Layout::new(4, 4);
    layout.hostile = Some(Coordinate::new(0, 1));
    layout.gold = Some(Coordinate::new(3, 3));
    layout.horizon = 200;
    let (mut simulator, percept) = load(layout);
    assert!(percept.stench());

    let events = play(&mut simulator, &mut Explorer::new(), percept);

    assert!(events
        .iter()
        .any(|event| matches!(event, Event::CreatureSlain { cell } if *cell == Coordinate::new(0, 1))));
    assert_eq!(escaped(&events), Some(true));
}

#[test]
fn retreat_walks_back_after_the_wall() {
    let (mut simulator, percept) = load(Layout::new(4, 4));

    let events = play(&mut simulator, &mut Retreat::new(), percept);

    assert_eq!(escaped(&events), Some(false));
    let world = simulator.world().expect("episode loaded");
    assert_eq!(query::agent_pose(world).0, Coordinate::new(0, 0));
    assert!(events.iter().any(|event| matches!(event, Event::Bumped { .. })));
}

#[test]
fn explorer_never_steps_into_a_hazard() {
    for seed in 0..64 {
        let config = SimulationConfig {
            seed: Some(seed),
            ..SimulationConfig::default()
        };
        let mut simulator = Simulator::new(config).expect("valid config");
        let percept = simulator.reset();
        let events = play(&mut simulator, &mut Explorer::new(), percept);
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::AgentDied { .. })),
            "explorer died with seed {seed}: {events:?}"
        );
    }
}
