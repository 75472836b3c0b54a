use wumpus_core::{Action, Coordinate, Percept, Sampled, SimulationConfig};
use wumpus_system_evaluation::{play_loaded, run_episode, EpisodeEnding, Evaluation};
use wumpus_system_policies::{EpisodeContext, Explorer, Policy, Retreat};
use wumpus_world::{Layout, Simulator, WorldState};

/// Repeats one action forever.
struct Repeat(Action);

impl Policy for Repeat {
    fn kind(&self) -> &'static str {
        "repeat"
    }

    fn new_episode(&mut self, _context: &EpisodeContext) {}

    fn decide(&mut self, _percept: &Percept, _reward: f64) -> Action {
        self.0
    }
}

fn seeded(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed: Some(seed),
        ..SimulationConfig::default()
    }
}

#[test]
fn climbing_at_once_escapes_empty_handed() {
    let mut simulator = Simulator::new(seeded(1)).expect("valid config");
    let summary = run_episode(&mut simulator, &mut Repeat(Action::Climb)).expect("episode runs");

    assert_eq!(summary.steps, 1);
    assert_eq!(summary.ending, EpisodeEnding::Escaped { with_gold: false });
    assert!((summary.total_reward - -0.2).abs() < 1e-9);
}

#[test]
fn spinning_in_place_runs_out_of_steps() {
    let mut config = seeded(3);
    config.horizon = Sampled::Fixed(10);
    let mut simulator = Simulator::new(config).expect("valid config");
    let summary = run_episode(&mut simulator, &mut Repeat(Action::Left)).expect("episode runs");

    assert_eq!(summary.steps, 9);
    assert_eq!(summary.ending, EpisodeEnding::HorizonExhausted);
    assert!((summary.total_reward - (9.0 * -0.2 - 80.0)).abs() < 1e-9);
}

#[test]
fn walking_into_a_pit_is_reported_as_a_pit_death() {
    let mut layout = Layout::new(4, 4);
    layout.pits = vec![Coordinate::new(0, 1)];
    let mut simulator = Simulator::new(seeded(0)).expect("valid config");
    let percept = simulator.load(WorldState::from_layout(layout).expect("valid layout"));

    let summary =
        play_loaded(&mut simulator, &mut Repeat(Action::Forward), percept).expect("episode runs");

    assert_eq!(
        summary.ending,
        EpisodeEnding::Died(wumpus_core::DeathCause::Pit)
    );
    assert_eq!(summary.steps, 1);
    assert!((summary.total_reward - (-0.2 - 80.0 + 2.0)).abs() < 1e-9);
}

#[test]
fn every_episode_is_accounted_for() {
    let mut simulator = Simulator::new(seeded(42)).expect("valid config");
    let report = Evaluation::run(&mut simulator, &mut Retreat::new(), 25).expect("evaluation runs");

    assert_eq!(report.episodes, 25);
    assert_eq!(
        report.escapes_with_gold
            + report.escapes_without_gold
            + report.pit_deaths
            + report.hostile_deaths
            + report.timeouts,
        25
    );
    assert!(report.min_reward <= report.mean_reward && report.mean_reward <= report.max_reward);
}

#[test]
fn same_seed_yields_identical_reports() {
    let evaluate = || {
        let mut simulator = Simulator::new(seeded(2024)).expect("valid config");
        Evaluation::run(&mut simulator, &mut Explorer::new(), 40).expect("evaluation runs")
    };

    let first = evaluate();
    assert_eq!(first, evaluate(), "evaluation replay diverged");
    assert_eq!(first.pit_deaths + first.hostile_deaths, 0);

    let rendered = toml::to_string(&first).expect("report serialises");
    assert!(rendered.contains("episodes = 40"));
}

#[test]
fn boxed_policies_can_be_evaluated() {
    let mut policy: Box<dyn Policy> = Box::new(Explorer::new());
    let mut simulator = Simulator::new(seeded(9)).expect("valid config");
    let report = Evaluation::run(&mut simulator, &mut policy, 3).expect("evaluation runs");
    assert_eq!(report.episodes, 3);
}
