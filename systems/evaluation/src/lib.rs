#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Plays policies against the simulator and aggregates how episodes end.

use serde::Serialize;
use tracing::{debug, info};
use wumpus_core::{DeathCause, Event, StepError};
use wumpus_system_policies::{EpisodeContext, Policy};
use wumpus_world::{query, Simulator};

/// How a single episode ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EpisodeEnding {
    /// The agent climbed out through the exit.
    Escaped {
        /// Whether the gold came along.
        with_gold: bool,
    },
    /// The agent walked into a hazard.
    Died(DeathCause),
    /// The step limit ran out.
    HorizonExhausted,
}

/// Outcome of one played episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EpisodeSummary {
    /// Sum of every step reward.
    pub total_reward: f64,
    /// Number of actions processed.
    pub steps: u32,
    /// How the episode ended.
    pub ending: EpisodeEnding,
}

/// Generates a fresh episode and lets `policy` play it to termination.
pub fn run_episode<P>(simulator: &mut Simulator, policy: &mut P) -> Result<EpisodeSummary, StepError>
where
    P: Policy + ?Sized,
{
    let percept = simulator.reset();
    play_loaded(simulator, policy, percept)
}

/// Lets `policy` play the episode currently loaded in `simulator`, starting
/// from its initial `percept`.
pub fn play_loaded<P>(
    simulator: &mut Simulator,
    policy: &mut P,
    mut percept: wumpus_core::Percept,
) -> Result<EpisodeSummary, StepError>
where
    P: Policy + ?Sized,
{
    let world = simulator.world().ok_or(StepError::AlreadyTerminated)?;
    let (width, height) = query::dimensions(world);
    let (start, orientation) = query::agent_pose(world);
    policy.new_episode(&EpisodeContext::new(width, height, start, orientation));

    let mut total_reward = 0.0;
    let mut reward = 0.0;
    let mut steps = 0;
    let mut events = Vec::new();
    loop {
        let action = policy.decide(&percept, reward);
        events.clear();
        let outcome = simulator.step_with_events(action, &mut events)?;
        steps += 1;
        total_reward += outcome.reward;
        if outcome.terminated {
            let ending = ending_from(&events);
            debug!(policy = policy.kind(), steps, total_reward, ?ending, "episode finished");
            return Ok(EpisodeSummary {
                total_reward,
                steps,
                ending,
            });
        }
        percept = outcome.percept;
        reward = outcome.reward;
    }
}

fn ending_from(events: &[Event]) -> EpisodeEnding {
    events
        .iter()
        .find_map(|event| match event {
            Event::Escaped { with_gold } => Some(EpisodeEnding::Escaped {
                with_gold: *with_gold,
            }),
            Event::AgentDied { cause } => Some(EpisodeEnding::Died(*cause)),
            Event::HorizonExhausted { .. } => Some(EpisodeEnding::HorizonExhausted),
            _ => None,
        })
        .unwrap_or(EpisodeEnding::HorizonExhausted)
}

/// Aggregate statistics over a batch of episodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Number of episodes played.
    pub episodes: u32,
    /// Mean total reward per episode.
    pub mean_reward: f64,
    /// Lowest total reward seen.
    pub min_reward: f64,
    /// Highest total reward seen.
    pub max_reward: f64,
    /// Mean number of steps per episode.
    pub mean_steps: f64,
    /// Escapes carrying the gold.
    pub escapes_with_gold: u32,
    /// Escapes without the gold.
    pub escapes_without_gold: u32,
    /// Deaths in a pit.
    pub pit_deaths: u32,
    /// Deaths to the creature.
    pub hostile_deaths: u32,
    /// Episodes that ran out of steps.
    pub timeouts: u32,
}

/// Accumulates episode summaries into an [`EvaluationReport`].
#[derive(Debug, Default)]
pub struct Evaluation {
    summaries: Vec<EpisodeSummary>,
}

impl Evaluation {
    /// Creates an empty evaluation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plays `episodes` consecutive episodes and reports on them.
    pub fn run<P>(
        simulator: &mut Simulator,
        policy: &mut P,
        episodes: u32,
    ) -> Result<EvaluationReport, StepError>
    where
        P: Policy + ?Sized,
    {
        let mut evaluation = Self::new();
        for _ in 0..episodes {
            evaluation.record(run_episode(simulator, policy)?);
        }
        let report = evaluation.report();
        info!(
            policy = policy.kind(),
            episodes = report.episodes,
            mean_reward = report.mean_reward,
            escapes_with_gold = report.escapes_with_gold,
            "evaluation finished"
        );
        Ok(report)
    }

    /// Adds one episode to the tally.
    pub fn record(&mut self, summary: EpisodeSummary) {
        self.summaries.push(summary);
    }

    /// Episodes recorded so far.
    #[must_use]
    pub fn summaries(&self) -> &[EpisodeSummary] {
        &self.summaries
    }

    /// Summarises every recorded episode.
    #[must_use]
    pub fn report(&self) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        if self.summaries.is_empty() {
            return report;
        }

        let count = self.summaries.len() as f64;
        report.episodes = u32::try_from(self.summaries.len()).unwrap_or(u32::MAX);
        report.min_reward = f64::INFINITY;
        report.max_reward = f64::NEG_INFINITY;
        let mut reward_sum = 0.0;
        let mut step_sum = 0.0;
        for summary in &self.summaries {
            reward_sum += summary.total_reward;
            step_sum += f64::from(summary.steps);
            report.min_reward = report.min_reward.min(summary.total_reward);
            report.max_reward = report.max_reward.max(summary.total_reward);
            match summary.ending {
                EpisodeEnding::Escaped { with_gold: true } => report.escapes_with_gold += 1,
                EpisodeEnding::Escaped { with_gold: false } => report.escapes_without_gold += 1,
                EpisodeEnding::Died(DeathCause::Pit) => report.pit_deaths += 1,
                EpisodeEnding::Died(DeathCause::Hostile) => report.hostile_deaths += 1,
                EpisodeEnding::HorizonExhausted => report.timeouts += 1,
            }
        }
        report.mean_reward = reward_sum / count;
        report.mean_steps = step_sum / count;
        report
    }
}
