use std::collections::BTreeSet;

use rand::Rng;
use wumpus_core::{
    ConfigError, Coordinate, Orientation, Sampled, SimulationConfig, StartOrientation,
    StartPosition,
};

use crate::{percepts, WorldState};

/// Populates a fresh world from `config`, drawing every random choice from `rng`.
///
/// A malformed configuration is rejected before anything is drawn.
pub fn generate<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<WorldState, ConfigError> {
    config.validate()?;
    Ok(populate(config, rng))
}

/// Same as [`generate`] for a configuration that was validated up front.
pub(crate) fn populate<R: Rng + ?Sized>(config: &SimulationConfig, rng: &mut R) -> WorldState {
    let width = config.width;
    let height = config.height;
    let pit_probability = sample_probability(config.pit_probability, rng);
    let horizon = sample_horizon(config.horizon, rng);

    let start = match config.start_position {
        StartPosition::Fixed(cell) => cell,
        StartPosition::RandomCorner => {
            let x = if rng.gen::<bool>() { 0 } else { width - 1 };
            let y = if rng.gen::<bool>() { 0 } else { height - 1 };
            Coordinate::new(x, y)
        }
    };
    let orientation = match config.start_orientation {
        StartOrientation::Fixed(orientation) => orientation,
        StartOrientation::Random => Orientation::ALL[rng.gen_range(0..Orientation::ALL.len())],
    };

    let mut pits = BTreeSet::new();
    for x in 0..width {
        for y in 0..height {
            let cell = Coordinate::new(x, y);
            if rng.gen::<f64>() < pit_probability && cell != start {
                let _ = pits.insert(cell);
            }
        }
    }

    let cell_count = config.cell_count();
    let hostile_position = if cell_count > 1 {
        loop {
            let cell = index_to_cell(rng.gen_range(0..cell_count), width);
            if cell != start {
                break Some(cell);
            }
        }
    } else {
        None
    };

    let mut has_arrow = true;
    if !config.with_hostile && rng.gen_bool(0.5) {
        has_arrow = false;
    }

    let gold_position = index_to_cell(rng.gen_range(0..cell_count), width);

    let mut world = WorldState {
        width,
        height,
        agent_pos: start,
        agent_orientation: orientation,
        has_arrow,
        has_gold: false,
        hostile_alive: config.with_hostile && hostile_position.is_some(),
        pits,
        hostile_position,
        gold_position: Some(gold_position),
        exit_position: start,
        step_count: 0,
        horizon,
        pit_probability,
        terminated: false,
        last_reward: 0.0,
        visited: BTreeSet::from([start]),
        percept: Default::default(),
    };
    world.percept = percepts::encode(&world, percepts::Transients::default());
    world
}

fn sample_probability<R: Rng + ?Sized>(value: Sampled<f64>, rng: &mut R) -> f64 {
    match value {
        Sampled::Fixed(probability) => probability,
        Sampled::Range([low, high]) if low < high => rng.gen_range(low..high),
        Sampled::Range([low, _]) => low,
    }
}

fn sample_horizon<R: Rng + ?Sized>(value: Sampled<u32>, rng: &mut R) -> u32 {
    match value {
        Sampled::Fixed(horizon) => horizon,
        Sampled::Range([low, high]) if low < high => rng.gen_range(low..high),
        Sampled::Range([low, _]) => low,
    }
}

fn index_to_cell(index: u64, width: u32) -> Coordinate {
    let width = u64::from(width);
    // `index` is below `width * height`, so both parts fit in u32.
    Coordinate::new((index % width) as u32, (index / width) as u32)
}
