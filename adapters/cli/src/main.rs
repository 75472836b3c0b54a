#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that evaluates policies and replays scripted episodes.

mod settings;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use wumpus_core::{Action, Percept};
use wumpus_system_evaluation::Evaluation;
use wumpus_system_policies::{Dtype, Explorer, Network, NetworkPolicy, Policy, Retreat};
use wumpus_world::{query, Simulator};

use crate::settings::SeedOverride;

#[derive(Parser, Debug)]
#[command(name = "wumpus", version, about = "Wumpus World simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a policy for a number of episodes and print aggregate statistics.
    Evaluate {
        /// TOML file with the simulation settings; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Policy that chooses the actions.
        #[arg(long, value_enum, default_value_t = PolicyKind::Explorer)]
        policy: PolicyKind,
        /// Weight blob for the network policy.
        #[arg(long)]
        weights: Option<PathBuf>,
        /// Number of episodes to play.
        #[arg(long, default_value_t = 100)]
        episodes: u32,
        /// Overrides the seed from the config file.
        #[arg(long)]
        seed: Option<u64>,
        /// Seeds the episodes from the operating system instead.
        #[arg(long, conflicts_with = "seed")]
        random_seed: bool,
    },
    /// Play a fixed list of actions and print every step.
    Replay {
        /// TOML file with the simulation settings; defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated actions, as letters (F,L,R,G,S,C) or names.
        #[arg(long, value_delimiter = ',', required = true)]
        actions: Vec<Action>,
        /// Overrides the seed from the config file.
        #[arg(long)]
        seed: Option<u64>,
        /// Seeds the episodes from the operating system instead.
        #[arg(long, conflicts_with = "seed")]
        random_seed: bool,
    },
    /// Write a randomly initialised weight blob for the network policy.
    InitWeights {
        /// Grid columns the network observes.
        #[arg(long, default_value_t = 4)]
        width: u32,
        /// Grid rows the network observes.
        #[arg(long, default_value_t = 4)]
        height: u32,
        /// Hidden layer widths, comma-separated.
        #[arg(long, value_delimiter = ',')]
        hidden: Vec<usize>,
        /// Numeric type of the stored parameters.
        #[arg(long, value_enum, default_value_t = DtypeArg::F32)]
        dtype: DtypeArg,
        /// Seed for the initial weights.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Destination file; the blob goes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    Retreat,
    Explorer,
    Network,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DtypeArg {
    F32,
    F64,
}

impl From<DtypeArg> for Dtype {
    fn from(value: DtypeArg) -> Self {
        match value {
            DtypeArg::F32 => Dtype::F32,
            DtypeArg::F64 => Dtype::F64,
        }
    }
}

/// Entry point for the Wumpus World command-line interface.
fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Evaluate {
            config,
            policy,
            weights,
            episodes,
            seed,
            random_seed,
        } => evaluate(
            config,
            policy,
            weights,
            episodes,
            SeedOverride::from_flags(seed, random_seed),
        ),
        Command::Replay {
            config,
            actions,
            seed,
            random_seed,
        } => replay(config, &actions, SeedOverride::from_flags(seed, random_seed)),
        Command::InitWeights {
            width,
            height,
            hidden,
            dtype,
            seed,
            output,
        } => init_weights(width, height, &hidden, dtype.into(), seed, output),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn evaluate(
    config: Option<PathBuf>,
    kind: PolicyKind,
    weights: Option<PathBuf>,
    episodes: u32,
    seed: SeedOverride,
) -> Result<()> {
    let config = settings::load_config(config.as_deref(), seed)?;
    let mut policy: Box<dyn Policy> = match kind {
        PolicyKind::Retreat => Box::new(Retreat::new()),
        PolicyKind::Explorer => Box::new(Explorer::new()),
        PolicyKind::Network => {
            let Some(path) = weights else {
                bail!("the network policy needs --weights");
            };
            let blob = settings::load_weights(&path)?;
            Box::new(NetworkPolicy::from_blob(&blob, config.width, config.height)?)
        }
    };

    let mut simulator = Simulator::new(config)?;
    info!(
        policy = policy.kind(),
        episodes,
        seed = ?simulator.config().seed,
        "starting evaluation"
    );
    let report = Evaluation::run(&mut simulator, &mut policy, episodes)?;
    print!("{}", toml::to_string_pretty(&report)?);
    Ok(())
}

fn replay(config: Option<PathBuf>, actions: &[Action], seed: SeedOverride) -> Result<()> {
    let config = settings::load_config(config.as_deref(), seed)?;
    let mut simulator = Simulator::new(config)?;
    let percept = simulator.reset();
    print_pose(&simulator, 0, None, percept, 0.0)?;

    let mut total = 0.0;
    for (index, action) in actions.iter().enumerate() {
        let outcome = simulator.step(*action)?;
        total += outcome.reward;
        print_pose(&simulator, index + 1, Some(*action), outcome.percept, outcome.reward)?;
        if outcome.terminated {
            if let Some(note) = &outcome.info {
                println!("{note}");
            }
            if index + 1 < actions.len() {
                println!("episode ended; {} actions ignored", actions.len() - index - 1);
            }
            break;
        }
    }
    println!("total reward {total:.1}");
    Ok(())
}

fn print_pose(
    simulator: &Simulator,
    step: usize,
    action: Option<Action>,
    percept: Percept,
    reward: f64,
) -> Result<()> {
    let world = simulator.world().context("no episode is loaded")?;
    let (position, orientation) = query::agent_pose(world);
    let action = action.map_or_else(|| "-".to_owned(), |action| action.to_string());
    println!(
        "{step:>3} {action:<7} at {position} facing {orientation:?} percept {percept} reward {reward:+.1}"
    );
    Ok(())
}

fn init_weights(
    width: u32,
    height: u32,
    hidden: &[usize],
    dtype: Dtype,
    seed: u64,
    output: Option<PathBuf>,
) -> Result<()> {
    let inputs = NetworkPolicy::input_width(width, height);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let network = Network::random(&mut rng, inputs, hidden, Action::ALL.len());
    let policy = NetworkPolicy::new(network, width, height)?;
    let blob = policy.network().to_blob(dtype).encode();
    match output {
        Some(path) => fs::write(&path, format!("{blob}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{blob}"),
    }
    Ok(())
}
