use std::{fs, path::Path};

use anyhow::{Context, Result};
use wumpus_core::SimulationConfig;
use wumpus_system_policies::WeightBlob;

/// Where the random stream of a run gets its seed from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum SeedOverride {
    /// Keep whatever the config file says.
    #[default]
    Keep,
    /// Use this seed.
    Fixed(u64),
    /// Draw a seed from the operating system.
    Entropy,
}

impl SeedOverride {
    /// Combines the `--seed` and `--random-seed` flags.
    pub(crate) fn from_flags(seed: Option<u64>, random_seed: bool) -> Self {
        match (seed, random_seed) {
            (_, true) => Self::Entropy,
            (Some(seed), false) => Self::Fixed(seed),
            (None, false) => Self::Keep,
        }
    }
}

/// Reads the simulation config from `path`, or falls back to the defaults,
/// then applies the command-line seed override.
pub(crate) fn load_config(path: Option<&Path>, seed: SeedOverride) -> Result<SimulationConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            parse_config(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    match seed {
        SeedOverride::Keep => {}
        SeedOverride::Fixed(seed) => config.seed = Some(seed),
        SeedOverride::Entropy => config.seed = None,
    }
    config.validate()?;
    Ok(config)
}

fn parse_config(text: &str) -> Result<SimulationConfig> {
    Ok(toml::from_str(text)?)
}

/// Reads and decodes a weight blob file.
pub(crate) fn load_weights(path: &Path) -> Result<WeightBlob> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read weights {}", path.display()))?;
    WeightBlob::decode(&text).with_context(|| format!("invalid weights {}", path.display()))
}
