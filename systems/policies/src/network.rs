use rand::Rng;
use tracing::warn;
use wumpus_core::{Action, Coordinate, Orientation, Percept, PerceptKind};

use crate::{
    blob::{BlobError, Dtype, WeightBlob},
    EpisodeContext, Policy, PoseTracker,
};

/// Pose, arrow, gold and creature flags that lead every observation.
const BELIEF_PREFIX: usize = 6;
/// Cell value for "never visited".
const UNKNOWN: f64 = -1.0;

/// Dense feed-forward network: `tanh` between layers, softmax on the output.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    layers: Vec<Dense>,
}

#[derive(Clone, Debug, PartialEq)]
struct Dense {
    inputs: usize,
    outputs: usize,
    /// Row-major, `inputs` rows of `outputs` columns.
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Dense {
    fn apply(&self, input: &[f64]) -> Vec<f64> {
        let mut output = self.biases.clone();
        for (row, value) in input.iter().enumerate().take(self.inputs) {
            let weights = &self.weights[row * self.outputs..(row + 1) * self.outputs];
            for (slot, weight) in output.iter_mut().zip(weights) {
                *slot += value * weight;
            }
        }
        output
    }
}

impl Network {
    /// Creates a network with Xavier-uniform weights and zero biases.
    ///
    /// `hidden` lists the widths of the hidden layers; it may be empty.
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        inputs: usize,
        hidden: &[usize],
        outputs: usize,
    ) -> Self {
        let widths: Vec<usize> = std::iter::once(inputs)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(outputs))
            .collect();
        let layers = widths
            .windows(2)
            .map(|pair| {
                let (inputs, outputs) = (pair[0], pair[1]);
                let limit = (6.0 / (inputs + outputs).max(1) as f64).sqrt();
                Dense {
                    inputs,
                    outputs,
                    weights: (0..inputs * outputs)
                        .map(|_| rng.gen_range(-limit..=limit))
                        .collect(),
                    biases: vec![0.0; outputs],
                }
            })
            .collect();
        Self { layers }
    }

    /// Rebuilds a network from a decoded blob.
    #[must_use]
    pub fn from_blob(blob: &WeightBlob) -> Self {
        let mut params = blob.params().iter().copied();
        let layers = blob
            .shapes()
            .iter()
            .map(|&(inputs, outputs)| Dense {
                inputs,
                outputs,
                weights: params.by_ref().take(inputs * outputs).collect(),
                biases: params.by_ref().take(outputs).collect(),
            })
            .collect();
        Self { layers }
    }

    /// Flattens the parameters into a blob using `dtype` on the wire.
    #[must_use]
    pub fn to_blob(&self, dtype: Dtype) -> WeightBlob {
        let shapes = self
            .layers
            .iter()
            .map(|layer| (layer.inputs, layer.outputs))
            .collect();
        let params = self
            .layers
            .iter()
            .flat_map(|layer| layer.weights.iter().chain(&layer.biases).copied())
            .collect();
        WeightBlob::from_parts(shapes, dtype, params)
    }

    /// Width of the input layer.
    #[must_use]
    pub fn inputs(&self) -> usize {
        self.layers.first().map_or(0, |layer| layer.inputs)
    }

    /// Width of the output layer.
    #[must_use]
    pub fn outputs(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.outputs)
    }

    /// Action probabilities for `input`.
    #[must_use]
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut activations = input.to_vec();
        let last = self.layers.len().saturating_sub(1);
        for (index, layer) in self.layers.iter().enumerate() {
            activations = layer.apply(&activations);
            if index < last {
                activations.iter_mut().for_each(|value| *value = value.tanh());
            }
        }
        softmax(&mut activations);
        activations
    }
}

fn softmax(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for value in values.iter_mut() {
        *value = (*value - max).exp();
        total += *value;
    }
    if total > 0.0 {
        values.iter_mut().for_each(|value| *value /= total);
    }
}

/// Observation width for a `width` x `height` grid.
#[must_use]
fn observation_len(width: u32, height: u32) -> usize {
    BELIEF_PREFIX + width as usize * height as usize * Percept::LEN
}

/// Plays the action with the highest network output.
///
/// The observation is the tracked belief: `x`, `y`, orientation index, arrow,
/// gold and creature-alive flags, followed by the last percept seen on every
/// cell (`-1` for cells never visited), cell `(x, y)` at
/// `(x * height + y) * 5`.
#[derive(Clone, Debug)]
pub struct NetworkPolicy {
    network: Network,
    width: u32,
    height: u32,
    pose: PoseTracker,
    has_arrow: bool,
    has_gold: bool,
    hostile_alive: bool,
    map: Vec<f64>,
}

impl NetworkPolicy {
    /// Wraps `network` for episodes on a `width` x `height` grid.
    pub fn new(network: Network, width: u32, height: u32) -> Result<Self, BlobError> {
        let expected_inputs = observation_len(width, height);
        let expected_outputs = Action::ALL.len();
        if network.inputs() != expected_inputs || network.outputs() != expected_outputs {
            return Err(BlobError::IncompatibleNetwork {
                inputs: network.inputs(),
                outputs: network.outputs(),
                expected_inputs,
                expected_outputs,
            });
        }
        let context = EpisodeContext::new(width, height, Coordinate::new(0, 0), Orientation::North);
        Ok(Self {
            network,
            width,
            height,
            pose: PoseTracker::new(&context),
            has_arrow: true,
            has_gold: false,
            hostile_alive: true,
            map: vec![UNKNOWN; expected_inputs - BELIEF_PREFIX],
        })
    }

    /// Input width a network needs to drive a `width` x `height` grid.
    #[must_use]
    pub fn input_width(width: u32, height: u32) -> usize {
        observation_len(width, height)
    }

    /// Decodes `blob` and wraps the resulting network.
    pub fn from_blob(blob: &WeightBlob, width: u32, height: u32) -> Result<Self, BlobError> {
        Self::new(Network::from_blob(blob), width, height)
    }

    /// The wrapped network.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    fn cell_offset(&self, cell: Coordinate) -> usize {
        (cell.x() as usize * self.height as usize + cell.y() as usize) * Percept::LEN
    }

    fn observation(&self) -> Vec<f64> {
        let flag = |value: bool| if value { 1.0 } else { 0.0 };
        let mut observation = Vec::with_capacity(BELIEF_PREFIX + self.map.len());
        observation.extend([
            f64::from(self.pose.position.x()),
            f64::from(self.pose.position.y()),
            self.pose.orientation.index() as f64,
            flag(self.has_arrow),
            flag(self.has_gold),
            flag(self.hostile_alive),
        ]);
        observation.extend_from_slice(&self.map);
        observation
    }

    fn remember(&mut self, percept: &Percept) {
        let offset = self.cell_offset(self.pose.position);
        for (slot, seen) in self.map[offset..offset + Percept::LEN]
            .iter_mut()
            .zip(percept.as_array())
        {
            *slot = if seen { 1.0 } else { 0.0 };
        }
        if percept.scream() {
            self.hostile_alive = false;
        }
    }

    fn glitter_here(&self) -> bool {
        let offset = self.cell_offset(self.pose.position);
        self.map[offset + PerceptKind::Glitter.index()] > 0.0
    }
}

impl Policy for NetworkPolicy {
    fn kind(&self) -> &'static str {
        "network"
    }

    fn new_episode(&mut self, context: &EpisodeContext) {
        if context.width != self.width || context.height != self.height {
            warn!(
                expected_width = self.width,
                expected_height = self.height,
                width = context.width,
                height = context.height,
                "network was sized for a different grid; keeping its own dimensions"
            );
        }
        let start = if context.start.within(self.width, self.height) {
            context.start
        } else {
            Coordinate::new(0, 0)
        };
        self.pose = PoseTracker::new(&EpisodeContext::new(
            self.width,
            self.height,
            start,
            context.orientation,
        ));
        self.has_arrow = true;
        self.has_gold = false;
        self.hostile_alive = true;
        self.map.fill(UNKNOWN);
    }

    fn decide(&mut self, percept: &Percept, _reward: f64) -> Action {
        self.remember(percept);
        let probabilities = self.network.forward(&self.observation());
        let choice = probabilities
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (index, &value)| {
                if value > best.1 {
                    (index, value)
                } else {
                    best
                }
            })
            .0;
        let action = Action::ALL[choice.min(Action::ALL.len() - 1)];

        match action {
            Action::Grab if self.glitter_here() => self.has_gold = true,
            Action::Shoot => self.has_arrow = false,
            _ => {}
        }
        self.pose.record(action)
    }
}
