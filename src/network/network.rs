use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::train::generation_stats::TrainingReport;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::EvolutionConfig;

/// Feed-forward network: an ordered chain of dense layers where each layer's
/// output width matches the next layer's input width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr")]
pub struct Network {
    layers: Vec<Layer>,
}

/// Unchecked wire form; deserialization goes through [`Network::from_layers`].
#[derive(Deserialize)]
struct NetworkRepr {
    layers: Vec<Layer>,
}

impl TryFrom<NetworkRepr> for Network {
    type Error = NnError;

    fn try_from(repr: NetworkRepr) -> Result<Network> {
        Network::from_layers(repr.layers)
    }
}

impl Network {
    /// Builds zero-initialized sigmoid layers from consecutive pairs of
    /// `sizes`, so `[2, 3, 1]` yields a 2x3 layer followed by a 3x1 layer.
    pub fn new(sizes: &[usize]) -> Result<Network> {
        Network::with_activation(sizes, ActivationFunction::Sigmoid)
    }

    /// Like [`Network::new`] with the same activation on every layer.
    pub fn with_activation(sizes: &[usize], activation: ActivationFunction) -> Result<Network> {
        if sizes.len() < 2 {
            return Err(NnError::InvalidConfiguration(format!(
                "a network needs at least 2 layer sizes, got {}",
                sizes.len()
            )));
        }
        let layers = sizes.windows(2)
            .map(|pair| Layer::with_activation(pair[0], pair[1], activation))
            .collect();
        Ok(Network { layers })
    }

    /// Wraps hand-built layers, checking that their shapes chain.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(NnError::InvalidConfiguration("a network needs at least one layer".into()));
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.weights.cols() != layer.biases.cols() || layer.biases.rows() != 1 {
                return Err(NnError::InvalidConfiguration(format!(
                    "layer {i}: weights {:?} and biases {:?} do not agree",
                    layer.weights.shape(),
                    layer.biases.shape()
                )));
            }
        }
        if let Some(i) = layers.windows(2).position(|w| w[0].output_size() != w[1].input_size()) {
            return Err(NnError::InvalidConfiguration(format!(
                "layer {i} outputs {} values but layer {} expects {}",
                layers[i].output_size(),
                i + 1,
                layers[i + 1].input_size()
            )));
        }
        Ok(Network { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to each layer's parameters. The slice itself cannot
    /// grow or shrink, so the layer count is fixed.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_size)
    }

    /// Forward pass; each layer's output feeds the next.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let mut layers = self.layers.iter();
        let Some(first) = layers.next() else {
            return Ok(input.clone());
        };
        layers.try_fold(first.forward(input)?, |current, layer| layer.forward(&current))
    }

    pub fn randomize(&mut self, low: f32, high: f32) -> Result<()> {
        for layer in &mut self.layers {
            layer.randomize(low, high)?;
        }
        Ok(())
    }

    /// Total mean squared error of `predict(inputs)` against `targets`.
    pub fn fitness(&self, inputs: &Matrix, targets: &Matrix) -> Result<f32> {
        MseLoss::total(&self.predict(inputs)?, targets)
    }

    /// Evolutionary training with the default configuration for `epochs`
    /// generations. Returns the fitness of the adopted network.
    ///
    /// `learning_rate` only matters when the configuration scales mutations by
    /// it; the default fixed `[-1, 1]` perturbation ignores it. Use
    /// [`Network::train_with`] to choose.
    pub fn train(&mut self, inputs: &Matrix, targets: &Matrix, epochs: usize, learning_rate: f32) -> Result<f32> {
        let config = EvolutionConfig::new(epochs, learning_rate);
        Ok(self.train_with(inputs, targets, &config)?.final_fitness)
    }

    pub fn train_with(&mut self, inputs: &Matrix, targets: &Matrix, config: &EvolutionConfig) -> Result<TrainingReport> {
        train_loop(self, inputs, targets, config)
    }

    /// Moves the layers out, leaving `self` with none.
    pub fn take(&mut self) -> Network {
        std::mem::take(self)
    }

    pub(crate) fn adopt(&mut self, other: Network) {
        self.layers = other.layers;
    }
}
