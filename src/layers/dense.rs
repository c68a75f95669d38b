use rand::distributions::Distribution;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::math::matrix::{self, AddPolicy, Matrix};
use crate::math::rng;

/// Fully connected layer: `activation(input * weights + biases)`.
///
/// `weights` is `input_size x output_size` and `biases` is `1 x output_size`;
/// the bias row is broadcast over every row of the input batch. The default
/// layer holds two empty matrices and only serves as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Matrix,
    pub biases: Matrix,
    pub activation: ActivationFunction,
}

impl Layer {
    /// Zero-initialized sigmoid layer.
    pub fn new(input_size: usize, output_size: usize) -> Layer {
        Layer::with_activation(input_size, output_size, ActivationFunction::Sigmoid)
    }

    pub fn with_activation(input_size: usize, output_size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            weights: Matrix::zeros(input_size, output_size),
            biases: Matrix::zeros(1, output_size),
            activation,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    /// Forward pass over a batch: one sample per row of `input`.
    pub fn forward(&self, input: &Matrix) -> Result<Matrix> {
        let z = input
            .multiply(&self.weights)?
            .add_with(&self.biases, AddPolicy::Broadcast)?;
        Ok(self.activation.apply(&z))
    }

    pub fn randomize(&mut self, low: f32, high: f32) -> Result<()> {
        // Validate once so a bad range cannot leave weights randomized and biases not.
        matrix::uniform(low, high)?;
        self.weights.randomize(low, high)?;
        self.biases.randomize(low, high)
    }

    /// Perturbs each weight and bias cell, independently with probability
    /// `rate`, by a uniform draw in `[low, high]`.
    pub fn mutate(&mut self, rate: f32, low: f32, high: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(NnError::InvalidConfiguration(format!(
                "mutation rate {rate} outside [0, 1]"
            )));
        }
        let dist = matrix::uniform(low, high)?;
        let rate = f64::from(rate);

        rng::with_rng(|rng| {
            let cells = self.weights.as_mut_slice().iter_mut()
                .chain(self.biases.as_mut_slice().iter_mut());
            for x in cells {
                if rng.gen_bool(rate) {
                    *x += dist.sample(rng);
                }
            }
        });
        Ok(())
    }

    /// Moves the parameters out, leaving `self` as the empty default layer.
    pub fn take(&mut self) -> Layer {
        std::mem::take(self)
    }
}
