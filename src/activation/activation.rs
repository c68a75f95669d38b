use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// Elementwise nonlinearity applied at the end of a layer's forward pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    #[default]
    Sigmoid,
    /// No nonlinearity: the layer is a plain affine transform.
    Identity,
    Tanh,
    ReLU,
}

impl ActivationFunction {
    pub fn function(&self, x: f32) -> f32 {
        match self {
            // exp over/underflow saturates this to 0.0 / 1.0 for large |x|.
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
        }
    }

    /// Applies the activation to every cell, producing a new matrix.
    pub fn apply(&self, input: &Matrix) -> Matrix {
        match self {
            ActivationFunction::Identity => input.clone(),
            _ => input.map(|x| self.function(x)),
        }
    }
}

/// Elementwise logistic sigmoid.
pub fn sigmoid(input: &Matrix) -> Matrix {
    ActivationFunction::Sigmoid.apply(input)
}
