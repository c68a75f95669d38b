use std::sync::mpsc;

use crate::error::{NnError, Result};
use crate::loss::mse::Reduction;
use crate::math::matrix;
use crate::train::generation_stats::GenerationStats;

pub const DEFAULT_POPULATION_SIZE: usize = 30;
pub const DEFAULT_MUTATION_RATE: f32 = 0.5;
pub const DEFAULT_REPORT_EVERY: usize = 25;

/// Range of the uniform perturbation added to a mutated cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Perturbation {
    /// Always `[low, high]`; the learning rate is ignored.
    Fixed { low: f32, high: f32 },
    /// `[-learning_rate, +learning_rate]`.
    LearningRate,
}

impl Perturbation {
    pub fn range(&self, learning_rate: f32) -> (f32, f32) {
        match *self {
            Perturbation::Fixed { low, high } => (low, high),
            Perturbation::LearningRate => (-learning_rate, learning_rate),
        }
    }
}

impl Default for Perturbation {
    fn default() -> Self {
        Perturbation::Fixed { low: -1.0, high: 1.0 }
    }
}

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `generations`:     number of generations; the loop never stops early
/// - `population_size`: networks per generation; the best half survive
/// - `mutation_rate`:   probability that a single weight/bias cell is perturbed
/// - `perturbation`:    range of the perturbation, see [`Perturbation`]
/// - `learning_rate`:   only read by `Perturbation::LearningRate`
/// - `elitism`:         top survivors also carried into the next generation
///                      unmutated; `0` mutates every survivor
/// - `fitness`:         how per-row losses collapse into one score
/// - `report_every`:    `log::info!` cadence in generations; `0` disables it
/// - `progress_tx`:     optional channel receiving one `GenerationStats` per
///                      generation.  A dropped receiver does not stop training.
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub generations: usize,
    pub population_size: usize,
    pub mutation_rate: f32,
    pub perturbation: Perturbation,
    pub learning_rate: f32,
    pub elitism: usize,
    pub fitness: Reduction,
    pub report_every: usize,
    pub progress_tx: Option<mpsc::Sender<GenerationStats>>,
}

impl EvolutionConfig {
    /// Default hyperparameters for `generations` generations.
    pub fn new(generations: usize, learning_rate: f32) -> Self {
        EvolutionConfig {
            generations,
            learning_rate,
            ..EvolutionConfig::default()
        }
    }

    pub fn survivors(&self) -> usize {
        self.population_size / 2
    }

    pub fn perturbation_range(&self) -> (f32, f32) {
        self.perturbation.range(self.learning_rate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(invalid(format!(
                "population size must be at least 2, got {}",
                self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(invalid(format!(
                "mutation rate {} outside [0, 1]",
                self.mutation_rate
            )));
        }
        if self.elitism > self.survivors() {
            return Err(invalid(format!(
                "elitism {} exceeds the {} survivors per generation",
                self.elitism,
                self.survivors()
            )));
        }
        let (low, high) = self.perturbation_range();
        matrix::uniform(low, high)?;
        Ok(())
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        EvolutionConfig {
            generations: 0,
            population_size: DEFAULT_POPULATION_SIZE,
            mutation_rate: DEFAULT_MUTATION_RATE,
            perturbation: Perturbation::default(),
            learning_rate: 0.0,
            elitism: 1,
            fitness: Reduction::Sum,
            report_every: DEFAULT_REPORT_EVERY,
            progress_tx: None,
        }
    }
}

fn invalid(msg: String) -> NnError {
    NnError::InvalidConfiguration(msg)
}
