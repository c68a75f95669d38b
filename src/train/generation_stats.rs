use serde::{Serialize, Deserialize};

/// Per-generation statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `EvolutionConfig`, the loop
/// sends one `GenerationStats` value after ranking each generation. Fitness is
/// the reduced mean squared error; lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    /// Total generations requested for this run.
    pub total_generations: usize,
    pub best_fitness: f32,
    pub worst_fitness: f32,
    pub mean_fitness: f32,
    /// Wall-clock duration of this generation in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome of a full training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Best fitness in the first evaluated population (before any mutation).
    pub initial_fitness: f32,
    /// Fitness of the network adopted at the end.
    pub final_fitness: f32,
    pub history: Vec<GenerationStats>,
}
