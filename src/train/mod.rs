pub mod generation_stats;
pub mod train_config;
pub mod loop_fn;

pub use generation_stats::{GenerationStats, TrainingReport};
pub use train_config::{EvolutionConfig, Perturbation};
pub use loop_fn::train_loop;
