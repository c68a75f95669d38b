pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod train;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::{AddPolicy, Matrix};
pub use activation::activation::{sigmoid, ActivationFunction};
pub use layers::dense::Layer;
pub use network::network::Network;
pub use loss::mse::{MseLoss, Reduction};
pub use train::{train_loop, EvolutionConfig, GenerationStats, Perturbation, TrainingReport};
