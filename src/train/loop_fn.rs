use std::time::Instant;

use rand::Rng;

use crate::error::{NnError, Result};
use crate::loss::mse::{MseLoss, Reduction};
use crate::math::matrix::Matrix;
use crate::math::rng;
use crate::network::network::Network;
use crate::train::generation_stats::{GenerationStats, TrainingReport};
use crate::train::train_config::{EvolutionConfig, Perturbation};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` by truncation-selection evolution for exactly
/// `config.generations` generations, then overwrites it with the fittest
/// member of the final population.
///
/// # Arguments
/// - `network`: seed of the first population; replaced in place at the end
/// - `inputs`:  input batch, one sample per row
/// - `targets`: expected outputs, one row per input row
/// - `config`:  population and mutation hyperparameters, optional progress channel
///
/// # Generation
/// 1. rank every member by `MseLoss` fitness, ascending
/// 2. keep the best half
/// 3. copy the top `elitism` survivors, then mutate every survivor
/// 4. refill to `population_size` with survivors drawn uniformly with replacement
///
/// # Errors
/// Fails before any mutation if the configuration is invalid, the batches
/// disagree on row count, or the network cannot map `inputs` onto `targets`.
pub fn train_loop(
    network: &mut Network,
    inputs: &Matrix,
    targets: &Matrix,
    config: &EvolutionConfig,
) -> Result<TrainingReport> {
    config.validate()?;
    if inputs.rows() != targets.rows() {
        return Err(NnError::mismatch("train_loop", inputs.shape(), targets.shape()));
    }
    if let Perturbation::Fixed { low, high } = config.perturbation {
        log::debug!(
            "learning rate {} unused: mutations draw from fixed range [{low}, {high}]",
            config.learning_rate
        );
    }

    let (low, high) = config.perturbation_range();
    let mut population: Vec<Network> = vec![network.clone(); config.population_size];
    let mut history = Vec::with_capacity(config.generations);
    let mut initial_fitness = None;

    for generation in 1..=config.generations {
        let t_start = Instant::now();

        let ranked = rank(population, inputs, targets, config.fitness)?;
        initial_fitness.get_or_insert(ranked[0].0);
        let stats = summarize(&ranked, generation, config.generations);

        // ── Selection ───────────────────────────────────────────────────
        let mut survivors: Vec<Network> = ranked.into_iter()
            .take(config.survivors())
            .map(|(_, member)| member)
            .collect();
        let mut next: Vec<Network> = survivors[..config.elitism].to_vec();

        // ── Mutation ────────────────────────────────────────────────────
        for member in &mut survivors {
            for layer in member.layers_mut() {
                layer.mutate(config.mutation_rate, low, high)?;
            }
        }

        // ── Refill ──────────────────────────────────────────────────────
        let picks: Vec<usize> = rng::with_rng(|rng| {
            let missing = config.population_size - config.elitism - survivors.len();
            (0..missing).map(|_| rng.gen_range(0..survivors.len())).collect()
        });
        let refill: Vec<Network> = picks.into_iter().map(|i| survivors[i].clone()).collect();
        next.extend(survivors);
        next.extend(refill);
        population = next;

        let stats = GenerationStats {
            elapsed_ms: t_start.elapsed().as_millis() as u64,
            ..stats
        };
        report(&stats, config);
        history.push(stats);
    }

    let ranked = rank(population, inputs, targets, config.fitness)?;
    let (final_fitness, best) = ranked.into_iter()
        .next()
        .ok_or_else(|| NnError::InvalidConfiguration("empty population".into()))?;
    network.adopt(best);

    let initial_fitness = initial_fitness.unwrap_or(final_fitness);
    log::info!(
        "Training finished after {} generations: fitness {:.6} -> {:.6}",
        config.generations,
        initial_fitness,
        final_fitness
    );

    Ok(TrainingReport {
        initial_fitness,
        final_fitness,
        history,
    })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Scores every member and sorts ascending by fitness. Ties keep population order.
fn rank(
    population: Vec<Network>,
    inputs: &Matrix,
    targets: &Matrix,
    reduction: Reduction,
) -> Result<Vec<(f32, Network)>> {
    let mut scored = population.into_iter()
        .map(|member| -> Result<(f32, Network)> {
            let output = member.predict(inputs)?;
            Ok((MseLoss::reduce(&output, targets, reduction)?, member))
        })
        .collect::<Result<Vec<_>>>()?;
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(scored)
}

fn summarize(ranked: &[(f32, Network)], generation: usize, total_generations: usize) -> GenerationStats {
    let best_fitness = ranked.first().map_or(f32::NAN, |(f, _)| *f);
    let worst_fitness = ranked.last().map_or(f32::NAN, |(f, _)| *f);
    let mean_fitness = ranked.iter().map(|(f, _)| f).sum::<f32>() / ranked.len() as f32;
    GenerationStats {
        generation,
        total_generations,
        best_fitness,
        worst_fitness,
        mean_fitness,
        elapsed_ms: 0,
    }
}

fn report(stats: &GenerationStats, config: &EvolutionConfig) {
    log::debug!(
        "generation {}: best {:.6}, worst {:.6}",
        stats.generation,
        stats.best_fitness,
        stats.worst_fitness
    );
    if config.report_every > 0 && stats.generation % config.report_every == 0 {
        log::info!(
            "Generation {}/{}: best fitness = {:.6}",
            stats.generation,
            stats.total_generations,
            stats.best_fitness
        );
    }
    if let Some(ref tx) = config.progress_tx {
        // A hung-up receiver only loses the progress feed.
        let _ = tx.send(stats.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn xor() -> (Matrix, Matrix) {
        let inputs = Matrix::from_vec(4, 2, vec![
            0.0, 0.0,
            0.0, 1.0,
            1.0, 0.0,
            1.0, 1.0,
        ]).unwrap();
        let targets = Matrix::from_vec(4, 1, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        (inputs, targets)
    }

    #[test]
    fn never_worse_than_first_generation() {
        rng::seed(3);
        let (inputs, targets) = xor();
        let mut nn = Network::new(&[2, 3, 1]).unwrap();
        nn.randomize(-1.0, 1.0).unwrap();

        let report = train_loop(&mut nn, &inputs, &targets, &EvolutionConfig::new(40, 0.1)).unwrap();

        assert_eq!(report.history.len(), 40);
        assert!(report.final_fitness <= report.initial_fitness);
        assert_eq!(report.initial_fitness, report.history[0].best_fitness);
        let adopted = MseLoss::total(&nn.predict(&inputs).unwrap(), &targets).unwrap();
        assert!((adopted - report.final_fitness).abs() < 1e-6);
    }

    #[test]
    fn elitism_keeps_best_fitness_monotonic() {
        rng::seed(11);
        let (inputs, targets) = xor();
        let mut nn = Network::new(&[2, 2, 1]).unwrap();

        let report = train_loop(&mut nn, &inputs, &targets, &EvolutionConfig::new(30, 0.0)).unwrap();
        for pair in report.history.windows(2) {
            assert!(pair[1].best_fitness <= pair[0].best_fitness);
        }
        assert!(report.final_fitness <= report.history.last().unwrap().best_fitness);
    }

    #[test]
    fn zero_generations_adopts_a_clone() {
        let (inputs, targets) = xor();
        let mut nn = Network::new(&[2, 2, 1]).unwrap();
        nn.randomize(-1.0, 1.0).unwrap();
        let before = nn.clone();

        let report = train_loop(&mut nn, &inputs, &targets, &EvolutionConfig::new(0, 0.1)).unwrap();
        assert!(report.history.is_empty());
        assert_eq!(nn, before);
        assert_eq!(report.initial_fitness, report.final_fitness);
    }

    #[test]
    fn sends_progress_per_generation() {
        let (inputs, targets) = xor();
        let (tx, rx) = mpsc::channel();
        let config = EvolutionConfig {
            population_size: 6,
            progress_tx: Some(tx),
            ..EvolutionConfig::new(5, 0.1)
        };
        let mut nn = Network::new(&[2, 1]).unwrap();
        train_loop(&mut nn, &inputs, &targets, &config).unwrap();
        drop(config);

        let stats: Vec<GenerationStats> = rx.iter().collect();
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[4].generation, 5);
        assert!(stats.iter().all(|s| s.total_generations == 5 && s.best_fitness <= s.worst_fitness));
    }

    #[test]
    fn dropped_receiver_does_not_stop_training() {
        let (inputs, targets) = xor();
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let config = EvolutionConfig {
            progress_tx: Some(tx),
            ..EvolutionConfig::new(3, 0.1)
        };
        let mut nn = Network::new(&[2, 1]).unwrap();
        let report = train_loop(&mut nn, &inputs, &targets, &config).unwrap();
        assert_eq!(report.history.len(), 3);
    }

    #[test]
    fn rejects_mismatched_batches_without_touching_network() {
        let (inputs, _) = xor();
        let mut nn = Network::new(&[2, 1]).unwrap();
        nn.randomize(-1.0, 1.0).unwrap();
        let before = nn.clone();

        let short = Matrix::zeros(3, 1);
        assert!(matches!(
            train_loop(&mut nn, &inputs, &short, &EvolutionConfig::new(5, 0.1)),
            Err(NnError::DimensionMismatch { .. })
        ));
        let wide = Matrix::zeros(4, 2);
        assert!(train_loop(&mut nn, &inputs, &wide, &EvolutionConfig::new(5, 0.1)).is_err());
        assert_eq!(nn, before);
    }

    #[test]
    fn odd_population_without_elitism_runs_every_generation() {
        let (inputs, targets) = xor();
        let (tx, rx) = mpsc::channel();
        let config = EvolutionConfig {
            population_size: 7,
            elitism: 0,
            progress_tx: Some(tx),
            ..EvolutionConfig::new(4, 0.1)
        };
        let mut nn = Network::new(&[2, 2, 1]).unwrap();
        train_loop(&mut nn, &inputs, &targets, &config).unwrap();
        drop(config);
        assert_eq!(rx.iter().count(), 4);
    }
}
