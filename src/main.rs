// Demo binary: evolves a 2-2-1 sigmoid network on XOR and prints its predictions.
// All logic lives in the library. Set RUST_LOG=debug for per-generation output.
use ferrite_evo::{Matrix, Network, Result};

const GENERATIONS: usize = 500;
const LEARNING_RATE: f32 = 0.1;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let inputs = Matrix::from_vec(4, 2, vec![
        1.0, 0.0,
        1.0, 1.0,
        0.0, 1.0,
        0.0, 0.0,
    ])?;
    let targets = Matrix::from_vec(4, 1, vec![1.0, 0.0, 1.0, 0.0])?;

    let mut network = Network::new(&[2, 2, 1])?;
    network.randomize(-1.0, 1.0)?;

    let fitness = network.train(&inputs, &targets, GENERATIONS, LEARNING_RATE)?;
    println!("Final fitness: {fitness:.6}");

    let output = network.predict(&inputs)?;
    for i in 0..inputs.rows() {
        println!("Input: {:?} -> Output: {:.4}", inputs.row(i)?, output.get(i, 0)?);
    }
    Ok(())
}
