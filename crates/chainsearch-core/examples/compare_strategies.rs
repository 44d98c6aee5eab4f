//! Strategy comparison example.
//!
//! Runs every search strategy on the same random chain and batch, and prints
//! the replayed reward and the number of visited nodes of each. Exhaustive
//! search gives the optimum the others are measured against.

use chainsearch_core::prelude::*;
use chainsearch_core::testing::{random_features, random_logistic_chain};
use std::sync::Arc;

const DEPTH: usize = 10;
const NUM_FEATURES: usize = 8;
const ROWS: usize = 500;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let chain = Arc::new(random_logistic_chain(DEPTH, NUM_FEATURES, 2024));
    let x = random_features(ROWS, NUM_FEATURES, 7);
    println!("Chain of depth {} over {} rows, order {:?}\n", DEPTH, ROWS, chain.order());

    for loss in [Loss::ExactMatch, Loss::Hamming] {
        println!("=== {} ===\n", loss);
        println!("{:<28} {:>12} {:>14}", "strategy", "reward", "visited/row");

        let configs = [
            StrategyConfig::Greedy,
            StrategyConfig::EpsilonApproximation(EpsilonConfig { epsilon: 0.25 }),
            StrategyConfig::EpsilonApproximation(EpsilonConfig { epsilon: 0.05 }),
            StrategyConfig::BeamSearch(BeamConfig { beam_width: 2 }),
            StrategyConfig::BeamSearch(BeamConfig { beam_width: 8 }),
            StrategyConfig::MonteCarlo(MonteCarloConfig { num_samples: 50, random_seed: Some(1) }),
            StrategyConfig::EfficientMonteCarlo(MonteCarloConfig { num_samples: 50, random_seed: Some(1) }),
            StrategyConfig::from_name("exhaustive_search")?,
        ];

        for config in configs {
            let label = match &config {
                StrategyConfig::EpsilonApproximation(c) => format!("epsilon_approximation({})", c.epsilon),
                StrategyConfig::BeamSearch(c) => format!("beam_search({})", c.beam_width),
                StrategyConfig::MonteCarlo(c) | StrategyConfig::EfficientMonteCarlo(c) => {
                    format!("{}({})", config.name(), c.num_samples)
                }
                other => other.name().to_string(),
            };

            let inferer = Inferer::from_boxed(chain.clone(), config.build(loss)?)
                .with_parallelism(Parallelism::Sharded { shard_size: 64 });
            let out = inferer.infer_with_reward(x.view())?;
            println!("{:<28} {:>12.5} {:>14.1}", label, out.reward, out.visited_nodes);
        }
        println!();
    }

    Ok(())
}
