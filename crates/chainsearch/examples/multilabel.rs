//! Multi-label prediction example.
//!
//! Builds a small chain by hand, then predicts with a predictor configured
//! from JSON and with one configured through the builder.

use anyhow::Result;
use chainsearch::prelude::*;
use ndarray::array;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Three labels over two features, fitted elsewhere. The chain decides
    // label 2 first, then label 0, then label 1.
    let chain = Arc::new(ChainModel::new(
        vec![
            Box::new(LogisticEstimator::new(array![1.5, -0.5], 0.1)) as Box<dyn Estimator>,
            Box::new(LogisticEstimator::new(array![-1.0, 2.0, 1.2], -0.3)),
            Box::new(LogisticEstimator::new(array![0.4, 0.4, -2.0, 1.5], 0.0)),
        ],
        vec![2, 0, 1],
    )?);

    let x = array![[0.2, 0.9], [-1.0, 0.1], [1.3, -0.4], [0.0, 0.0]];

    let config: SearchConfig = serde_json::from_str(
        r#"{ "loss": "exact_match", "method": "exhaustive_search" }"#,
    )?;
    let exact = ChainPredictor::from_config(chain.clone(), config)?;
    let optimum = exact.infer_with_reward(x.view())?;
    println!("exhaustive: reward {:.4}, {:.1} nodes/row", optimum.reward, optimum.visited_nodes);
    println!("{:?}\n", optimum.prediction);

    let predictors = [
        ChainPredictor::builder(chain.clone()).method("greedy"),
        ChainPredictor::builder(chain.clone()).method("beam_search").beam_width(2),
        ChainPredictor::builder(chain.clone())
            .method("efficient_monte_carlo")
            .num_samples(32)
            .random_seed(11),
    ];

    for builder in predictors {
        let predictor = builder.build()?;
        let out = predictor.infer_with_reward(x.view())?;
        println!(
            "{}: reward {:.4}, {:.1} nodes/row, agrees with optimum: {}",
            predictor.config().strategy.name(),
            out.reward,
            out.visited_nodes,
            out.prediction == optimum.prediction
        );
    }

    Ok(())
}
