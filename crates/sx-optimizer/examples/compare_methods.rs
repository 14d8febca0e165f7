//! Runs all three strategies on the industrial search space and prints a
//! JSON report for each.
//!
//! `RUST_LOG=sx_optimizer=debug cargo run --example compare_methods`

use sx_optimizer::{CallbackObserver, OptimizationConfig, OptimizationMethod, OptimizationRunner};
use sx_types::{Parameter, ParameterRange, SearchSpace};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A coarser grid than the industrial default keeps grid search quick.
    let space = SearchSpace::industrial()
        .with_range(Parameter::Pressure, ParameterRange::new(95.0, 110.0, 2.5))
        .with_range(Parameter::Temperature, ParameterRange::new(1400.0, 1600.0, 10.0));

    for method in [
        OptimizationMethod::Grid,
        OptimizationMethod::Genetic,
        OptimizationMethod::Bayesian,
    ] {
        let config = OptimizationConfig::new(method)
            .with_seed(2024)
            .with_parallel(true);
        let runner = OptimizationRunner::new(config);
        let mut last_decile = 0;
        let mut observer = CallbackObserver::new().with_progress(|fraction| {
            let decile = (fraction * 10.0) as u32;
            if decile > last_decile {
                last_decile = decile;
                eprintln!("{:>22}: {:>3}%", method.display_name(), decile * 10);
            }
        });

        let report = runner.run_with_observer(&space, &mut observer)?;
        println!("{}", report.to_json()?);
    }

    Ok(())
}
