use std::sync::Arc;

use parking_lot::Mutex;
use sx_optimizer::{
    BayesianConfig, CallbackObserver, ChannelObserver, GeneticConfig, Objective,
    OptimizationConfig, OptimizationMethod, OptimizationReport, OptimizationRunner, QualityModel,
    RunEvent, RunObserver,
};
use sx_types::{Parameter, ParameterRange, ProcessParameters, SearchSpace};

const METHODS: [OptimizationMethod; 3] = [
    OptimizationMethod::Grid,
    OptimizationMethod::Genetic,
    OptimizationMethod::Bayesian,
];

fn reference_space() -> SearchSpace {
    SearchSpace::new(
        ParameterRange::new(1400.0, 1600.0, 50.0),
        ParameterRange::new(10.0, 120.0, 50.0),
        ParameterRange::new(95.0, 110.0, 5.0),
        ParameterRange::new(250.0, 350.0, 50.0),
    )
}

fn narrow_space() -> SearchSpace {
    SearchSpace::new(
        ParameterRange::new(1450.0, 1520.0, 10.0),
        ParameterRange::new(30.0, 90.0, 10.0),
        ParameterRange::new(98.0, 105.0, 1.0),
        ParameterRange::new(280.0, 320.0, 10.0),
    )
}

/// Captures everything the runner reports.
#[derive(Default)]
struct Recorder {
    evaluations: Vec<(ProcessParameters, f64)>,
    bests: Vec<(usize, f64)>,
    progress: Vec<f64>,
    lines: Vec<String>,
}

impl RunObserver for Recorder {
    fn on_progress(&mut self, fraction: f64) {
        self.progress.push(fraction);
    }

    fn on_log_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn on_evaluation(&mut self, params: &ProcessParameters, quality: f64) {
        self.evaluations.push((*params, quality));
    }

    fn on_new_best(&mut self, evaluations: usize, _params: &ProcessParameters, quality: f64) {
        self.bests.push((evaluations, quality));
    }
}

fn run(config: OptimizationConfig, space: &SearchSpace) -> (OptimizationReport, Recorder) {
    let mut recorder = Recorder::default();
    let report = OptimizationRunner::new(config)
        .run_with_observer(space, &mut recorder)
        .expect("run succeeds");
    (report, recorder)
}

#[test]
fn every_evaluated_point_lies_inside_the_box() {
    let space = narrow_space();
    for method in METHODS {
        let (report, recorder) = run(OptimizationConfig::new(method).with_seed(17), &space);
        assert_eq!(recorder.evaluations.len(), report.result.evaluations);
        for (params, _) in &recorder.evaluations {
            assert!(space.contains(params), "{method}: {params} escaped the box");
        }
    }
}

#[test]
fn best_quality_never_regresses() {
    for method in METHODS {
        let (report, recorder) = run(OptimizationConfig::new(method).with_seed(5), &narrow_space());

        assert!(!recorder.bests.is_empty());
        for pair in recorder.bests.windows(2) {
            assert!(pair[1].0 > pair[0].0);
            assert!(pair[1].1 > pair[0].1, "{method}: best went {} -> {}", pair[0].1, pair[1].1);
        }

        // the reported best is the maximum of everything evaluated
        let max = recorder
            .evaluations
            .iter()
            .map(|(_, q)| *q)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(report.result.best_quality, Some(max));
        assert_eq!(recorder.bests.last().map(|b| b.1), Some(max));
    }
}

#[test]
fn progress_is_monotone_and_completes() {
    for method in METHODS {
        let (_, recorder) = run(OptimizationConfig::new(method).with_seed(2), &reference_space());
        assert!(recorder.progress.iter().all(|f| (0.0..=1.0).contains(f)));
        assert!(recorder.progress.windows(2).all(|w| w[1] >= w[0]));
        assert!((recorder.progress.last().unwrap() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn grid_search_is_exhaustive_and_deterministic() {
    let space = reference_space();
    let (first, _) = run(OptimizationConfig::new(OptimizationMethod::Grid), &space);
    let (second, _) = run(OptimizationConfig::new(OptimizationMethod::Grid), &space);

    assert_eq!(first.result.evaluations, 5 * 3 * 4 * 3);
    assert_eq!(first.result.evaluations, space.grid_size().unwrap());
    assert_eq!(first.result.best_params, second.result.best_params);
    assert_eq!(first.result.best_quality, second.result.best_quality);
    assert_eq!(first.result.log, second.result.log);

    let best = first.result.best_params.unwrap();
    for parameter in Parameter::ALL {
        let values = space.range(parameter).grid_values().unwrap();
        assert!(values.contains(&best.get(parameter)), "{parameter} = {}", best.get(parameter));
    }
    assert!([1400.0, 1450.0, 1500.0, 1550.0, 1600.0].contains(&best.temperature));
}

#[test]
fn grid_search_finds_the_true_grid_maximum() {
    let space = reference_space();
    let model = QualityModel::new();
    let (report, recorder) = run(OptimizationConfig::new(OptimizationMethod::Grid), &space);

    let brute = recorder
        .evaluations
        .iter()
        .map(|(p, _)| model.evaluate(p))
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(report.result.best_quality, Some(brute));
}

#[test]
fn grid_ties_keep_the_earliest_point() {
    // Two temperature slabs share the maximum; 1450 is enumerated first.
    let objective = |p: &ProcessParameters| {
        if p.temperature == 1450.0 || p.temperature == 1550.0 {
            390.0
        } else {
            320.0
        }
    };
    let runner = OptimizationRunner::new(OptimizationConfig::new(OptimizationMethod::Grid))
        .with_objective(objective);
    let report = runner.run(&reference_space()).unwrap();

    assert_eq!(
        report.result.best_params,
        Some(ProcessParameters::new(1450.0, 10.0, 95.0, 250.0))
    );
    assert_eq!(report.result.best_quality, Some(390.0));
}

#[test]
fn genetic_budget_is_independent_of_box_size() {
    for space in [reference_space(), narrow_space(), SearchSpace::industrial()] {
        let (report, _) = run(
            OptimizationConfig::new(OptimizationMethod::Genetic).with_seed(8),
            &space,
        );
        assert_eq!(report.result.evaluations, 50 * (100 + 1));
        assert!(!report.result.cancelled);
    }
}

#[test]
fn bayesian_budget_counts_only_real_evaluations() {
    for space in [reference_space(), SearchSpace::industrial()] {
        let (report, recorder) = run(
            OptimizationConfig::new(OptimizationMethod::Bayesian).with_seed(8),
            &space,
        );
        assert_eq!(report.result.evaluations, 50);
        assert_eq!(recorder.evaluations.len(), 50);
    }
}

#[test]
fn seeded_stochastic_runs_are_reproducible() {
    for method in [OptimizationMethod::Genetic, OptimizationMethod::Bayesian] {
        let (a, _) = run(OptimizationConfig::new(method).with_seed(99), &narrow_space());
        let (b, _) = run(OptimizationConfig::new(method).with_seed(99), &narrow_space());
        assert_eq!(a.result.best_params, b.result.best_params);
        assert_eq!(a.result.best_quality, b.result.best_quality);
        assert_eq!(a.result.log, b.result.log);
    }
}

#[test]
fn parallel_scoring_does_not_change_results() {
    for method in [OptimizationMethod::Grid, OptimizationMethod::Genetic] {
        let serial = OptimizationConfig::new(method).with_seed(31);
        let parallel = serial.clone().with_parallel(true);
        let (a, ra) = run(serial, &reference_space());
        let (b, rb) = run(parallel, &reference_space());
        assert_eq!(a.result.best_params, b.result.best_params);
        assert_eq!(a.result.log, b.result.log);
        assert_eq!(ra.evaluations, rb.evaluations);
    }
}

#[test]
fn cancelling_after_ten_generations_keeps_best_so_far() {
    struct CancelAfter {
        token: sx_optimizer::CancellationToken,
        generations_seen: usize,
        qualities: Vec<f64>,
    }

    impl RunObserver for CancelAfter {
        fn on_progress(&mut self, _fraction: f64) {
            self.generations_seen += 1;
            if self.generations_seen == 10 {
                self.token.cancel();
            }
        }

        fn on_evaluation(&mut self, _params: &ProcessParameters, quality: f64) {
            self.qualities.push(quality);
        }
    }

    let runner =
        OptimizationRunner::new(OptimizationConfig::new(OptimizationMethod::Genetic).with_seed(12));
    let mut observer = CancelAfter {
        token: runner.cancellation_token(),
        generations_seen: 0,
        qualities: Vec::new(),
    };
    let report = runner
        .run_with_observer(&SearchSpace::industrial(), &mut observer)
        .unwrap();

    assert!(report.result.cancelled);
    assert_eq!(report.result.evaluations, 50 + 10 * 50);
    let max = observer.qualities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(report.result.best_quality, Some(max));
    assert!(report
        .result
        .log
        .iter()
        .any(|l| l == "Run cancelled after 550 evaluations"));
}

#[test]
fn cancelling_grid_search_stops_on_a_yield_boundary() {
    let runner = OptimizationRunner::new(OptimizationConfig::new(OptimizationMethod::Grid));
    let token = runner.cancellation_token();
    let mut evaluations = 0usize;
    let mut observer = CallbackObserver::new().with_progress(move |_| {
        evaluations += 1;
        if evaluations == 250 {
            token.cancel();
        }
    });

    let report = runner
        .run_with_observer(&SearchSpace::industrial(), &mut observer)
        .unwrap();
    assert!(report.result.cancelled);
    assert_eq!(report.result.evaluations, 300);
    assert!(report.result.best_quality.is_some());
}

#[test]
fn cancelling_bayesian_stops_after_a_multiple_of_five_iterations() {
    let runner =
        OptimizationRunner::new(OptimizationConfig::new(OptimizationMethod::Bayesian).with_seed(3));
    let token = runner.cancellation_token();
    let mut observer = CallbackObserver::new().with_progress(move |fraction| {
        // 10 warm-up + 2 guided evaluations
        if fraction >= 12.0 / 50.0 {
            token.cancel();
        }
    });

    let report = runner
        .run_with_observer(&reference_space(), &mut observer)
        .unwrap();
    assert!(report.result.cancelled);
    assert_eq!(report.result.evaluations, 10 + 5);
}

#[test]
fn cancelling_after_the_last_yield_point_completes_the_run() {
    // Each threshold falls after the final checkpoint that precedes the end:
    // grid batch 2 of 2, genetic generation 91+, bayesian iteration 36+.
    let cases = [
        (OptimizationMethod::Grid, 0.6, 180),
        (OptimizationMethod::Genetic, 0.9, 5050),
        (OptimizationMethod::Bayesian, 0.91, 50),
    ];

    for (method, threshold, budget) in cases {
        let runner = OptimizationRunner::new(OptimizationConfig::new(method).with_seed(8));
        let token = runner.cancellation_token();
        let mut observer = CallbackObserver::new().with_progress(move |fraction| {
            if fraction > threshold {
                token.cancel();
            }
        });

        let report = runner
            .run_with_observer(&reference_space(), &mut observer)
            .unwrap();
        assert!(runner.cancellation_token().is_cancelled(), "{method}");
        assert!(!report.result.cancelled, "{method}");
        assert_eq!(report.result.evaluations, budget, "{method}");
        assert!(
            !report.result.log.iter().any(|l| l.starts_with("Run cancelled")),
            "{method}"
        );
    }
}

#[test]
fn non_finite_evaluations_are_rejected_not_fatal() {
    // Below 1400 °C the temperature term is NaN.
    let space = reference_space().with_range(
        Parameter::Temperature,
        ParameterRange::new(1300.0, 1500.0, 100.0),
    );
    let (report, recorder) = run(OptimizationConfig::new(OptimizationMethod::Grid), &space);

    assert_eq!(report.result.evaluations, 3 * 3 * 4 * 3);
    assert_eq!(report.result.rejected_evaluations, 3 * 4 * 3);
    let best = report.result.best_params.unwrap();
    assert!(best.temperature >= 1400.0);
    assert!(report.result.best_quality.unwrap().is_finite());
    assert!(recorder
        .lines
        .iter()
        .any(|l| l.starts_with("Warning: rejected non-finite quality")));
}

#[test]
fn log_lines_reach_callbacks_and_result_alike() {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let mut observer = CallbackObserver::new().with_log_line(move |line| sink.lock().push(line.to_string()));

    let report = OptimizationRunner::new(OptimizationConfig::new(OptimizationMethod::Bayesian).with_seed(6))
        .run_with_observer(&reference_space(), &mut observer)
        .unwrap();

    assert_eq!(*lines.lock(), report.result.log);
    assert_eq!(report.result.log[0], "Bayesian optimization started: 50 iterations");
    assert!(report.result.log[1].starts_with("Initial samples: best quality = "));
    assert_eq!(
        report.result.log.last().unwrap(),
        "Bayesian optimization finished: 50 evaluations"
    );
}

#[test]
fn channel_observer_streams_to_another_thread() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let consumer = std::thread::spawn(move || rx.iter().collect::<Vec<RunEvent>>());

    let config = OptimizationConfig::new(OptimizationMethod::Genetic)
        .with_seed(1)
        .with_genetic(GeneticConfig {
            population_size: 10,
            generations: 20,
            ..GeneticConfig::default()
        });
    let report = {
        let mut observer = ChannelObserver::new(tx);
        OptimizationRunner::new(config)
            .run_with_observer(&narrow_space(), &mut observer)
            .unwrap()
    };

    let events = consumer.join().unwrap();
    let progress = events
        .iter()
        .filter(|e| matches!(e, RunEvent::Progress { .. }))
        .count();
    assert_eq!(progress, 20);
    assert_eq!(report.result.evaluations, 10 * 21);

    let last_best = events.iter().rev().find_map(|e| match e {
        RunEvent::NewBest { quality, .. } => Some(*quality),
        _ => None,
    });
    assert_eq!(last_best, report.result.best_quality);
}

#[test]
fn custom_bayesian_budget_is_respected() {
    let config = OptimizationConfig::new(OptimizationMethod::Bayesian)
        .with_seed(10)
        .with_bayesian(BayesianConfig {
            initial_samples: 4,
            iterations: 6,
            candidates: 20,
            ..BayesianConfig::default()
        });
    let (report, _) = run(config, &narrow_space());
    assert_eq!(report.result.evaluations, 10);
}
