use std::io::Write;

use anyhow::{ensure, Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::batch::WorkBatch;
use crate::config::BenchConfig;
use crate::factors::Factorization;
use crate::report::{create_progress_bar, format_ms, Summary};
use crate::runner::{self, Strategy};
use crate::timer::Timer;

/// Runs the sequential baseline followed by every selected strategy and
/// writes the report to `out`. Each parallel run must reproduce the
/// baseline's factorizations exactly.
pub fn run_suite<W: Write>(config: &BenchConfig, out: &mut W) -> Result<Summary> {
    config.validate()?;

    let mut batch = WorkBatch::odd_in_range(config.low, config.high)?;
    let hardware = config.concurrency.hardware();

    info!(
        low = config.low,
        high = config.high,
        numbers = batch.len(),
        hardware,
        workers = config.workers(),
        "benchmark configured"
    );

    writeln!(
        out,
        "Prime factors of the odd numbers in [{}, {})\n",
        config.low, config.high
    )?;
    writeln!(out, "Hardware concurrency: {}", hardware)?;

    let mut summary = Summary::new();
    let mut timer = Timer::new();

    writeln!(out, "\nSequential:")?;
    timer.start();
    runner::run_sequential(&batch);
    let elapsed = timer.stop();

    for pf in &batch {
        writeln!(out, "{}", pf)?;
    }
    writeln!(out, "\nSequential: {}", format_ms(elapsed))?;
    summary.set_baseline(elapsed);
    summary.record(Strategy::Sequential.label(batch.len(), 1), elapsed);

    let baseline = batch.factorizations();
    let plan = plan_runs(config);
    let progress = if config.quiet {
        None
    } else {
        Some(create_progress_bar(plan.len())?)
    };

    writeln!(out)?;
    for (strategy, workers) in plan {
        let label = strategy.label(batch.len(), workers);
        if let Some(pb) = &progress {
            pb.set_message(label.clone());
        }

        batch.clear_all();
        timer.start();
        runner::run(strategy, &batch, workers).with_context(|| format!("{} failed", label))?;
        let elapsed = timer.stop();

        verify(&batch, &baseline, &label)?;
        debug!(%label, ?elapsed, cost = ?batch.total_compute_time(), "run verified");

        with_progress(progress.as_ref(), || -> Result<()> {
            writeln!(out, "{}: {}", label, format_ms(elapsed))?;
            if config.print_results {
                for pf in &batch {
                    writeln!(out, "{}", pf)?;
                }
            }
            Ok(())
        })?;

        summary.record(label, elapsed);
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    summary.write_table(out)?;
    Ok(summary)
}

/// Runs after the baseline, in suite order. The dynamic strategy appears once
/// per worker count of the sweep.
pub fn plan_runs(config: &BenchConfig) -> Vec<(Strategy, usize)> {
    let mut plan: Vec<(Strategy, usize)> = Strategy::ALL
        .into_iter()
        .filter(|&strategy| {
            strategy != Strategy::Sequential
                && strategy != Strategy::DynamicPull
                && config.runs(strategy)
        })
        .map(|strategy| (strategy, config.workers()))
        .collect();

    if config.runs(Strategy::DynamicPull) {
        plan.extend(
            config
                .sweep()
                .into_iter()
                .map(|workers| (Strategy::DynamicPull, workers)),
        );
    }

    plan
}

fn verify(batch: &WorkBatch, baseline: &[Factorization], label: &str) -> Result<()> {
    ensure!(batch.all_computed(), "{} left elements uncomputed", label);
    ensure!(
        batch.factorizations() == baseline,
        "{} disagrees with the sequential baseline",
        label
    );
    Ok(())
}

fn with_progress<R>(progress: Option<&ProgressBar>, f: impl FnOnce() -> R) -> R {
    match progress {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::Concurrency;

    fn small_config() -> BenchConfig {
        BenchConfig {
            low: 9,
            high: 20,
            concurrency: Concurrency::with_hardware(2, None),
            sweep_extra: 4,
            sweep_step: 2,
            quiet: true,
            ..BenchConfig::default()
        }
    }

    #[test]
    fn test_plan_order() {
        let plan = plan_runs(&small_config());
        assert_eq!(
            plan,
            vec![
                (Strategy::DataParallel, 2),
                (Strategy::ThreadPerItem, 2),
                (Strategy::FuturePerItem, 2),
                (Strategy::StaticThreads, 2),
                (Strategy::StaticFutures, 2),
                (Strategy::DynamicPull, 2),
                (Strategy::DynamicPull, 4),
                (Strategy::DynamicPull, 6),
            ]
        );
    }

    #[test]
    fn test_plan_filtered() {
        let config = BenchConfig {
            strategies: vec![Strategy::StaticThreads],
            ..small_config()
        };
        assert_eq!(plan_runs(&config), vec![(Strategy::StaticThreads, 2)]);
    }

    #[test]
    fn test_suite_report() {
        let mut out = Vec::new();
        let summary = run_suite(&small_config(), &mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("Hardware concurrency: 2"));
        assert!(report.contains("         9 = 3^2"));
        assert!(report.contains("        15 = 3 * 5"));
        assert!(report.contains("        19 = 19"));
        assert!(report.contains("Dynamic pull (6 threads): "));
        assert_eq!(summary.runs().len(), 9);
        assert_eq!(summary.baseline(), Some(summary.runs()[0].elapsed));
    }

    #[test]
    fn test_suite_rejects_empty_range_below_two() {
        let config = BenchConfig {
            low: 0,
            high: 1,
            ..small_config()
        };
        let mut out = Vec::new();
        assert!(run_suite(&config, &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn test_suite_rejects_invalid_range() {
        let config = BenchConfig {
            low: 0,
            high: 4,
            ..small_config()
        };
        let mut out = Vec::new();
        assert!(run_suite(&config, &mut out).is_err());
    }
}
