use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Formats a duration in whole milliseconds; anything under 1ms prints as `<1ms`.
pub fn format_ms(elapsed: Duration) -> String {
    match elapsed.as_millis() {
        0 => "<1ms".to_string(),
        ms => format!("{}ms", ms),
    }
}

pub fn create_progress_bar(total_runs: usize) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total_runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} runs {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub label: String,
    pub elapsed: Duration,
}

/// Timings of every run in a suite, compared against the sequential baseline.
#[derive(Debug, Default)]
pub struct Summary {
    baseline: Option<Duration>,
    runs: Vec<RunRecord>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_baseline(&mut self, elapsed: Duration) {
        self.baseline = Some(elapsed);
    }

    pub fn baseline(&self) -> Option<Duration> {
        self.baseline
    }

    pub fn record(&mut self, label: impl Into<String>, elapsed: Duration) {
        self.runs.push(RunRecord {
            label: label.into(),
            elapsed,
        });
    }

    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn speedup(&self, elapsed: Duration) -> Option<f64> {
        let baseline = self.baseline?;
        if elapsed.is_zero() {
            return None;
        }
        Some(baseline.as_secs_f64() / elapsed.as_secs_f64())
    }

    pub fn write_table<W: Write>(&self, out: &mut W) -> Result<()> {
        let width = self
            .runs
            .iter()
            .map(|run| run.label.len())
            .max()
            .unwrap_or(0);

        writeln!(out, "\n{:<width$}  {:>10}  {:>8}", "Strategy", "Time", "Speedup")?;
        for run in &self.runs {
            let speedup = self
                .speedup(run.elapsed)
                .map(|s| format!("{:.2}x", s))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                out,
                "{:<width$}  {:>10}  {:>8}",
                run.label,
                format_ms(run.elapsed),
                speedup
            )?;
        }
        Ok(())
    }
}
