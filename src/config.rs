use anyhow::{bail, Result};

use crate::parallel::Concurrency;
use crate::runner::Strategy;

pub const DEFAULT_LOW: u64 = 1_000_000_001;
pub const DEFAULT_COUNT: u64 = 50;
pub const DEFAULT_SWEEP_EXTRA: usize = 16;
pub const DEFAULT_SWEEP_STEP: usize = 2;

/// Fully resolved settings of one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Inclusive lower bound of the number range
    pub low: u64,
    /// Exclusive upper bound of the number range
    pub high: u64,
    pub concurrency: Concurrency,
    pub sweep_extra: usize,
    pub sweep_step: usize,
    /// Print every element after each strategy, not only after the baseline
    pub print_results: bool,
    pub quiet: bool,
    pub strategies: Vec<Strategy>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW,
            high: DEFAULT_LOW + DEFAULT_COUNT,
            concurrency: Concurrency::new(None),
            sweep_extra: DEFAULT_SWEEP_EXTRA,
            sweep_step: DEFAULT_SWEEP_STEP,
            print_results: false,
            quiet: false,
            strategies: Strategy::ALL.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.low < 2 {
            bail!("Range must start at 2 or above, got low = {}", self.low);
        }
        if self.low >= self.high {
            bail!("Empty range: low ({}) must be below high ({})", self.low, self.high);
        }
        if self.sweep_step == 0 {
            bail!("Sweep step must be at least 1");
        }
        if self.strategies.is_empty() {
            bail!("No strategy selected");
        }
        Ok(())
    }

    pub fn workers(&self) -> usize {
        self.concurrency.workers()
    }

    pub fn sweep(&self) -> Vec<usize> {
        self.concurrency.sweep(self.sweep_extra, self.sweep_step)
    }

    pub fn runs(&self, strategy: Strategy) -> bool {
        self.strategies.contains(&strategy)
    }
}
