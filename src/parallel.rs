use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};

/// Worker counts resolved once at startup and handed to every strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concurrency {
    hardware: usize,
    workers: usize,
}

impl Concurrency {
    pub fn new(workers: Option<usize>) -> Self {
        let hardware = num_cpus::get().max(1);
        Self::with_hardware(hardware, workers)
    }

    pub fn with_hardware(hardware: usize, workers: Option<usize>) -> Self {
        Self {
            hardware,
            workers: workers.unwrap_or(hardware).max(1),
        }
    }

    pub fn hardware(&self) -> usize {
        self.hardware
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Worker counts for the dynamic strategy: `workers..=workers + extra` in `step`s.
    pub fn sweep(&self, extra: usize, step: usize) -> Vec<usize> {
        (self.workers..=self.workers + extra)
            .step_by(step.max(1))
            .collect()
    }
}

/// Splits `[0, len)` into `workers` contiguous ranges whose lengths differ by
/// at most one. The first `len % workers` ranges get the extra element.
pub fn partition_ranges(len: usize, workers: usize) -> Result<Vec<Range<usize>>> {
    if workers == 0 {
        bail!("Cannot partition {} items across zero workers", len);
    }

    let per_group = len / workers;
    let mut rest = len % workers;
    let mut ranges = Vec::with_capacity(workers);
    let mut low = 0;

    for _ in 0..workers {
        let mut high = low + per_group;
        if rest > 0 {
            high += 1;
            rest -= 1;
        }
        let high = high.min(len);

        ranges.push(low..high);
        low = high;
    }

    Ok(ranges)
}

/// Shared claim counter for pull-based scheduling. Every index in `[0, len)`
/// is handed out exactly once; the position never moves past `len`.
#[derive(Debug)]
pub struct Cursor {
    next: AtomicUsize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self {
            next: AtomicUsize::new(0),
            len,
        }
    }

    pub fn claim(&self) -> Option<usize> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next < self.len).then_some(next + 1)
            })
            .ok()
    }

    pub fn position(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }

    pub fn is_exhausted(&self) -> bool {
        self.position() >= self.len
    }
}
