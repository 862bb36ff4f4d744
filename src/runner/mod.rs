//! Execution strategies that factorize every element of a [`WorkBatch`].
//!
//! Every runner blocks until all elements are computed and differs from the
//! others only in how elements are handed to threads. A panicking worker is
//! reported as an error at the point where the runner waits for it.

pub mod deferred;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use crossbeam::thread::ScopedJoinHandle;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::batch::WorkBatch;
use crate::factors::PrimeFactors;
use crate::parallel::{partition_ranges, Cursor};

use self::deferred::spawn_deferred;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Strategy {
    /// Single thread, batch order
    Sequential,
    /// rayon parallel iterator
    DataParallel,
    /// One OS thread per element
    ThreadPerItem,
    /// One deferred result per element
    FuturePerItem,
    /// One thread per precomputed range
    StaticThreads,
    /// One deferred result per precomputed range
    StaticFutures,
    /// Workers pull indices from a shared cursor
    DynamicPull,
}

impl Strategy {
    pub const ALL: [Strategy; 7] = [
        Strategy::Sequential,
        Strategy::DataParallel,
        Strategy::ThreadPerItem,
        Strategy::FuturePerItem,
        Strategy::StaticThreads,
        Strategy::StaticFutures,
        Strategy::DynamicPull,
    ];

    pub fn label(&self, batch_len: usize, workers: usize) -> String {
        match self {
            Strategy::Sequential => "Sequential".to_string(),
            Strategy::DataParallel => "Data-parallel for_each".to_string(),
            Strategy::ThreadPerItem => format!("Thread per item ({} threads)", batch_len),
            Strategy::FuturePerItem => format!("Future per item ({} futures)", batch_len),
            Strategy::StaticThreads => format!("Static groups, threads ({} groups)", workers),
            Strategy::StaticFutures => format!("Static groups, futures ({} groups)", workers),
            Strategy::DynamicPull => format!("Dynamic pull ({} threads)", workers),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_else(|| format!("{:?}", self));
        f.write_str(&name)
    }
}

/// Runs `strategy` over `batch`. `workers` is ignored by strategies whose
/// thread count is fixed by the batch.
pub fn run(strategy: Strategy, batch: &WorkBatch, workers: usize) -> Result<()> {
    match strategy {
        Strategy::Sequential => {
            run_sequential(batch);
            Ok(())
        }
        Strategy::DataParallel => run_data_parallel(batch),
        Strategy::ThreadPerItem => run_thread_per_item(batch),
        Strategy::FuturePerItem => run_future_per_item(batch),
        Strategy::StaticThreads => run_static_threads(batch, workers),
        Strategy::StaticFutures => run_static_futures(batch, workers),
        Strategy::DynamicPull => run_dynamic_pull(batch, workers).map(|_| ()),
    }
}

pub fn run_sequential(batch: &WorkBatch) {
    batch.iter().for_each(PrimeFactors::compute);
}

pub fn run_data_parallel(batch: &WorkBatch) -> Result<()> {
    data_parallel(batch.items(), &PrimeFactors::compute)
}

pub fn run_thread_per_item(batch: &WorkBatch) -> Result<()> {
    thread_per_item(batch.items(), &PrimeFactors::compute)
}

pub fn run_future_per_item(batch: &WorkBatch) -> Result<()> {
    future_per_item(batch.items(), &PrimeFactors::compute)
}

pub fn run_static_threads(batch: &WorkBatch, workers: usize) -> Result<()> {
    static_threads(batch.items(), workers, &PrimeFactors::compute)
}

pub fn run_static_futures(batch: &WorkBatch, workers: usize) -> Result<()> {
    static_futures(batch.items(), workers, &PrimeFactors::compute)
}

/// Returns how many elements each worker claimed.
pub fn run_dynamic_pull(batch: &WorkBatch, workers: usize) -> Result<Vec<usize>> {
    dynamic_pull(batch.items(), workers, &PrimeFactors::compute)
}

fn data_parallel<F>(items: &[PrimeFactors], job: &F) -> Result<()>
where
    F: Fn(&PrimeFactors) + Sync,
{
    // rayon re-raises a worker panic on the calling thread
    panic::catch_unwind(AssertUnwindSafe(|| {
        items.par_iter().for_each(|item| job(item));
    }))
    .map_err(panic_error)
}

fn thread_per_item<F>(items: &[PrimeFactors], job: &F) -> Result<()>
where
    F: Fn(&PrimeFactors) + Sync,
{
    crossbeam::thread::scope(|s| {
        let handles: Vec<_> = items
            .iter()
            .map(|item| s.spawn(move |_| job(item)))
            .collect();

        join_all(handles).map(|_| ())
    })
    .map_err(panic_error)?
}

fn future_per_item<F>(items: &[PrimeFactors], job: &F) -> Result<()>
where
    F: Fn(&PrimeFactors) + Sync,
{
    crossbeam::thread::scope(|s| {
        let results: Vec<_> = items
            .iter()
            .map(|item| spawn_deferred(s, move || job(item)))
            .collect();

        debug!(count = results.len(), "waiting on deferred results");
        for result in results {
            result.wait()?;
        }
        Ok(())
    })
    .map_err(panic_error)?
}

fn static_threads<F>(items: &[PrimeFactors], workers: usize, job: &F) -> Result<()>
where
    F: Fn(&PrimeFactors) + Sync,
{
    let ranges = partition_ranges(items.len(), workers)?;

    crossbeam::thread::scope(|s| {
        let handles: Vec<_> = ranges
            .into_iter()
            .filter(|range| !range.is_empty())
            .map(|range| {
                info!(low = range.start, high = range.end, "starting group thread");
                let group = &items[range];
                s.spawn(move |_| {
                    debug!(
                        thread = ?std::thread::current().id(),
                        len = group.len(),
                        "group started"
                    );
                    group.iter().for_each(job);
                })
            })
            .collect();

        join_all(handles).map(|_| ())
    })
    .map_err(panic_error)?
}

fn static_futures<F>(items: &[PrimeFactors], workers: usize, job: &F) -> Result<()>
where
    F: Fn(&PrimeFactors) + Sync,
{
    let ranges = partition_ranges(items.len(), workers)?;

    crossbeam::thread::scope(|s| {
        let results: Vec<_> = ranges
            .into_iter()
            .filter(|range| !range.is_empty())
            .map(|range| {
                info!(low = range.start, high = range.end, "dispatching group future");
                let group = &items[range];
                spawn_deferred(s, move || group.iter().for_each(job))
            })
            .collect();

        for result in results {
            result.wait()?;
        }
        Ok(())
    })
    .map_err(panic_error)?
}

fn dynamic_pull<F>(items: &[PrimeFactors], workers: usize, job: &F) -> Result<Vec<usize>>
where
    F: Fn(&PrimeFactors) + Sync,
{
    if workers == 0 {
        anyhow::bail!("Dynamic scheduling needs at least one worker");
    }

    let cursor = Cursor::new(items.len());
    let cursor = &cursor;

    let claimed = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = (0..workers)
            .map(|worker_id| {
                s.spawn(move |_| {
                    let mut claimed = 0;
                    while let Some(index) = cursor.claim() {
                        job(&items[index]);
                        claimed += 1;
                    }
                    debug!(worker_id, claimed, "worker finished");
                    claimed
                })
            })
            .collect();

        join_all(handles)
    })
    .map_err(panic_error)??;

    debug_assert!(cursor.is_exhausted());
    Ok(claimed)
}

/// Joins every handle before reporting, so the first failure in spawn order
/// is the one surfaced.
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, T>>) -> Result<Vec<T>> {
    let outcomes: Vec<_> = handles.into_iter().map(|handle| handle.join()).collect();

    outcomes
        .into_iter()
        .map(|outcome| outcome.map_err(panic_error))
        .collect()
}

pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Ok(payloads) = payload.downcast::<Vec<Box<dyn Any + Send + 'static>>>() {
        // crossbeam's scope collects the panics of threads nobody joined
        return match (*payloads).into_iter().next() {
            Some(first) => panic_error(first),
            None => anyhow!("worker panicked: unknown panic payload"),
        };
    } else {
        "unknown panic payload".to_string()
    };

    anyhow!("worker panicked: {}", message)
}
