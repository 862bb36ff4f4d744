use std::panic::{self, AssertUnwindSafe};
use std::thread;

use anyhow::{anyhow, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use crossbeam::thread::Scope;

use super::panic_error;

/// Write end of a one-shot result channel.
pub struct Promise<T> {
    tx: Sender<thread::Result<T>>,
}

/// Read end of a one-shot result channel; [`Deferred::wait`] blocks until the
/// producer has delivered its outcome.
pub struct Deferred<T> {
    rx: Receiver<thread::Result<T>>,
}

pub fn channel<T>() -> (Promise<T>, Deferred<T>) {
    let (tx, rx) = bounded(1);
    (Promise { tx }, Deferred { rx })
}

impl<T> Promise<T> {
    pub fn set(self, outcome: thread::Result<T>) {
        // The consumer may already have given up on the result.
        let _ = self.tx.send(outcome);
    }
}

impl<T> Deferred<T> {
    pub fn wait(self) -> Result<T> {
        match self.rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(panic_error(payload)),
            Err(_) => Err(anyhow!("Deferred result was dropped before it was set")),
        }
    }
}

/// Runs `f` on a new scoped thread and returns a handle to its outcome. A
/// panic inside `f` is delivered through the handle instead of unwinding the
/// thread.
pub fn spawn_deferred<'env, T, F>(scope: &Scope<'env>, f: F) -> Deferred<T>
where
    F: FnOnce() -> T + Send + 'env,
    T: Send + 'env,
{
    let (promise, deferred) = channel();
    scope.spawn(move |_| promise.set(panic::catch_unwind(AssertUnwindSafe(f))));
    deferred
}
