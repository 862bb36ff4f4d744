use std::time::{Duration, Instant};

/// Wall-clock stopwatch for the orchestrating thread.
#[derive(Debug, Clone)]
pub struct Timer {
    started: Instant,
    stopped: Option<Duration>,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
        }
    }

    pub fn start(&mut self) {
        self.started = Instant::now();
        self.stopped = None;
    }

    pub fn stop(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        self.stopped = Some(elapsed);
        elapsed
    }

    /// Time between start and stop, or since start while still running.
    pub fn elapsed(&self) -> Duration {
        self.stopped.unwrap_or_else(|| self.started.elapsed())
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed().as_millis()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
