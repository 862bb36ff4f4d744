pub mod batch;
pub mod config;
pub mod factors;
pub mod parallel;
pub mod report;
pub mod runner;
pub mod suite;
pub mod timer;

pub use batch::WorkBatch;
pub use config::BenchConfig;
pub use factors::{FactorError, Factorization, PrimeFactors};
pub use parallel::{partition_ranges, Concurrency, Cursor};
pub use runner::Strategy;
pub use suite::run_suite;
pub use timer::Timer;
