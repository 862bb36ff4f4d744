use std::io;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use primebench::config::{
    BenchConfig, DEFAULT_COUNT, DEFAULT_LOW, DEFAULT_SWEEP_EXTRA, DEFAULT_SWEEP_STEP,
};
use primebench::{run_suite, Concurrency, Strategy};

#[derive(Parser, Debug)]
#[command(name = "primebench")]
#[command(about = "Compare parallel work-distribution strategies on prime factorization", long_about = None)]
struct Args {
    /// Lowest number of the range (inclusive)
    #[arg(long, default_value_t = DEFAULT_LOW)]
    low: u64,

    /// Width of the range; only its odd numbers are factorized
    #[arg(long, default_value_t = DEFAULT_COUNT)]
    count: u64,

    /// Number of worker threads (defaults to the hardware concurrency)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Additional threads tried by the dynamic strategy
    #[arg(long, default_value_t = DEFAULT_SWEEP_EXTRA)]
    sweep_extra: usize,

    /// Step between thread counts tried by the dynamic strategy
    #[arg(long, default_value_t = DEFAULT_SWEEP_STEP)]
    sweep_step: usize,

    /// Print every factorization after each strategy
    #[arg(short, long)]
    print_results: bool,

    /// Only run the given strategy (repeatable)
    #[arg(short, long, value_enum)]
    strategy: Vec<Strategy>,

    /// Disable progress bar
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let high = args
        .low
        .checked_add(args.count)
        .context("Range end overflows u64")?;

    let strategies = if args.strategy.is_empty() {
        Strategy::ALL.to_vec()
    } else {
        args.strategy
    };

    let config = BenchConfig {
        low: args.low,
        high,
        concurrency: Concurrency::new(args.threads),
        sweep_extra: args.sweep_extra,
        sweep_step: args.sweep_step,
        print_results: args.print_results,
        quiet: args.quiet,
        strategies,
    };
    config.validate()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_suite(&config, &mut out)?;

    Ok(())
}
