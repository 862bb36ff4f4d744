use std::fmt;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::report::format_ms;

/// Column at which the timing of a report line starts.
pub const REPORT_WIDTH: usize = 50;

/// Ascending `(prime, exponent)` pairs.
pub type Factorization = Vec<(u64, u32)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorError {
    InvalidArgument { value: u64 },
}

impl fmt::Display for FactorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorError::InvalidArgument { value } => {
                write!(f, "invalid argument: PrimeFactors requires n >= 2, got {}", value)
            }
        }
    }
}

impl std::error::Error for FactorError {}

#[derive(Debug)]
struct Computed {
    factors: Factorization,
    elapsed: Duration,
}

/// A positive integer together with its lazily computed prime factorization.
///
/// The factorization is computed at most once between two calls to
/// [`PrimeFactors::clear`]; later calls to [`PrimeFactors::compute`] are no-ops
/// and keep the elapsed time of the first computation.
#[derive(Debug)]
pub struct PrimeFactors {
    value: u64,
    computed: OnceLock<Computed>,
}

impl PrimeFactors {
    pub fn new(value: u64) -> Result<Self> {
        if value < 2 {
            return Err(FactorError::InvalidArgument { value }.into());
        }

        Ok(Self {
            value,
            computed: OnceLock::new(),
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn compute(&self) {
        self.get();
    }

    pub fn is_computed(&self) -> bool {
        self.computed.get().is_some()
    }

    /// Returns the factorization, computing it first if necessary.
    pub fn factors(&self) -> &[(u64, u32)] {
        &self.get().factors
    }

    /// Duration of the most recent computation, zero before the first one.
    pub fn elapsed(&self) -> Duration {
        self.computed
            .get()
            .map_or(Duration::ZERO, |computed| computed.elapsed)
    }

    pub fn clear(&mut self) {
        self.computed.take();
    }

    fn get(&self) -> &Computed {
        self.computed.get_or_init(|| {
            let start = Instant::now();
            let factors = trial_division(self.value);
            let elapsed = start.elapsed();

            tracing::trace!(value = self.value, ?elapsed, "factorized");

            Computed { factors, elapsed }
        })
    }
}

impl fmt::Display for PrimeFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .factors()
            .iter()
            .map(|&(prime, exponent)| {
                if exponent > 1 {
                    format!("{}^{}", prime, exponent)
                } else {
                    prime.to_string()
                }
            })
            .collect();

        let line = format!("{:>10} = {}", self.value, terms.join(" * "));
        let padding = REPORT_WIDTH.saturating_sub(line.len()).max(1);

        write!(f, "{}{:padding$}({})", line, "", format_ms(self.elapsed()))
    }
}

fn divide_out(n: &mut u64, divisor: u64) -> u32 {
    let mut multiplicity = 0;

    while *n % divisor == 0 {
        multiplicity += 1;
        *n /= divisor;
    }

    multiplicity
}

// Candidates run all the way up to the remaining cofactor: a large prime
// cofactor costs a full scan, which is what makes per-item cost uneven.
fn trial_division(value: u64) -> Factorization {
    let mut n = value;
    let mut factors = Vec::new();

    let twos = divide_out(&mut n, 2);
    if twos > 0 {
        factors.push((2, twos));
    }

    let mut k = 3;
    while n > 1 {
        if n % k == 0 {
            factors.push((k, divide_out(&mut n, k)));
        }
        k += 2;
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(factors: &[(u64, u32)]) -> u64 {
        factors.iter().map(|&(p, k)| p.pow(k)).product()
    }

    #[test]
    fn test_factorize_360() {
        let pf = PrimeFactors::new(360).unwrap();
        assert_eq!(pf.factors(), &[(2, 3), (3, 2), (5, 1)]);
    }

    #[test]
    fn test_factorize_primes() {
        assert_eq!(PrimeFactors::new(97).unwrap().factors(), &[(97, 1)]);
        assert_eq!(PrimeFactors::new(2).unwrap().factors(), &[(2, 1)]);
        assert_eq!(PrimeFactors::new(3).unwrap().factors(), &[(3, 1)]);
    }

    #[test]
    fn test_product_and_ordering() {
        for n in 2..5_000u64 {
            let pf = PrimeFactors::new(n).unwrap();
            let factors = pf.factors();

            assert_eq!(product(factors), n, "product mismatch for {}", n);
            assert!(
                factors.windows(2).all(|w| w[0].0 < w[1].0),
                "primes not strictly ascending for {}",
                n
            );
            assert!(factors.iter().all(|&(_, k)| k >= 1));
        }
    }

    #[test]
    fn test_reduced_one_has_no_factors() {
        assert!(trial_division(1).is_empty());
    }

    #[test]
    fn test_rejects_values_below_two() {
        for value in [0, 1] {
            let err = PrimeFactors::new(value).unwrap_err();
            assert_eq!(
                err.downcast_ref::<FactorError>(),
                Some(&FactorError::InvalidArgument { value })
            );
        }
    }

    #[test]
    fn test_lazy_and_idempotent() {
        let pf = PrimeFactors::new(1_000_003).unwrap();
        assert!(!pf.is_computed());
        assert_eq!(pf.elapsed(), Duration::ZERO);

        pf.compute();
        assert!(pf.is_computed());
        let first = pf.factors().to_vec();
        let elapsed = pf.elapsed();

        pf.compute();
        assert_eq!(pf.factors(), first.as_slice());
        assert_eq!(pf.elapsed(), elapsed);
    }

    #[test]
    fn test_clear_allows_recompute() {
        let mut pf = PrimeFactors::new(1_001).unwrap();
        let before = pf.factors().to_vec();

        pf.clear();
        assert!(!pf.is_computed());
        assert_eq!(pf.elapsed(), Duration::ZERO);

        assert_eq!(pf.factors(), before.as_slice());
        assert_eq!(before, vec![(7, 1), (11, 1), (13, 1)]);
    }

    #[test]
    fn test_report_line() {
        let pf = PrimeFactors::new(360).unwrap();
        let line = pf.to_string();

        assert!(line.starts_with("       360 = 2^3 * 3^2 * 5 "));
        assert!(line.ends_with("ms)"));
        assert_eq!(line.find('(').unwrap(), REPORT_WIDTH);
    }
}
