use std::time::Duration;

use anyhow::Result;

use crate::factors::{Factorization, PrimeFactors};

/// Fixed, ordered collection of numbers factorized together in one run.
#[derive(Debug)]
pub struct WorkBatch {
    items: Vec<PrimeFactors>,
}

impl WorkBatch {
    /// Builds a batch from the odd values of `[low, high)`.
    pub fn odd_in_range(low: u64, high: u64) -> Result<Self> {
        Self::from_values((low..high).filter(|value| value % 2 == 1))
    }

    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let items = values
            .into_iter()
            .map(PrimeFactors::new)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PrimeFactors] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrimeFactors> {
        self.items.iter()
    }

    pub fn values(&self) -> Vec<u64> {
        self.items.iter().map(PrimeFactors::value).collect()
    }

    pub fn clear_all(&mut self) {
        self.items.iter_mut().for_each(PrimeFactors::clear);
    }

    pub fn all_computed(&self) -> bool {
        self.items.iter().all(PrimeFactors::is_computed)
    }

    /// Snapshot of every element's factorization, in batch order.
    pub fn factorizations(&self) -> Vec<Factorization> {
        self.items.iter().map(|pf| pf.factors().to_vec()).collect()
    }

    /// Sum of the per-element compute times of the last run.
    pub fn total_compute_time(&self) -> Duration {
        self.items.iter().map(PrimeFactors::elapsed).sum()
    }
}

impl<'a> IntoIterator for &'a WorkBatch {
    type Item = &'a PrimeFactors;
    type IntoIter = std::slice::Iter<'a, PrimeFactors>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::FactorError;

    #[test]
    fn test_odd_range() {
        let batch = WorkBatch::odd_in_range(9, 20).unwrap();
        assert_eq!(batch.values(), vec![9, 11, 13, 15, 17, 19]);
        assert!(!batch.all_computed());
    }

    #[test]
    fn test_empty_range() {
        let batch = WorkBatch::odd_in_range(20, 20).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_range_including_one_fails() {
        let err = WorkBatch::odd_in_range(0, 10).unwrap_err();
        assert_eq!(
            err.downcast_ref::<FactorError>(),
            Some(&FactorError::InvalidArgument { value: 1 })
        );
    }

    #[test]
    fn test_clear_all() {
        let mut batch = WorkBatch::odd_in_range(101, 121).unwrap();
        batch.iter().for_each(PrimeFactors::compute);
        assert!(batch.all_computed());

        let before = batch.factorizations();
        batch.clear_all();
        assert!(!batch.iter().any(PrimeFactors::is_computed));
        assert_eq!(batch.total_compute_time(), Duration::ZERO);
        assert_eq!(batch.factorizations(), before);
    }
}
