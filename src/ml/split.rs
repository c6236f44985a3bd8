use crate::error::{AppError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Row positions of a train/test partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainTestSplit {
    /// Positions into the input, in input order
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }
}

/// Reproducibly split rows by identifier.
///
/// Each row is ranked by `SHA-256(seed || id)`; the lowest
/// `ceil(n * test_size)` ranks form the test partition. The assignment of an
/// identifier depends only on the seed and the set of identifiers, never on
/// row order.
pub fn train_test_split(ids: &[i64], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Data(format!(
            "test_size must lie strictly between 0 and 1, got {}",
            test_size
        )));
    }

    let n = ids.len();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AppError::Data(format!(
            "cannot split {} rows with test_size {} into two non-empty partitions",
            n, test_size
        )));
    }

    let mut ranked: Vec<([u8; 32], i64, usize)> = ids
        .iter()
        .enumerate()
        .map(|(pos, &id)| (split_key(seed, id), id, pos))
        .collect();
    ranked.sort_unstable();

    let mut test: Vec<usize> = ranked[..n_test].iter().map(|&(_, _, pos)| pos).collect();
    let mut train: Vec<usize> = ranked[n_test..].iter().map(|&(_, _, pos)| pos).collect();
    test.sort_unstable();
    train.sort_unstable();

    Ok(TrainTestSplit { train, test })
}

fn split_key(seed: u64, id: i64) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(id.to_le_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: i64) -> Vec<i64> {
        (1..=n).collect()
    }

    #[test]
    fn test_partition_sizes() {
        let split = train_test_split(&ids(10), 0.2, 42).unwrap();
        assert_eq!(split.test_len(), 2);
        assert_eq!(split.train_len(), 8);

        let split = train_test_split(&ids(11), 0.2, 42).unwrap();
        assert_eq!(split.test_len(), 3);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let a = train_test_split(&ids(100), 0.25, 7).unwrap();
        let b = train_test_split(&ids(100), 0.25, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_changes_partition() {
        let a = train_test_split(&ids(100), 0.25, 7).unwrap();
        let b = train_test_split(&ids(100), 0.25, 8).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn test_partitions_cover_every_row_once() {
        let split = train_test_split(&ids(50), 0.3, 1).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_assignment_ignores_row_order() {
        let forward = ids(40);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = train_test_split(&forward, 0.2, 3).unwrap();
        let b = train_test_split(&reversed, 0.2, 3).unwrap();

        let mut test_a: Vec<i64> = a.test.iter().map(|&p| forward[p]).collect();
        let mut test_b: Vec<i64> = b.test.iter().map(|&p| reversed[p]).collect();
        test_a.sort_unstable();
        test_b.sort_unstable();
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn test_invalid_ratios() {
        assert!(train_test_split(&ids(10), 0.0, 1).is_err());
        assert!(train_test_split(&ids(10), 1.0, 1).is_err());
        assert!(train_test_split(&ids(10), f64::NAN, 1).is_err());
        assert!(train_test_split(&ids(1), 0.5, 1).is_err());
        assert!(train_test_split(&[], 0.5, 1).is_err());
    }
}
