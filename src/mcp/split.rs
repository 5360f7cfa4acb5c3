use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{AssessmentError, Result};

/// Row positions of a shuffled train/test partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` with a seeded generator and hold out `ceil(n · test_fraction)`
/// positions for testing. The same `(n, test_fraction, seed)` always gives the
/// same partition.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(AssessmentError::InvalidConfig(format!(
            "test fraction must lie in (0, 1), got {test_fraction}"
        )));
    }

    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AssessmentError::InsufficientData {
            required: 2,
            available: n,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    Ok(TrainTestSplit { train, test: order })
}
