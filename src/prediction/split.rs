use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::prediction::types::JoinedSample;

/// Training and held-out partitions of the joined samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<JoinedSample>,
    pub test: Vec<JoinedSample>,
}

/// Number of samples held out: `ceil(n * test_fraction)`, leaving at least
/// one sample to train on.
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    let wanted = (n as f64 * test_fraction).ceil() as usize;
    wanted.min(n.saturating_sub(1))
}

/// Shuffles the samples with a seeded generator and splits off the test
/// partition. The same seed and input always give the same split.
pub fn train_test_split(samples: &[JoinedSample], test_fraction: f64, seed: u64) -> Split {
    let mut indices: Vec<usize> = (0..samples.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_size(samples.len(), test_fraction));
    let pick = |idx: &[usize]| -> Vec<JoinedSample> {
        idx.iter().map(|&i| samples[i].clone()).collect()
    };

    Split {
        train: pick(train_idx),
        test: pick(test_idx),
    }
}
