//! Parent selection.

use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

/// Draws of the second parent before falling back to a uniform pick among the
/// others.
const MAX_PAIR_DRAWS: usize = 100;

/// How survivors are weighted when drawn as parents.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::FromStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SelectionWeighting {
    /// Proportional to survival time.
    #[display("time")]
    Time,
    /// Proportional to rank: the longest survivor weighs `n`, the shortest 1.
    #[display("order")]
    Order,
    #[default]
    #[display("uniform")]
    Uniform,
}

impl SelectionWeighting {
    /// Selection weight of each candidate given their survival times.
    #[must_use]
    pub fn weights(self, times: &[u64]) -> Vec<f64> {
        match self {
            #[expect(clippy::cast_precision_loss)]
            Self::Time => times.iter().map(|&t| t as f64).collect(),
            Self::Order => {
                let mut ranked = (0..times.len()).collect::<Vec<_>>();
                ranked.sort_by_key(|&i| std::cmp::Reverse(times[i]));
                let mut weights = vec![0.0; times.len()];
                for (rank, idx) in ranked.into_iter().enumerate() {
                    #[expect(clippy::cast_precision_loss)]
                    let weight = (times.len() - rank) as f64;
                    weights[idx] = weight;
                }
                weights
            }
            Self::Uniform => vec![1.0; times.len()],
        }
    }
}

/// Samples parent indices from a pool.
///
/// Falls back to uniform sampling when the weights are all zero.
#[derive(Debug, Clone)]
pub struct ParentSampler {
    len: usize,
    weighted: Option<WeightedIndex<f64>>,
}

impl ParentSampler {
    #[must_use]
    pub fn new(weighting: SelectionWeighting, times: &[u64]) -> Self {
        let weighted = match weighting {
            SelectionWeighting::Uniform => None,
            _ => WeightedIndex::new(weighting.weights(times)).ok(),
        };
        Self {
            len: times.len(),
            weighted,
        }
    }

    #[must_use]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn sample<R>(&self, rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
    {
        if self.len == 0 {
            return None;
        }
        Some(match &self.weighted {
            Some(weighted) => weighted.sample(rng),
            None => rng.random_range(0..self.len),
        })
    }

    /// Two distinct indices.
    ///
    /// Returns `None` for pools with fewer than two entries.
    pub fn sample_pair<R>(&self, rng: &mut R) -> Option<(usize, usize)>
    where
        R: Rng + ?Sized,
    {
        if self.len < 2 {
            return None;
        }
        let first = self.sample(rng)?;
        for _ in 0..MAX_PAIR_DRAWS {
            let second = self.sample(rng)?;
            if second != first {
                return Some((first, second));
            }
        }
        // All weight sits on `first`.
        let second = (first + rng.random_range(1..self.len)) % self.len;
        Some((first, second))
    }
}
