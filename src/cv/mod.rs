//! K-fold cross-validation of the prediction error along a LARS path
//!
//! The result is an error curve over a grid of path positions, together with its standard
//! error, from which a position can be selected (see [`LarsCv::best_position`] and
//! [`LarsCv::one_se_position`]).

use linfa::Float;
use ndarray::{Array1, Array2};
use ndarray_stats::QuantileExt;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::{LarsValidParams, PathMeasure};

mod algorithm;
mod hyperparams;

pub use hyperparams::{LarsCvParams, LarsCvValidParams};

/// Assign `n_samples` samples to `n_folds` folds
///
/// Samples are dealt to the folds in turn and the assignment is shuffled afterwards, so
/// that fold sizes differ by at most one.
pub fn random_folds<R: Rng + ?Sized>(n_samples: usize, n_folds: usize, rng: &mut R) -> Vec<usize> {
    let mut folds: Vec<usize> = (0..n_samples).map(|i| i % n_folds).collect();
    folds.shuffle(rng);
    folds
}

/// Cross-validated prediction error of a LARS path
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct LarsCv<F> {
    positions: Array1<F>,
    measure: PathMeasure,
    mean: Array1<F>,
    std_error: Array1<F>,
    fold_errors: Array2<F>,
    fold_sizes: Vec<usize>,
    folds: Vec<usize>,
}

impl<F: Float> LarsCv<F> {
    /// Create default cross-validation hyper parameters
    ///
    /// Folds are drawn with a `Xoshiro256Plus` generator seeded with `42`.
    pub fn params() -> LarsCvParams<F, Xoshiro256Plus> {
        Self::params_with_rng(Xoshiro256Plus::seed_from_u64(42))
    }

    /// Create default cross-validation hyper parameters drawing the folds with `rng`
    pub fn params_with_rng<R: Rng + Clone>(rng: R) -> LarsCvParams<F, R> {
        let n_positions = 101;
        let positions = (0..n_positions)
            .map(|i| F::cast(i) / F::cast(n_positions - 1))
            .collect();

        LarsCvParams(LarsCvValidParams {
            n_folds: 10,
            positions,
            measure: PathMeasure::L1Fraction,
            folds: None,
            lars: LarsValidParams {
                fit_intercept: true,
                max_steps: None,
                eps: F::epsilon().sqrt(),
            },
            rng,
        })
    }

    /// The evaluated path positions
    pub fn positions(&self) -> &Array1<F> {
        &self.positions
    }

    pub fn measure(&self) -> PathMeasure {
        self.measure
    }

    /// Mean over the folds of the held-out mean squared error, one entry per position
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Standard error of [`mean`](Self::mean), one entry per position
    pub fn std_error(&self) -> &Array1<F> {
        &self.std_error
    }

    /// Held-out mean squared error of every fold, `positions × folds`
    pub fn fold_errors(&self) -> &Array2<F> {
        &self.fold_errors
    }

    /// Number of samples in each fold
    pub fn fold_sizes(&self) -> &[usize] {
        &self.fold_sizes
    }

    /// Fold of every sample
    pub fn folds(&self) -> &[usize] {
        &self.folds
    }

    /// Index of the smallest error, the first position if the curve holds a NaN
    fn argmin(&self) -> usize {
        self.mean.argmin().unwrap_or(0)
    }

    /// Position with the smallest cross-validated error
    ///
    /// An undefined error curve, i.e. one holding a NaN, selects the first position.
    pub fn best_position(&self) -> F {
        self.positions[self.argmin()]
    }

    /// Smallest position whose error lies within one standard error of the minimum
    pub fn one_se_position(&self) -> F {
        let best = self.argmin();
        let threshold = self.mean[best] + self.std_error[best];
        self.positions
            .iter()
            .zip(self.mean.iter())
            .filter(|(_, &err)| err <= threshold)
            .fold(self.positions[best], |acc, (&position, _)| acc.min(position))
    }
}
