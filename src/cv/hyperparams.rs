use linfa::{Float, ParamGuard};
use rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::{error::LarsError, LarsValidParams, PathMeasure};

/// A verified hyper-parameter set for the cross-validation of a LARS path
///
/// See [`LarsCvParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarsCvValidParams<F, R> {
    pub(crate) n_folds: usize,
    pub(crate) positions: Vec<F>,
    pub(crate) measure: PathMeasure,
    pub(crate) folds: Option<Vec<usize>>,
    pub(crate) lars: LarsValidParams<F>,
    pub(crate) rng: R,
}

impl<F: Float, R: Rng + Clone> LarsCvValidParams<F, R> {
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Positions along the path at which the prediction error is estimated
    pub fn positions(&self) -> &[F] {
        &self.positions
    }

    pub fn measure(&self) -> PathMeasure {
        self.measure
    }

    /// The explicit fold assignment, `None` if folds are drawn at random
    pub fn folds(&self) -> Option<&[usize]> {
        self.folds.as_deref()
    }

    /// Parameters of the path computed on every training part
    pub fn lars(&self) -> &LarsValidParams<F> {
        &self.lars
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// A hyper-parameter set for the k-fold cross-validation of a LARS path
///
/// The samples are split into `n_folds` folds. Each fold is held out once, a path is
/// computed on the remaining samples and the mean squared error of the held-out samples is
/// measured at every position of the grid. The errors are then averaged over the folds.
///
/// As the folds are drawn at random, it also accepts an [`Rng`] as parameter. The folds can
/// also be given explicitly with [`folds`](Self::folds).
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [n_folds](Self::n_folds) | `10` | Number of folds | `[2, n_samples]` |
/// | [positions](Self::positions) | `0.00, 0.01, ..., 1.00` | Path positions to evaluate | each in `[0, 1]` |
/// | [measure](Self::measure) | `L1Fraction` | How positions are read | [`PathMeasure`] |
/// | [folds](Self::folds) | random | Fold of every sample | `[0, n_folds)` |
/// | [fit_intercept](Self::fit_intercept) | `true` | Fit an intercept on each training part | `false`, `true` |
/// | [max_steps](Self::max_steps) | `3 * min(n_samples, n_features)` | Step cap of each path | `[1, inf)` |
/// | [eps](Self::eps) | `sqrt(F::epsilon())` | Tolerance of each path | `(0, inf)` |
///
/// # Errors
///
/// Returns [`TooFewFolds`](LarsError::TooFewFolds) if fewer than two folds are requested,
/// [`EmptyPositions`](LarsError::EmptyPositions) or
/// [`InvalidPosition`](LarsError::InvalidPosition) for a bad grid and
/// [`FoldOutOfRange`](LarsError::FoldOutOfRange) or [`EmptyFold`](LarsError::EmptyFold)
/// for a bad explicit assignment. The path parameters are checked as in
/// [`LarsParams`](crate::LarsParams).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarsCvParams<F, R>(pub(crate) LarsCvValidParams<F, R>);

impl<F: Float, R: Rng + Clone> LarsCvParams<F, R> {
    /// Set the number of folds
    pub fn n_folds(mut self, n_folds: usize) -> Self {
        self.0.n_folds = n_folds;
        self
    }

    /// Set the path positions at which the prediction error is estimated
    pub fn positions(mut self, positions: Vec<F>) -> Self {
        self.0.positions = positions;
        self
    }

    /// Choose how positions are read along the path
    pub fn measure(mut self, measure: PathMeasure) -> Self {
        self.0.measure = measure;
        self
    }

    /// Assign sample `i` to fold `folds[i]` instead of drawing the folds at random
    pub fn folds(mut self, folds: Vec<usize>) -> Self {
        self.0.folds = Some(folds);
        self
    }

    /// Whether to fit an intercept on each training part
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.lars.fit_intercept = fit_intercept;
        self
    }

    /// Set the step cap of each path
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.0.lars.max_steps = Some(max_steps);
        self
    }

    /// Set the tolerance of each path
    pub fn eps(mut self, eps: F) -> Self {
        self.0.lars.eps = eps;
        self
    }

    /// Specify the random number generator used to draw the folds
    pub fn with_rng<R2: Rng + Clone>(self, rng: R2) -> LarsCvParams<F, R2> {
        LarsCvParams(LarsCvValidParams {
            n_folds: self.0.n_folds,
            positions: self.0.positions,
            measure: self.0.measure,
            folds: self.0.folds,
            lars: self.0.lars,
            rng,
        })
    }
}

impl<F: Float, R: Rng + Clone> ParamGuard for LarsCvParams<F, R> {
    type Checked = LarsCvValidParams<F, R>;
    type Error = LarsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let params = &self.0;
        params.lars.validate()?;

        // the upper bound depends on the dataset and is checked when fitting
        if params.n_folds < 2 {
            return Err(LarsError::TooFewFolds(params.n_folds));
        }
        if params.positions.is_empty() {
            return Err(LarsError::EmptyPositions);
        }
        if let Some(&position) = params
            .positions
            .iter()
            .find(|&&p| !(p >= F::zero() && p <= F::one()))
        {
            return Err(LarsError::InvalidPosition(
                position.to_f32().unwrap_or(f32::NAN),
            ));
        }

        if let Some(folds) = &params.folds {
            if let Some(&fold) = folds.iter().find(|&&f| f >= params.n_folds) {
                return Err(LarsError::FoldOutOfRange {
                    fold,
                    n_folds: params.n_folds,
                });
            }
            let mut sizes = vec![0; params.n_folds];
            for &fold in folds {
                sizes[fold] += 1;
            }
            if let Some(empty) = sizes.iter().position(|&size| size == 0) {
                return Err(LarsError::EmptyFold(empty));
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LarsCv;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn defaults() {
        let params = LarsCv::<f64>::params().check().unwrap();
        assert_eq!(params.n_folds(), 10);
        assert_eq!(params.positions().len(), 101);
        assert_abs_diff_eq!(params.positions()[37], 0.37);
        assert_eq!(params.positions()[100], 1.0);
        assert_eq!(params.measure(), PathMeasure::L1Fraction);
        assert!(params.folds().is_none());
        assert!(params.lars().fit_intercept());
    }

    #[test]
    fn rng_can_be_replaced() {
        let params = LarsCv::<f64>::params()
            .n_folds(4)
            .with_rng(Xoshiro256Plus::seed_from_u64(7))
            .check()
            .unwrap();
        assert_eq!(params.n_folds(), 4);
        assert_eq!(params.rng(), &Xoshiro256Plus::seed_from_u64(7));
    }

    #[test]
    fn invalid_fold_count() {
        let res = LarsCv::<f64>::params().n_folds(1).check();
        assert!(matches!(res, Err(LarsError::TooFewFolds(1))));

        // an explicit assignment does not change the reported count
        let res = LarsCv::<f64>::params().n_folds(0).folds(vec![0, 0, 0]).check();
        assert!(matches!(res, Err(LarsError::TooFewFolds(0))));
    }

    #[test]
    fn invalid_positions() {
        let res = LarsCv::<f64>::params().positions(vec![]).check();
        assert!(matches!(res, Err(LarsError::EmptyPositions)));

        for bad in [1.5, -0.1, f64::NAN] {
            let res = LarsCv::<f64>::params().positions(vec![0.5, bad]).check();
            assert!(matches!(res, Err(LarsError::InvalidPosition(_))));
        }
    }

    #[test]
    fn invalid_fold_assignment() {
        let res = LarsCv::<f64>::params()
            .n_folds(2)
            .folds(vec![0, 1, 2])
            .check();
        assert!(matches!(
            res,
            Err(LarsError::FoldOutOfRange {
                fold: 2,
                n_folds: 2
            })
        ));

        let res = LarsCv::<f64>::params()
            .n_folds(3)
            .folds(vec![0, 2, 0, 2])
            .check();
        assert!(matches!(res, Err(LarsError::EmptyFold(1))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn parameters_are_serializable() {
        fn has_serde<T: Serialize + for<'de> Deserialize<'de>>() {}
        has_serde::<LarsCvParams<f64, Xoshiro256Plus>>();
        has_serde::<LarsCvValidParams<f64, Xoshiro256Plus>>();
        has_serde::<crate::LarsParams<f64>>();
        has_serde::<crate::FusedLarsValidParams<f64>>();
    }

    #[test]
    fn path_parameters_are_checked() {
        let res = LarsCv::<f64>::params().eps(0.0).check();
        assert!(matches!(res, Err(LarsError::InvalidEpsilon(_))));
    }
}
