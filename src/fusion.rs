//! Fused lasso through a change of basis
//!
//! The fused lasso penalizes the L1 norm of the differences of successive coefficients
//!
//! ```ignore
//! 1 / 2 * ||y - Xb||^2_2 + lambda * sum_j |b_j - b_(j-1)|,  b_(-1) = 0
//! ```
//!
//! With `theta_j = b_j - b_(j-1)` this is an ordinary lasso in `theta` on the design
//! `Z = X L`, where `L` is the lower triangular all-ones matrix. Column `j` of `Z` is the
//! sum of the columns `j..p` of `X` and the fused coefficients are the cumulative sums
//! `b = L theta`.

use linfa::{
    dataset::{AsSingleTargets, DatasetBase},
    traits::{Fit, PredictInplace},
    Float, ParamGuard,
};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::{
    error::{LarsError, Result},
    Lars, LarsPath, LarsValidParams, PathMeasure,
};

/// Transform a design `x` into the design of the equivalent lasso problem
///
/// Returns a new matrix whose column `j` is the sum of the columns `j..p` of `x`, the
/// input is left untouched.
pub fn compute_z<F: Float, D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>) -> Array2<F> {
    let mut z = x.to_owned();
    let n_features = z.ncols();
    for j in (0..n_features.saturating_sub(1)).rev() {
        let (mut current, next) = z.multi_slice_mut((s![.., j], s![.., j + 1]));
        current += &next;
    }
    z
}

/// Cumulative sums of `theta`, the coefficients of the fused lasso in the original basis
fn cumulative<F: Float>(mut theta: Array1<F>) -> Array1<F> {
    theta.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
    theta
}

/// A verified hyper-parameter set for the fused lasso path
///
/// See [`FusedLarsParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FusedLarsValidParams<F>(LarsValidParams<F>);

impl<F: Float> FusedLarsValidParams<F> {
    /// Parameters of the lasso path computed on the transformed design
    pub fn lars(&self) -> &LarsValidParams<F> {
        &self.0
    }
}

/// A hyper-parameter set for the fused lasso path
///
/// Takes the parameters of [`LarsParams`](crate::LarsParams) with the same defaults and
/// validates them the same way.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct FusedLarsParams<F>(FusedLarsValidParams<F>);

impl<F: Float> Default for FusedLarsParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> FusedLarsParams<F> {
    pub fn new() -> Self {
        Self(FusedLarsValidParams(LarsValidParams {
            fit_intercept: true,
            max_steps: None,
            eps: F::epsilon().sqrt(),
        }))
    }

    /// Whether to calculate the intercept for this model.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0 .0.fit_intercept = fit_intercept;
        self
    }

    /// Set the maximal number of steps
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.0 .0.max_steps = Some(max_steps);
        self
    }

    /// Set the tolerance for ties, collinearity and termination
    pub fn eps(mut self, eps: F) -> Self {
        self.0 .0.eps = eps;
        self
    }
}

impl<F: Float> ParamGuard for FusedLarsParams<F> {
    type Checked = FusedLarsValidParams<F>;
    type Error = LarsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        self.0 .0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// A fitted fused lasso path
///
/// The path is computed in the transformed basis and is available as is through
/// [`lars`](Self::lars). Every other accessor works with the fused coefficients of the
/// original features.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct FusedLars<F> {
    lars: Lars<F>,
}

impl<F: Float> FusedLars<F> {
    /// Create default fused lasso hyper parameters
    pub fn params() -> FusedLarsParams<F> {
        FusedLarsParams::new()
    }

    /// The lasso model of the transformed design
    pub fn lars(&self) -> &Lars<F> {
        &self.lars
    }

    /// The path in the transformed basis, coefficients are successive differences
    pub fn path(&self) -> &LarsPath<F> {
        self.lars.path()
    }

    /// The path of the fused coefficients
    pub fn fused_path(&self) -> LarsPath<F> {
        self.lars.path().to_fusion(self.lars.n_features())
    }

    /// The fused coefficients of the last state
    pub fn hyperplane(&self) -> Array1<F> {
        cumulative(self.lars.hyperplane().clone())
    }

    pub fn intercept(&self) -> F {
        self.lars.intercept()
    }

    /// Fused coefficients at `position` along the path
    pub fn coefficients_at(&self, position: F, measure: PathMeasure) -> Array1<F> {
        cumulative(self.lars.coefficients_at(position, measure))
    }

    /// Predict the target of `x`, given in the original basis, at `position` along the path
    pub fn predict_at<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        position: F,
        measure: PathMeasure,
    ) -> Array1<F> {
        assert_eq!(
            x.ncols(),
            self.lars.n_features(),
            "Number of data features must match the number of features the model was trained with."
        );
        // the means of `Z` weigh `theta` exactly like the means of `X` weigh `b`
        x.dot(&self.coefficients_at(position, measure)) + self.lars.intercept_at(position, measure)
    }
}

impl<F, D, T> Fit<ArrayBase<D, Ix2>, T, LarsError> for FusedLarsValidParams<F>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = FusedLars<F>;

    /// Compute the fused lasso path, the dataset is not modified
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let z = compute_z(dataset.records());
        let targets = dataset.as_single_targets();
        let transformed = DatasetBase::new(z, targets);

        let lars = self.0.fit(&transformed)?;
        Ok(FusedLars { lars })
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for FusedLars<F> {
    /// Predict with the fused coefficients of the last state
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.lars.n_features(),
            "Number of data features must match the number of features the model was trained with."
        );

        *y = x.dot(&self.hyperplane()) + self.lars.intercept();
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
