use linfa::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::LarsError;

/// A verified hyper-parameter set ready for the computation of a LARS lasso path
///
/// See [`LarsParams`] for more information.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarsValidParams<F> {
    pub(crate) fit_intercept: bool,
    pub(crate) max_steps: Option<usize>,
    pub(crate) eps: F,
}

impl<F: Float> LarsValidParams<F> {
    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
    }

    /// The configured step cap, `None` if it is derived from the data
    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    /// The step cap used for a design with `n_samples` rows and `n_features` columns
    pub fn max_steps_for(&self, n_samples: usize, n_features: usize) -> usize {
        self.max_steps
            .unwrap_or_else(|| 3 * n_samples.min(n_features))
    }

    pub fn eps(&self) -> F {
        self.eps
    }

    pub(crate) fn validate(&self) -> Result<(), LarsError> {
        if !self.eps.is_finite() || self.eps <= F::zero() {
            Err(LarsError::InvalidEpsilon(self.eps.to_f32().unwrap_or(f32::NAN)))
        } else if self.max_steps == Some(0) {
            Err(LarsError::InvalidMaxSteps)
        } else {
            Ok(())
        }
    }
}

/// A hyper-parameter set for the LARS lasso path
///
/// The path covers every solution of
/// ```ignore
/// 1 / 2 * ||y - Xw||^2_2 + lambda * ||w||_1
/// ```
/// for `lambda` decreasing from `max |X^T y|` towards zero, one breakpoint per step.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [fit_intercept](Self::fit_intercept) | `true` | Center features and target before fitting | `false`, `true` |
/// | [max_steps](Self::max_steps) | `3 * min(n_samples, n_features)` | Maximal number of breakpoints | `[1, inf)` |
/// | [eps](Self::eps) | `sqrt(F::epsilon())` | Tolerance for ties, collinearity and termination | `(0, inf)` |
///
/// # Errors
///
/// Returns [`InvalidEpsilon`](LarsError::InvalidEpsilon) if `eps` is not positive and finite.
///
/// Returns [`InvalidMaxSteps`](LarsError::InvalidMaxSteps) if the step cap is set to zero.
///
/// # Example
///
/// ```rust
/// use linfa_lars::{LarsParams, LarsError};
/// use linfa::prelude::*;
/// use ndarray::array;
///
/// let ds = Dataset::new(array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], array![3.0, 2.0, 5.0]);
///
/// let unchecked_params = LarsParams::new().fit_intercept(false);
/// let model = unchecked_params.fit(&ds)?;
///
/// let checked_params = unchecked_params.check()?;
/// let model = checked_params.fit(&ds)?;
/// # Ok::<(), LarsError>(())
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarsParams<F>(LarsValidParams<F>);

impl<F: Float> Default for LarsParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> LarsParams<F> {
    /// Create default LARS hyper parameters
    ///
    /// By default, an intercept will be fitted. To disable fitting an
    /// intercept, call `.fit_intercept(false)` before calling `.fit()`.
    pub fn new() -> Self {
        Self(LarsValidParams {
            fit_intercept: true,
            max_steps: None,
            eps: F::epsilon().sqrt(),
        })
    }

    /// Whether to calculate the intercept for this model.
    /// Defaults to `true` if not set.
    /// If set to false, the features and target are used as given.
    pub fn fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.0.fit_intercept = fit_intercept;
        self
    }

    /// Set the maximal number of steps, each step adds or drops variables of the active set.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.0.max_steps = Some(max_steps);
        self
    }

    /// Set the tolerance used to detect tied correlations, collinear columns and a
    /// vanishing correlation maximum.
    pub fn eps(mut self, eps: F) -> Self {
        self.0.eps = eps;
        self
    }
}

impl<F: Float> ParamGuard for LarsParams<F> {
    type Checked = LarsValidParams<F>;
    type Error = LarsError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
