//! # Lasso regularization path with least angle regression
//!
//! `linfa-lars` computes the complete regularization path of the lasso
//!
//! ```ignore
//! 1 / 2 * ||y - Xw||^2_2 + lambda * ||w||_1
//! ```
//!
//! with the lasso modification of the least angle regression (LARS) algorithm. The path is
//! piecewise linear in `lambda`, so the algorithm only visits its breakpoints: at each step
//! the variables most correlated with the residual move along the direction that is
//! equiangular between them, until another variable becomes as correlated as they are (it
//! joins the active set) or an active coefficient crosses zero (it leaves the active set).
//! Variables found collinear with the active columns are ignored for the rest of the run.
//!
//! Coefficients anywhere along the path are reconstructed by interpolating between two
//! breakpoints, with positions read either as a fraction of the largest L1 norm reached or
//! as a fraction of the traversed `lambda` range (see [`PathMeasure`]).
//!
//! The crate also contains
//! * [`FusedLars`], the fused lasso which penalizes the differences of successive
//!   coefficients, solved as a lasso on a transformed design
//! * [`LarsCv`], k-fold cross-validation of the prediction error along the path
//!
//! ## Example
//!
//! ```rust
//! use linfa::prelude::*;
//! use linfa_lars::{Lars, PathMeasure};
//!
//! let dataset = linfa_datasets::diabetes();
//! let model = Lars::params().fit(&dataset)?;
//!
//! println!("{} steps, stopped because of {:?}", model.n_steps(), model.stop_reason());
//! let halfway = model.coefficients_at(0.5, PathMeasure::L1Fraction);
//! let prediction = model.predict_at(dataset.records(), 0.5, PathMeasure::L1Fraction);
//! # assert_eq!(halfway.len(), 10);
//! # assert_eq!(prediction.len(), dataset.nsamples());
//! # Ok::<(), linfa_lars::LarsError>(())
//! ```
//!
//! ## References
//!
//! * ["Least Angle Regression", Efron et al.](https://web.stanford.edu/~hastie/Papers/LARS/LeastAngle_2002.pdf)
//! * ["Sparsity and smoothness via the fused lasso", Tibshirani et al.](https://doi.org/10.1111/j.1467-9868.2005.00490.x)
//! * [Wikipedia entry on the Least-angle regression](https://en.wikipedia.org/wiki/Least-angle_regression)

use linfa::Float;
use ndarray::{Array1, Array2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

pub use cv::{random_folds, LarsCv, LarsCvParams, LarsCvValidParams};
pub use error::{LarsError, Result};
pub use fusion::{compute_z, FusedLars, FusedLarsParams, FusedLarsValidParams};
pub use hyperparams::{LarsParams, LarsValidParams};
pub use path::{interpolate_states, Evolution, LarsPath, PathMeasure, PathState};

mod active;
mod algorithm;
mod cv;
mod error;
mod fusion;
mod hyperparams;
mod path;
mod qr;
mod utils;

/// Why the computation of a path ended
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The step cap was reached
    MaxSteps,
    /// The correlation maximum fell below `100 * eps`, the residual is explained
    NoCorrelation,
    /// No variable was left to enter an empty active set
    NoCandidate,
    /// The active set reached the rank bound of the design
    Saturated,
    /// The correlation maximum increased, the last step was discarded
    ///
    /// The path is valid up to the previous step. [`Lars::warning`] holds the details.
    CorrelationIncrease,
}

/// A fitted LARS lasso path
///
/// Holds every breakpoint of the path together with the centering information needed to
/// predict with the coefficients at any position along it.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Lars<F> {
    path: LarsPath<F>,
    hyperplane: Array1<F>,
    intercept: F,
    y_mean: F,
    x_means: Array1<F>,
    ignored: Vec<usize>,
    stop_reason: StopReason,
    warning: Option<String>,
}

impl<F: Float> Lars<F> {
    /// Create default Lars hyper parameters
    ///
    /// By default, an intercept will be fitted. To disable fitting an
    /// intercept, call `.fit_intercept(false)` before calling `.fit()`.
    pub fn params() -> LarsParams<F> {
        LarsParams::new()
    }

    /// The breakpoints of the path
    pub fn path(&self) -> &LarsPath<F> {
        &self.path
    }

    /// The number of steps taken by the algorithm
    pub fn n_steps(&self) -> usize {
        self.path.n_steps()
    }

    /// Number of features the model was trained with
    pub fn n_features(&self) -> usize {
        self.hyperplane.len()
    }

    /// The coefficients of the last state as a dense vector
    pub fn hyperplane(&self) -> &Array1<F> {
        &self.hyperplane
    }

    /// Get the intercept of the last state, 0. if no intercept was fitted
    pub fn intercept(&self) -> F {
        self.intercept
    }

    /// Mean of the training target, 0. if no intercept was fitted
    pub fn y_mean(&self) -> F {
        self.y_mean
    }

    /// Column means of the training features, zeros if no intercept was fitted
    pub fn x_means(&self) -> &Array1<F> {
        &self.x_means
    }

    /// Variables excluded because they were collinear with the active set, in the order they
    /// were found
    pub fn ignored(&self) -> &[usize] {
        &self.ignored
    }

    pub fn stop_reason(&self) -> StopReason {
        self.stop_reason
    }

    /// Diagnostic message of a run that ended on a numerical problem
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Get the varying values of the coefficients along the path, one column per state
    pub fn coef_path(&self) -> Array2<F> {
        self.path.coef_path(self.n_features())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<Lars<f64>>();
        has_autotraits::<LarsParams<f64>>();
        has_autotraits::<LarsValidParams<f64>>();
        has_autotraits::<LarsError>();
        has_autotraits::<LarsPath<f64>>();
        has_autotraits::<PathState<f64>>();
        has_autotraits::<Evolution>();
        has_autotraits::<PathMeasure>();
        has_autotraits::<StopReason>();
        has_autotraits::<FusedLars<f64>>();
        has_autotraits::<FusedLarsParams<f64>>();
        has_autotraits::<FusedLarsValidParams<f64>>();
        has_autotraits::<LarsCv<f64>>();
        has_autotraits::<LarsCvParams<f64, rand_xoshiro::Xoshiro256Plus>>();
        has_autotraits::<LarsCvValidParams<f64, rand_xoshiro::Xoshiro256Plus>>();
    }
}
