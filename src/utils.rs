use linfa::Float;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_stats::QuantileExt;

use crate::error::{LarsError, Result};

/// Evaluate the line through `(x1, y1)` and `(x2, y2)` at `x`
///
/// A degenerate segment (`x1 == x2`) evaluates to `y2`.
pub(crate) fn affine<F: Float>(x1: F, y1: F, x2: F, y2: F, x: F) -> F {
    if x2 == x1 {
        y2
    } else {
        y1 + (y2 - y1) * (x - x1) / (x2 - x1)
    }
}

/// Sign of `x` as `-1`, `0` or `1`
pub(crate) fn sign<F: Float>(x: F) -> F {
    if x > F::zero() {
        F::one()
    } else if x < F::zero() {
        -F::one()
    } else {
        F::zero()
    }
}

/// Owned working copies of the design and the response, centered if an intercept is fitted
pub(crate) struct Centered<F> {
    pub x: Array2<F>,
    pub y: Array1<F>,
    pub x_means: Array1<F>,
    pub y_mean: F,
}

/// Copy `x` and `y` and subtract the column means and the response mean when
/// `with_intercept` is set. The means are zero otherwise.
pub(crate) fn center<F, D, E>(
    with_intercept: bool,
    x: &ArrayBase<D, Ix2>,
    y: &ArrayBase<E, Ix1>,
) -> Result<Centered<F>>
where
    F: Float,
    D: Data<Elem = F>,
    E: Data<Elem = F>,
{
    if x.nrows() == 0 {
        return Err(LarsError::NotEnoughSamples);
    }

    if with_intercept {
        let x_means = x.mean_axis(Axis(0)).ok_or(LarsError::NotEnoughSamples)?;
        let y_mean = y.mean().ok_or(LarsError::NotEnoughSamples)?;

        Ok(Centered {
            x: x - &x_means.view().insert_axis(Axis(0)),
            y: y.mapv(|v| v - y_mean),
            x_means,
            y_mean,
        })
    } else {
        Ok(Centered {
            x: x.to_owned(),
            y: y.to_owned(),
            x_means: Array1::zeros(x.ncols()),
            y_mean: F::zero(),
        })
    }
}

/// Largest `|c_j|` over the variables accepted by `eligible`, zero if there is none
pub(crate) fn max_abs_where<F: Float>(c: &Array1<F>, mut eligible: impl FnMut(usize) -> bool) -> F {
    let masked = Array1::from_shape_fn(c.len(), |j| {
        if eligible(j) {
            c[j].abs()
        } else {
            F::zero()
        }
    });
    masked.max().map(|&m| m).unwrap_or_else(|_| F::zero())
}
