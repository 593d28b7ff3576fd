//! Incremental QR factorization of the active columns
//!
//! Columns are appended with twice-iterated Gram-Schmidt and removed with Givens
//! rotations, so that `Xi = Q R` holds for the active submatrix `Xi` after every step of
//! the path.

use linfa::Float;
use linfa_linalg::triangular::{SolveTriangularInplace, UPLO};
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1};

use crate::error::Result;

pub(crate) struct ActiveQr<F> {
    q: Array2<F>,
    r: Array2<F>,
    width: usize,
}

impl<F: Float> ActiveQr<F> {
    /// Storage for at most `capacity` columns of length `n_samples`
    pub fn new(n_samples: usize, capacity: usize) -> Self {
        ActiveQr {
            q: Array2::zeros((n_samples, capacity)),
            r: Array2::zeros((capacity, capacity)),
            width: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// The upper triangular factor of the current columns
    pub fn r(&self) -> ArrayView2<'_, F> {
        self.r.slice(s![..self.width, ..self.width])
    }

    /// Append `column` as the last column
    ///
    /// Returns `false` and leaves the factorization unchanged when the new diagonal
    /// element of `R` falls below `eps`, i.e. the column lies in the span of the current
    /// ones.
    pub fn push<D: Data<Elem = F>>(&mut self, column: &ArrayBase<D, Ix1>, eps: F) -> bool {
        let k = self.width;
        if k == self.q.ncols() {
            return false;
        }

        let mut v = column.to_owned();
        let mut r_col = Array1::zeros(k);
        if k > 0 {
            let q = self.q.slice(s![.., ..k]);
            // a second pass restores orthogonality lost to cancellation
            for _ in 0..2 {
                let proj = q.t().dot(&v);
                v -= &q.dot(&proj);
                r_col += &proj;
            }
        }

        let diag = v.dot(&v).sqrt();
        if diag.is_nan() || diag < eps {
            return false;
        }

        v.mapv_inplace(|x| x / diag);
        self.q.column_mut(k).assign(&v);
        self.r.slice_mut(s![..k, k]).assign(&r_col);
        self.r[[k, k]] = diag;
        self.width += 1;
        true
    }

    /// Remove column `pos` and restore the triangular shape of `R`
    pub fn remove(&mut self, pos: usize) {
        let k = self.width;
        assert!(pos < k, "column {} out of range for width {}", pos, k);

        for j in pos..k - 1 {
            let next = self.r.slice(s![..k, j + 1]).to_owned();
            self.r.slice_mut(s![..k, j]).assign(&next);
        }

        // R is now upper Hessenberg from column `pos` on
        for j in pos..k - 1 {
            let (a, b) = (self.r[[j, j]], self.r[[j + 1, j]]);
            let norm = a.hypot(b);
            if norm == F::zero() {
                continue;
            }
            let (cos, sin) = (a / norm, b / norm);

            for col in j..k - 1 {
                let (x, y) = (self.r[[j, col]], self.r[[j + 1, col]]);
                self.r[[j, col]] = cos * x + sin * y;
                self.r[[j + 1, col]] = cos * y - sin * x;
            }
            self.r[[j + 1, j]] = F::zero();

            let (mut qj, mut qn) = self
                .q
                .multi_slice_mut((s![.., j], s![.., j + 1]));
            for (x, y) in qj.iter_mut().zip(qn.iter_mut()) {
                let (xv, yv) = (*x, *y);
                *x = cos * xv + sin * yv;
                *y = cos * yv - sin * xv;
            }
        }

        self.r.slice_mut(s![k - 1, ..k]).fill(F::zero());
        self.r.slice_mut(s![..k, k - 1]).fill(F::zero());
        self.q.column_mut(k - 1).fill(F::zero());
        self.width -= 1;
    }

    /// Solve `Xi^T Xi z = b` through the two triangular systems `R^T v = b` and `R z = v`
    pub fn solve_normal(&self, b: &Array1<F>) -> Result<Array1<F>> {
        let r = self.r();
        let mut rhs = b.clone().insert_axis(Axis(1));
        r.t().solve_triangular_inplace(&mut rhs, UPLO::Lower)?;
        r.solve_triangular_inplace(&mut rhs, UPLO::Upper)?;
        Ok(rhs.remove_axis(Axis(1)))
    }
}
