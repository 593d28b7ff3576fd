use linfa::{
    dataset::{AsSingleTargets, DatasetBase},
    traits::{Fit, PredictInplace},
    Float,
};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2};

use crate::{
    active::ActiveSet,
    error::{LarsError, Result},
    path::{LarsPath, PathMeasure, PathState, PathUpdate},
    qr::ActiveQr,
    utils::{center, max_abs_where, sign},
    Lars, LarsValidParams, StopReason,
};

impl<F, D, T> Fit<ArrayBase<D, Ix2>, T, LarsError> for LarsValidParams<F>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = Lars<F>;

    /// Compute the LARS lasso path for a feature matrix `x` and a target variable `y`.
    ///
    /// The feature matrix `x` must have shape `(n_samples, n_features)`
    /// The target variable `y` must have shape `(n_samples)`
    ///
    /// The data is copied (and centered if an intercept is fitted) before the path is
    /// computed, the dataset itself is never modified. Returns a `Lars` object holding the
    /// complete path, which can be used to `predict` at any position along it.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.as_single_targets();
        let (n_samples, n_features) = x.dim();

        let centered = center(self.fit_intercept(), x, &y)?;

        // a centered design has rank at most `n_samples - 1`
        let rank_bound = if self.fit_intercept() {
            n_samples - 1
        } else {
            n_samples
        };

        let engine = LarsEngine::new(
            centered.x,
            centered.y,
            self.max_steps_for(n_samples, n_features),
            rank_bound,
            self.eps(),
        );
        let outcome = engine.run()?;

        let hyperplane = outcome.path.last_state().to_dense(n_features);
        let intercept = centered.y_mean - centered.x_means.dot(&hyperplane);

        Ok(Lars {
            path: outcome.path,
            hyperplane,
            intercept,
            y_mean: centered.y_mean,
            x_means: centered.x_means,
            ignored: outcome.ignored,
            stop_reason: outcome.stop_reason,
            warning: outcome.warning,
        })
    }
}

struct LarsOutcome<F> {
    path: LarsPath<F>,
    ignored: Vec<usize>,
    stop_reason: StopReason,
    warning: Option<String>,
}

/// Owns the working copy of the data and every piece of state of one path computation
struct LarsEngine<F> {
    x: Array2<F>,
    /// correlations `X^T r` of the current residual
    c: Array1<F>,
    active: ActiveSet<F>,
    qr: ActiveQr<F>,
    rank_bound: usize,
    max_steps: usize,
    eps: F,
}

/// Equiangular direction of one step
struct Direction<F> {
    /// coefficient direction, one entry per active variable
    w: Array1<F>,
    /// `X^T u` for the unit equiangular vector `u = Xi w`
    a: Array1<F>,
    aa: F,
}

impl<F: Float> LarsEngine<F> {
    fn new(x: Array2<F>, y: Array1<F>, max_steps: usize, rank_bound: usize, eps: F) -> Self {
        let (n_samples, n_features) = x.dim();
        let c = x.t().dot(&y);
        let capacity = n_samples.min(n_features);

        LarsEngine {
            x,
            c,
            active: ActiveSet::new(n_features),
            qr: ActiveQr::new(n_samples, capacity),
            rank_bound,
            max_steps,
            eps,
        }
    }

    fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Largest active-set size admissible for the remaining variables
    fn max_active(&self) -> usize {
        self.rank_bound
            .min(self.n_features() - self.active.n_ignored())
    }

    /// Tolerance for quantities of magnitude `scale`, `eps` below one and relative above
    fn tolerance(&self, scale: F) -> F {
        self.eps * scale.abs().max(F::one())
    }

    /// Correlation maximum over all variables that are not ignored
    ///
    /// At a breakpoint the active variables share this value in absolute terms.
    fn correlation_max(&self) -> F {
        let active = &self.active;
        max_abs_where(&self.c, |j| !active.is_ignored(j))
    }

    fn run(mut self) -> Result<LarsOutcome<F>> {
        let threshold = F::cast(100.) * self.eps;
        let mut c_max = self.correlation_max();
        let mut path = LarsPath::new(c_max);
        let mut warning = None;
        let mut is_add_case = true;

        log::debug!("Step\tAdded\tDropped\tActive set size\tC");

        let stop_reason = loop {
            let step = path.n_steps();
            if step >= self.max_steps {
                break StopReason::MaxSteps;
            }
            if c_max < threshold {
                break StopReason::NoCorrelation;
            }

            let mut added = Vec::new();
            if is_add_case {
                if self.active.len() >= self.max_active() {
                    break StopReason::Saturated;
                }
                let candidates = self.candidates(c_max);
                if candidates.is_empty() && self.active.is_empty() {
                    break StopReason::NoCandidate;
                }
                let n_candidates = candidates.len();
                added = self.add_variables(candidates);
                if added.is_empty() && n_candidates > 0 {
                    // every candidate was collinear, look again without them
                    c_max = self.correlation_max();
                    continue;
                }
            }
            debug_assert!(self.active.is_consistent());
            debug_assert_eq!(self.active.len(), self.qr.width());

            let direction = self.direction()?;
            let full_step = c_max / direction.aa;
            let gamma_hat = self.gamma_hat(c_max, full_step, &direction);
            let previous = coefficients_in_active_order(path.last_state(), self.active.len());
            let (gamma_tilde, to_drop) = self.gamma_tilde(&previous, &direction.w, full_step);

            let (gamma, dropped) = if gamma_tilde < gamma_hat {
                (gamma_tilde, to_drop)
            } else {
                (gamma_hat, Vec::new())
            };

            let moves: Vec<F> = direction.w.iter().map(|&w| gamma * w).collect();
            let update = PathUpdate::new(added, dropped);
            let state = path.last_state().advance(&update, &moves);

            self.c.scaled_add(-gamma, &direction.a);
            let next_c_max = self.correlation_max();
            if next_c_max > c_max + self.tolerance(c_max) {
                let message = format!(
                    "correlation maximum increased from {} to {} at step {}, the path stops at step {}",
                    c_max,
                    next_c_max,
                    step + 1,
                    step
                );
                log::warn!("{}", message);
                warning = Some(message);
                break StopReason::CorrelationIncrease;
            }

            let evolution = update.evolution();
            log::debug!(
                "{}\t{:?}\t{:?}\t{}\t{}",
                step + 1,
                evolution.added(),
                evolution.dropped(),
                self.active.len() - evolution.dropped().len(),
                next_c_max
            );

            for &idx in evolution.dropped() {
                if let Some(pos) = self.active.remove(idx) {
                    self.qr.remove(pos);
                }
            }
            // after a drop the next step only moves the remaining variables
            is_add_case = evolution.dropped().is_empty() || self.active.is_empty();

            path.push(state, evolution, next_c_max);
            c_max = next_c_max;
        };

        log::debug!(
            "LARS stopped after {} steps ({:?}), {} variables ignored",
            path.n_steps(),
            stop_reason,
            self.active.n_ignored()
        );

        Ok(LarsOutcome {
            path,
            ignored: self.active.ignored().to_vec(),
            stop_reason,
            warning,
        })
    }

    /// Eligible variables whose correlation ties with the maximum
    fn candidates(&self, c_max: F) -> Vec<usize> {
        (0..self.n_features())
            .filter(|&j| {
                self.active.is_eligible(j) && self.c[j].abs() >= c_max - self.tolerance(c_max)
            })
            .collect()
    }

    /// Try to enter every candidate, collinear ones are moved to the ignore set
    fn add_variables(&mut self, candidates: Vec<usize>) -> Vec<usize> {
        let mut added = Vec::with_capacity(candidates.len());
        for idx in candidates {
            if self.active.len() >= self.max_active() {
                break;
            }
            if self.qr.push(&self.x.column(idx), self.eps) {
                self.active.insert(idx, sign(self.c[idx]));
                added.push(idx);
            } else {
                log::debug!("variable {} is collinear with the active set, ignoring it", idx);
                self.active.ignore(idx);
            }
        }
        added
    }

    /// Solve `(Xi^T Xi) z = s` with the active signs `s`, then normalize so that the
    /// direction `u = Xi w` has unit length and equal correlation `aa` with every
    /// active column.
    fn direction(&self) -> Result<Direction<F>> {
        let signs = self.active.signs();
        let z = self.qr.solve_normal(&signs)?;
        let aa = F::one() / signs.dot(&z).sqrt();
        let w = z * aa;

        let xi = self.x.select(Axis(1), self.active.members());
        let u = xi.dot(&w);
        let a = self.x.t().dot(&u);

        Ok(Direction { w, a, aa })
    }

    /// Step length until an eligible variable catches up with the active correlation
    ///
    /// `full_step` brings the active correlation to zero. Step lengths scale with the
    /// response, so candidates are compared against a tolerance relative to it.
    fn gamma_hat(&self, c_max: F, full_step: F, direction: &Direction<F>) -> F {
        if self.active.len() >= self.max_active() {
            return full_step;
        }

        let aa = direction.aa;
        let threshold = self.tolerance(full_step);
        (0..self.n_features())
            .filter(|&j| self.active.is_eligible(j))
            .flat_map(|j| {
                let (c, a) = (self.c[j], direction.a[j]);
                [(c_max - c) / (aa - a), (c_max + c) / (aa + a)]
            })
            .filter(|&g| g > threshold)
            .fold(full_step, |acc, g| acc.min(g))
    }

    /// Step length until active coefficients cross zero, and every variable reaching
    /// zero at that length
    fn gamma_tilde(&self, previous: &[F], w: &Array1<F>, full_step: F) -> (F, Vec<usize>) {
        let threshold = self.tolerance(full_step);
        let crossings: Vec<(usize, F)> = self
            .active
            .members()
            .iter()
            .zip(previous.iter().zip(w.iter()))
            .filter(|(_, (_, &w))| w != F::zero())
            .map(|(&idx, (&beta, &w))| (idx, -beta / w))
            .filter(|&(_, g)| g > threshold)
            .collect();

        let gamma_tilde = crossings
            .iter()
            .fold(F::infinity(), |acc, &(_, g)| acc.min(g));
        let tolerance = self.tolerance(gamma_tilde);
        let dropped = crossings
            .into_iter()
            .filter(|&(_, g)| (g - gamma_tilde).abs() <= tolerance)
            .map(|(idx, _)| idx)
            .collect();

        (gamma_tilde, dropped)
    }
}

/// Coefficients of the active variables in active order. Variables added at the
/// beginning of the step are not part of `state` yet and start at zero.
fn coefficients_in_active_order<F: Float>(state: &PathState<F>, n_active: usize) -> Vec<F> {
    let mut coefficients: Vec<F> = state.coefficients().iter().map(|(_, v)| *v).collect();
    coefficients.resize(n_active, F::zero());
    coefficients
}

/// View the fitted path and make predictions anywhere along it
impl<F: Float> Lars<F> {
    /// Dense coefficients at `position` in `[0, 1]` along the path
    ///
    /// Position `0` gives all-zero coefficients and position `1` the last state. See
    /// [`PathMeasure`] for how positions in between are read.
    pub fn coefficients_at(&self, position: F, measure: PathMeasure) -> Array1<F> {
        self.path
            .coefficients_at(position, measure)
            .to_dense(self.n_features())
    }

    /// Intercept matching the coefficients at `position`
    pub fn intercept_at(&self, position: F, measure: PathMeasure) -> F {
        let coefficients = self.coefficients_at(position, measure);
        self.y_mean - self.x_means.dot(&coefficients)
    }

    /// Predict the target of `x` with the coefficients at `position` along the path
    pub fn predict_at<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        position: F,
        measure: PathMeasure,
    ) -> Array1<F> {
        let mut y = Array1::zeros(x.nrows());
        self.predict_at_inplace(x, position, measure, &mut y);
        y
    }

    /// Same as [`predict_at`](Self::predict_at) but writes into `y`
    pub fn predict_at_inplace<D: Data<Elem = F>>(
        &self,
        x: &ArrayBase<D, Ix2>,
        position: F,
        measure: PathMeasure,
        y: &mut Array1<F>,
    ) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.n_features(),
            "Number of data features must match the number of features the model was trained with."
        );

        let coefficients = self.coefficients_at(position, measure);
        let intercept = self.y_mean - self.x_means.dot(&coefficients);
        *y = x.dot(&coefficients) + intercept;
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>> for Lars<F> {
    /// Given an input matrix `X`, with shape `(n_samples, n_features)`,
    /// `predict` returns the target variable with the coefficients of the last
    /// state of the path.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.n_features(),
            "Number of data features must match the number of features the model was trained with."
        );

        *y = x.dot(&self.hyperplane) + self.intercept;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
