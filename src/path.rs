//! Bookkeeping of the piecewise linear coefficient path
//!
//! A [`LarsPath`] stores one sparse [`PathState`] per breakpoint together with the
//! [`Evolution`] of the active set between two consecutive states and the correlation
//! maximum (`lambda`) at each state. Coefficients are linear in both the L1 norm and
//! `lambda` between two breakpoints, which allows the exact reconstruction of any point
//! on the path.

use linfa::Float;
use ndarray::{Array1, Array2};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::utils::affine;

/// How a position in `[0, 1]` along the path is read
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMeasure {
    /// Fraction of the largest L1 norm reached along the path
    L1Fraction,
    /// Fraction of the way from the first to the last correlation maximum
    Lambda,
}

impl Default for PathMeasure {
    fn default() -> Self {
        PathMeasure::L1Fraction
    }
}

/// Sparse coefficients at one breakpoint, in order of insertion into the active set
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PathState<F> {
    coefficients: Vec<(usize, F)>,
    l1_norm: F,
}

impl<F: Float> Default for PathState<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Float> PathState<F> {
    /// The all-zero state at the start of every path
    pub fn empty() -> Self {
        PathState {
            coefficients: Vec::new(),
            l1_norm: F::zero(),
        }
    }

    /// Build a state from `(variable index, coefficient)` pairs
    pub fn from_pairs(coefficients: Vec<(usize, F)>) -> Self {
        let l1_norm = coefficients.iter().map(|(_, v)| v.abs()).sum();
        PathState {
            coefficients,
            l1_norm,
        }
    }

    /// The `(variable index, coefficient)` pairs
    pub fn coefficients(&self) -> &[(usize, F)] {
        &self.coefficients
    }

    /// Indices of the variables carried by this state
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.coefficients.iter().map(|(idx, _)| *idx)
    }

    /// Coefficient of variable `idx`, `None` if it is not part of the state
    pub fn get(&self, idx: usize) -> Option<F> {
        self.coefficients
            .iter()
            .find(|(i, _)| *i == idx)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.get(idx).is_some()
    }

    pub fn l1_norm(&self) -> F {
        self.l1_norm
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Dense coefficient vector of length `n_features`
    pub fn to_dense(&self, n_features: usize) -> Array1<F> {
        let mut dense = Array1::zeros(n_features);
        for &(idx, v) in &self.coefficients {
            dense[idx] = v;
        }
        dense
    }

    /// Derive the next state by applying one step of the algorithm
    ///
    /// `moves[i]` is the coefficient increment of the i-th active variable during the
    /// step. The active variables are this state's variables in order followed by the
    /// ones added at the beginning of the step.
    pub(crate) fn advance(&self, update: &PathUpdate, moves: &[F]) -> PathState<F> {
        let mut next = self.clone();
        match update {
            PathUpdate::Add(added) => {
                next.shift(moves);
                next.append(added, &moves[self.len()..]);
            }
            PathUpdate::AddWithDrop { added, dropped } => {
                next.shift(moves);
                next.append(added, &moves[self.len()..]);
                next.remove(dropped);
            }
            PathUpdate::Update => next.shift(moves),
            PathUpdate::DropAfterDrop(dropped) => {
                next.shift(moves);
                next.remove(dropped);
            }
        }
        next.l1_norm = next.coefficients.iter().map(|(_, v)| v.abs()).sum();
        next
    }

    fn shift(&mut self, moves: &[F]) {
        for ((_, v), m) in self.coefficients.iter_mut().zip(moves) {
            *v += *m;
        }
    }

    fn append(&mut self, added: &[usize], moves: &[F]) {
        debug_assert_eq!(added.len(), moves.len());
        self.coefficients
            .extend(added.iter().copied().zip(moves.iter().copied()));
    }

    fn remove(&mut self, dropped: &[usize]) {
        self.coefficients.retain(|(idx, _)| !dropped.contains(idx));
    }
}

/// Change of the active set between two consecutive states
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Evolution {
    added: Vec<usize>,
    dropped: Vec<usize>,
}

impl Evolution {
    pub fn new(added: Vec<usize>, dropped: Vec<usize>) -> Self {
        Evolution { added, dropped }
    }

    /// Variables that entered the active set during the step
    pub fn added(&self) -> &[usize] {
        &self.added
    }

    /// Variables that left the active set at the end of the step
    pub fn dropped(&self) -> &[usize] {
        &self.dropped
    }
}

/// The four ways one step transforms the previous state
///
/// A step either starts by adding variables or follows a drop, and either ends with
/// variables hitting zero or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathUpdate {
    Add(Vec<usize>),
    AddWithDrop {
        added: Vec<usize>,
        dropped: Vec<usize>,
    },
    Update,
    DropAfterDrop(Vec<usize>),
}

impl PathUpdate {
    pub(crate) fn new(added: Vec<usize>, dropped: Vec<usize>) -> Self {
        match (added.is_empty(), dropped.is_empty()) {
            (false, true) => PathUpdate::Add(added),
            (false, false) => PathUpdate::AddWithDrop { added, dropped },
            (true, true) => PathUpdate::Update,
            (true, false) => PathUpdate::DropAfterDrop(dropped),
        }
    }

    pub(crate) fn evolution(&self) -> Evolution {
        match self {
            PathUpdate::Add(added) => Evolution::new(added.clone(), Vec::new()),
            PathUpdate::AddWithDrop { added, dropped } => {
                Evolution::new(added.clone(), dropped.clone())
            }
            PathUpdate::Update => Evolution::default(),
            PathUpdate::DropAfterDrop(dropped) => Evolution::new(Vec::new(), dropped.clone()),
        }
    }
}

/// The sequence of breakpoints computed by LARS
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct LarsPath<F> {
    states: Vec<PathState<F>>,
    evolution: Vec<Evolution>,
    lambdas: Vec<F>,
}

impl<F: Float> LarsPath<F> {
    /// A path holding only the all-zero state, with correlation maximum `lambda`
    pub fn new(lambda: F) -> Self {
        LarsPath {
            states: vec![PathState::empty()],
            evolution: Vec::new(),
            lambdas: vec![lambda],
        }
    }

    pub(crate) fn push(&mut self, state: PathState<F>, evolution: Evolution, lambda: F) {
        self.states.push(state);
        self.evolution.push(evolution);
        self.lambdas.push(lambda);
    }

    /// Number of steps, the path holds one more state than steps
    pub fn n_steps(&self) -> usize {
        self.evolution.len()
    }

    pub fn states(&self) -> &[PathState<F>] {
        &self.states
    }

    pub fn state(&self, step: usize) -> &PathState<F> {
        &self.states[step]
    }

    pub fn last_state(&self) -> &PathState<F> {
        // a path always holds the initial state
        &self.states[self.states.len() - 1]
    }

    /// The evolution of the active set, entry `k` leads from state `k` to state `k + 1`
    pub fn evolution(&self) -> &[Evolution] {
        &self.evolution
    }

    /// Correlation maximum at each state
    pub fn lambdas(&self) -> &[F] {
        &self.lambdas
    }

    pub fn l1_norms(&self) -> Array1<F> {
        self.states.iter().map(PathState::l1_norm).collect()
    }

    /// Dense `n_features × (n_steps + 1)` matrix of the coefficients at every state
    pub fn coef_path(&self, n_features: usize) -> Array2<F> {
        let mut path = Array2::zeros((n_features, self.states.len()));
        for (k, state) in self.states.iter().enumerate() {
            for &(idx, v) in state.coefficients() {
                path[[idx, k]] = v;
            }
        }
        path
    }

    fn measure_at(&self, step: usize, measure: PathMeasure) -> F {
        match measure {
            PathMeasure::L1Fraction => self.states[step].l1_norm(),
            PathMeasure::Lambda => self.lambdas[step],
        }
    }

    /// Absolute target value of `position` under `measure`
    fn target(&self, position: F, measure: PathMeasure) -> F {
        match measure {
            PathMeasure::L1Fraction => {
                let l1_max = self
                    .states
                    .iter()
                    .fold(F::zero(), |acc, s| acc.max(s.l1_norm()));
                position * l1_max
            }
            PathMeasure::Lambda => {
                let first = self.lambdas[0];
                let last = self.lambdas[self.lambdas.len() - 1];
                first - position * (first - last)
            }
        }
    }

    /// The adjacent states `(k - 1, k)` enclosing `position`, `None` if the position
    /// falls exactly on the first or the last state
    ///
    /// Positions are clamped to `[0, 1]`.
    pub fn bracket(&self, position: F, measure: PathMeasure) -> Option<(usize, usize)> {
        let position = position.max(F::zero()).min(F::one());
        if self.n_steps() == 0 || position == F::zero() || position == F::one() {
            return None;
        }

        let target = self.target(position, measure);
        let reached = |k: usize| match measure {
            PathMeasure::L1Fraction => self.measure_at(k, measure) >= target,
            PathMeasure::Lambda => self.measure_at(k, measure) <= target,
        };
        let k = (1..self.states.len())
            .find(|&k| reached(k))
            .unwrap_or(self.states.len() - 1);
        Some((k - 1, k))
    }

    /// Coefficients at `position` along the path
    ///
    /// Position `0` is the all-zero state and position `1` the last state, both returned
    /// without interpolation. Other positions are interpolated between the bracketing
    /// states.
    pub fn coefficients_at(&self, position: F, measure: PathMeasure) -> PathState<F> {
        let position = position.max(F::zero()).min(F::one());
        if self.n_steps() == 0 || position == F::zero() {
            return PathState::empty();
        }
        if position == F::one() {
            return self.last_state().clone();
        }

        match self.bracket(position, measure) {
            Some((k1, k2)) => interpolate_states(
                &self.states[k1],
                &self.states[k2],
                &self.evolution[k1],
                self.measure_at(k1, measure),
                self.measure_at(k2, measure),
                self.target(position, measure),
            ),
            None => self.last_state().clone(),
        }
    }

    /// Re-express a path fitted on [`compute_z`](crate::compute_z) transformed data as
    /// a path of fused (cumulative) coefficients
    ///
    /// Every state is sorted by variable index, entries that vanish are left out and the
    /// L1 norm is recomputed. The evolution is rebuilt from the supports of consecutive
    /// states, the correlation maxima are kept.
    pub fn to_fusion(&self, n_features: usize) -> LarsPath<F> {
        let states: Vec<PathState<F>> = self
            .states
            .iter()
            .map(|state| {
                let mut running = F::zero();
                let fused = state
                    .to_dense(n_features)
                    .iter()
                    .enumerate()
                    .filter_map(|(idx, &v)| {
                        running += v;
                        if running != F::zero() {
                            Some((idx, running))
                        } else {
                            None
                        }
                    })
                    .collect();
                PathState::from_pairs(fused)
            })
            .collect();

        let evolution = states
            .windows(2)
            .map(|pair| {
                let added = pair[1].indices().filter(|&i| !pair[0].contains(i)).collect();
                let dropped = pair[0].indices().filter(|&i| !pair[1].contains(i)).collect();
                Evolution::new(added, dropped)
            })
            .collect();

        LarsPath {
            states,
            evolution,
            lambdas: self.lambdas.clone(),
        }
    }
}

/// Coefficients between two adjacent states
///
/// `x1` and `x2` are the values of the path measure at `state1` and `state2` and `target`
/// the requested value. Every coefficient is interpolated linearly and matched by
/// variable index. Variables of `state1` that are dropped towards `state2` interpolate
/// towards zero and disappear once the target reaches `state2`. Added variables start
/// from zero and are appended after the variables of `state1`.
pub fn interpolate_states<F: Float>(
    state1: &PathState<F>,
    state2: &PathState<F>,
    evolution: &Evolution,
    x1: F,
    x2: F,
    target: F,
) -> PathState<F> {
    let reached_end = if x2 == x1 {
        true
    } else {
        (target - x1) / (x2 - x1) >= F::one()
    };

    let mut coefficients = Vec::with_capacity(state1.len() + evolution.added().len());
    for &(idx, v1) in state1.coefficients() {
        let is_dropped = evolution.dropped().contains(&idx);
        if is_dropped && reached_end {
            continue;
        }
        let v2 = state2.get(idx).unwrap_or_else(F::zero);
        coefficients.push((idx, affine(x1, v1, x2, v2, target)));
    }

    for &idx in evolution.added() {
        if state1.contains(idx) {
            continue;
        }
        let v2 = state2.get(idx).unwrap_or_else(F::zero);
        coefficients.push((idx, affine(x1, F::zero(), x2, v2, target)));
    }

    PathState::from_pairs(coefficients)
}
