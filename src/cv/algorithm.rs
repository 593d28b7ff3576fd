use linfa::{
    dataset::{AsSingleTargets, DatasetBase},
    traits::Fit,
    Float,
};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use rand::Rng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::{random_folds, LarsCv, LarsCvValidParams};
use crate::{
    error::{LarsError, Result},
    LarsValidParams, PathMeasure,
};

impl<F, R, D, T> Fit<ArrayBase<D, Ix2>, T, LarsError> for LarsCvValidParams<F, R>
where
    F: Float,
    R: Rng + Clone,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = LarsCv<F>;

    /// Estimate the prediction error along the LARS path with k-fold cross-validation
    ///
    /// The folds are validated against the dataset, or drawn at random from a clone of the
    /// configured generator, so that fitting twice gives the same folds.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records().view();
        let y = dataset.as_single_targets();
        let n_samples = x.nrows();

        if n_samples == 0 {
            return Err(LarsError::NotEnoughSamples);
        }
        if self.n_folds > n_samples {
            return Err(LarsError::InvalidFoldCount {
                n_folds: self.n_folds,
                n_samples,
            });
        }

        let folds = match &self.folds {
            Some(folds) if folds.len() != n_samples => {
                return Err(LarsError::FoldAssignmentLength {
                    expected: n_samples,
                    found: folds.len(),
                })
            }
            Some(folds) => folds.clone(),
            None => {
                let mut rng = self.rng.clone();
                random_folds(n_samples, self.n_folds, &mut rng)
            }
        };

        let mut fold_sizes = vec![0; self.n_folds];
        for &fold in &folds {
            fold_sizes[fold] += 1;
        }
        log::debug!("cross-validation with fold sizes {:?}", fold_sizes);

        let evaluation = FoldEvaluation {
            lars: &self.lars,
            positions: &self.positions,
            measure: self.measure,
            x,
            y,
            folds: &folds,
        };

        #[cfg(feature = "rayon")]
        let errors = (0..self.n_folds)
            .into_par_iter()
            .map(|fold| evaluation.held_out_errors(fold))
            .collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let errors = (0..self.n_folds)
            .map(|fold| evaluation.held_out_errors(fold))
            .collect::<Result<Vec<_>>>()?;

        let mut fold_errors = Array2::zeros((self.positions.len(), self.n_folds));
        for (mut column, errors) in fold_errors.columns_mut().into_iter().zip(&errors) {
            column.assign(errors);
        }

        let k = F::cast(self.n_folds);
        let mean = fold_errors.sum_axis(Axis(1)) / k;
        let deviation = &fold_errors - &mean.view().insert_axis(Axis(1));
        let std_error = deviation
            .mapv(|d| d * d)
            .sum_axis(Axis(1))
            .mapv(|s| (s / ((k - F::one()) * k)).sqrt());

        Ok(LarsCv {
            positions: Array1::from(self.positions.clone()),
            measure: self.measure,
            mean,
            std_error,
            fold_errors,
            fold_sizes,
            folds,
        })
    }
}

/// Everything one fold needs, shared between the folds
struct FoldEvaluation<'a, F> {
    lars: &'a LarsValidParams<F>,
    positions: &'a [F],
    measure: PathMeasure,
    x: ArrayView2<'a, F>,
    y: ArrayView1<'a, F>,
    folds: &'a [usize],
}

impl<'a, F: Float> FoldEvaluation<'a, F> {
    /// Compute a path without the samples of `fold` and return the mean squared error of
    /// those samples at every position
    fn held_out_errors(&self, fold: usize) -> Result<Array1<F>> {
        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..self.folds.len()).partition(|&i| self.folds[i] == fold);

        let training = DatasetBase::new(
            self.x.select(Axis(0), &train),
            self.y.select(Axis(0), &train),
        );
        let x_test = self.x.select(Axis(0), &test);
        let y_test = self.y.select(Axis(0), &test);

        let model = self.lars.fit(&training)?;
        log::debug!(
            "fold {}: {} training samples, {} held out, {} steps",
            fold,
            train.len(),
            test.len(),
            model.n_steps()
        );

        let errors = self
            .positions
            .iter()
            .map(|&position| {
                let residual = model.predict_at(&x_test, position, self.measure) - &y_test;
                residual.mapv(|r| r * r).sum() / F::cast(test.len())
            })
            .collect();

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lars;
    use approx::assert_abs_diff_eq;
    use linfa::{traits::Fit, Dataset, ParamGuard};
    use ndarray::{array, Array1, Array2, Ix1};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::StandardNormal;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn sparse_problem(seed: u64) -> Dataset<f64, f64, Ix1> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        let x = Array2::<f64>::random_using((40, 10), StandardNormal, &mut rng);
        let noise = Array1::<f64>::random_using(40, StandardNormal, &mut rng);
        let mut beta = Array1::zeros(10);
        beta[0] = 2.0;
        beta[3] = -1.5;
        let y = x.dot(&beta) + noise * 0.5;
        Dataset::new(x, y)
    }

    #[test]
    fn fold_errors_are_held_out_errors() {
        let dataset = sparse_problem(1);
        let folds: Vec<usize> = (0..40).map(|i| i % 4).collect();
        let cv = LarsCv::params()
            .n_folds(4)
            .positions(vec![0.0, 0.5, 1.0])
            .folds(folds.clone())
            .fit(&dataset)
            .unwrap();

        assert_eq!(cv.fold_errors().dim(), (3, 4));
        assert_eq!(cv.fold_sizes(), &[10, 10, 10, 10]);
        assert_eq!(cv.folds(), &folds[..]);

        // recompute the error of the last fold at the last position by hand
        let train: Vec<usize> = (0..40).filter(|i| i % 4 != 3).collect();
        let test: Vec<usize> = (0..40).filter(|i| i % 4 == 3).collect();
        let model = Lars::params()
            .fit(&Dataset::new(
                dataset.records().select(Axis(0), &train),
                dataset.targets().select(Axis(0), &train),
            ))
            .unwrap();
        let x_test = dataset.records().select(Axis(0), &test);
        let y_test = dataset.targets().select(Axis(0), &test);
        let residual = model.predict_at(&x_test, 1.0, PathMeasure::L1Fraction) - &y_test;
        let expected = residual.mapv(|r| r * r).mean().unwrap();
        assert_abs_diff_eq!(cv.fold_errors()[[2, 3]], expected, epsilon = 1e-12);

        let mean = cv.fold_errors().mean_axis(Axis(1)).unwrap();
        assert_abs_diff_eq!(cv.mean(), &mean, epsilon = 1e-12);
    }

    #[test]
    fn standard_error_of_the_mean() {
        let dataset = sparse_problem(2);
        let cv = LarsCv::params()
            .n_folds(5)
            .positions(vec![0.3])
            .fit(&dataset)
            .unwrap();

        let errors = cv.fold_errors().row(0).to_owned();
        let mean = errors.mean().unwrap();
        let variance = errors.mapv(|e| (e - mean) * (e - mean)).sum() / 4.0;
        assert_abs_diff_eq!(cv.std_error()[0], (variance / 5.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn explicit_folds_are_reproducible() {
        let dataset = sparse_problem(3);
        let folds: Vec<usize> = (0..40).map(|i| (i * 7) % 5).collect();
        let params = LarsCv::params()
            .n_folds(5)
            .positions(vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0])
            .measure(PathMeasure::Lambda)
            .folds(folds)
            .check()
            .unwrap();

        let first = params.fit(&dataset).unwrap();
        let second = params.fit(&dataset).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn random_folds_follow_the_generator() {
        let dataset = sparse_problem(4);
        let first = LarsCv::params_with_rng(Xoshiro256Plus::seed_from_u64(9))
            .n_folds(3)
            .positions(vec![0.5])
            .fit(&dataset)
            .unwrap();
        let second = LarsCv::params()
            .with_rng(Xoshiro256Plus::seed_from_u64(9))
            .n_folds(3)
            .positions(vec![0.5])
            .fit(&dataset)
            .unwrap();

        assert_eq!(first.folds(), second.folds());
        assert_eq!(first.mean(), second.mean());
        let mut sizes = first.fold_sizes().to_vec();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![13, 13, 14]);
    }

    #[test]
    fn dataset_dependent_checks() {
        let dataset = Dataset::new(array![[1.0], [2.0], [3.0]], array![1.0, 2.0, 3.0]);

        let res = LarsCv::params().n_folds(4).fit(&dataset);
        assert!(matches!(
            res,
            Err(LarsError::InvalidFoldCount {
                n_folds: 4,
                n_samples: 3
            })
        ));

        let res = LarsCv::params().n_folds(2).folds(vec![0, 1]).fit(&dataset);
        assert!(matches!(
            res,
            Err(LarsError::FoldAssignmentLength {
                expected: 3,
                found: 2
            })
        ));
    }
}
