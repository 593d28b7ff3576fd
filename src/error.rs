use thiserror::Error;

/// Simplified `Result` using [`LarsError`](crate::LarsError) as error type
pub type Result<T> = std::result::Result<T, LarsError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LarsError {
    #[error("epsilon should be positive and finite, but is {0}")]
    InvalidEpsilon(f32),
    #[error("the maximal number of steps must be at least 1")]
    InvalidMaxSteps,
    #[error("at least 1 sample needed")]
    NotEnoughSamples,
    #[error("at least 2 folds are needed, but {0} were requested")]
    TooFewFolds(usize),
    #[error("number of folds should lie in [2, {n_samples}], but is {n_folds}")]
    InvalidFoldCount { n_folds: usize, n_samples: usize },
    #[error("at least one path position is needed")]
    EmptyPositions,
    #[error("path positions should lie in [0, 1], but found {0}")]
    InvalidPosition(f32),
    #[error("fold assignment has {found} entries for {expected} samples")]
    FoldAssignmentLength { expected: usize, found: usize },
    #[error("sample assigned to fold {fold}, but only {n_folds} folds exist")]
    FoldOutOfRange { fold: usize, n_folds: usize },
    #[error("fold {0} holds no sample")]
    EmptyFold(usize),
    #[error(transparent)]
    Linalg(#[from] linfa_linalg::LinalgError),
    #[error(transparent)]
    BaseCrate(#[from] linfa::Error),
}
