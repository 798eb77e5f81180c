// Error types
use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Faults raised by the field engines and their collaborators.
///
/// None of these are retried internally; recovery belongs to the caller
/// (e.g. moving the sample grid off a charge location).
#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported charge kind tag: {0}")]
    UnsupportedChargeKind(f64),

    #[error("line record density {found} disagrees with q / length = {expected}")]
    LineDensityMismatch { expected: f64, found: f64 },

    #[error("charge collection is empty")]
    EmptyChargeSet,

    #[error("invalid sample grid: {0}")]
    InvalidSampleGrid(String),

    #[error("invalid launch request: shape {shape:?} with budget {max_units}")]
    InvalidLaunch { shape: Vec<usize>, max_units: usize },

    #[error("buffer shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Faults caused by caller input rather than by execution.
    pub fn is_input_fault(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedChargeKind(_)
                | Error::LineDensityMismatch { .. }
                | Error::EmptyChargeSet
                | Error::InvalidSampleGrid(_)
                | Error::InvalidLaunch { .. }
                | Error::Config(_)
        )
    }
}
