use thiserror::Error;

/// Top-level error type for the optrack photon transport core.
#[derive(Debug, Error)]
pub enum OptrackError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),
}

/// Errors raised by geometry queries.
///
/// [`GeometryError::InvalidNormal`] aborts the current event; the others
/// signal a malformed geometry store.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("navigator returned an invalid surface normal at ({x}, {y}, {z})")]
    InvalidNormal { x: f64, y: f64, z: f64 },

    #[error("volume not found: {0}")]
    VolumeNotFound(String),

    #[error("material not found: {0}")]
    MaterialNotFound(String),

    #[error("optical surface not found: {0}")]
    SurfaceNotFound(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("invalid volume name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Errors in setup-time configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{parameter} = {value} is out of range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("trapping fractions must satisfy 0 <= core <= clad1 <= clad2 <= 1, got {0:?}")]
    TrappingFractions([f64; 3]),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors in run-level bookkeeping. All of them are fatal for the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("volume ID {id} out of bounds for {len} hit counters")]
    VolumeIdOutOfRange { id: i32, len: usize },

    #[error("cannot merge hit accumulators of size {left} and {right}")]
    SizeMismatch { left: usize, right: usize },
}

/// Convenience type alias for results using [`OptrackError`].
pub type Result<T> = std::result::Result<T, OptrackError>;
