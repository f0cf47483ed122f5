pub mod boundary;
pub mod config;
pub mod error;
pub mod fiber;
pub mod geometry;
pub mod math;
pub mod optics;
pub mod random;
pub mod run;
pub mod stepping;
pub mod track;

pub use error::{OptrackError, Result};
