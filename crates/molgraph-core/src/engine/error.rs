use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("Point sets differ in length: {target} target points vs {source_len} source points")]
    LengthMismatch { target: usize, source_len: usize },

    #[error("Point {index} has {dimension} coordinates; exactly 3 are required")]
    InvalidDimension { index: usize, dimension: usize },

    #[error("Cannot fit empty point sets")]
    Empty,

    #[error("Superposition failed to converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
}
