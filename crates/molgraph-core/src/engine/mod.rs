//! # Engine Module
//!
//! Algorithms that operate on the core models.
//!
//! ## Architecture
//!
//! - **Superposition** ([`fitter`]) - Iterative least-squares fitting of one point set onto another
//! - **Build Order** ([`internal_coords`]) - Z-matrix style placement order derived from connectivity
//! - **Configuration** ([`config`]) - Fit parameters and TOML-backed settings
//! - **Error Handling** ([`error`]) - Fitting failures

pub mod config;
pub mod error;
pub mod fitter;
pub mod internal_coords;
