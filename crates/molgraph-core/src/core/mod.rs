//! # Core Module
//!
//! The stateless foundation of the library: molecular data models, geometry and
//! element utilities, and the feedback side channel used by mutating operations.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds and the Indexed/Connected graph containers
//! - **Utilities** ([`utils`]) - 3D vector and matrix helpers, and the static element table
//! - **Feedback** ([`feedback`]) - Category-gated progress notifications

pub mod feedback;
pub mod models;
pub mod utils;
