//! # molgraph
//!
//! Molecular graph containers with position-stable bond bookkeeping, rigid-body
//! superposition, and internal-coordinate build orders.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers:
//!
//! - **[`core`]: The Foundation.** Atom and bond value types, the `MolecularGraph`
//!   container in its Indexed and Connected layouts, 3D geometry helpers, the static
//!   element table, and the feedback side channel.
//!
//! - **[`engine`]: The Algorithms.** The superposition `Fitter`, the
//!   `InternalCoordinateBuilder`, and the settings that parameterize them.
//!
//! Logging goes through `tracing`; installing a subscriber is left to the embedding
//! application.

pub mod core;
pub mod engine;
