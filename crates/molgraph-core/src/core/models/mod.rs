//! # Core Models Module
//!
//! Data structures for representing a molecule as a graph of atoms and bonds.
//!
//! ## Overview
//!
//! A molecule is held by a [`graph::MolecularGraph`], which owns its atoms in a
//! `slotmap` arena, keeps them in an explicit sequence, and delegates bond storage
//! to one of two layouts:
//!
//! - **Indexed** ([`indexed`]) - a single flat list of bonds referencing atom positions
//! - **Connected** ([`connected`]) - one adjacency bucket per atom, each bond listed
//!   under both of its endpoints while stored only once
//!
//! Both layouts share insertion, deletion, residue segmentation, naming and mass
//! bookkeeping through the [`graph::BondStore`] capability trait, and can be converted
//! into one another without losing atom identity.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom values with sparse, presence-tracked annotations
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - Container-level metadata (title, comments, chirality, dimensionality)
//! - [`ids`] - Stable handles for atoms and bonds
//! - [`error`] - Structural contract violations
//!
//! ## Usage
//!
//! ```ignore
//! use molgraph::core::models::{atom::Atom, indexed::IndexedGraph, topology::{Bond, BondOrder}};
//!
//! let mut graph = IndexedGraph::new();
//! let c = graph.add_atom(Atom::new("C", Point3::origin()));
//! let o = graph.add_atom(Atom::new("O", Point3::new(1.2, 0.0, 0.0)));
//! graph.add_bond(Bond::new(c, o, BondOrder::Double))?;
//!
//! let connected = graph.convert_to_connected();
//! ```

pub mod atom;
pub mod connected;
pub mod error;
pub mod graph;
pub mod ids;
pub mod indexed;
pub mod molecule;
pub mod topology;
