use super::ids::{AtomId, BondId};
use thiserror::Error;

/// Structural contract violations detected at a graph container boundary.
///
/// Every mutating operation validates its input before touching the container,
/// so a returned error means the graph was left exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Atom position {position} is out of range for a container of {len} atoms")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Bond ({a}, {b}) references an atom outside a container of {len} atoms", a = atoms[0], b = atoms[1])]
    DanglingBond { atoms: [usize; 2], len: usize },

    #[error("Bond position {position} is out of range for a list of {len} bonds")]
    BondOutOfRange { position: usize, len: usize },

    #[error("Bond {0:?} does not exist in this container")]
    UnknownBond(BondId),

    #[error("Identity index is inconsistent for atom {id:?}: {reason}")]
    IndexMismatch { id: AtomId, reason: &'static str },

    #[error("Adjacency layout is inconsistent: {0}")]
    Adjacency(String),
}
