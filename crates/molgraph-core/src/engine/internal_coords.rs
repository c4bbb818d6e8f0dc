use crate::core::models::connected::ConnectedGraph;
use crate::core::models::indexed::IndexedGraph;
use crate::core::utils::geometry::{centroid, distance_sq};
use itertools::{Itertools, iproduct};
use nalgebra::Point3;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument};

/// One step of a Z-matrix style build order. The first atom of each step is the
/// one being placed; the others are already placed reference atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalTuple {
    /// The origin atom.
    Atom(usize),
    /// Placed by its distance to the reference atom.
    Distance(usize, usize),
    /// Placed by distance and angle. The placed slot is empty when no third atom
    /// could be chosen.
    Angle(Option<usize>, usize, usize),
    /// Placed by distance, angle and torsion.
    Torsion(usize, usize, usize, usize),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildOrderError {
    #[error("No atom has at least two bond references to start the build order from")]
    NoBranchPoint,
    #[error("Atoms {unplaced:?} cannot be reached from the seeded build order")]
    Unreachable { unplaced: Vec<usize> },
}

/// Read-only connectivity view from which a build order is derived.
///
/// Each atom's bucket lists the endpoint pairs of its bonds; a self-bond appears
/// twice in its atom's bucket, matching the Connected layout. `bonds` lists every
/// logical bond once.
#[derive(Debug, Clone)]
pub struct InternalCoordinateBuilder {
    positions: Vec<Point3<f64>>,
    buckets: Vec<Vec<[usize; 2]>>,
    bonds: Vec<[usize; 2]>,
}

impl InternalCoordinateBuilder {
    pub fn from_connected(graph: &ConnectedGraph) -> Self {
        let adjacency = graph.adjacency();
        let buckets = adjacency
            .buckets()
            .iter()
            .map(|bucket| {
                bucket
                    .iter()
                    .filter_map(|&id| adjacency.get(id).map(|bond| bond.atoms))
                    .collect()
            })
            .collect();
        Self {
            positions: graph.get_coord_list(),
            buckets,
            bonds: graph.unique_bonds().map(|(_, bond)| bond.atoms).collect(),
        }
    }

    pub fn from_indexed(graph: &IndexedGraph) -> Self {
        let mut buckets = vec![Vec::new(); graph.len()];
        for bond in graph.bonds() {
            for position in bond.atoms {
                if let Some(bucket) = buckets.get_mut(position) {
                    bucket.push(bond.atoms);
                }
            }
        }
        Self {
            positions: graph.get_coord_list(),
            buckets,
            bonds: graph.bonds().iter().map(|bond| bond.atoms).collect(),
        }
    }

    fn degree(&self, position: usize) -> usize {
        self.buckets.get(position).map_or(0, Vec::len)
    }

    fn bucket(&self, position: usize) -> &[[usize; 2]] {
        self.buckets.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Derives the build order.
    ///
    /// The first atom is the multivalent atom nearest the centroid, the second a
    /// bonded neighbour (multivalent if possible), and the third another unplaced
    /// neighbour of the first. Remaining atoms are placed through torsions
    /// `a0-a1-a2-a3`, each written with the newly placed atom first. A molecule with
    /// no torsions at all falls back to pseudo-torsions around the first atom.
    ///
    /// Fewer than three atoms yield `[Atom(0), Distance(1, 0)]`.
    ///
    /// # Errors
    ///
    /// - [`BuildOrderError::NoBranchPoint`] if no atom has two bond references.
    /// - [`BuildOrderError::Unreachable`] if some atoms cannot be placed, through
    ///   torsions or around the first atom, as with disconnected fragments.
    #[instrument(skip_all, name = "internal_coordinates", fields(atoms = self.positions.len()))]
    pub fn build(&self) -> Result<Vec<InternalTuple>, BuildOrderError> {
        let atom_count = self.positions.len();
        if atom_count < 3 {
            return Ok(vec![InternalTuple::Atom(0), InternalTuple::Distance(1, 0)]);
        }
        let center = centroid(&self.positions).unwrap_or_else(Point3::origin);

        let mut fst = None;
        let mut best = f64::INFINITY;
        for (position, point) in self.positions.iter().enumerate() {
            if self.degree(position) > 1 {
                let d = distance_sq(point, &center);
                if d < best {
                    best = d;
                    fst = Some(position);
                }
            }
        }
        let fst = fst.ok_or(BuildOrderError::NoBranchPoint)?;

        let partners: Vec<usize> = self
            .bucket(fst)
            .iter()
            .map(|&[a, b]| if a == fst { b } else { a })
            .collect();

        let nxt = partners
            .iter()
            .copied()
            .find(|&p| self.degree(p) > 1)
            .or_else(|| partners.last().copied())
            .unwrap_or(fst);

        let mut placed = HashSet::from([fst, nxt]);
        let trd = partners
            .iter()
            .copied()
            .find(|p| self.degree(*p) > 1 && !placed.contains(p))
            .or_else(|| partners.iter().copied().find(|p| !placed.contains(p)));

        let mut order = vec![
            InternalTuple::Atom(fst),
            InternalTuple::Distance(nxt, fst),
            InternalTuple::Angle(trd, fst, nxt),
        ];
        placed.extend(trd);
        if placed.len() == atom_count {
            return Ok(order);
        }

        let torsions = self.torsions();
        debug!(fst, nxt, ?trd, torsions = torsions.len(), "Seeded build order");

        if torsions.is_empty() {
            if let Some(trd) = trd {
                for &[a, b] in self.bucket(fst) {
                    let neighbor = if [fst, nxt, trd].contains(&a) { b } else { a };
                    if placed.insert(neighbor) {
                        order.push(InternalTuple::Torsion(neighbor, trd, fst, nxt));
                    }
                }
            }
            // One entry per atom; a degenerate seed may repeat an atom.
            if order.len() < atom_count {
                return Err(unreachable(&placed, atom_count));
            }
            return Ok(order);
        }

        while placed.len() < atom_count {
            let before = placed.len();
            for &[a0, a1, a2, a3] in &torsions {
                let known = [a0, a1, a2, a3].map(|a| placed.contains(&a));
                match known {
                    [false, true, true, true] => {
                        order.push(InternalTuple::Torsion(a0, a1, a2, a3));
                        placed.insert(a0);
                    }
                    [true, true, true, false] => {
                        order.push(InternalTuple::Torsion(a3, a2, a1, a0));
                        placed.insert(a3);
                    }
                    _ => {}
                }
            }
            if placed.len() == before {
                return Err(unreachable(&placed, atom_count));
            }
        }
        Ok(order)
    }

    /// Every distinct torsion `a0-a1-a2-a3` centred on a bond `a1-a2`, written so
    /// that the smaller outer atom comes first, in discovery order.
    fn torsions(&self) -> Vec<[usize; 4]> {
        self.bonds
            .iter()
            .flat_map(|&[a1, a2]| {
                let outer = self.bucket(a1).iter().flatten().copied();
                let inner = self.bucket(a2).iter().flatten().copied();
                iproduct!(outer, inner)
                    .filter(move |&(a0, a3)| {
                        a0 != a1 && a0 != a2 && a3 != a0 && a3 != a1 && a3 != a2
                    })
                    .map(move |(a0, a3)| {
                        if a0 < a3 {
                            [a0, a1, a2, a3]
                        } else {
                            [a3, a2, a1, a0]
                        }
                    })
            })
            .unique()
            .collect()
    }
}

fn unreachable(placed: &HashSet<usize>, atom_count: usize) -> BuildOrderError {
    let unplaced = (0..atom_count).filter(|p| !placed.contains(p)).collect();
    BuildOrderError::Unreachable { unplaced }
}

impl IndexedGraph {
    /// Build order for reconstructing the molecule from internal coordinates.
    ///
    /// Works directly on the bond list; the graph is neither copied nor converted.
    pub fn get_internal_tuples(&self) -> Result<Vec<InternalTuple>, BuildOrderError> {
        InternalCoordinateBuilder::from_indexed(self).build()
    }
}

impl ConnectedGraph {
    /// Build order for reconstructing the molecule from internal coordinates.
    pub fn get_internal_tuples(&self) -> Result<Vec<InternalTuple>, BuildOrderError> {
        InternalCoordinateBuilder::from_connected(self).build()
    }
}
