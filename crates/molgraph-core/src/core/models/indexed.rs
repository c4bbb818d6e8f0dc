use super::atom::Atom;
use super::connected::{BondAdjacency, ConnectedGraph};
use super::error::GraphError;
use super::graph::{BondStore, MolecularGraph};
use super::ids::AtomId;
use super::topology::{Bond, BondOrder};
use crate::core::feedback::FeedbackCategory;
use crate::core::utils::elements::HYDROGEN_MASS;
use std::collections::HashSet;

/// Flat bond layout: every bond appears exactly once, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondList {
    bonds: Vec<Bond>,
}

impl From<Vec<Bond>> for BondList {
    fn from(bonds: Vec<Bond>) -> Self {
        Self { bonds }
    }
}

impl BondStore for BondList {
    const LABEL: &'static str = "Indexed";

    fn len(&self) -> usize {
        self.bonds.len()
    }

    fn iter(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.iter()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bond> {
        self.bonds.iter_mut()
    }

    fn atom_appended(&mut self) {}

    fn atom_inserted(&mut self, position: usize) {
        for bond in &mut self.bonds {
            bond.remap(|a| if a >= position { a + 1 } else { a });
        }
    }

    fn atom_removed(&mut self, position: usize) {
        self.bonds.retain(|bond| !bond.contains(position));
        for bond in &mut self.bonds {
            bond.remap(|a| if a > position { a - 1 } else { a });
        }
    }

    fn clear(&mut self) {
        self.bonds.clear();
    }
}

/// Graph whose bonds are held in one flat list referencing atom positions.
pub type IndexedGraph = MolecularGraph<BondList>;

impl MolecularGraph<BondList> {
    /// All bonds, in list order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds.bonds
    }

    /// Retrieves the bond at a list position.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position in the bond list.
    ///
    /// # Return
    ///
    /// Returns `Some(&Bond)` if the position is in range, otherwise `None`.
    pub fn bond(&self, position: usize) -> Option<&Bond> {
        self.bonds.bonds.get(position)
    }

    fn bond_slot(&mut self, position: usize) -> Result<&mut Bond, GraphError> {
        let len = self.bonds.bonds.len();
        self.bonds
            .bonds
            .get_mut(position)
            .ok_or(GraphError::BondOutOfRange { position, len })
    }

    /// Changes the order of the bond at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::BondOutOfRange`] if there is no such bond.
    pub fn set_bond_order(&mut self, position: usize, order: BondOrder) -> Result<(), GraphError> {
        self.bond_slot(position)?.order = order;
        Ok(())
    }

    /// Changes the stereo flag of the bond at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::BondOutOfRange`] if there is no such bond.
    pub fn set_bond_stereo(&mut self, position: usize, stereo: i8) -> Result<(), GraphError> {
        self.bond_slot(position)?.stereo = stereo;
        Ok(())
    }

    /// Moves the bond at `position` onto new endpoints.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position in the bond list.
    /// * `atoms` - The new endpoint positions.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::BondOutOfRange`] if there is no such bond, or
    /// [`GraphError::DanglingBond`] if either endpoint is not a current atom
    /// position. The bond is unchanged in both cases.
    pub fn set_bond_atoms(&mut self, position: usize, atoms: [usize; 2]) -> Result<(), GraphError> {
        let mut moved = *self.bond(position).ok_or(GraphError::BondOutOfRange {
            position,
            len: self.bonds.bonds.len(),
        })?;
        moved.atoms = atoms;
        self.check_bond(&moved)?;
        self.report(FeedbackCategory::Bonds, || {
            format!("moving bond {position} to ({}, {})", atoms[0], atoms[1])
        });
        self.bond_slot(position)?.atoms = atoms;
        Ok(())
    }

    /// Appends a bond to the list.
    ///
    /// # Return
    ///
    /// The position of the new bond in the list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingBond`] if either endpoint is not a current position.
    pub fn add_bond(&mut self, bond: Bond) -> Result<usize, GraphError> {
        self.check_bond(&bond)?;
        self.report(FeedbackCategory::Bonds, || {
            format!("adding bond ({}, {})", bond.atoms[0], bond.atoms[1])
        });
        self.bonds.bonds.push(bond);
        Ok(self.bonds.bonds.len() - 1)
    }

    /// Removes the bond at `position` in the bond list.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::BondOutOfRange`] if there is no such bond.
    pub fn remove_bond(&mut self, position: usize) -> Result<Bond, GraphError> {
        let len = self.bonds.bonds.len();
        if position >= len {
            return Err(GraphError::BondOutOfRange { position, len });
        }
        self.report(FeedbackCategory::Bonds, || format!("removing bond {position}"));
        Ok(self.bonds.bonds.remove(position))
    }

    /// Deletes several atoms in one pass.
    ///
    /// Duplicate positions are ignored. Every bond touching a deleted atom is dropped
    /// and the survivors are renumbered through a single old-to-new translation, so
    /// the result matches deleting the positions one at a time in descending order.
    /// The identity index, if present, is rebuilt.
    ///
    /// # Return
    ///
    /// The removed atoms in ascending position order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PositionOutOfRange`] if any position is out of range; no
    /// atom is deleted in that case.
    pub fn delete_list(&mut self, positions: &[usize]) -> Result<Vec<Atom>, GraphError> {
        if let Some(&position) = positions.iter().find(|&&p| p >= self.len()) {
            return Err(GraphError::PositionOutOfRange {
                position,
                len: self.len(),
            });
        }
        let doomed: HashSet<usize> = positions.iter().copied().collect();
        self.report(FeedbackCategory::Atoms, || {
            format!("deleting {} atoms", doomed.len())
        });

        let mut translation = Vec::with_capacity(self.len());
        let mut next = 0;
        for position in 0..self.len() {
            if doomed.contains(&position) {
                translation.push(None);
            } else {
                translation.push(Some(next));
                next += 1;
            }
        }

        self.bonds
            .bonds
            .retain(|bond| bond.atoms.iter().all(|&a| translation[a].is_some()));
        for bond in &mut self.bonds.bonds {
            bond.remap(|a| translation[a].unwrap_or(a));
        }
        Ok(self.remove_positions(&doomed))
    }

    /// Moves every atom and bond of `other` into `self` and resets `other`.
    ///
    /// Bond endpoints from `other` are offset by the number of atoms `self` held
    /// before the merge. Handles are not portable between graphs, so the merged
    /// atoms receive new ones.
    ///
    /// # Return
    ///
    /// The new handles of the merged atoms, in their original order.
    pub fn merge(&mut self, other: &mut IndexedGraph) -> Vec<AtomId> {
        self.report(FeedbackCategory::Actions, || {
            format!("merging {} atoms", other.len())
        });
        let offset = self.len();
        let bonds = std::mem::take(&mut other.bonds.bonds);
        let (mut atoms, order, _) = other.take_parts();

        let ids: Vec<AtomId> = order
            .into_iter()
            .filter_map(|id| atoms.remove(id))
            .map(|atom| self.append(atom))
            .collect();
        self.bonds.bonds.extend(bonds.into_iter().map(|mut bond| {
            bond.remap(|a| a + offset);
            bond
        }));
        if self.has_index() {
            self.update_index();
        }
        ids
    }

    /// Stable-sorts atoms by their natural ordering and renumbers every bond.
    ///
    /// The identity index is built if absent and stays built afterwards.
    pub fn sort(&mut self) {
        self.report(FeedbackCategory::Verbose, || "sorting".to_string());
        let translation = self.sort_sequence();
        for bond in &mut self.bonds.bonds {
            bond.remap(|a| translation.get(a).copied().unwrap_or(a));
        }
    }

    /// Moves the atoms into a new [`ConnectedGraph`] and resets `self`.
    ///
    /// Each bond is listed under both of its endpoints. The new graph has no
    /// identity index; atom handles survive the move.
    pub fn convert_to_connected(&mut self) -> ConnectedGraph {
        self.report(FeedbackCategory::Verbose, || {
            "converting to connected model".to_string()
        });
        let bonds = std::mem::take(&mut self.bonds.bonds);
        let feedback = self.feedback().clone();
        let (atoms, order, molecule) = self.take_parts();

        let mut adjacency = BondAdjacency::with_atoms(order.len());
        for bond in bonds {
            adjacency.link(bond);
        }
        MolecularGraph::from_parts(atoms, order, molecule, adjacency, feedback)
    }

    /// Mass including the hydrogens implied by each atom's unmet valence.
    ///
    /// Observed valence sums bond orders at each endpoint, with aromatic bonds
    /// counting 1.5 and a self-bond counting at both of its (identical) ends.
    pub fn get_implicit_mass(&self) -> f64 {
        let mut valence = vec![0.0; self.len()];
        for bond in self.bonds() {
            for position in bond.atoms {
                if let Some(total) = valence.get_mut(position) {
                    *total += bond.order.valence();
                }
            }
        }
        let hydrogens: u32 = self
            .atoms()
            .zip(&valence)
            .map(|(atom, &observed)| atom.free_valence(observed))
            .sum();
        self.get_mass() + f64::from(hydrogens) * HYDROGEN_MASS
    }
}
