use super::atom::Atom;
use super::error::GraphError;
use super::ids::AtomId;
use super::molecule::Molecule;
use super::topology::Bond;
use crate::core::feedback::{Feedback, FeedbackCategory};
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use tracing::{debug, warn};

/// Storage strategy for the bonds of a [`MolecularGraph`].
///
/// The shared container keeps atoms, positions and the identity index; the store
/// owns bond layout and is told about every positional shift so that it can keep
/// endpoints valid. Implementors must leave no bond referencing a position that
/// no longer exists once a hook returns.
pub trait BondStore: Default + Clone + fmt::Debug {
    /// Short label used when reporting feedback.
    const LABEL: &'static str;

    /// Number of logical bonds. A bond referenced from two places counts once.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every logical bond exactly once.
    fn iter(&self) -> impl Iterator<Item = &Bond>;

    /// Mutably iterates every logical bond exactly once.
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bond>;

    /// Called after an atom has been appended at the end of the sequence.
    fn atom_appended(&mut self);

    /// Called after an atom has been inserted at `position`; endpoints at or past
    /// `position` must move up by one.
    fn atom_inserted(&mut self, position: usize);

    /// Called after the atom at `position` has been removed; bonds touching it must
    /// be dropped and endpoints past it must move down by one.
    fn atom_removed(&mut self, position: usize);

    fn clear(&mut self);

    /// Checks layout-specific invariants for a container holding `atom_count` atoms.
    fn validate_layout(&self, _atom_count: usize) -> Result<(), GraphError> {
        Ok(())
    }
}

/// An ordered collection of atoms together with the bonds between them.
///
/// Atoms live in a `slotmap` arena and are addressed two ways: by their stable
/// [`AtomId`] handle, and by their current position in the atom sequence. Bonds
/// reference positions, so every structural edit renumbers them in the same call.
///
/// The identity index (`AtomId` → position) is an optional cache. It is absent
/// until [`MolecularGraph::update_index`] is called and, once built, is kept in
/// step with every mutation.
///
/// Every mutating method validates its arguments before touching any state, so
/// an `Err` return leaves the graph exactly as it was.
#[derive(Debug, Clone, Default)]
pub struct MolecularGraph<B: BondStore> {
    atoms: SlotMap<AtomId, Atom>,
    order: Vec<AtomId>,
    index: Option<SecondaryMap<AtomId, usize>>,
    molecule: Molecule,
    pub(crate) bonds: B,
    feedback: Feedback,
}

impl<B: BondStore> MolecularGraph<B> {
    /// Creates an empty graph with no identity index and default metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph that reports through `feedback`.
    ///
    /// # Arguments
    ///
    /// * `feedback` - The category flags and optional sink used for reporting.
    pub fn with_feedback(feedback: Feedback) -> Self {
        Self {
            feedback,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        atoms: SlotMap<AtomId, Atom>,
        order: Vec<AtomId>,
        molecule: Molecule,
        bonds: B,
        feedback: Feedback,
    ) -> Self {
        Self {
            atoms,
            order,
            index: None,
            molecule,
            bonds,
            feedback,
        }
    }

    /// Moves the atom arena, sequence and metadata out, leaving `self` reset.
    pub(crate) fn take_parts(&mut self) -> (SlotMap<AtomId, Atom>, Vec<AtomId>, Molecule) {
        let atoms = std::mem::take(&mut self.atoms);
        let order = std::mem::take(&mut self.order);
        let molecule = std::mem::take(&mut self.molecule);
        self.reset();
        (atoms, order, molecule)
    }

    pub(crate) fn report(&self, category: FeedbackCategory, message: impl FnOnce() -> String) {
        self.feedback.report(category, B::LABEL, message);
    }

    /// The feedback channel this graph reports through.
    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Replaces the feedback channel.
    ///
    /// # Arguments
    ///
    /// * `feedback` - The new category flags and optional sink.
    pub fn set_feedback(&mut self, feedback: Feedback) {
        self.feedback = feedback;
    }

    /// Returns the number of atoms in the sequence.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the graph holds no atoms.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Retrieves an immutable reference to the atom at a sequence position.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position in the atom sequence.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the position is in range, otherwise `None`.
    pub fn atom(&self, position: usize) -> Option<&Atom> {
        self.order.get(position).and_then(|&id| self.atoms.get(id))
    }

    /// Retrieves a mutable reference to the atom at a sequence position.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position in the atom sequence.
    ///
    /// # Return
    ///
    /// Returns `Some(&mut Atom)` if the position is in range, otherwise `None`.
    pub fn atom_mut(&mut self, position: usize) -> Option<&mut Atom> {
        let id = *self.order.get(position)?;
        self.atoms.get_mut(id)
    }

    /// Retrieves an immutable reference to an atom by its stable handle.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom is still held by this graph, otherwise `None`.
    pub fn atom_by_id(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its stable handle.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&mut Atom)` if the atom is still held by this graph, otherwise `None`.
    pub fn atom_by_id_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Returns the stable handle of the atom at a sequence position.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position in the atom sequence.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if the position is in range, otherwise `None`.
    pub fn atom_id(&self, position: usize) -> Option<AtomId> {
        self.order.get(position).copied()
    }

    /// Atom handles in sequence order.
    pub fn atom_ids(&self) -> &[AtomId] {
        &self.order
    }

    /// Iterates atoms in sequence order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> + '_ {
        self.order.iter().filter_map(|&id| self.atoms.get(id))
    }

    /// Molecule-level metadata (title, dimensionality, comments).
    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    /// Mutable access to the molecule-level metadata.
    pub fn molecule_mut(&mut self) -> &mut Molecule {
        &mut self.molecule
    }

    /// Replaces the molecule-level metadata.
    ///
    /// # Arguments
    ///
    /// * `molecule` - The new metadata record.
    pub fn set_molecule(&mut self, molecule: Molecule) {
        self.molecule = molecule;
    }

    /// The identity index, if one has been built.
    pub fn identity_index(&self) -> Option<&SecondaryMap<AtomId, usize>> {
        self.index.as_ref()
    }

    /// Returns `true` if an identity index has been built and not cleared.
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Drops the identity index without rebuilding it.
    pub fn clear_index(&mut self) {
        self.index = None;
    }

    /// Number of logical bonds, counting each bond once regardless of layout.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Appends an atom to the end of the sequence.
    ///
    /// If an identity index exists, the new atom is recorded in it.
    ///
    /// # Arguments
    ///
    /// * `atom` - The atom to append.
    ///
    /// # Return
    ///
    /// The position of the new atom, which is always `len() - 1` afterwards.
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.report(FeedbackCategory::Atoms, || {
            format!("adding atom \"{}\"", atom.name_or_default())
        });
        self.append(atom);
        self.order.len() - 1
    }

    pub(crate) fn append(&mut self, atom: Atom) -> AtomId {
        let position = self.order.len();
        let id = self.atoms.insert(atom);
        self.order.push(id);
        if let Some(index) = self.index.as_mut() {
            index.insert(id, position);
        }
        self.bonds.atom_appended();
        id
    }

    /// Removes the atom at `position` along with every bond that touches it.
    ///
    /// Remaining bond endpoints and identity-index entries past `position` shift
    /// down by one.
    ///
    /// # Arguments
    ///
    /// * `position` - The zero-based position of the atom to remove.
    ///
    /// # Return
    ///
    /// The removed atom.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PositionOutOfRange`] if `position` is not a current
    /// atom position, or [`GraphError::IndexMismatch`] if the sequence entry has no
    /// atom behind it. The graph is left unchanged in both cases.
    pub fn delete_atom(&mut self, position: usize) -> Result<Atom, GraphError> {
        self.check_position(position)?;
        let id = self.order[position];
        let atom = self.atoms.remove(id).ok_or(GraphError::IndexMismatch {
            id,
            reason: "sequence entry has no atom in the arena",
        })?;
        self.report(FeedbackCategory::Atoms, || format!("deleting atom {position}"));

        self.order.remove(position);
        if let Some(index) = self.index.as_mut() {
            index.remove(id);
            for slot in index.values_mut() {
                if *slot > position {
                    *slot -= 1;
                }
            }
        }
        self.bonds.atom_removed(position);
        Ok(atom)
    }

    /// Inserts an atom before `position`, shifting later atoms up by one.
    ///
    /// Inserting at `len()` appends. Bond endpoints at or past `position` are
    /// incremented, so the new atom never becomes an endpoint of an existing bond.
    ///
    /// # Arguments
    ///
    /// * `position` - The position the new atom will occupy, at most `len()`.
    /// * `atom` - The atom to insert.
    ///
    /// # Return
    ///
    /// The stable handle of the inserted atom.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PositionOutOfRange`] if `position > len()`.
    pub fn insert_atom(&mut self, position: usize, atom: Atom) -> Result<AtomId, GraphError> {
        if position > self.order.len() {
            return Err(GraphError::PositionOutOfRange {
                position,
                len: self.order.len(),
            });
        }
        self.report(FeedbackCategory::Atoms, || {
            format!(
                "inserting atom \"{}\" before {position}",
                atom.name_or_default()
            )
        });

        let id = self.atoms.insert(atom);
        self.order.insert(position, id);
        if let Some(index) = self.index.as_mut() {
            for slot in index.values_mut() {
                if *slot >= position {
                    *slot += 1;
                }
            }
            index.insert(id, position);
        }
        self.bonds.atom_inserted(position);
        Ok(id)
    }

    /// Clears atoms, bonds and the identity index, and restores default metadata.
    pub fn reset(&mut self) {
        self.report(FeedbackCategory::Verbose, || "resetting".to_string());
        self.atoms.clear();
        self.order.clear();
        self.index = None;
        self.molecule = Molecule::default();
        self.bonds.clear();
    }

    /// Rebuilds the identity index from the current atom sequence.
    pub fn update_index(&mut self) {
        self.report(FeedbackCategory::Verbose, || "updating index".to_string());
        let mut index = SecondaryMap::with_capacity(self.order.len());
        for (position, &id) in self.order.iter().enumerate() {
            index.insert(id, position);
        }
        self.index = Some(index);
    }

    /// Finds the position of `id` by scanning the atom sequence.
    ///
    /// This never consults the identity index, so it is correct even when the
    /// index is absent.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(position)` if the atom is in the sequence, otherwise `None`.
    pub fn index_atom(&self, id: AtomId) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == id)
    }

    /// Finds the position of `id`, using the identity index when present.
    pub fn position_of(&self, id: AtomId) -> Option<usize> {
        match &self.index {
            Some(index) => index.get(id).copied(),
            None => self.index_atom(id),
        }
    }

    /// Partitions the sequence into contiguous residues using [`Atom::in_same_residue`].
    pub fn get_residues(&self) -> Vec<Range<usize>> {
        self.get_residues_by(Atom::in_same_residue)
    }

    /// Partitions the sequence into maximal runs whose atoms all match the run's
    /// first atom under `same_residue`.
    ///
    /// A run is closed whenever an atom differs from the first atom of the current
    /// run. The final run is only reported if it holds more than one atom, so a
    /// trailing single-atom residue is omitted.
    ///
    /// # Arguments
    ///
    /// * `same_residue` - Decides whether an atom belongs to the run started by
    ///   another; called as `same_residue(first_of_run, candidate)`.
    ///
    /// # Return
    ///
    /// Half-open position ranges, one per reported residue, in sequence order.
    pub fn get_residues_by<F>(&self, mut same_residue: F) -> Vec<Range<usize>>
    where
        F: FnMut(&Atom, &Atom) -> bool,
    {
        let atoms: Vec<&Atom> = self.atoms().collect();
        let mut residues = Vec::new();
        let Some(&first) = atoms.first() else {
            return residues;
        };

        let mut start = 0;
        let mut anchor = first;
        for (position, &atom) in atoms.iter().enumerate().skip(1) {
            if !same_residue(anchor, atom) {
                residues.push(start..position);
                start = position;
                anchor = atom;
            }
        }
        if atoms.len() - start > 1 {
            residues.push(start..atoms.len());
        }
        residues
    }

    /// Sum of standard atomic weights. Unknown elements contribute nothing.
    pub fn get_mass(&self) -> f64 {
        self.atoms()
            .map(|atom| {
                atom.mass().unwrap_or_else(|| {
                    warn!(symbol = %atom.symbol, "Unknown element; mass taken as zero");
                    0.0
                })
            })
            .sum()
    }

    /// Sum of atomic numbers. Unknown elements contribute nothing.
    pub fn get_nuclear_charges(&self) -> u32 {
        self.atoms()
            .map(|atom| {
                atom.atomic_number().unwrap_or_else(|| {
                    warn!(symbol = %atom.symbol, "Unknown element; nuclear charge taken as zero");
                    0
                })
            })
            .sum()
    }

    /// Gives every unnamed atom a unique `{symbol}{counter}` name.
    ///
    /// With `preserve == false`, all existing names are cleared first. Counters are
    /// kept per symbol, start at 1, and skip any value whose name is already taken.
    ///
    /// # Arguments
    ///
    /// * `preserve` - Whether names already present are kept and reserved.
    pub fn assign_names(&mut self, preserve: bool) {
        self.report(FeedbackCategory::Actions, || {
            format!("assigning atom names (preserve = {preserve})")
        });

        let mut taken: HashSet<String> = HashSet::new();
        for &id in &self.order {
            let Some(atom) = self.atoms.get_mut(id) else {
                continue;
            };
            if preserve {
                if let Some(name) = &atom.name {
                    taken.insert(name.clone());
                }
            } else {
                atom.name = None;
            }
        }

        let mut counters: HashMap<String, usize> = HashMap::new();
        for &id in &self.order {
            let Some(atom) = self.atoms.get_mut(id) else {
                continue;
            };
            if atom.name.is_some() {
                continue;
            }
            let counter = counters.entry(atom.symbol.clone()).or_insert(1);
            let name = loop {
                let candidate = format!("{}{}", atom.symbol, counter);
                *counter += 1;
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(name.clone());
            atom.name = Some(name);
        }
    }

    /// Atom coordinates in sequence order.
    pub fn get_coord_list(&self) -> Vec<Point3<f64>> {
        self.atoms().map(|atom| atom.position).collect()
    }

    /// Per-axis minimum and maximum coordinates, or two origins for an empty graph.
    pub fn get_min_max(&self) -> (Point3<f64>, Point3<f64>) {
        let mut positions = self.atoms().map(|atom| atom.position);
        let Some(first) = positions.next() else {
            return (Point3::origin(), Point3::origin());
        };
        positions.fold((first, first), |(min, max), p| {
            (min.coords.inf(&p.coords).into(), max.coords.sup(&p.coords).into())
        })
    }

    /// Checks the structural invariants of the graph.
    ///
    /// Every bond endpoint must be a current position, every sequence entry must
    /// resolve to an atom, and the identity index (if present) must map exactly
    /// the current atoms to their current positions.
    pub fn validate(&self) -> Result<(), GraphError> {
        let len = self.order.len();
        if let Some(bond) = self.bonds.iter().find(|b| b.atoms.iter().any(|&a| a >= len)) {
            return Err(GraphError::DanglingBond {
                atoms: bond.atoms,
                len,
            });
        }
        for &id in &self.order {
            if !self.atoms.contains_key(id) {
                return Err(GraphError::IndexMismatch {
                    id,
                    reason: "sequence entry has no atom in the arena",
                });
            }
        }
        if self.atoms.len() != len {
            return Err(GraphError::Adjacency(format!(
                "arena holds {} atoms but the sequence has {len}",
                self.atoms.len()
            )));
        }
        if let Some(index) = &self.index {
            if index.len() != len {
                return Err(GraphError::Adjacency(format!(
                    "identity index has {} entries for {len} atoms",
                    index.len()
                )));
            }
            for (position, &id) in self.order.iter().enumerate() {
                if index.get(id) != Some(&position) {
                    return Err(GraphError::IndexMismatch {
                        id,
                        reason: "identity index disagrees with the atom sequence",
                    });
                }
            }
        }
        self.bonds.validate_layout(len)?;
        debug!(atoms = len, bonds = self.bonds.len(), "Graph validated");
        Ok(())
    }

    pub(crate) fn check_position(&self, position: usize) -> Result<(), GraphError> {
        if position < self.order.len() {
            Ok(())
        } else {
            Err(GraphError::PositionOutOfRange {
                position,
                len: self.order.len(),
            })
        }
    }

    pub(crate) fn check_bond(&self, bond: &Bond) -> Result<(), GraphError> {
        let len = self.order.len();
        if bond.atoms.iter().all(|&a| a < len) {
            Ok(())
        } else {
            Err(GraphError::DanglingBond {
                atoms: bond.atoms,
                len,
            })
        }
    }

    /// Removes the atoms at the given positions without touching bonds.
    ///
    /// `doomed` must hold distinct, in-range positions. Removed atoms are returned in
    /// ascending position order and the identity index is rebuilt if one existed.
    pub(crate) fn remove_positions(&mut self, doomed: &HashSet<usize>) -> Vec<Atom> {
        let mut removed = Vec::with_capacity(doomed.len());
        let mut kept = Vec::with_capacity(self.order.len().saturating_sub(doomed.len()));
        for (position, id) in std::mem::take(&mut self.order).into_iter().enumerate() {
            if doomed.contains(&position) {
                removed.extend(self.atoms.remove(id));
            } else {
                kept.push(id);
            }
        }
        self.order = kept;
        if self.index.is_some() {
            self.update_index();
        }
        removed
    }

    /// Stable-sorts the atom sequence by [`Atom::canonical_cmp`].
    ///
    /// Returns the translation from each old position to its new position. The
    /// identity index is left built and consistent with the new order; bonds are
    /// not touched here.
    pub(crate) fn sort_sequence(&mut self) -> Vec<usize> {
        if self.index.is_none() {
            self.update_index();
        }
        let before = self.index.take().unwrap_or_default();

        let atoms = &self.atoms;
        self.order
            .sort_by(|&a, &b| match (atoms.get(a), atoms.get(b)) {
                (Some(a), Some(b)) => a.canonical_cmp(b),
                _ => std::cmp::Ordering::Equal,
            });
        self.update_index();

        let mut translation = vec![0; self.order.len()];
        for (new_position, &id) in self.order.iter().enumerate() {
            if let Some(&old_position) = before.get(id) {
                translation[old_position] = new_position;
            }
        }
        translation
    }
}
