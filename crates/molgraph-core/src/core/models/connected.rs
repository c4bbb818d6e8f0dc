use super::error::GraphError;
use super::graph::{BondStore, MolecularGraph};
use super::ids::BondId;
use super::indexed::{BondList, IndexedGraph};
use super::topology::{Bond, BondOrder};
use crate::core::feedback::FeedbackCategory;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::HashSet;

/// Per-atom adjacency layout.
///
/// Each bond is stored once in an arena and referenced by [`BondId`] from the
/// bucket of both of its endpoints, so an edit made through either bucket is seen
/// through the other. A self-bond is referenced twice from its single bucket.
#[derive(Debug, Clone, Default)]
pub struct BondAdjacency {
    bonds: SlotMap<BondId, Bond>,
    buckets: Vec<Vec<BondId>>,
}

impl BondAdjacency {
    pub(crate) fn with_atoms(atom_count: usize) -> Self {
        Self {
            bonds: SlotMap::with_key(),
            buckets: vec![Vec::new(); atom_count],
        }
    }

    /// Stores `bond` and lists it under both endpoints. Endpoints must be in range.
    pub(crate) fn link(&mut self, bond: Bond) -> BondId {
        let id = self.bonds.insert(bond);
        for position in bond.atoms {
            if let Some(bucket) = self.buckets.get_mut(position) {
                bucket.push(id);
            }
        }
        id
    }

    /// Lists `id` under `atoms` instead of its current endpoints. Endpoints must be in range.
    fn relink(&mut self, id: BondId, atoms: [usize; 2]) -> Option<()> {
        let old = self.bonds.get(id)?.atoms;
        for position in old {
            if let Some(bucket) = self.buckets.get_mut(position) {
                bucket.retain(|&listed| listed != id);
            }
        }
        self.bonds.get_mut(id)?.atoms = atoms;
        for position in atoms {
            if let Some(bucket) = self.buckets.get_mut(position) {
                bucket.push(id);
            }
        }
        Some(())
    }

    fn unlink(&mut self, id: BondId) -> Option<Bond> {
        let bond = self.bonds.remove(id)?;
        for position in bond.atoms {
            if let Some(bucket) = self.buckets.get_mut(position) {
                bucket.retain(|&listed| listed != id);
            }
        }
        Some(bond)
    }

    /// Looks up a bond in the arena.
    pub fn get(&self, id: BondId) -> Option<&Bond> {
        self.bonds.get(id)
    }

    /// Bond references listed under `position`, or an empty slice if there is no such atom.
    pub fn bucket(&self, position: usize) -> &[BondId] {
        self.buckets.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All buckets, indexed by atom position.
    pub fn buckets(&self) -> &[Vec<BondId>] {
        &self.buckets
    }

    /// Every logical bond once, ordered by the bucket of its first endpoint.
    pub fn unique(&self) -> impl Iterator<Item = (BondId, &Bond)> + '_ {
        let mut seen = HashSet::new();
        self.buckets
            .iter()
            .enumerate()
            .flat_map(|(position, bucket)| bucket.iter().map(move |&id| (position, id)))
            .filter_map(move |(position, id)| {
                let bond = self.bonds.get(id)?;
                (bond.atoms[0] == position && seen.insert(id)).then_some((id, bond))
            })
    }
}

impl BondStore for BondAdjacency {
    const LABEL: &'static str = "Connected";

    fn len(&self) -> usize {
        self.bonds.len()
    }

    fn iter(&self) -> impl Iterator<Item = &Bond> {
        self.bonds.values()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bond> {
        self.bonds.values_mut()
    }

    fn atom_appended(&mut self) {
        self.buckets.push(Vec::new());
    }

    fn atom_inserted(&mut self, position: usize) {
        let position = position.min(self.buckets.len());
        self.buckets.insert(position, Vec::new());
        for bond in self.bonds.values_mut() {
            bond.remap(|a| if a >= position { a + 1 } else { a });
        }
    }

    fn atom_removed(&mut self, position: usize) {
        if position >= self.buckets.len() {
            return;
        }
        let incident = self.buckets.remove(position);
        for id in incident {
            self.bonds.remove(id);
        }
        let bonds = &self.bonds;
        for bucket in &mut self.buckets {
            bucket.retain(|&id| bonds.contains_key(id));
        }
        for bond in self.bonds.values_mut() {
            bond.remap(|a| if a > position { a - 1 } else { a });
        }
    }

    fn clear(&mut self) {
        self.bonds.clear();
        self.buckets.clear();
    }

    fn validate_layout(&self, atom_count: usize) -> Result<(), GraphError> {
        if self.buckets.len() != atom_count {
            return Err(GraphError::Adjacency(format!(
                "{} buckets for {atom_count} atoms",
                self.buckets.len()
            )));
        }
        let mut references: SecondaryMap<BondId, usize> = SecondaryMap::new();
        for (position, bucket) in self.buckets.iter().enumerate() {
            for &id in bucket {
                let bond = self.bonds.get(id).ok_or(GraphError::UnknownBond(id))?;
                if !bond.contains(position) {
                    return Err(GraphError::Adjacency(format!(
                        "bond {:?} is listed under atom {position}, which it does not touch",
                        bond.atoms
                    )));
                }
                match references.get_mut(id) {
                    Some(count) => *count += 1,
                    None => {
                        references.insert(id, 1);
                    }
                }
            }
        }
        for (id, bond) in &self.bonds {
            let count = references.get(id).copied().unwrap_or(0);
            if count != 2 {
                return Err(GraphError::Adjacency(format!(
                    "bond {:?} is referenced {count} times instead of twice",
                    bond.atoms
                )));
            }
        }
        Ok(())
    }
}

/// Graph whose bonds are reachable from each endpoint's adjacency bucket.
pub type ConnectedGraph = MolecularGraph<BondAdjacency>;

impl MolecularGraph<BondAdjacency> {
    /// The adjacency layout: bond arena plus per-atom buckets.
    pub fn adjacency(&self) -> &BondAdjacency {
        &self.bonds
    }

    /// Adds a bond and lists it under both of its endpoints.
    ///
    /// # Arguments
    ///
    /// * `bond` - The bond to add; its endpoints are atom positions.
    ///
    /// # Return
    ///
    /// The handle under which the bond is stored.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingBond`] if either endpoint is not a current position.
    pub fn add_bond(&mut self, bond: Bond) -> Result<BondId, GraphError> {
        self.check_bond(&bond)?;
        self.report(FeedbackCategory::Bonds, || {
            format!("adding bond ({}, {})", bond.atoms[0], bond.atoms[1])
        });
        Ok(self.bonds.link(bond))
    }

    /// Removes a bond from the arena and from both endpoint buckets.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownBond`] if `id` is not held by this graph.
    pub fn remove_bond(&mut self, id: BondId) -> Result<Bond, GraphError> {
        let bond = self.bonds.unlink(id).ok_or(GraphError::UnknownBond(id))?;
        self.report(FeedbackCategory::Bonds, || {
            format!("removing bond ({}, {})", bond.atoms[0], bond.atoms[1])
        });
        Ok(bond)
    }

    /// Retrieves a bond by its handle.
    ///
    /// # Arguments
    ///
    /// * `id` - The bond ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Bond)` if the bond exists, otherwise `None`.
    pub fn bond(&self, id: BondId) -> Option<&Bond> {
        self.bonds.get(id)
    }

    fn bond_slot(&mut self, id: BondId) -> Result<&mut Bond, GraphError> {
        self.bonds.bonds.get_mut(id).ok_or(GraphError::UnknownBond(id))
    }

    /// Changes the order of a bond. Both buckets see the change.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownBond`] if `id` is not held by this graph.
    pub fn set_bond_order(&mut self, id: BondId, order: BondOrder) -> Result<(), GraphError> {
        self.bond_slot(id)?.order = order;
        Ok(())
    }

    /// Changes the stereo flag of a bond.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownBond`] if `id` is not held by this graph.
    pub fn set_bond_stereo(&mut self, id: BondId, stereo: i8) -> Result<(), GraphError> {
        self.bond_slot(id)?.stereo = stereo;
        Ok(())
    }

    /// Moves a bond onto new endpoints, relisting it under their buckets.
    ///
    /// # Arguments
    ///
    /// * `id` - The bond to move.
    /// * `atoms` - The new endpoint positions.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownBond`] if `id` is not held by this graph, or
    /// [`GraphError::DanglingBond`] if either endpoint is not a current atom
    /// position. The bond and the buckets are unchanged in both cases.
    pub fn set_bond_atoms(&mut self, id: BondId, atoms: [usize; 2]) -> Result<(), GraphError> {
        let mut moved = *self.bond(id).ok_or(GraphError::UnknownBond(id))?;
        moved.atoms = atoms;
        self.check_bond(&moved)?;
        self.report(FeedbackCategory::Bonds, || {
            format!("moving bond to ({}, {})", atoms[0], atoms[1])
        });
        self.bonds.relink(id, atoms).ok_or(GraphError::UnknownBond(id))
    }

    /// Bonds listed under the atom at `position`, in insertion order.
    pub fn bonds_of(&self, position: usize) -> &[BondId] {
        self.bonds.bucket(position)
    }

    /// Positions bonded to the atom at `position`, one entry per bucket reference.
    pub fn neighbors(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.bonds
            .bucket(position)
            .iter()
            .filter_map(move |&id| self.bonds.get(id)?.partner(position))
    }

    /// Every logical bond once, ordered by the bucket of its first endpoint.
    pub fn unique_bonds(&self) -> impl Iterator<Item = (BondId, &Bond)> + '_ {
        self.bonds.unique()
    }

    /// Stable-sorts atoms by their natural ordering, carrying each bucket to its
    /// atom's new position and renumbering every bond once.
    pub fn sort(&mut self) {
        self.report(FeedbackCategory::Verbose, || "sorting".to_string());
        let translation = self.sort_sequence();

        let mut buckets = vec![Vec::new(); translation.len()];
        for (old_position, bucket) in std::mem::take(&mut self.bonds.buckets)
            .into_iter()
            .enumerate()
        {
            if let Some(&new_position) = translation.get(old_position) {
                buckets[new_position] = bucket;
            }
        }
        self.bonds.buckets = buckets;
        for bond in self.bonds.bonds.values_mut() {
            bond.remap(|a| translation.get(a).copied().unwrap_or(a));
        }
    }

    /// Moves the atoms into a new [`IndexedGraph`], listing each bond once, and
    /// resets `self`.
    ///
    /// Bonds are emitted bucket by bucket, keeping only the references whose first
    /// endpoint is the bucket's own atom. Atom handles survive the move.
    pub fn convert_to_indexed(&mut self) -> IndexedGraph {
        self.report(FeedbackCategory::Actions, || {
            "converting to indexed model".to_string()
        });
        let bonds: Vec<Bond> = self.bonds.unique().map(|(_, bond)| *bond).collect();
        let feedback = self.feedback().clone();
        let (atoms, order, molecule) = self.take_parts();
        MolecularGraph::from_parts(atoms, order, molecule, BondList::from(bonds), feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::feedback::{Feedback, FeedbackFlags};
    use crate::core::models::graph::tests::{atom, mixed_chain_fixture};
    use std::sync::{Arc, Mutex};

    fn propane() -> ConnectedGraph {
        let mut graph = ConnectedGraph::new();
        for (i, chain) in ["B", "A", "C"].iter().enumerate() {
            graph.add_atom(atom("C", i as f64).with_chain(chain));
        }
        graph.add_bond(Bond::new(0, 1, BondOrder::Single)).unwrap();
        graph.add_bond(Bond::new(1, 2, BondOrder::Double)).unwrap();
        graph
    }

    fn endpoint_set(graph: &ConnectedGraph) -> Vec<[usize; 2]> {
        let mut pairs: Vec<[usize; 2]> = graph.unique_bonds().map(|(_, b)| b.atoms).collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn add_atom_appends_empty_bucket() {
        let mut graph = ConnectedGraph::new();
        graph.add_atom(atom("C", 0.0));
        graph.add_atom(atom("C", 1.0));
        assert_eq!(graph.adjacency().buckets().len(), 2);
        assert!(graph.bonds_of(0).is_empty());
        graph.validate().unwrap();
    }

    #[test]
    fn bond_is_shared_between_both_buckets() {
        let mut graph = propane();
        let id = graph.bonds_of(1)[1];
        assert_eq!(graph.bonds_of(2), &[id]);

        graph.set_bond_order(id, BondOrder::Triple).unwrap();
        let via_other_end = graph.bonds_of(2)[0];
        assert_eq!(graph.bond(via_other_end).unwrap().order, BondOrder::Triple);
        assert_eq!(graph.bond_count(), 2);
        graph.validate().unwrap();
    }

    #[test]
    fn set_bond_atoms_rejects_missing_endpoint_and_relists_valid_moves() {
        let mut graph = propane();
        let id = graph.bonds_of(0)[0];

        assert_eq!(
            graph.set_bond_atoms(id, [1, 7]).unwrap_err(),
            GraphError::DanglingBond { atoms: [1, 7], len: 3 }
        );
        assert_eq!(graph.bond(id).unwrap().atoms, [0, 1]);
        assert_eq!(graph.bonds_of(0), &[id]);
        graph.validate().unwrap();

        graph.set_bond_atoms(id, [2, 0]).unwrap();
        assert!(graph.bonds_of(1).iter().all(|&listed| listed != id));
        assert_eq!(graph.bonds_of(2).len(), 2);
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![2]);
        graph.validate().unwrap();

        graph.delete_atom(0).unwrap();
        assert_eq!(endpoint_set(&graph), vec![[0, 1]]);
        graph.validate().unwrap();
    }

    #[test]
    fn bond_setters_reject_unknown_handle() {
        let mut graph = propane();
        let id = graph.bonds_of(0)[0];
        graph.remove_bond(id).unwrap();

        assert_eq!(
            graph.set_bond_stereo(id, 1).unwrap_err(),
            GraphError::UnknownBond(id)
        );
        assert_eq!(
            graph.set_bond_atoms(id, [0, 1]).unwrap_err(),
            GraphError::UnknownBond(id)
        );
    }

    #[test]
    fn conversions_and_sort_report_under_their_categories() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = Arc::clone(&lines);
        let mut flags = FeedbackFlags::default();
        flags.set(FeedbackCategory::Actions, true);
        let feedback = Feedback::with_flags(flags).with_sink(Arc::new(
            move |category: FeedbackCategory, line: &str| {
                sink_lines
                    .lock()
                    .unwrap()
                    .push(format!("{category}|{line}"));
            },
        ));

        let mut indexed = IndexedGraph::with_feedback(feedback);
        indexed.add_atom(atom("C", 0.0));
        let mut connected = indexed.convert_to_connected();
        connected.sort();
        let mut back = connected.convert_to_indexed();
        back.sort();

        assert_eq!(
            lines.lock().unwrap().as_slice(),
            ["actions|Connected: converting to indexed model"]
        );
    }

    #[test]
    fn validate_reports_adjacency_inconsistencies() {
        let mut graph = propane();
        let id = graph.bonds_of(0)[0];
        graph.bonds.buckets[2].push(id);
        assert!(matches!(graph.validate(), Err(GraphError::Adjacency(_))));

        let mut graph = propane();
        graph.bonds.buckets[0].clear();
        assert_eq!(
            graph.validate().unwrap_err(),
            GraphError::Adjacency("bond [0, 1] is referenced 1 times instead of twice".to_string())
        );

        let mut graph = propane();
        graph.bonds.buckets.push(Vec::new());
        assert_eq!(
            graph.validate().unwrap_err(),
            GraphError::Adjacency("4 buckets for 3 atoms".to_string())
        );
    }

    #[test]
    fn neighbors_follow_bucket_order() {
        let graph = propane();
        assert_eq!(graph.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(graph.neighbors(9).count(), 0);
    }

    #[test]
    fn add_bond_rejects_dangling_endpoint() {
        let mut graph = propane();
        assert_eq!(
            graph.add_bond(Bond::new(0, 3, BondOrder::Single)).unwrap_err(),
            GraphError::DanglingBond { atoms: [0, 3], len: 3 }
        );
        assert_eq!(graph.bond_count(), 2);
    }

    #[test]
    fn remove_bond_clears_both_references() {
        let mut graph = propane();
        let id = graph.bonds_of(0)[0];
        let removed = graph.remove_bond(id).unwrap();
        assert_eq!(removed.atoms, [0, 1]);
        assert!(graph.bonds_of(0).is_empty());
        assert_eq!(graph.bonds_of(1).len(), 1);
        assert_eq!(graph.remove_bond(id).unwrap_err(), GraphError::UnknownBond(id));
        graph.validate().unwrap();
    }

    #[test]
    fn delete_atom_drops_bucket_and_renumbers_each_bond_once() {
        let mut graph = ConnectedGraph::new();
        for i in 0..4 {
            graph.add_atom(atom("C", i as f64));
        }
        graph.add_bond(Bond::new(0, 1, BondOrder::Single)).unwrap();
        graph.add_bond(Bond::new(1, 2, BondOrder::Single)).unwrap();
        graph.add_bond(Bond::new(2, 3, BondOrder::Single)).unwrap();
        graph.add_bond(Bond::new(0, 3, BondOrder::Single)).unwrap();

        graph.delete_atom(1).unwrap();

        assert_eq!(endpoint_set(&graph), vec![[0, 2], [1, 2]]);
        assert_eq!(graph.bonds_of(0).len(), 1);
        assert_eq!(graph.bonds_of(1).len(), 1);
        assert_eq!(graph.bonds_of(2).len(), 2);
        graph.validate().unwrap();
    }

    #[test]
    fn insert_atom_adds_empty_bucket_at_position() {
        let mut graph = propane();
        graph.update_index();
        graph.insert_atom(1, atom("O", 9.0)).unwrap();

        assert!(graph.bonds_of(1).is_empty());
        assert_eq!(endpoint_set(&graph), vec![[0, 2], [2, 3]]);
        assert_eq!(graph.neighbors(2).collect::<Vec<_>>(), vec![0, 3]);
        graph.validate().unwrap();
    }

    #[test]
    fn self_bond_is_listed_twice_in_its_bucket() {
        let mut graph = ConnectedGraph::new();
        graph.add_atom(atom("He", 0.0));
        let id = graph.add_bond(Bond::new(0, 0, BondOrder::Double)).unwrap();

        assert_eq!(graph.bonds_of(0), &[id, id]);
        assert_eq!(graph.unique_bonds().count(), 1);
        graph.validate().unwrap();

        graph.delete_atom(0).unwrap();
        assert_eq!(graph.bond_count(), 0);
    }

    #[test]
    fn sort_moves_buckets_with_their_atoms() {
        let mut graph = propane();
        let middle = graph.atom_id(1).unwrap();

        graph.sort();

        let chains: Vec<&str> = graph.atoms().map(Atom::chain_or_default).collect();
        assert_eq!(chains, vec!["A", "B", "C"]);
        assert_eq!(graph.position_of(middle), Some(0));
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(endpoint_set(&graph), vec![[0, 2], [1, 0]]);
        graph.validate().unwrap();
    }

    #[test]
    fn convert_to_indexed_emits_each_bond_once_and_resets_source() {
        let mut connected = mixed_chain_fixture().convert_to_connected();
        connected.add_bond(Bond::new(0, 2, BondOrder::Aromatic)).unwrap();
        let ids = connected.atom_ids().to_vec();

        let indexed = connected.convert_to_indexed();

        assert!(connected.is_empty());
        assert_eq!(connected.bond_count(), 0);
        assert_eq!(indexed.atom_ids(), ids.as_slice());
        assert_eq!(
            indexed.bonds().iter().map(|b| b.atoms).collect::<Vec<_>>(),
            vec![[0, 0], [0, 2], [1, 1], [2, 2]]
        );
        assert!(!indexed.has_index());
        indexed.validate().unwrap();
    }
}
