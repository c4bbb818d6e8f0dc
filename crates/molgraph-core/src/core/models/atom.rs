use crate::core::utils::elements::{self, ElementData};
use nalgebra::Point3;
use std::cmp::Ordering;
use std::str::FromStr;

const DEFAULT_SYMBOL: &str = "X";
const DEFAULT_RESIDUE_NAME: &str = "UNK";
const DEFAULT_RESIDUE_ID: &str = "1";
const DEFAULT_RESIDUE_NUMBER: i32 = 1;

/// Identifies one of the sparse, optionally-populated fields of an [`Atom`].
///
/// Atoms coming from different sources carry different subsets of annotation.
/// These fields are stored as `Option`s so that "explicitly set" can be told
/// apart from "left at its default", which matters for name assignment and
/// for callers merging annotations from several sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomField {
    /// Atom name (e.g., "CA", "O1").
    Name,
    /// Residue name (e.g., "ALA").
    ResidueName,
    /// One-letter residue code.
    ResidueNameCode,
    /// Residue identifier as text, possibly with an insertion code (e.g., "27A").
    ResidueId,
    /// Numeric residue sequence number.
    ResidueNumber,
    /// Chain identifier.
    Chain,
    /// Segment identifier.
    Segment,
    /// Alternate location indicator.
    AltLoc,
    /// Numeric force field type.
    NumericType,
    /// Text force field type.
    TextType,
    /// Van der Waals radius override.
    VdwRadius,
}

/// Represents an atom held by a molecular graph container.
///
/// The element symbol and the numeric properties (coordinate, charges, B-factor,
/// occupancy) are always present. Residue, chain and typing annotations are sparse
/// and tracked through `Option`s; accessors such as [`Atom::chain_or_default`]
/// resolve them to the conventional defaults when unset.
///
/// An `Atom` is a plain value. Its identity inside a container is the
/// [`AtomId`](super::ids::AtomId) the container assigns when the atom is added,
/// never its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol (e.g., "C", "Cl").
    pub symbol: String,
    pub name: Option<String>,
    pub residue_name: Option<String>,
    pub residue_name_code: Option<String>,
    pub residue_id: Option<String>,
    pub residue_number: Option<i32>,
    pub chain: Option<String>,
    pub segment: Option<String>,
    pub alt_loc: Option<String>,
    pub numeric_type: Option<i32>,
    pub text_type: Option<String>,
    pub vdw_radius: Option<f64>,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Formal charge in elementary charge units.
    pub formal_charge: i32,
    /// Partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    pub b_factor: f64,
    pub occupancy: f64,
    /// Whether the atom was read from a hetero-atom record.
    pub hetero: bool,
    pub stereo: i8,
    pub flags: u32,
    pub color_code: i32,
    /// Tie-breaker used by [`Atom::canonical_cmp`] before the atom name.
    pub priority: i32,
}

impl Default for Atom {
    fn default() -> Self {
        Self::new(DEFAULT_SYMBOL, Point3::origin())
    }
}

impl Atom {
    /// Creates a new `Atom` of the given element at `position`.
    ///
    /// All sparse annotations start unset; numeric properties start at zero
    /// except occupancy, which starts at 1.
    pub fn new(symbol: &str, position: Point3<f64>) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: None,
            residue_name: None,
            residue_name_code: None,
            residue_id: None,
            residue_number: None,
            chain: None,
            segment: None,
            alt_loc: None,
            numeric_type: None,
            text_type: None,
            vdw_radius: None,
            position,
            formal_charge: 0,
            partial_charge: 0.0,
            b_factor: 0.0,
            occupancy: 1.0,
            hetero: false,
            stereo: 0,
            flags: 0,
            color_code: 0,
            priority: 0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_chain(mut self, chain: &str) -> Self {
        self.chain = Some(chain.to_string());
        self
    }

    pub fn with_residue(mut self, residue_name: &str, residue_number: i32) -> Self {
        self.residue_name = Some(residue_name.to_string());
        self.residue_number = Some(residue_number);
        self.residue_id = Some(residue_number.to_string());
        self
    }

    /// Reports whether the given optional field has been explicitly set.
    pub fn has(&self, field: AtomField) -> bool {
        match field {
            AtomField::Name => self.name.is_some(),
            AtomField::ResidueName => self.residue_name.is_some(),
            AtomField::ResidueNameCode => self.residue_name_code.is_some(),
            AtomField::ResidueId => self.residue_id.is_some(),
            AtomField::ResidueNumber => self.residue_number.is_some(),
            AtomField::Chain => self.chain.is_some(),
            AtomField::Segment => self.segment.is_some(),
            AtomField::AltLoc => self.alt_loc.is_some(),
            AtomField::NumericType => self.numeric_type.is_some(),
            AtomField::TextType => self.text_type.is_some(),
            AtomField::VdwRadius => self.vdw_radius.is_some(),
        }
    }

    /// Unsets the given optional field.
    pub fn clear(&mut self, field: AtomField) {
        match field {
            AtomField::Name => self.name = None,
            AtomField::ResidueName => self.residue_name = None,
            AtomField::ResidueNameCode => self.residue_name_code = None,
            AtomField::ResidueId => self.residue_id = None,
            AtomField::ResidueNumber => self.residue_number = None,
            AtomField::Chain => self.chain = None,
            AtomField::Segment => self.segment = None,
            AtomField::AltLoc => self.alt_loc = None,
            AtomField::NumericType => self.numeric_type = None,
            AtomField::TextType => self.text_type = None,
            AtomField::VdwRadius => self.vdw_radius = None,
        }
    }

    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn residue_name_or_default(&self) -> &str {
        self.residue_name.as_deref().unwrap_or(DEFAULT_RESIDUE_NAME)
    }

    pub fn residue_id_or_default(&self) -> &str {
        self.residue_id.as_deref().unwrap_or(DEFAULT_RESIDUE_ID)
    }

    pub fn residue_number_or_default(&self) -> i32 {
        self.residue_number.unwrap_or(DEFAULT_RESIDUE_NUMBER)
    }

    pub fn chain_or_default(&self) -> &str {
        self.chain.as_deref().unwrap_or("")
    }

    pub fn segment_or_default(&self) -> &str {
        self.segment.as_deref().unwrap_or("")
    }

    pub fn alt_loc_or_default(&self) -> &str {
        self.alt_loc.as_deref().unwrap_or("")
    }

    /// Two atoms share a residue when their residue identifier, chain and segment agree.
    pub fn in_same_residue(&self, other: &Atom) -> bool {
        self.residue_id_or_default() == other.residue_id_or_default()
            && self.chain_or_default() == other.chain_or_default()
            && self.segment_or_default() == other.segment_or_default()
    }

    /// The natural ordering of atoms within a container.
    ///
    /// Atoms are ordered by segment, chain, residue number, residue identifier,
    /// priority, alternate location and finally name. Unset fields compare as
    /// their defaults.
    pub fn canonical_cmp(&self, other: &Atom) -> Ordering {
        self.segment_or_default()
            .cmp(other.segment_or_default())
            .then_with(|| self.chain_or_default().cmp(other.chain_or_default()))
            .then_with(|| {
                self.residue_number_or_default()
                    .cmp(&other.residue_number_or_default())
            })
            .then_with(|| {
                self.residue_id_or_default()
                    .cmp(other.residue_id_or_default())
            })
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.alt_loc_or_default().cmp(other.alt_loc_or_default()))
            .then_with(|| self.name_or_default().cmp(other.name_or_default()))
    }

    pub fn element(&self) -> Option<&'static ElementData> {
        elements::lookup(&self.symbol)
    }

    /// Standard atomic weight, or `None` if the symbol is not a known element.
    pub fn mass(&self) -> Option<f64> {
        self.element().map(|e| e.mass)
    }

    /// Atomic number, or `None` if the symbol is not a known element.
    pub fn atomic_number(&self) -> Option<u32> {
        self.element().map(|e| e.number)
    }

    /// Number of hydrogens needed to saturate this atom given the valence already
    /// consumed by explicit bonds.
    pub fn free_valence(&self, observed_valence: f64) -> u32 {
        let Some(element) = self.element() else {
            return 0;
        };
        (element.valence as f64 - observed_valence).floor().max(0.0) as u32
    }
}

impl FromStr for AtomField {
    type Err = ();

    /// Parses the conventional short field names (`"name"`, `"resn"`, `"resi"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(AtomField::Name),
            "resn" | "residue_name" => Ok(AtomField::ResidueName),
            "resn_code" | "residue_name_code" => Ok(AtomField::ResidueNameCode),
            "resi" | "residue_id" => Ok(AtomField::ResidueId),
            "resi_number" | "residue_number" => Ok(AtomField::ResidueNumber),
            "chain" => Ok(AtomField::Chain),
            "segi" | "segment" => Ok(AtomField::Segment),
            "alt" | "alt_loc" => Ok(AtomField::AltLoc),
            "numeric_type" => Ok(AtomField::NumericType),
            "text_type" => Ok(AtomField::TextType),
            "vdw" | "vdw_radius" => Ok(AtomField::VdwRadius),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new("C", Point3::new(1.0, 2.0, 3.0));

        assert_eq!(atom.symbol, "C");
        assert_eq!(atom.position, Point3::new(1.0, 2.0, 3.0));
        assert!(atom.name.is_none());
        assert_eq!(atom.formal_charge, 0);
        assert_eq!(atom.partial_charge, 0.0);
        assert_eq!(atom.occupancy, 1.0);
        assert!(!atom.hetero);
        assert_eq!(Atom::default().symbol, "X");
    }

    #[test]
    fn has_tracks_explicitly_set_fields() {
        let mut atom = Atom::new("N", Point3::origin());
        assert!(!atom.has(AtomField::Name));
        assert!(!atom.has(AtomField::Chain));

        atom = atom.with_name("N1").with_chain("A");
        assert!(atom.has(AtomField::Name));
        assert!(atom.has(AtomField::Chain));

        atom.clear(AtomField::Name);
        assert!(!atom.has(AtomField::Name));
        assert_eq!(atom.name_or_default(), "");
    }

    #[test]
    fn unset_fields_resolve_to_defaults() {
        let atom = Atom::new("O", Point3::origin());
        assert_eq!(atom.residue_name_or_default(), "UNK");
        assert_eq!(atom.residue_id_or_default(), "1");
        assert_eq!(atom.residue_number_or_default(), 1);
        assert_eq!(atom.chain_or_default(), "");
        assert_eq!(atom.segment_or_default(), "");
    }

    #[test]
    fn in_same_residue_compares_residue_chain_and_segment() {
        let a = Atom::new("C", Point3::origin()).with_chain("AB");
        let b = Atom::new("C", Point3::origin()).with_chain("BA");
        let c = Atom::new("O", Point3::origin()).with_chain("BA");
        assert!(!a.in_same_residue(&b));
        assert!(b.in_same_residue(&c));

        let mut d = c.clone();
        d.segment = Some("SEG1".to_string());
        assert!(!c.in_same_residue(&d));
    }

    #[test]
    fn canonical_cmp_orders_by_chain_then_residue_then_name() {
        let a1 = Atom::new("C", Point3::origin())
            .with_chain("A")
            .with_residue("GLY", 2)
            .with_name("CA");
        let a2 = Atom::new("N", Point3::origin())
            .with_chain("A")
            .with_residue("GLY", 2)
            .with_name("N");
        let a3 = Atom::new("C", Point3::origin())
            .with_chain("A")
            .with_residue("ALA", 10)
            .with_name("C");
        let b1 = Atom::new("C", Point3::origin())
            .with_chain("B")
            .with_residue("ALA", 1)
            .with_name("C");

        assert_eq!(a1.canonical_cmp(&a2), Ordering::Less);
        assert_eq!(a2.canonical_cmp(&a3), Ordering::Less);
        assert_eq!(a3.canonical_cmp(&b1), Ordering::Less);
        assert_eq!(b1.canonical_cmp(&b1.clone()), Ordering::Equal);
    }

    #[test]
    fn element_properties_come_from_symbol() {
        let hydrogen = Atom::new("H", Point3::origin());
        assert_eq!(hydrogen.mass(), Some(1.00794));
        assert_eq!(hydrogen.atomic_number(), Some(1));

        let unknown = Atom::new("Qq", Point3::origin());
        assert!(unknown.mass().is_none());
        assert!(unknown.atomic_number().is_none());
    }

    #[test]
    fn free_valence_saturates_at_zero() {
        let carbon = Atom::new("C", Point3::origin());
        assert_eq!(carbon.free_valence(0.0), 4);
        assert_eq!(carbon.free_valence(3.0), 1);
        assert_eq!(carbon.free_valence(4.5), 0);
        // Two aromatic bonds leave room for one hydrogen.
        assert_eq!(carbon.free_valence(1.5 + 1.5), 1);

        let helium = Atom::new("He", Point3::origin());
        assert_eq!(helium.free_valence(0.0), 0);
        assert_eq!(Atom::new("Qq", Point3::origin()).free_valence(0.0), 0);
    }

    #[test]
    fn atom_field_from_str_parses_short_and_long_names() {
        assert_eq!(AtomField::from_str("resn"), Ok(AtomField::ResidueName));
        assert_eq!(AtomField::from_str("residue_number"), Ok(AtomField::ResidueNumber));
        assert_eq!(AtomField::from_str("SEGI"), Ok(AtomField::Segment));
        assert_eq!(AtomField::from_str("charge"), Err(()));
    }
}
