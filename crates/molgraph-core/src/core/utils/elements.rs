use phf::{Map, phf_map};

/// Mass added per implicit hydrogen.
pub const HYDROGEN_MASS: f64 = 1.00794;

/// Static per-element data used for mass and valence bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementData {
    /// Atomic number (nuclear charge).
    pub number: u32,
    /// Standard atomic weight in daltons.
    pub mass: f64,
    /// Number of bonds the element forms when saturated with implicit hydrogens.
    /// Zero for elements that never carry implicit hydrogens.
    pub valence: u32,
}

const fn element(number: u32, mass: f64, valence: u32) -> ElementData {
    ElementData {
        number,
        mass,
        valence,
    }
}

#[rustfmt::skip]
static ELEMENTS: Map<&'static str, ElementData> = phf_map! {
    // --- Period 1 ---
    "H"  => element(1, 1.00794, 1),      "He" => element(2, 4.002602, 0),

    // --- Period 2 ---
    "Li" => element(3, 6.941, 0),        "Be" => element(4, 9.012182, 0),
    "B"  => element(5, 10.811, 3),       "C"  => element(6, 12.0107, 4),
    "N"  => element(7, 14.0067, 3),      "O"  => element(8, 15.9994, 2),
    "F"  => element(9, 18.9984032, 1),   "Ne" => element(10, 20.1797, 0),

    // --- Period 3 ---
    "Na" => element(11, 22.98977, 0),    "Mg" => element(12, 24.305, 0),
    "Al" => element(13, 26.981538, 0),   "Si" => element(14, 28.0855, 4),
    "P"  => element(15, 30.973761, 3),   "S"  => element(16, 32.065, 2),
    "Cl" => element(17, 35.453, 1),      "Ar" => element(18, 39.948, 0),

    // --- Period 4 ---
    "K"  => element(19, 39.0983, 0),     "Ca" => element(20, 40.078, 0),
    "Sc" => element(21, 44.95591, 0),    "Ti" => element(22, 47.867, 0),
    "V"  => element(23, 50.9415, 0),     "Cr" => element(24, 51.9961, 0),
    "Mn" => element(25, 54.938049, 0),   "Fe" => element(26, 55.845, 0),
    "Co" => element(27, 58.9332, 0),     "Ni" => element(28, 58.6934, 0),
    "Cu" => element(29, 63.546, 0),      "Zn" => element(30, 65.409, 0),
    "Ga" => element(31, 69.723, 0),      "Ge" => element(32, 72.64, 4),
    "As" => element(33, 74.9216, 3),     "Se" => element(34, 78.96, 2),
    "Br" => element(35, 79.904, 1),      "Kr" => element(36, 83.798, 0),

    // --- Period 5 ---
    "Rb" => element(37, 85.4678, 0),     "Sr" => element(38, 87.62, 0),
    "Y"  => element(39, 88.90585, 0),    "Zr" => element(40, 91.224, 0),
    "Nb" => element(41, 92.90638, 0),    "Mo" => element(42, 95.94, 0),
    "Tc" => element(43, 98.0, 0),        "Ru" => element(44, 101.07, 0),
    "Rh" => element(45, 102.9055, 0),    "Pd" => element(46, 106.42, 0),
    "Ag" => element(47, 107.8682, 0),    "Cd" => element(48, 112.411, 0),
    "In" => element(49, 114.818, 0),     "Sn" => element(50, 118.71, 4),
    "Sb" => element(51, 121.76, 3),      "Te" => element(52, 127.6, 2),
    "I"  => element(53, 126.90447, 1),   "Xe" => element(54, 131.293, 0),

    // --- Selected heavy elements ---
    "Cs" => element(55, 132.90545, 0),   "Ba" => element(56, 137.327, 0),
    "Pt" => element(78, 195.078, 0),     "Au" => element(79, 196.96655, 0),
    "Hg" => element(80, 200.59, 0),      "Pb" => element(82, 207.2, 0),
    "U"  => element(92, 238.02891, 0),
};

/// Looks up element data by symbol.
///
/// Symbols are matched case-insensitively on their canonical capitalisation
/// (`"CL"`, `"cl"` and `"Cl"` all resolve to chlorine).
pub fn lookup(symbol: &str) -> Option<&'static ElementData> {
    let trimmed = symbol.trim();
    ELEMENTS.get(trimmed).or_else(|| {
        let mut chars = trimmed.chars();
        let first = chars.next()?.to_ascii_uppercase();
        let canonical: String = std::iter::once(first)
            .chain(chars.map(|c| c.to_ascii_lowercase()))
            .collect();
        ELEMENTS.get(canonical.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_common_elements() {
        let carbon = lookup("C").unwrap();
        assert_eq!(carbon.number, 6);
        assert_eq!(carbon.valence, 4);
        assert_eq!(lookup("He").unwrap().mass, 4.002602);
    }

    #[test]
    fn lookup_normalizes_symbol_case_and_whitespace() {
        assert_eq!(lookup("CL"), lookup("Cl"));
        assert_eq!(lookup(" br "), lookup("Br"));
        assert_eq!(lookup("cl").unwrap().number, 17);
    }

    #[test]
    fn lookup_returns_none_for_unknown_symbols() {
        assert!(lookup("Xx").is_none());
        assert!(lookup("").is_none());
    }
}
