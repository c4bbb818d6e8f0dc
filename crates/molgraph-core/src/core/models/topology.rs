use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Numeric code reserved for aromatic bonds.
pub const AROMATIC_ORDER_CODE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BondOrder {
    Zero = 0,
    Single = 1,
    Double = 2,
    Triple = 3,
    Aromatic = AROMATIC_ORDER_CODE,
}

impl Default for BondOrder {
    fn default() -> Self {
        BondOrder::Single
    }
}

impl BondOrder {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Zero),
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            AROMATIC_ORDER_CODE => Some(Self::Aromatic),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Valence consumed at each endpoint; aromatic bonds count as one and a half.
    pub fn valence(self) -> f64 {
        match self {
            Self::Aromatic => 1.5,
            other => other.code() as f64,
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid bond order string")]
pub struct ParseBondOrderError;

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "z" | "zero" => Ok(Self::Zero),
            "1" | "s" | "single" => Ok(Self::Single),
            "2" | "d" | "double" => Ok(Self::Double),
            "3" | "t" | "triple" => Ok(Self::Triple),
            "4" | "ar" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError),
        }
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Zero => "Zero",
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// A bond between two atom positions of the owning container.
///
/// Endpoints are positions, not identities: the container renumbers them whenever
/// atoms are inserted, deleted, sorted or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atoms: [usize; 2], // Positions of the two bonded atoms
    pub order: BondOrder,  // Bond order (e.g., single, double, etc.)
    pub stereo: i8,        // Stereo flag, 0 when unspecified
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize, order: BondOrder) -> Self {
        Self {
            atoms: [atom1, atom2],
            order,
            stereo: 0,
        }
    }

    pub fn contains(&self, position: usize) -> bool {
        self.atoms[0] == position || self.atoms[1] == position
    }

    /// The endpoint across the bond from `position`, or `None` if the bond does not touch it.
    ///
    /// A self-bond yields `position` itself.
    pub fn partner(&self, position: usize) -> Option<usize> {
        if self.atoms[0] == position {
            Some(self.atoms[1])
        } else if self.atoms[1] == position {
            Some(self.atoms[0])
        } else {
            None
        }
    }

    pub(crate) fn remap(&mut self, mut f: impl FnMut(usize) -> usize) {
        self.atoms = [f(self.atoms[0]), f(self.atoms[1])];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bond_order_from_str_parses_valid_strings() {
        assert_eq!("0".parse::<BondOrder>().unwrap(), BondOrder::Zero);
        assert_eq!("1".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("single".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("S".parse::<BondOrder>().unwrap(), BondOrder::Single);
        assert_eq!("2".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("D".parse::<BondOrder>().unwrap(), BondOrder::Double);
        assert_eq!("triple".parse::<BondOrder>().unwrap(), BondOrder::Triple);
        assert_eq!("4".parse::<BondOrder>().unwrap(), BondOrder::Aromatic);
        assert_eq!(
            "aromatic".parse::<BondOrder>().unwrap(),
            BondOrder::Aromatic
        );
    }

    #[test]
    fn bond_order_from_str_rejects_invalid_strings() {
        assert!("".parse::<BondOrder>().is_err());
        assert!("quadruple".parse::<BondOrder>().is_err());
        assert!("5".parse::<BondOrder>().is_err());
    }

    #[test]
    fn bond_order_codes_round_trip_and_aromatic_counts_as_one_and_a_half() {
        for code in 0..=4 {
            assert_eq!(BondOrder::from_code(code).unwrap().code(), code);
        }
        assert!(BondOrder::from_code(7).is_none());
        assert_eq!(BondOrder::Zero.valence(), 0.0);
        assert_eq!(BondOrder::Double.valence(), 2.0);
        assert_eq!(BondOrder::Aromatic.valence(), 1.5);
    }

    #[test]
    fn bond_order_display_and_default() {
        assert_eq!(BondOrder::Aromatic.to_string(), "Aromatic");
        assert_eq!(BondOrder::Zero.to_string(), "Zero");
        assert_eq!(BondOrder::default(), BondOrder::Single);
    }

    #[test]
    fn bond_contains_and_partner() {
        let bond = Bond::new(3, 7, BondOrder::Double);
        assert!(bond.contains(3));
        assert!(bond.contains(7));
        assert!(!bond.contains(5));
        assert_eq!(bond.partner(3), Some(7));
        assert_eq!(bond.partner(7), Some(3));
        assert_eq!(bond.partner(5), None);
        assert_eq!(Bond::new(2, 2, BondOrder::Single).partner(2), Some(2));
        assert_eq!(bond.stereo, 0);
    }

    #[test]
    fn remap_applies_to_both_endpoints() {
        let mut bond = Bond::new(1, 4, BondOrder::Single);
        bond.remap(|p| p * 10);
        assert_eq!(bond.atoms, [10, 40]);
    }
}
