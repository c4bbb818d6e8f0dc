use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimensionality {
    /// Planar depiction coordinates.
    Flat,
    /// Full three-dimensional coordinates.
    #[default]
    Spatial,
}

impl FromStr for Dimensionality {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "2D" => Ok(Self::Flat),
            "3D" => Ok(Self::Spatial),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => write!(f, "2D"),
            Self::Spatial => write!(f, "3D"),
        }
    }
}

/// Container-level metadata describing the molecule as a whole.
///
/// Replaced wholesale when the owning container is reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Molecule {
    pub title: String,
    pub comments: String,
    pub chiral: bool,
    pub dimensionality: Dimensionality,
}

impl Default for Molecule {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            comments: String::new(),
            chiral: false,
            dimensionality: Dimensionality::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_molecule_is_untitled_and_spatial() {
        let molecule = Molecule::default();
        assert_eq!(molecule.title, "untitled");
        assert!(molecule.comments.is_empty());
        assert!(!molecule.chiral);
        assert_eq!(molecule.dimensionality, Dimensionality::Spatial);
    }

    #[test]
    fn dimensionality_parses_and_displays_codes() {
        assert_eq!("2d".parse::<Dimensionality>(), Ok(Dimensionality::Flat));
        assert_eq!(" 3D".parse::<Dimensionality>(), Ok(Dimensionality::Spatial));
        assert!("4D".parse::<Dimensionality>().is_err());
        assert_eq!(Dimensionality::Flat.to_string(), "2D");
    }
}
