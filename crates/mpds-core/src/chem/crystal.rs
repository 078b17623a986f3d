use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Crystal system derived from an international space group number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrystalSystem {
    Triclinic,
    Monoclinic,
    Orthorhombic,
    Tetragonal,
    Trigonal,
    Hexagonal,
    Cubic,
}

impl CrystalSystem {
    /// Map a space group number (1-230) to its crystal system.
    pub fn from_space_group(number: u16) -> Result<Self> {
        match number {
            1..=2 => Ok(Self::Triclinic),
            3..=15 => Ok(Self::Monoclinic),
            16..=74 => Ok(Self::Orthorhombic),
            75..=142 => Ok(Self::Tetragonal),
            143..=167 => Ok(Self::Trigonal),
            168..=194 => Ok(Self::Hexagonal),
            195..=230 => Ok(Self::Cubic),
            _ => Err(Error::InvalidData(format!(
                "space group number {number} is invalid"
            ))),
        }
    }

    /// Short label used in reports (`cub`, `hex`, `trig`, ...).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Triclinic => "tricl",
            Self::Monoclinic => "monocl",
            Self::Orthorhombic => "orth",
            Self::Tetragonal => "tet",
            Self::Trigonal => "trig",
            Self::Hexagonal => "hex",
            Self::Cubic => "cub",
        }
    }
}

impl fmt::Display for CrystalSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        let cases = [
            (1, "tricl"),
            (2, "tricl"),
            (3, "monocl"),
            (15, "monocl"),
            (16, "orth"),
            (74, "orth"),
            (75, "tet"),
            (142, "tet"),
            (143, "trig"),
            (167, "trig"),
            (168, "hex"),
            (194, "hex"),
            (195, "cub"),
            (225, "cub"),
            (230, "cub"),
        ];
        for (sg, label) in cases {
            assert_eq!(CrystalSystem::from_space_group(sg).unwrap().label(), label, "sg {sg}");
        }
    }

    #[test]
    fn test_invalid_space_group() {
        assert!(CrystalSystem::from_space_group(0).is_err());
        assert!(CrystalSystem::from_space_group(231).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CrystalSystem::Hexagonal.to_string(), "hex");
    }
}
