use crate::error::{Error, Result};

/// Chemical symbols indexed by atomic number; index 0 is a placeholder.
pub const CHEMICAL_SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Highest atomic number in [`CHEMICAL_SYMBOLS`].
pub const MAX_ATOMIC_NUMBER: u8 = 118;

/// Atomic number for a chemical symbol (case-sensitive, e.g. `"Fe"`).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    CHEMICAL_SYMBOLS
        .iter()
        .skip(1)
        .position(|s| *s == symbol)
        .and_then(|idx| u8::try_from(idx + 1).ok())
}

/// Chemical symbol for an atomic number.
pub fn symbol(z: u8) -> Option<&'static str> {
    if z == 0 {
        return None;
    }
    CHEMICAL_SYMBOLS.get(usize::from(z)).copied()
}

/// Periodic table group (1-18) of an element.
///
/// Lanthanoids (La-Lu) and actinoids (Ac-Lr) are placed in group 3.
pub fn element_group(z: u8) -> Result<u8> {
    if z == 0 || z > MAX_ATOMIC_NUMBER {
        return Err(Error::InvalidData(format!("atomic number {z} is out of range")));
    }

    let group = match z {
        1 => 1,
        2 => 18,
        3..=18 => match (z - 2) % 8 {
            0 => 18,
            r @ (1 | 2) => r,
            r => 10 + r,
        },
        19..=54 => match (z - 18) % 18 {
            0 => 18,
            r => r,
        },
        57..=71 | 89..=103 => 3,
        _ => match (z - 54) % 32 {
            0 => 18,
            r if r >= 17 => r - 14,
            r => r,
        },
    };

    Ok(group)
}

/// Periodic table group for a chemical symbol.
pub fn element_group_of(symbol: &str) -> Result<u8> {
    let z = atomic_number(symbol)
        .ok_or_else(|| Error::InvalidData(format!("unknown chemical element {symbol:?}")))?;
    element_group(z)
}
