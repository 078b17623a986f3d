//! Chemistry helpers: the periodic table, crystal systems, and formula
//! normalisation.

pub mod crystal;
pub mod elements;
pub mod formula;

pub use crystal::CrystalSystem;
pub use elements::{atomic_number, element_group, element_group_of, symbol};
pub use formula::{is_scalar, short_formula};
