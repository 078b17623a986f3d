use anyhow::Result;
use mpds_core::chem::{atomic_number, element_group, symbol};

/// Print the periodic table group of an element given by symbol or number.
pub fn show_group(element: &str) -> Result<()> {
    let z = match element.parse::<u8>() {
        Ok(z) => z,
        Err(_) => atomic_number(element)
            .ok_or_else(|| anyhow::anyhow!("Unknown chemical element {element:?}"))?,
    };
    let group = element_group(z)?;
    let name = symbol(z).unwrap_or("?");
    println!("{name} (Z = {z}): group {group}");
    Ok(())
}
