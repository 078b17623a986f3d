use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mpds_client::miners::conductivity_archives;
use mpds_client::{Config, DataType};
use mpds_core::transport::analyze_at;

use super::api_client;

/// Print the conductivity of a `SIGMA.DAT` table at one point.
pub fn analyze_file(path: &Path, temperature: f64, mu: f64) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let sigma = analyze_at(BufReader::new(file), temperature, mu)?;
    println!("{sigma}");
    Ok(())
}

/// List raw data archives of ab initio conductivity calculations.
pub async fn list_archives(config: &Config) -> Result<()> {
    let client = api_client(config)?.with_dtype(DataType::AbInitio);
    for archive in conductivity_archives(&client).await? {
        println!("{}\t{}\t{}", archive.entry, archive.phase, archive.url);
    }
    Ok(())
}
