//! Electronic transport data from ab initio calculations.
//!
//! MPDS ab initio entries carry raw CRYSTAL output computed within the
//! semiclassical Boltzmann transport theory (frozen band approximation).
//! `SIGMA.DAT` lists, per chemical potential and temperature, the carrier
//! concentration and the conductivity tensor components. Carrier counts
//! are positive for p-doping and negative for n-doping; only their
//! magnitude is kept.

use std::io::BufRead;

use serde::Serialize;

use crate::error::{Error, Result};

/// Temperature of the reference conductivity value, K.
pub const REFERENCE_TEMPERATURE: f64 = 600.0;

/// Chemical potential of the reference conductivity value, eV.
pub const REFERENCE_MU: f64 = 2.0;

/// One row of a `SIGMA.DAT` table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SigmaRecord {
    pub mu: f64,
    pub temperature: f64,
    pub carriers: f64,
    /// The xx tensor component; the tensor is expected to be diagonal and
    /// scalar up to numerical noise.
    pub sigma_xx: f64,
}

/// Parse a `SIGMA.DAT` table, skipping comments and blank lines.
pub fn parse_sigma<R: BufRead>(reader: R) -> Result<Vec<SigmaRecord>> {
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let values = trimmed
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::InvalidData(format!("line {}: {e}", line_no + 1)))?;

        let [mu, temperature, carriers, sigma_xx, _xy, _xz, _yy, _yz, _zz] = values[..] else {
            return Err(Error::InvalidData(format!(
                "line {}: expected 9 columns, found {}",
                line_no + 1,
                values.len()
            )));
        };

        records.push(SigmaRecord {
            mu,
            temperature,
            carriers: carriers.abs(),
            sigma_xx,
        });
    }

    Ok(records)
}

/// Conductivity at the given temperature and chemical potential.
#[allow(clippy::float_cmp)]
pub fn analyze_at<R: BufRead>(reader: R, temperature: f64, mu: f64) -> Result<f64> {
    parse_sigma(reader)?
        .into_iter()
        .find(|r| r.temperature == temperature && r.mu == mu)
        .map(|r| r.sigma_xx)
        .ok_or_else(|| Error::NotFound {
            entity: "conductivity value",
            id: format!("T = {temperature} K, mu = {mu} eV"),
        })
}

/// Conductivity at 600 K and 2 eV.
pub fn analyze_raw<R: BufRead>(reader: R) -> Result<f64> {
    analyze_at(reader, REFERENCE_TEMPERATURE, REFERENCE_MU)
}
