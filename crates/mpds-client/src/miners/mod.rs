//! Data-mining workflows over the MPDS API.
//!
//! Each miner issues one or more searches through an [`MpdsClient`]
//! and reduces the results with the domain logic of `mpds-core`.
//!
//! [`MpdsClient`]: crate::MpdsClient

pub mod bandgap;
pub mod comparison;
pub mod melting;
pub mod phase_diagrams;
pub mod transport;

pub use bandgap::{bandgap_clusters, BandgapClusters};
pub use comparison::harvest_comparison;
pub use melting::{melting_expansion, MeltingExpansion};
pub use phase_diagrams::{liquidus, nonformers};
pub use transport::{conductivity_archives, RawArchive};

/// Median of a non-empty slice; averages the middle pair for even lengths.
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
