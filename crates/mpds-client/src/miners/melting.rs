use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use mpds_core::chem::formula::scalar_value;

use super::median;
use crate::client::MpdsClient;
use crate::error::ApiResult;
use crate::fields::{EntryKind, Fields};
use crate::source::FacetSource;

/// Melting points above this are considered, K.
pub const MELTING_THRESHOLD: f64 = 1800.0 + 273.0;

/// Median congruent melting point and thermal expansion of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeltingExpansion {
    pub phase_id: i64,
    pub formula: String,
    /// Degrees Celsius.
    pub t_melt: f64,
    /// Linear thermal expansion coefficient times 1e5.
    pub alpha_e5: f64,
}

fn phase_of(deck: &[Value]) -> Option<i64> {
    deck.first().and_then(Value::as_i64)
}

/// Oxides melting congruently above 1800 C, with their linear thermal
/// expansion, sorted by expansion.
///
/// Phases may carry several values of each property; medians are
/// reported. Decks without a numeric value are skipped.
pub async fn melting_expansion<S: FacetSource>(client: &MpdsClient<S>) -> ApiResult<Vec<MeltingExpansion>> {
    let melting_fields = Fields::new().with_paths(
        EntryKind::P,
        &[
            "sample.material.phase_id",
            "sample.material.chemical_formula",
            "sample.measurement[0].property.scalar",
        ],
    )?;
    let decks = client
        .get_data(
            &json!({"props": "temperature for congruent melting", "classes": "oxide"}),
            &[],
            &melting_fields,
        )
        .await?;

    let mut formulae: BTreeMap<i64, String> = BTreeMap::new();
    let mut melting: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for deck in &decks {
        let (Some(phase), Some(value)) = (phase_of(deck), deck.get(2).and_then(scalar_value)) else {
            continue;
        };
        if value > MELTING_THRESHOLD {
            let formula = deck.get(1).and_then(Value::as_str).unwrap_or_default();
            formulae.insert(phase, formula.to_string());
            melting.entry(phase).or_default().push(value);
        }
    }

    if melting.is_empty() {
        return Ok(Vec::new());
    }

    let phases: Vec<u64> = melting.keys().filter_map(|p| u64::try_from(*p).ok()).collect();
    let expansion_fields = Fields::new().with_paths(
        EntryKind::P,
        &["sample.material.phase_id", "sample.measurement[0].property.scalar"],
    )?;
    let decks = client
        .get_data(
            &json!({"props": "linear thermal expansion coefficient"}),
            &phases,
            &expansion_fields,
        )
        .await?;

    let mut expansion: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for deck in &decks {
        if let (Some(phase), Some(value)) = (phase_of(deck), deck.get(1).and_then(scalar_value)) {
            expansion.entry(phase).or_default().push(value * 1e5);
        }
    }

    let mut results: Vec<MeltingExpansion> = formulae
        .into_iter()
        .filter_map(|(phase_id, formula)| {
            Some(MeltingExpansion {
                phase_id,
                formula,
                t_melt: median(melting.get(&phase_id)?)? - 273.0,
                alpha_e5: median(expansion.get(&phase_id)?)?,
            })
        })
        .collect();
    results.sort_by(|a, b| a.alpha_e5.total_cmp(&b.alpha_e5));
    Ok(results)
}
