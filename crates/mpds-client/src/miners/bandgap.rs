use std::collections::BTreeMap;

use rand::Rng;
use serde_json::{json, Value};

use mpds_core::chem::element_group_of;
use mpds_core::chem::formula::scalar_value;
use mpds_core::export::{ExportedPlot, Exporter, PlotKind};
use mpds_core::kmeans::{k_from_n, kmeans, Point, DEFAULT_CUTOFF};

use crate::client::MpdsClient;
use crate::error::ApiResult;
use crate::fields::{EntryKind, Fields};
use crate::source::FacetSource;

/// Columns of the exported clustering plot.
pub const CLUSTER_COLUMNS: [&str; 5] = ["groupA", "groupB", "bandgap", "compound", "cluster"];

/// Clustered band gaps of binary compounds.
#[derive(Debug, Clone, PartialEq)]
pub struct BandgapClusters {
    /// `[groupA, groupB, bandgap, compound, cluster]`, clusters numbered from 1.
    pub rows: Vec<Vec<Value>>,
    pub exported: ExportedPlot,
}

#[derive(Debug)]
struct FormulaGaps {
    elements: Vec<String>,
    gaps: Vec<f64>,
}

/// Band gap points `(sorted groups..., mean gap)` per formula.
fn bandgap_points(decks: &[Vec<Value>]) -> Vec<Point> {
    let mut by_formula: BTreeMap<String, FormulaGaps> = BTreeMap::new();

    for deck in decks {
        let [formula, elements, _sg, units, gap] = deck.as_slice() else {
            continue;
        };
        if units.as_str() != Some("eV") {
            continue;
        }
        let (Some(formula), Some(gap)) = (formula.as_str(), scalar_value(gap)) else {
            continue;
        };
        if !(0.0 < gap && gap < 20.0) {
            continue;
        }
        let elements: Vec<String> = elements
            .as_array()
            .map(|els| els.iter().filter_map(|e| e.as_str().map(ToString::to_string)).collect())
            .unwrap_or_default();

        by_formula
            .entry(formula.to_string())
            .or_insert_with(|| FormulaGaps {
                elements,
                gaps: Vec::new(),
            })
            .gaps
            .push(gap);
    }

    by_formula
        .into_iter()
        .filter_map(|(formula, FormulaGaps { elements, gaps })| {
            let [a, b] = elements.as_slice() else {
                log::warn!("{formula}: expected two elements, got {elements:?}");
                return None;
            };
            let groups = element_group_of(a).and_then(|ga| Ok((ga, element_group_of(b)?)));
            let (ga, gb) = match groups {
                Ok(groups) => groups,
                Err(e) => {
                    log::warn!("{formula}: {e}");
                    return None;
                }
            };
            #[allow(clippy::cast_precision_loss)]
            let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
            Some(
                Point::new(vec![
                    f64::from(ga.min(gb)),
                    f64::from(ga.max(gb)),
                    (mean * 100.0).round() / 100.0,
                ])
                .with_reference(formula),
            )
        })
        .collect()
}

/// Cluster binary compounds by element groups and band gap, and export
/// the clusters as a 3D plot.
pub async fn bandgap_clusters<S, R>(
    client: &MpdsClient<S>,
    exporter: &Exporter,
    rng: &mut R,
) -> ApiResult<BandgapClusters>
where
    S: FacetSource,
    R: Rng + ?Sized,
{
    let fields = Fields::new().with_paths(
        EntryKind::P,
        &[
            "sample.material.chemical_formula",
            "sample.material.chemical_elements",
            "sample.material.condition[0].scalar[0].value",
            "sample.measurement[0].property.units",
            "sample.measurement[0].property.scalar",
        ],
    )?;
    let decks = client
        .get_data(&json!({"classes": "binary", "props": "band gap"}), &[], &fields)
        .await?;

    let points = bandgap_points(&decks);
    log::info!("Clustering {} compounds", points.len());
    let clusters = kmeans(&points, k_from_n(points.len()), DEFAULT_CUTOFF, rng)?;

    let mut rows = Vec::new();
    for (cluster_n, cluster) in clusters.iter().enumerate() {
        for point in &cluster.points {
            let mut row: Vec<Value> = point.coords.iter().map(|c| json!(c)).collect();
            row.push(json!(point.reference.as_deref().unwrap_or_default()));
            row.push(json!(cluster_n + 1));
            rows.push(row);
        }
    }

    let exported = exporter.export_plot(&rows, &CLUSTER_COLUMNS, PlotKind::Plot3d)?;
    Ok(BandgapClusters { rows, exported })
}
