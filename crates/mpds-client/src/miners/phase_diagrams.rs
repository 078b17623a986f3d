use std::collections::BTreeSet;

use serde_json::{json, Value};

use mpds_core::phase_diagram::{find_nonformers, liquidus_lines, LiquidusReport, PhaseDiagram};

use crate::client::MpdsClient;
use crate::error::{ApiError, ApiResult};
use crate::source::FacetSource;

/// All binary phase diagrams, optionally limited to one chemical system.
pub async fn binary_diagrams<S: FacetSource>(
    client: &MpdsClient<S>,
    elements: Option<&str>,
) -> ApiResult<Vec<PhaseDiagram>> {
    let mut search = json!({"props": "phase diagram", "classes": "binary"});
    if let Some(elements) = elements {
        search["elements"] = Value::String(elements.to_string());
    }

    client
        .get_raw(&search, &[])
        .await?
        .into_iter()
        .map(|entry| serde_json::from_value(entry).map_err(ApiError::from))
        .collect()
}

/// Binary systems forming no compounds.
pub async fn nonformers<S: FacetSource>(client: &MpdsClient<S>) -> ApiResult<BTreeSet<Vec<String>>> {
    let diagrams = binary_diagrams(client, None).await?;
    log::info!("Inspecting {} phase diagrams", diagrams.len());
    Ok(find_nonformers(&diagrams)?)
}

/// Liquidus lines of every reported diagram of the `a`-`b` system.
pub async fn liquidus<S: FacetSource>(
    client: &MpdsClient<S>,
    a: &str,
    b: &str,
) -> ApiResult<LiquidusReport> {
    if a == b {
        return Err(ApiError::InvalidResponse(format!(
            "two distinct chemical elements are required, got {a} twice"
        )));
    }
    let mut elements = [a, b];
    elements.sort_unstable();
    let system = elements.join("-");
    log::info!("Elements: {system}");

    let diagrams = binary_diagrams(client, Some(&system)).await?;
    Ok(liquidus_lines(&diagrams)?)
}
