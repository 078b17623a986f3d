use serde::Serialize;
use serde_json::json;

use crate::client::MpdsClient;
use crate::error::ApiResult;
use crate::source::FacetSource;

/// Location of the raw simulation archive of one ab initio entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawArchive {
    pub entry: String,
    pub phase: String,
    pub url: String,
}

/// Raw data archives of the electrical conductivity calculations.
///
/// The archives hold `TRANSPORT/SIGMA.DAT` among other outputs. Entries
/// without an archive link are skipped.
pub async fn conductivity_archives<S: FacetSource>(client: &MpdsClient<S>) -> ApiResult<Vec<RawArchive>> {
    let entries = client
        .get_raw(&json!({"props": "electrical conductivity"}), &[])
        .await?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let material = &entry["sample"]["material"];
            let url = entry["sample"]["measurement"][0]["raw_data"].as_str()?;
            Some(RawArchive {
                entry: material["entry"].as_str().unwrap_or_default().to_string(),
                phase: material["phase"].as_str().map_or_else(
                    || material["phase_id"].to_string(),
                    ToString::to_string,
                ),
                url: url.to_string(),
            })
        })
        .collect())
}

