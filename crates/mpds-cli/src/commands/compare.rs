use anyhow::{Context, Result};

use mpds_client::miners::harvest_comparison;
use mpds_client::{Config, DataType, MpdsClient};
use mpds_core::compare::default_outlines;
use mpds_core::schema::HarvestCache;

/// Compare ab initio and peer-reviewed values, harvesting only when no
/// complete run is cached or `refresh` is set.
pub async fn run_compare(config: &Config, refresh: bool) -> Result<()> {
    if let Some(parent) = config.cache_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create cache directory")?;
    }
    let cache = HarvestCache::open(&config.cache_path)?;

    let cached = if refresh {
        None
    } else {
        cache.latest_complete_run()?
    };

    let run = if let Some(run) = cached {
        log::info!("Using cached harvest {run}");
        run
    } else {
        let ab_client = MpdsClient::from_config(config)?.with_dtype(DataType::AbInitio);
        let pr_client = MpdsClient::from_config(config)?.with_dtype(DataType::PeerReviewed);
        harvest_comparison(&ab_client, &pr_client, &default_outlines(), &cache).await?
    };

    for (property, pairs) in cache.pairs_for_run(run)? {
        println!("{} comparing {property}", "#".repeat(50));
        for pair in pairs {
            println!(
                "{} ({}): {} vs. {}",
                pair.label.formula,
                pair.label.crystal_system,
                serde_json::to_string(&pair.ab_values)?,
                serde_json::to_string(&pair.pr_values)?
            );
        }
    }
    Ok(())
}
