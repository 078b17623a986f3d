use serde_json::json;

use mpds_core::compare::{Comparison, DataSource, MassageState, PropertyOutline};
use mpds_core::ids::RunId;
use mpds_core::schema::HarvestCache;

use crate::client::MpdsClient;
use crate::error::ApiResult;
use crate::fields::{EntryKind, Fields};
use crate::source::FacetSource;

async fn ingest_source<S: FacetSource>(
    client: &MpdsClient<S>,
    comparison: &mut Comparison,
    source: DataSource,
    property: &str,
    state: &mut MassageState,
) -> ApiResult<()> {
    let fields = Fields::new().with_paths(EntryKind::P, comparison.outline().fields(source))?;
    let decks = client
        .get_data(&json!({"props": property}), &[], &fields)
        .await?;

    let total = decks.len();
    let mut rejected = 0;
    for deck in decks {
        if let Err(rejection) = comparison.ingest(source, deck, state) {
            log::debug!("Skipping {property} deck: {rejection:?}");
            rejected += 1;
        }
    }
    log::info!("{property} ({source:?}): kept {} of {total} decks", total - rejected);
    Ok(())
}

/// Collect ab initio and peer-reviewed values of every outlined property
/// and store the phases reported by both under a new run.
///
/// The run is marked complete only after all properties were stored.
pub async fn harvest_comparison<A, P>(
    ab_client: &MpdsClient<A>,
    pr_client: &MpdsClient<P>,
    outlines: &[PropertyOutline],
    cache: &HarvestCache,
) -> ApiResult<RunId>
where
    A: FacetSource,
    P: FacetSource,
{
    let run = cache.start_run()?;
    let mut state = MassageState::default();

    for outline in outlines {
        log::info!("Harvesting {}", outline.property);
        let mut comparison = Comparison::new(outline.clone());

        ingest_source(
            ab_client,
            &mut comparison,
            DataSource::AbInitio,
            outline.property,
            &mut state,
        )
        .await?;
        ingest_source(
            pr_client,
            &mut comparison,
            DataSource::PeerReviewed,
            outline.pr_property(),
            &mut state,
        )
        .await?;

        let pairs = comparison.pairs();
        log::info!("{}: {} phases in common", outline.property, pairs.len());
        cache.store_pairs(run, outline.property, &pairs)?;
    }

    cache.complete_run(run)?;
    Ok(run)
}
