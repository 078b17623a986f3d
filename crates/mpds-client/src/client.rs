//! Paged retrieval from the MPDS API.
//!
//! A search is a JSON object of facets (`elements`, `props`, `classes`,
//! ...). Results may be narrowed to a list of phase ids; long lists are
//! split into chunks sent as separate queries. Every query is paged
//! through until its declared page count is reached, pausing between
//! pages. The declared hit count must not change while paging and must
//! match the number of collected entries.

use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::Value;

use crate::config::{Config, DEFAULT_CHILLOUT};
use crate::datatype::DataType;
use crate::error::{ApiError, ApiResult};
use crate::fields::Fields;
use crate::source::{FacetSource, HttpFacetSource, PageRequest};
use crate::table::Table;

const COUNT_PAGESIZE: u32 = 10;

/// Paging parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub dtype: DataType,
    pub pagesize: u32,
    pub max_npages: u64,
    pub max_nphases: usize,
    pub chillout: Duration,
}

impl ClientSettings {
    fn with_chillout_of(config: &Config, chillout: Duration) -> Self {
        Self {
            dtype: config.dtype,
            pagesize: config.pagesize,
            max_npages: config.max_npages,
            max_nphases: config.max_nphases,
            chillout,
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::with_chillout_of(&Config::default(), DEFAULT_CHILLOUT)
    }
}

impl TryFrom<&Config> for ClientSettings {
    type Error = ApiError;

    fn try_from(config: &Config) -> ApiResult<Self> {
        let chillout = config.chillout().map_err(|e| ApiError::InvalidSetting {
            name: "chillout_secs",
            reason: e.to_string(),
        })?;
        Ok(Self::with_chillout_of(config, chillout))
    }
}

/// MPDS API client.
#[derive(Debug, Clone)]
pub struct MpdsClient<S = HttpFacetSource> {
    source: S,
    settings: ClientSettings,
}

impl MpdsClient<HttpFacetSource> {
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Ok(Self::new(
            HttpFacetSource::from_config(config)?,
            ClientSettings::try_from(config)?,
        ))
    }
}

impl<S: FacetSource> MpdsClient<S> {
    pub fn new(source: S, settings: ClientSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    #[must_use]
    pub fn with_dtype(mut self, dtype: DataType) -> Self {
        self.settings.dtype = dtype;
        self
    }

    #[must_use]
    pub fn with_chillout(mut self, chillout: Duration) -> Self {
        self.settings.chillout = chillout;
        self
    }

    /// Number of hits of a search, read from a small first page.
    ///
    /// Counts beyond what [`get_raw`](Self::get_raw) may page through are
    /// returned with a warning.
    pub async fn count_data(&self, search: &Value, phases: &[u64]) -> ApiResult<u64> {
        let phases = dedup_phases(phases);
        let request = PageRequest {
            pagesize: COUNT_PAGESIZE,
            ..self.request(search, &phases, 0)
        };
        let page = self.source.fetch_page(&request).await?;
        if let Some(message) = page.error {
            return Err(ApiError::Api {
                message,
                code: page.code.unwrap_or(0),
            });
        }

        let limit = self.settings.max_npages * u64::from(self.settings.pagesize);
        if page.count > limit {
            log::warn!("{} hits may be not fully retrieved (limit {limit})", page.count);
        }
        Ok(page.count)
    }

    /// All raw entries matching a search.
    pub async fn get_raw(&self, search: &Value, phases: &[u64]) -> ApiResult<Vec<Value>> {
        let chunks = split_phases(&dedup_phases(phases), self.settings.max_nphases);
        let nsteps = chunks.len();
        let mut output = Vec::new();
        let mut declared = 0;

        for (step, chunk) in chunks.iter().enumerate() {
            if nsteps > 1 {
                log::info!("Step {} of {nsteps} ({} phases)", step + 1, chunk.len());
            }
            let (entries, count) = self.collect_pages(search, chunk).await?;
            output.extend(entries);
            declared += count;
        }

        let collected = output.len() as u64;
        if collected != declared {
            return Err(ApiError::CountMismatch {
                collected,
                declared,
            });
        }
        log::info!("Got {collected} hits");
        Ok(output)
    }

    async fn collect_pages(&self, search: &Value, phases: &[u64]) -> ApiResult<(Vec<Value>, u64)> {
        let mut entries = Vec::new();
        let mut hits: Option<u64> = None;
        let mut page = 0;

        loop {
            let result = self
                .source
                .fetch_page(&self.request(search, phases, page))
                .await?;
            if let Some(message) = result.error {
                return Err(ApiError::Api {
                    message,
                    code: result.code.unwrap_or(0),
                });
            }
            if result.npages > self.settings.max_npages {
                return Err(ApiError::TooManyHits {
                    count: result.count,
                    limit: self.settings.max_npages * u64::from(self.settings.pagesize),
                });
            }
            if let Some(before) = hits {
                if before != result.count {
                    return Err(ApiError::CountChanged {
                        before,
                        after: result.count,
                    });
                }
            }
            hits = Some(result.count);
            entries.extend(result.out);

            if page + 1 >= result.npages {
                break;
            }
            page += 1;
            log::debug!("Page {page} of {}", result.npages);
            if !self.settings.chillout.is_zero() {
                tokio::time::sleep(self.settings.chillout).await;
            }
        }

        Ok((entries, hits.unwrap_or(0)))
    }

    /// Rows extracted from every entry matching a search.
    pub async fn get_data(
        &self,
        search: &Value,
        phases: &[u64],
        fields: &Fields,
    ) -> ApiResult<Vec<Vec<Value>>> {
        self.get_raw(search, phases)
            .await?
            .iter()
            .map(|entry| fields.extract(entry))
            .collect()
    }

    /// Like [`get_data`](Self::get_data), with named columns.
    ///
    /// Rows whose width differs from the column count are dropped.
    pub async fn get_table(
        &self,
        search: &Value,
        phases: &[u64],
        fields: &Fields,
        columns: &[&str],
    ) -> ApiResult<Table> {
        let rows = self.get_data(search, phases, fields).await?;
        let total = rows.len();
        let rows: Vec<Vec<Value>> = rows.into_iter().filter(|r| r.len() == columns.len()).collect();
        if rows.len() < total {
            log::warn!(
                "Dropped {} rows not matching {} columns",
                total - rows.len(),
                columns.len()
            );
        }
        Ok(Table::new(
            columns.iter().map(ToString::to_string).collect(),
            rows,
        ))
    }

    fn request<'a>(&self, search: &'a Value, phases: &'a [u64], page: u64) -> PageRequest<'a> {
        PageRequest {
            search,
            phases,
            page,
            pagesize: self.settings.pagesize,
            dtype: self.settings.dtype,
        }
    }
}

fn dedup_phases(phases: &[u64]) -> Vec<u64> {
    phases.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Split phases into the fewest near-equal chunks of at most `max` ids.
///
/// Earlier chunks take the remainder, one extra id each. No phases yields
/// a single empty chunk, i.e. an unrestricted query.
pub fn split_phases(phases: &[u64], max: usize) -> Vec<Vec<u64>> {
    if phases.is_empty() {
        return vec![Vec::new()];
    }
    let max = max.max(1);
    let nchunks = phases.len().div_ceil(max);
    let base = phases.len() / nchunks;
    let extra = phases.len() % nchunks;

    let mut chunks = Vec::with_capacity(nchunks);
    let mut start = 0;
    for i in 0..nchunks {
        let len = base + usize::from(i < extra);
        chunks.push(phases[start..start + len].to_vec());
        start += len;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_empty() {
        assert_eq!(split_phases(&[], 10), vec![Vec::<u64>::new()]);
    }

    #[test]
    fn test_split_under_limit() {
        assert_eq!(split_phases(&[1, 2, 3], 10), vec![vec![1, 2, 3]]);
    }

    #[test]
    fn test_split_balanced() {
        let phases: Vec<u64> = (1..=7).collect();
        assert_eq!(
            split_phases(&phases, 3),
            vec![vec![1, 2, 3], vec![4, 5], vec![6, 7]]
        );
    }

    #[test]
    fn test_split_respects_max() {
        let phases: Vec<u64> = (0..3001).collect();
        let chunks = split_phases(&phases, 1500);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() <= 1500));
        assert_eq!(chunks.iter().map(Vec::len).sum::<usize>(), 3001);
    }

    #[test]
    fn test_dedup_phases() {
        assert_eq!(dedup_phases(&[5, 1, 5, 3]), vec![1, 3, 5]);
    }

    #[test]
    fn test_settings_from_config() {
        let settings = ClientSettings::default();
        assert_eq!(settings.pagesize, 1000);
        assert_eq!(settings.max_npages, 120);
        assert_eq!(settings.dtype, DataType::PeerReviewed);
        assert_eq!(settings.chillout, Duration::from_secs(2));
    }

    #[test]
    fn test_settings_reject_unrepresentable_chillout() {
        let config = Config {
            chillout_secs: 1e30,
            ..Config::default()
        };
        let err = ClientSettings::try_from(&config).unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidSetting { name: "chillout_secs", .. }
        ));

        let config = Config {
            chillout_secs: 0.25,
            ..Config::default()
        };
        let settings = ClientSettings::try_from(&config).unwrap();
        assert_eq!(settings.chillout, Duration::from_millis(250));
    }
}
