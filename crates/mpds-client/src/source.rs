//! Page sources for the faceted-search endpoint.
//!
//! [`FacetSource`] is the seam between the paging logic in
//! [`MpdsClient`](crate::MpdsClient) and the network; tests substitute
//! canned pages for [`HttpFacetSource`].

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::datatype::DataType;
use crate::error::{ApiError, ApiResult};

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetPage {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub out: Vec<Value>,
    #[serde(default)]
    pub npages: u64,
    #[serde(default)]
    pub count: u64,
}

/// Parameters of one page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub search: &'a Value,
    pub phases: &'a [u64],
    pub page: u64,
    pub pagesize: u32,
    pub dtype: DataType,
}

#[async_trait]
pub trait FacetSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> ApiResult<FacetPage>;
}

/// HTTP access to the MPDS API.
#[derive(Debug, Clone)]
pub struct HttpFacetSource {
    http: Client,
    endpoint: String,
    api_key: String,
    max_retries: usize,
}

impl HttpFacetSource {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> ApiResult<Self> {
        let http = Client::builder()
            .user_agent(concat!(
                "mpds-toolkit/",
                env!("CARGO_PKG_VERSION"),
                " (https://developer.mpds.io)"
            ))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_retries: 3,
        })
    }

    /// Build from configuration; a missing API key is an error.
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        let api_key = config.api_key.as_deref().ok_or(ApiError::MissingKey)?;
        Self::new(config.endpoint.as_str(), api_key)
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn fetch_once(&self, request: &PageRequest<'_>) -> ApiResult<FacetPage> {
        let search = serde_json::to_string(request.search)?;
        let phases = request
            .phases
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let page = request.page.to_string();
        let pagesize = request.pagesize.to_string();
        let dtype = request.dtype.code().to_string();

        let response = self
            .http
            .get(&self.endpoint)
            .header("Key", &self.api_key)
            .query(&[
                ("q", search.as_str()),
                ("phases", phases.as_str()),
                ("page", page.as_str()),
                ("pagesize", pagesize.as_str()),
                ("dtype", dtype.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body, &self.endpoint));
        }

        response
            .json::<FacetPage>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

/// Errors reported in a non-success body are surfaced as API errors with
/// the HTTP status as code.
fn error_from_body(status: u16, body: &str, url: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(ToString::to_string));
    match message {
        Some(message) if !(status == 429 || status >= 500) => ApiError::Api {
            message,
            code: i64::from(status),
        },
        _ => ApiError::Http {
            status,
            url: url.to_string(),
        },
    }
}

#[async_trait]
impl FacetSource for HttpFacetSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> ApiResult<FacetPage> {
        (move || self.fetch_once(request))
            .retry(ExponentialBuilder::default().with_max_times(self.max_retries))
            .when(ApiError::is_transient)
            .notify(|err, dur| {
                log::warn!("MPDS request failed ({err}), retrying in {dur:?}");
            })
            .await
    }
}
