#![allow(dead_code)]

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use mpds_client::{ApiResult, ClientSettings, DataType, FacetPage, FacetSource, MpdsClient, PageRequest};

/// A request as seen by the mock source.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub search: Value,
    pub phases: Vec<u64>,
    pub page: u64,
    pub dtype: DataType,
}

/// Answers page requests with a closure and records them.
pub struct FnSource<F> {
    respond: F,
    requests: Mutex<Vec<Recorded>>,
}

impl<F> FnSource<F>
where
    F: Fn(&PageRequest<'_>) -> ApiResult<FacetPage> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<F> FacetSource for FnSource<F>
where
    F: Fn(&PageRequest<'_>) -> ApiResult<FacetPage> + Send + Sync,
{
    async fn fetch_page(&self, request: &PageRequest<'_>) -> ApiResult<FacetPage> {
        self.requests.lock().unwrap().push(Recorded {
            search: request.search.clone(),
            phases: request.phases.to_vec(),
            page: request.page,
            dtype: request.dtype,
        });
        (self.respond)(request)
    }
}

pub fn settings(pagesize: u32) -> ClientSettings {
    ClientSettings {
        pagesize,
        chillout: Duration::ZERO,
        ..ClientSettings::default()
    }
}

pub fn client<F>(pagesize: u32, respond: F) -> MpdsClient<FnSource<F>>
where
    F: Fn(&PageRequest<'_>) -> ApiResult<FacetPage> + Send + Sync,
{
    client_with(settings(pagesize), respond)
}

pub fn client_with<F>(settings: ClientSettings, respond: F) -> MpdsClient<FnSource<F>>
where
    F: Fn(&PageRequest<'_>) -> ApiResult<FacetPage> + Send + Sync,
{
    MpdsClient::new(FnSource::new(respond), settings)
}

/// Serve `entries` page by page.
pub fn page_of(entries: &[Value], request: &PageRequest<'_>) -> FacetPage {
    let size = request.pagesize as usize;
    let npages = entries.len().div_ceil(size) as u64;
    let start = (request.page as usize * size).min(entries.len());
    let end = (start + size).min(entries.len());
    FacetPage {
        error: None,
        code: None,
        out: entries[start..end].to_vec(),
        npages,
        count: entries.len() as u64,
    }
}

pub fn property_entry(phase_id: i64, formula: &str, sg: u16, units: &str, value: Value) -> Value {
    json!({
        "object_type": "P",
        "sample": {
            "material": {
                "phase_id": phase_id,
                "phase": format!("{formula}/{sg}"),
                "chemical_formula": formula,
                "entry": format!("P{phase_id:06}"),
                "condition": [{"scalar": [{"value": sg}]}]
            },
            "measurement": [{
                "property": {"units": units, "scalar": value}
            }]
        }
    })
}

pub fn search_props(request: &PageRequest<'_>) -> String {
    request.search["props"].as_str().unwrap_or_default().to_string()
}
