pub mod compare;
pub mod config;
pub mod fetch;
pub mod group;
pub mod mine;
pub mod project;
pub mod transport;
pub mod validate;

pub use compare::run_compare;
pub use fetch::{run_count, run_fetch};
pub use group::show_group;
pub use mine::{run_clusters, run_liquidus, run_melting, run_nonformers};
pub use project::show_project;
pub use validate::run_validate;

use anyhow::{Context, Result};
use mpds_client::{Config, MpdsClient};

pub(crate) fn api_client(config: &Config) -> Result<MpdsClient> {
    MpdsClient::from_config(config).context("Failed to set up the MPDS API client")
}
