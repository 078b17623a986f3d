//! Client for the MPDS materials data API.
//!
//! Implements paged retrieval from the faceted-search endpoint, field
//! extraction from the returned JSON entries, response validation, and
//! the data-mining workflows built on top of them.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod datatype;
pub mod error;
pub mod fields;
pub mod miners;
pub mod source;
pub mod table;
pub mod validate;

pub use client::{ClientSettings, MpdsClient};
pub use config::Config;
pub use datatype::DataType;
pub use error::{ApiError, ApiResult};
pub use fields::{EntryKind, FieldExpr, FieldPath, Fields};
pub use source::{FacetPage, FacetSource, HttpFacetSource, PageRequest};
pub use table::Table;
