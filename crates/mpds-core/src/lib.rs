//! Core domain model for the MPDS toolkit.
//!
//! This crate holds everything that does not talk to the network: the
//! API project metadata record, chemistry helpers, phase diagram and
//! transport-data analysis, k-means clustering, the ab initio vs.
//! peer-reviewed comparison model, plot export, and the SQLite harvest
//! cache.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod apidoc;
pub mod chem;
pub mod compare;
pub mod error;
pub mod export;
pub mod ids;
pub mod kmeans;
pub mod phase_diagram;
pub mod schema;
pub mod transport;

pub use apidoc::{Generator, ProjectMetadata, SampleUrl};
pub use error::{Error, Result};
