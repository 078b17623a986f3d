//! SQLite storage for harvested comparison data.

pub mod db;
pub mod migrations;

pub use db::HarvestCache;
