//! Playlog Loader Library
//!
//! Batch loader that walks a catalog tree and an event-log tree of JSON
//! files and loads them into a SQLite warehouse: songs, artists, users,
//! calendar breakdowns, and play facts. Each source file commits as one
//! unit of work; plays are joined best-effort against the catalog by
//! (title, artist name, duration).

pub mod collect;
pub mod config;
pub mod extract;
pub mod filter;
pub mod pipeline;
pub mod sqlite_persistence;
pub mod timeparts;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use config::{AppConfig, CliConfig, FileConfig};
pub use pipeline::{LoadStats, Loader};
pub use warehouse::{SqliteWarehouse, WAREHOUSE_SCHEMA};
