//! Persistence layer for the five warehouse tables.

mod models;
mod schema;
mod sqlite;

pub use models::{PlayRow, SongRef, UserRow, WarehouseCounts};
pub use schema::WAREHOUSE_SCHEMA;
pub use sqlite::{FileTx, SqliteWarehouse};
