//! Stream catalog: ingestion (playlist + inventory), the shared store, and filtering.

pub mod filter;
pub mod inventory;
pub mod playlist;
pub mod store;

pub use filter::{filter_catalog, FilterOptions};
pub use inventory::{ImportReport, InventoryImporter, JellyfinClient};
pub use playlist::{parse_playlist, PlaylistImporter};
pub use store::{CatalogSource, CatalogStore, RefreshSummary};
