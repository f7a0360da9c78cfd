pub mod catalog_refresh;

pub use catalog_refresh::{spawn_catalog_refresh_task, CatalogRefresher, RefreshSchedule};
