// src/tasks/catalog_refresh.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::catalog::{CatalogSource, CatalogStore, InventoryImporter, PlaylistImporter, RefreshSummary};

pub const DEFAULT_REFRESH_TIME: &str = "05:00";
pub const DEFAULT_REFRESH_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Wall-clock time of day, in a named zone, at which the catalog reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    pub at: NaiveTime,
    pub timezone: Tz,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            at: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or(NaiveTime::MIN),
            timezone: DEFAULT_REFRESH_TIMEZONE,
        }
    }
}

impl RefreshSchedule {
    /// First fire time strictly after `now`. A local time that falls in a
    /// DST gap does not exist that day, so that day is skipped.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut date = now.with_timezone(&self.timezone).date_naive();

        for _ in 0..8 {
            let local = date.and_time(self.at);
            if let Some(candidate) = self.timezone.from_local_datetime(&local).earliest() {
                let candidate = candidate.with_timezone(&Utc);
                if candidate > now {
                    return candidate;
                }
            }
            match date.checked_add_days(Days::new(1)) {
                Some(next) => date = next,
                None => break,
            }
        }

        now + chrono::Duration::days(1)
    }
}

/// Runs every configured importer and hands the results to the store.
pub struct CatalogRefresher {
    store: Arc<CatalogStore>,
    playlist: Option<PlaylistImporter>,
    inventory: Option<InventoryImporter>,
}

impl CatalogRefresher {
    pub fn new(
        store: Arc<CatalogStore>,
        playlist: Option<PlaylistImporter>,
        inventory: Option<InventoryImporter>,
    ) -> Self {
        Self { store, playlist, inventory }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub async fn refresh(&self) -> RefreshSummary {
        info!("Refreshing stream catalog...");
        let mut results = Vec::new();

        if let Some(playlist) = &self.playlist {
            results.push((CatalogSource::Playlist, playlist.import().await));
        }
        if let Some(inventory) = &self.inventory {
            let result = inventory.import().await.map(|report| report.catalog);
            results.push((CatalogSource::Inventory, result));
        }

        let summary = self.store.apply_refresh(results);
        if summary.kept_last_good.is_empty() {
            info!("Catalog refresh complete => {} streams", summary.total_entries);
        } else {
            warn!(
                "Catalog refresh complete => {} streams (stale sources: {:?})",
                summary.total_entries, summary.kept_last_good
            );
        }
        if summary.total_entries == 0 {
            error!("Stream catalog is empty after refresh");
        }
        summary
    }
}

/// Spawns the daily refresh loop. The startup load is the caller's job.
pub fn spawn_catalog_refresh_task(
    refresher: Arc<CatalogRefresher>,
    schedule: RefreshSchedule,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = schedule.next_after(now);
            info!(
                "Next catalog refresh at {}",
                next.with_timezone(&schedule.timezone).format("%Y-%m-%d %H:%M %Z")
            );

            let wait = (next - now).to_std().unwrap_or(Duration::from_secs(60));
            tokio::time::sleep(wait).await;
            refresher.refresh().await;
        }
    })
}
