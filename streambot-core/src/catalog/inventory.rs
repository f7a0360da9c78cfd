// File: streambot-core/src/catalog/inventory.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use url::Url;

use streambot_common::models::{Catalog, InventoryItem, InventoryItemList};
use streambot_common::traits::api::InventoryApi;

use crate::http::HttpClient;
use crate::Error;

pub const DEFAULT_NAMESPACE_PREFIX: &str = "Jellyfin";

const API_KEY_HEADER: &str = "X-Emby-Token";
const PLAYABLE_ITEM_TYPES: &str = "Movie,Episode";

/// Jellyfin-style REST client over the shared `HttpClient`.
pub struct JellyfinClient {
    http: Arc<dyn HttpClient>,
    base_url: Url,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str, api_key: String) -> Result<Self, Error> {
        // Keep any sub-path (`/jellyfin`) when joining `Items` onto it.
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        Ok(Self {
            http,
            base_url: Url::parse(&base)?,
            api_key,
        })
    }

    fn items_url(&self, query: &[(&str, &str)]) -> Result<String, Error> {
        let mut url = self.base_url.join("Items")?;
        url.query_pairs_mut().extend_pairs(query.iter());
        Ok(url.to_string())
    }

    async fn fetch_items(&self, url: String) -> Result<Vec<InventoryItem>, Error> {
        let mut headers = HashMap::new();
        headers.insert(API_KEY_HEADER.to_string(), self.api_key.clone());

        let body = self.http.get(url, headers).await?;
        let list: InventoryItemList = serde_json::from_str(&body)?;
        Ok(list.items)
    }
}

#[async_trait]
impl InventoryApi for JellyfinClient {
    async fn list_folders(&self) -> Result<Vec<InventoryItem>, Error> {
        let url = self.items_url(&[("IncludeItemTypes", "Folder")])?;
        self.fetch_items(url).await
    }

    async fn list_playable_items(&self, parent_id: &str) -> Result<Vec<InventoryItem>, Error> {
        let url = self.items_url(&[
            ("ParentId", parent_id),
            ("IncludeItemTypes", PLAYABLE_ITEM_TYPES),
            ("Recursive", "true"),
        ])?;
        self.fetch_items(url).await
    }
}

/// What one inventory import produced.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub catalog: Catalog,
    /// Folders whose item listing failed. Their items are missing from `catalog`.
    pub failed_folders: Vec<String>,
}

impl ImportReport {
    pub fn is_partial(&self) -> bool {
        !self.failed_folders.is_empty()
    }
}

/// Turns the allow-listed inventory folders into namespaced catalog entries.
pub struct InventoryImporter {
    api: Arc<dyn InventoryApi>,
    folder_names: Vec<String>,
    prefix: String,
}

impl InventoryImporter {
    pub fn new(api: Arc<dyn InventoryApi>, folder_names: Vec<String>, prefix: String) -> Self {
        Self { api, folder_names, prefix }
    }

    /// Listing the folders must succeed; a single folder failing only drops
    /// that folder's items.
    pub async fn import(&self) -> Result<ImportReport, Error> {
        let folders = self.api.list_folders().await?;
        let mut report = ImportReport::default();

        for folder in folders
            .iter()
            .filter(|f| self.folder_names.iter().any(|name| name == &f.name))
        {
            match self.api.list_playable_items(&folder.id).await {
                Ok(items) => {
                    debug!("Folder '{}' => {} item(s)", folder.name, items.len());
                    for item in items {
                        report
                            .catalog
                            .insert(format!("{} | {}", self.prefix, item.name), item.id);
                    }
                }
                Err(e) => {
                    error!("Error fetching items for folder '{}': {e}", folder.name);
                    report.failed_folders.push(folder.name.clone());
                }
            }
        }

        if report.is_partial() {
            warn!(
                "Inventory import partially failed ({} folder(s)): {:?}",
                report.failed_folders.len(),
                report.failed_folders
            );
        }
        info!("Imported {} inventory item(s)", report.catalog.len());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockHttpClient;
    use mockall::predicate::*;

    #[tokio::test]
    async fn folder_listing_sends_key_and_query() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .withf(|url, headers| {
                url == "http://media.local:8096/jellyfin/Items?IncludeItemTypes=Folder"
                    && headers.get("X-Emby-Token").map(String::as_str) == Some("secret")
            })
            .times(1)
            .returning(|_, _| Ok(r#"{"Items":[{"Name":"Movies","Id":"f1"}],"TotalRecordCount":1}"#.to_string()));

        let client =
            JellyfinClient::new(Arc::new(http), "http://media.local:8096/jellyfin/", "secret".into())
                .unwrap();
        let folders = client.list_folders().await.unwrap();

        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Movies");
        assert_eq!(folders[0].id, "f1");
    }

    #[tokio::test]
    async fn playable_items_are_recursive_under_parent() {
        let mut http = MockHttpClient::new();
        http.expect_get()
            .with(
                eq("http://media.local/Items?ParentId=f1&IncludeItemTypes=Movie%2CEpisode&Recursive=true".to_string()),
                always(),
            )
            .times(1)
            .returning(|_, _| Ok(r#"{"Items":[{"Name":"Heat","Id":"m1","Type":"Movie"}]}"#.to_string()));

        let client = JellyfinClient::new(Arc::new(http), "http://media.local", "k".into()).unwrap();
        let items = client.list_playable_items("f1").await.unwrap();

        assert_eq!(items[0].kind.as_deref(), Some("Movie"));
    }

    #[tokio::test]
    async fn garbled_body_is_a_json_error() {
        let mut http = MockHttpClient::new();
        http.expect_get().returning(|_, _| Ok("<html>".to_string()));

        let client = JellyfinClient::new(Arc::new(http), "http://media.local", "k".into()).unwrap();
        assert!(matches!(client.list_folders().await, Err(Error::Json(_))));
    }
}
