// File: streambot-core/src/catalog/playlist.rs
//
// Extended-M3U ingestion. A `#EXTINF` line names the stream through its
// `tvg-name="…"` attribute; the next non-comment line is its locator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use streambot_common::models::Catalog;

use crate::http::HttpClient;
use crate::Error;

const METADATA_PREFIX: &str = "#EXTINF";

static TVG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"tvg-name="([^"]+)""#).expect("static tvg-name pattern"));

/// Parses an extended-M3U document into a catalog.
///
/// Duplicate names overwrite (last write wins). A metadata line without a
/// `tvg-name` attribute resets the current name to the empty string, so a
/// following locator is stored under `""`. That entry is kept as-is.
pub fn parse_playlist(document: &str) -> Catalog {
    let mut catalog = Catalog::new();
    let mut current_name = String::new();

    for line in document.split('\n') {
        let line = line.trim();
        if line.starts_with(METADATA_PREFIX) {
            current_name = TVG_NAME
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
        } else if !line.is_empty() && !line.starts_with('#') {
            catalog.insert(current_name.clone(), line);
        }
    }

    catalog
}

/// Downloads the configured playlists and parses them.
///
/// Successful downloads are written to `cache_path` so a later run can fall
/// back to the file when every download fails.
pub struct PlaylistImporter {
    http: Arc<dyn HttpClient>,
    urls: Vec<String>,
    cache_path: PathBuf,
}

impl PlaylistImporter {
    pub fn new(http: Arc<dyn HttpClient>, urls: Vec<String>, cache_path: PathBuf) -> Self {
        Self { http, urls, cache_path }
    }

    pub async fn import(&self) -> Result<Catalog, Error> {
        let mut documents = Vec::new();
        for url in &self.urls {
            match self.http.get(url.clone(), HashMap::new()).await {
                Ok(body) => {
                    info!("Downloaded playlist from {url} ({} bytes)", body.len());
                    documents.push(body);
                }
                Err(e) => error!("Error downloading playlist {url}: {e}"),
            }
        }

        if !documents.is_empty() {
            if let Err(e) = tokio::fs::write(&self.cache_path, documents.join("\n")).await {
                warn!("Could not save playlist to {}: {e}", self.cache_path.display());
            }
            let mut catalog = Catalog::new();
            for doc in &documents {
                catalog.merge(&parse_playlist(doc));
            }
            return Ok(catalog);
        }

        if !self.urls.is_empty() {
            warn!(
                "All playlist downloads failed; reading {}",
                self.cache_path.display()
            );
        }
        self.import_file().await
    }

    async fn import_file(&self) -> Result<Catalog, Error> {
        if !tokio::fs::try_exists(&self.cache_path).await? {
            return Err(Error::NotFound(format!(
                "M3U file not found at: {}",
                self.cache_path.display()
            )));
        }
        let content = tokio::fs::read_to_string(&self.cache_path).await?;
        Ok(parse_playlist(&content))
    }
}
