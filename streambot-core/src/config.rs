// src/config.rs
//
// Typed view of the environment the bot is started with.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::{debug, info};
use twilight_model::id::marker::{ApplicationMarker, GuildMarker};
use twilight_model::id::Id;
use url::Url;

use crate::catalog::inventory::DEFAULT_NAMESPACE_PREFIX;
use crate::catalog::FilterOptions;
use crate::services::selection::SelectionConfig;
use crate::tasks::catalog_refresh::{DEFAULT_REFRESH_TIME, DEFAULT_REFRESH_TIMEZONE};
use crate::tasks::RefreshSchedule;
use crate::Error;

pub const DEFAULT_PLAYLIST_PATH: &str = "streams.url";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    pub base_url: String,
    pub api_key: String,
    pub folders: Vec<String>,
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub application_id: Id<ApplicationMarker>,
    pub guild_id: Id<GuildMarker>,
    pub playback_url: String,
    pub playlist_urls: Vec<String>,
    pub playlist_path: PathBuf,
    /// `None` unless both the inventory URL and API key are set.
    pub inventory: Option<InventoryConfig>,
    pub filter: FilterOptions,
    pub selection: SelectionConfig,
    pub refresh: RefreshSchedule,
}

/// Loads `path`, or `./.env` when none is given. A missing default file is fine.
pub fn load_env_file(path: Option<&Path>) -> Result<(), Error> {
    match path {
        Some(path) => {
            dotenv::from_path(path).map_err(|e| {
                Error::Configuration(format!("Could not load {}: {e}", path.display()))
            })?;
            info!("Loaded environment from {}", path.display());
        }
        None => match dotenv::dotenv() {
            Ok(found) => info!("Loaded environment from {}", found.display()),
            Err(e) => debug!("No .env file loaded: {e}"),
        },
    }
    Ok(())
}

impl BotConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Configuration(format!("{key} must be set")))
        };

        let discord_token = require("DISCORD_TOKEN")?;
        let application_id = Id::new_checked(parse_number::<u64>("CLIENT_ID", &require("CLIENT_ID")?)?)
            .ok_or_else(|| Error::Configuration("CLIENT_ID must be non-zero".into()))?;
        let guild_id = Id::new_checked(parse_number::<u64>("GUILD_ID", &require("GUILD_ID")?)?)
            .ok_or_else(|| Error::Configuration("GUILD_ID must be non-zero".into()))?;

        let playback_url = require("STREAM_BOT_URL")?;
        Url::parse(&playback_url)
            .map_err(|e| Error::Configuration(format!("STREAM_BOT_URL is not a URL: {e}")))?;

        let playlist_urls = get("M3U_STREAMS_URL").map(|v| split_list(&v)).unwrap_or_default();
        let playlist_path = PathBuf::from(get("M3U_STREAMS_PATH").unwrap_or_else(|| DEFAULT_PLAYLIST_PATH.to_string()));

        let inventory = match (get("JELLYFIN_URL"), get("JELLYFIN_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(InventoryConfig {
                base_url,
                api_key,
                folders: get("JELLYFIN_FOLDERS").map(|v| split_list(&v)).unwrap_or_default(),
                prefix: get("JELLYFIN_PREFIX").unwrap_or_else(|| DEFAULT_NAMESPACE_PREFIX.to_string()),
            }),
            _ => None,
        };

        let mut filter = FilterOptions {
            keyword_allowlist: get("STREAM_KEYWORDS").map(|v| split_list(&v)).unwrap_or_default(),
            denylist: get("STREAM_EXCLUDE_KEYWORDS").map(|v| split_list(&v)).unwrap_or_default(),
            ..FilterOptions::default()
        };
        if let Some(raw) = get("MAX_SEARCH_RESULTS") {
            filter.max_results = parse_number("MAX_SEARCH_RESULTS", &raw)?;
        }

        let mut selection = SelectionConfig::default();
        if let Some(raw) = get("STREAM_PAGE_SIZE") {
            selection.page_size = parse_number("STREAM_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = get("SELECTION_TIMEOUT_SECS") {
            selection.inactivity = Duration::from_secs(parse_number("SELECTION_TIMEOUT_SECS", &raw)?);
        }
        selection.validate()?;

        let at_raw = get("REFRESH_TIME").unwrap_or_else(|| DEFAULT_REFRESH_TIME.to_string());
        let at = NaiveTime::parse_from_str(&at_raw, "%H:%M")
            .map_err(|e| Error::Configuration(format!("REFRESH_TIME '{at_raw}' is not HH:MM: {e}")))?;
        let timezone = match get("REFRESH_TIMEZONE") {
            Some(name) => Tz::from_str(&name)
                .map_err(|e| Error::Configuration(format!("REFRESH_TIMEZONE '{name}': {e}")))?,
            None => DEFAULT_REFRESH_TIMEZONE,
        };

        Ok(Self {
            discord_token,
            application_id,
            guild_id,
            playback_url,
            playlist_urls,
            playlist_path,
            inventory,
            filter,
            selection,
            refresh: RefreshSchedule { at, timezone },
        })
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| Error::Configuration(format!("{key} '{raw}' is not a valid number: {e}")))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("DISCORD_TOKEN", "token"),
        ("CLIENT_ID", "1234"),
        ("GUILD_ID", "5678"),
        ("STREAM_BOT_URL", "http://player:3000"),
    ];

    fn with_required(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        pairs
    }

    #[test]
    fn defaults_apply() {
        let config = BotConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.application_id.get(), 1234);
        assert_eq!(config.guild_id.get(), 5678);
        assert!(config.playlist_urls.is_empty());
        assert_eq!(config.playlist_path, PathBuf::from("streams.url"));
        assert!(config.inventory.is_none());
        assert_eq!(config.filter.max_results, 100);
        assert_eq!(config.selection, SelectionConfig::default());
        assert_eq!(config.refresh, RefreshSchedule::default());
    }

    #[test]
    fn missing_required_value_is_configuration_error() {
        let err = BotConfig::from_lookup(lookup(&REQUIRED[..3])).unwrap_err();
        assert!(matches!(err, Error::Configuration(msg) if msg.contains("STREAM_BOT_URL")));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("DISCORD_TOKEN", "   ");
        assert!(matches!(
            BotConfig::from_lookup(lookup(&pairs)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn lists_are_split_and_trimmed() {
        let pairs = with_required(&[
            ("M3U_STREAMS_URL", "http://a/1.m3u, http://b/2.m3u,,"),
            ("STREAM_KEYWORDS", "News, Sports"),
            ("STREAM_EXCLUDE_KEYWORDS", "Adult"),
        ]);
        let config = BotConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.playlist_urls, vec!["http://a/1.m3u", "http://b/2.m3u"]);
        assert_eq!(config.filter.keyword_allowlist, vec!["News", "Sports"]);
        assert_eq!(config.filter.denylist, vec!["Adult"]);
    }

    #[test]
    fn inventory_needs_url_and_key() {
        let half = with_required(&[("JELLYFIN_URL", "http://jf:8096")]);
        assert!(BotConfig::from_lookup(lookup(&half)).unwrap().inventory.is_none());

        let full = with_required(&[
            ("JELLYFIN_URL", "http://jf:8096"),
            ("JELLYFIN_API_KEY", "key"),
            ("JELLYFIN_FOLDERS", "Live TV,Movies"),
        ]);
        let inventory = BotConfig::from_lookup(lookup(&full)).unwrap().inventory.unwrap();
        assert_eq!(inventory.folders, vec!["Live TV", "Movies"]);
        assert_eq!(inventory.prefix, "Jellyfin");
    }

    #[test]
    fn oversized_page_is_rejected() {
        let pairs = with_required(&[("STREAM_PAGE_SIZE", "101")]);
        assert!(matches!(
            BotConfig::from_lookup(lookup(&pairs)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn selection_timeout_beyond_fifteen_minutes_is_rejected() {
        let at_cap = with_required(&[("SELECTION_TIMEOUT_SECS", "900")]);
        let config = BotConfig::from_lookup(lookup(&at_cap)).unwrap();
        assert_eq!(config.selection.inactivity, Duration::from_secs(900));

        let over = with_required(&[("SELECTION_TIMEOUT_SECS", "901")]);
        assert!(matches!(
            BotConfig::from_lookup(lookup(&over)),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn bad_numbers_and_zones_are_rejected() {
        for extra in [
            ("MAX_SEARCH_RESULTS", "lots"),
            ("SELECTION_TIMEOUT_SECS", "-1"),
            ("REFRESH_TIME", "25:99"),
            ("REFRESH_TIMEZONE", "Mars/Olympus"),
            ("CLIENT_ID", "0"),
        ] {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .copied()
                .filter(|(k, _)| *k != extra.0)
                .chain(std::iter::once(extra))
                .collect();
            assert!(
                matches!(BotConfig::from_lookup(lookup(&pairs)), Err(Error::Configuration(_))),
                "{extra:?} should be rejected"
            );
        }
    }

    #[test]
    fn refresh_schedule_is_parsed() {
        let pairs = with_required(&[("REFRESH_TIME", "23:15"), ("REFRESH_TIMEZONE", "Europe/Berlin")]);
        let config = BotConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.refresh.at, NaiveTime::from_hms_opt(23, 15, 0).unwrap());
        assert_eq!(config.refresh.timezone, chrono_tz::Europe::Berlin);
    }
}
