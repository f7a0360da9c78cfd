use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One browsable stream: what the user sees, and what the playback service gets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub display_name: String,
    /// Opaque to us. A stream URL or an inventory item id.
    pub locator: String,
}

impl CatalogEntry {
    pub fn new(display_name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            locator: locator.into(),
        }
    }
}

/// Name -> locator mapping, unique by display name.
///
/// Iteration follows first-insertion order. Re-inserting an existing name
/// replaces the locator in place, so the entry keeps its original position.
/// Equality compares the mapping only, not the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    streams: IndexMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. Returns the previous locator for `display_name`, if any.
    pub fn insert(
        &mut self,
        display_name: impl Into<String>,
        locator: impl Into<String>,
    ) -> Option<String> {
        self.streams.insert(display_name.into(), locator.into())
    }

    pub fn get(&self, display_name: &str) -> Option<&str> {
        self.streams.get(display_name).map(String::as_str)
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.streams.contains_key(display_name)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// `(display_name, locator)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.streams
            .iter()
            .map(|(name, locator)| (name.as_str(), locator.as_str()))
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.iter()
            .map(|(name, locator)| CatalogEntry::new(name, locator))
            .collect()
    }

    /// Folds `other` into `self`; names already present take `other`'s locator.
    pub fn merge(&mut self, other: &Catalog) {
        self.streams.extend(
            other
                .streams
                .iter()
                .map(|(name, locator)| (name.clone(), locator.clone())),
        );
    }
}

impl<N: Into<String>, L: Into<String>> FromIterator<(N, L)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (N, L)>>(iter: I) -> Self {
        Self {
            streams: iter
                .into_iter()
                .map(|(name, locator)| (name.into(), locator.into()))
                .collect(),
        }
    }
}
