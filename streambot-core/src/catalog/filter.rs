use streambot_common::models::{Catalog, CatalogEntry};

pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Narrowing rules for one browse request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// User-typed search text. When set, the allow-list is not consulted.
    pub keyword: Option<String>,
    /// Empty means "everything is allowed".
    pub keyword_allowlist: Vec<String>,
    pub denylist: Vec<String>,
    pub max_results: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            keyword: None,
            keyword_allowlist: Vec::new(),
            denylist: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl FilterOptions {
    /// Same lists and cap, with the caller's search text. Blank text counts as none.
    pub fn with_keyword(&self, keyword: Option<&str>) -> Self {
        let keyword = keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Self {
            keyword,
            ..self.clone()
        }
    }
}

fn contains_ci(haystack_lower: &str, needle: &str) -> bool {
    haystack_lower.contains(&needle.to_lowercase())
}

/// Case-insensitive substring matching throughout. Output keeps catalog
/// order and never exceeds `max_results`; no match is an empty vec.
pub fn filter_catalog(catalog: &Catalog, opts: &FilterOptions) -> Vec<CatalogEntry> {
    let allowlist: Vec<&String> = opts
        .keyword_allowlist
        .iter()
        .filter(|k| !k.trim().is_empty())
        .collect();
    let denylist: Vec<&String> = opts
        .denylist
        .iter()
        .filter(|k| !k.trim().is_empty())
        .collect();

    catalog
        .iter()
        .filter(|(display_name, _)| {
            let name = display_name.to_lowercase();
            let admitted = match &opts.keyword {
                Some(keyword) => contains_ci(&name, keyword),
                None => allowlist.is_empty() || allowlist.iter().any(|k| contains_ci(&name, k)),
            };
            admitted && !denylist.iter().any(|d| contains_ci(&name, d))
        })
        .take(opts.max_results)
        .map(|(display_name, locator)| CatalogEntry::new(display_name, locator))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        [
            ("HBO East", "u1"),
            ("CNN", "u2"),
            ("hbo Family", "u3"),
            ("HBO Latino (Backup)", "u4"),
            ("ESPN", "u5"),
        ]
        .into_iter()
        .collect()
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn keyword_is_case_insensitive_and_ordered() {
        let opts = FilterOptions::default().with_keyword(Some("HBO"));
        let out = filter_catalog(&sample(), &opts);
        assert_eq!(names(&out), vec!["HBO East", "hbo Family", "HBO Latino (Backup)"]);
    }

    #[test]
    fn keyword_bypasses_allowlist() {
        let opts = FilterOptions {
            keyword_allowlist: vec!["espn".into()],
            ..Default::default()
        }
        .with_keyword(Some("cnn"));
        assert_eq!(names(&filter_catalog(&sample(), &opts)), vec!["CNN"]);
    }

    #[test]
    fn allowlist_uses_substring_match() {
        let opts = FilterOptions {
            keyword_allowlist: vec!["family".into(), "ESPN".into()],
            ..Default::default()
        };
        assert_eq!(names(&filter_catalog(&sample(), &opts)), vec!["hbo Family", "ESPN"]);
    }

    #[test]
    fn empty_allowlist_admits_everything() {
        let out = filter_catalog(&sample(), &FilterOptions::default());
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn denylist_applies_to_both_branches() {
        let base = FilterOptions {
            keyword_allowlist: vec!["hbo".into()],
            denylist: vec!["backup".into()],
            ..Default::default()
        };
        assert_eq!(names(&filter_catalog(&sample(), &base)), vec!["HBO East", "hbo Family"]);

        let searched = base.with_keyword(Some("latino"));
        assert!(filter_catalog(&sample(), &searched).is_empty());
    }

    #[test]
    fn truncates_to_max_results() {
        let opts = FilterOptions {
            max_results: 2,
            ..Default::default()
        };
        assert_eq!(names(&filter_catalog(&sample(), &opts)), vec!["HBO East", "CNN"]);
    }

    #[test]
    fn blank_keyword_counts_as_none() {
        let opts = FilterOptions::default().with_keyword(Some("   "));
        assert_eq!(opts.keyword, None);
    }
}
