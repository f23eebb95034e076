//! Core Matching Engine
//!
//! This is the hot path - every request goes through here.
//! Four pattern classes are tried in a fixed order and the first hit wins:
//!
//! 1. host+path trie (host anchored, path refined)
//! 2. host trie
//! 3. path substring table
//! 4. regex list
//!
//! Anchored classes come first because the unanchored ones are known to
//! produce false positives.

use crate::fuzzy::fuzzy_match_normalized;
use crate::store::{LabelTrie, NodeId, PathPattern, PatternStore, RegexPattern};
use crate::types::{BugId, MatchResult};
use crate::url::{normalize, NormalizedUrl};

// =============================================================================
// Host Walk
// =============================================================================

/// Walk `trie` along the reversed labels of `host`.
///
/// The deepest node carrying a bug id on the walked path is the plain host
/// match; an ancestor's id is kept when nothing deeper has one. The walk
/// stops at the first missing label.
///
/// With `path` set, nodes carrying path entries are checked deepest first and
/// the first entry whose prefix starts `path` wins. The plain host match is
/// only returned when no path entry applies.
pub fn walk_host(trie: &LabelTrie, host: &str, path: Option<&str>) -> MatchResult {
    let mut node = trie.root();
    let mut best: Option<BugId> = None;
    let mut with_paths: Vec<NodeId> = Vec::new();

    for label in host.rsplit('.') {
        let Some(child) = trie.child(node, label) else {
            break;
        };
        node = child;

        let Some(entry) = trie.node(node) else {
            break;
        };
        if let Some(id) = entry.bug_id() {
            best = Some(id);
        }
        if path.is_some() && !entry.path_entries().is_empty() {
            with_paths.push(node);
        }
    }

    if let Some(path) = path {
        for &id in with_paths.iter().rev() {
            let Some(entry) = trie.node(id) else {
                continue;
            };
            if let Some(hit) = entry.path_entries().iter().find(|e| path.starts_with(&*e.prefix)) {
                return MatchResult::Matched(hit.bug_id);
            }
        }
    }

    best.into()
}

// =============================================================================
// Path Table
// =============================================================================

/// Check `path` (without its leading `/`) against the substring table.
///
/// Patterns are stored with a leading `/`, so the probe is `/` + `path`.
/// A plain substring test: `/track` is found in `a/track/x` but not in
/// `retrack`.
pub fn match_path_table(table: &[PathPattern], path: &str) -> MatchResult {
    table
        .iter()
        .find(|p| contains_with_leading_slash(path, &p.pattern))
        .map(|p| p.bug_id)
        .into()
}

/// Whether `needle` occurs in `"/" + path`, without building that string.
#[inline]
fn contains_with_leading_slash(path: &str, needle: &str) -> bool {
    if let Some(rest) = needle.strip_prefix('/') {
        if path.starts_with(rest) {
            return true;
        }
    }
    path.contains(needle)
}

// =============================================================================
// Regex
// =============================================================================

/// Test `probe` (`host + path`, no delimiter) against each regex in stored
/// order.
pub fn match_regex(patterns: &[RegexPattern], probe: &str) -> MatchResult {
    patterns
        .iter()
        .find(|p| p.regex.is_match(probe))
        .map(|p| p.bug_id)
        .into()
}

// =============================================================================
// Classifier
// =============================================================================

/// Classifies request URLs against a borrowed store.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    store: &'a PatternStore,
}

impl<'a> Classifier<'a> {
    pub fn new(store: &'a PatternStore) -> Self {
        Self { store }
    }

    #[inline]
    pub fn store(&self) -> &'a PatternStore {
        self.store
    }

    /// Determine whether `url` is a bug. Malformed URLs are never bugs.
    pub fn is_bug(&self, url: &str) -> MatchResult {
        match normalize(url) {
            Ok(url) => self.classify(&url),
            Err(e) => {
                log::trace!("[is_bug] {}", e);
                MatchResult::NoMatch
            }
        }
    }

    /// Run the four pattern classes against an already normalized URL.
    pub fn classify(&self, url: &NormalizedUrl) -> MatchResult {
        let host = url.host();
        let path = url.path();

        walk_host(self.store.host_path_trie(), host, Some(path))
            .or_else(|| walk_host(self.store.host_trie(), host, None))
            .or_else(|| match_path_table(self.store.path_table(), path))
            .or_else(|| match_regex(self.store.regex_patterns(), &url.host_and_path()))
    }

    /// Whether `tab_url` is listed as a first-party exception for `bug_id`.
    pub fn is_first_party_exception(&self, bug_id: BugId, tab_url: &str) -> bool {
        let entries = self.store.first_party_exceptions(bug_id);
        if entries.is_empty() {
            return false;
        }
        match normalize(tab_url) {
            Ok(url) => fuzzy_match_normalized(&url, entries),
            Err(_) => false,
        }
    }
}

/// Classify `url` against `store`.
pub fn is_bug(store: &PatternStore, url: &str) -> MatchResult {
    Classifier::new(store).is_bug(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::FuzzyEntry;
    use crate::store::PatternStoreBuilder;

    fn bug(id: u32) -> BugId {
        BugId::new(id).expect("non-zero")
    }

    fn matched(id: u32) -> MatchResult {
        MatchResult::Matched(bug(id))
    }

    fn host_trie(hosts: &[(&str, u32)]) -> LabelTrie {
        let mut trie = LabelTrie::new();
        for &(host, id) in hosts {
            let node = trie.insert_host(host).expect("insert");
            trie.set_bug_id(node, bug(id)).expect("set");
        }
        trie
    }

    #[test]
    fn test_walk_host_most_specific_wins() {
        let trie = host_trie(&[("example.com", 1), ("sub.example.com", 2)]);
        assert_eq!(walk_host(&trie, "sub.example.com", None), matched(2));
        assert_eq!(walk_host(&trie, "other.example.com", None), matched(1));
        assert_eq!(walk_host(&trie, "deep.sub.example.com", None), matched(2));
        assert_eq!(walk_host(&trie, "example.com", None), matched(1));
    }

    #[test]
    fn test_walk_host_keeps_ancestor_id() {
        // `sub.example.com` exists as a node but carries no id of its own.
        let mut trie = host_trie(&[("example.com", 1)]);
        let leaf = trie.insert_host("x.sub.example.com").expect("insert");
        trie.set_bug_id(leaf, bug(3)).expect("set");

        assert_eq!(walk_host(&trie, "sub.example.com", None), matched(1));
        assert_eq!(walk_host(&trie, "y.sub.example.com", None), matched(1));
        assert_eq!(walk_host(&trie, "x.sub.example.com", None), matched(3));
    }

    #[test]
    fn test_walk_host_no_skipping() {
        let trie = host_trie(&[("ads.example.com", 1)]);
        assert_eq!(walk_host(&trie, "example.com", None), MatchResult::NoMatch);
        assert_eq!(walk_host(&trie, "ads.other.com", None), MatchResult::NoMatch);
        assert_eq!(walk_host(&trie, "ads.example.org", None), MatchResult::NoMatch);
        assert_eq!(walk_host(&trie, "", None), MatchResult::NoMatch);
    }

    #[test]
    fn test_walk_host_trailing_dot_stops_walk() {
        let trie = host_trie(&[("example.com", 1)]);
        assert_eq!(walk_host(&trie, "example.com.", None), MatchResult::NoMatch);
    }

    #[test]
    fn test_walk_host_path_prefix() {
        let mut trie = LabelTrie::new();
        let node = trie.insert_host("example.com").expect("insert");
        trie.push_path_entry(node, "ads/", bug(5)).expect("push");

        assert_eq!(walk_host(&trie, "example.com", Some("ads/banner.js")), matched(5));
        assert_eq!(walk_host(&trie, "cdn.example.com", Some("ads/x")), matched(5));
        assert_eq!(walk_host(&trie, "example.com", Some("news/ads/")), MatchResult::NoMatch);
        assert_eq!(walk_host(&trie, "example.com", None), MatchResult::NoMatch);
    }

    #[test]
    fn test_walk_host_path_deepest_first() {
        let mut trie = LabelTrie::new();
        let shallow = trie.insert_host("example.com").expect("insert");
        trie.push_path_entry(shallow, "t", bug(1)).expect("push");
        let deep = trie.insert_host("cdn.example.com").expect("insert");
        trie.push_path_entry(deep, "track", bug(2)).expect("push");

        assert_eq!(walk_host(&trie, "cdn.example.com", Some("track.gif")), matched(2));
        assert_eq!(walk_host(&trie, "cdn.example.com", Some("tag.js")), matched(1));
        assert_eq!(walk_host(&trie, "www.example.com", Some("track.gif")), matched(1));
    }

    #[test]
    fn test_walk_host_first_prefix_in_node_wins() {
        let mut trie = LabelTrie::new();
        let node = trie.insert_host("example.com").expect("insert");
        trie.push_path_entry(node, "a", bug(1)).expect("push");
        trie.push_path_entry(node, "ab", bug(2)).expect("push");
        assert_eq!(walk_host(&trie, "example.com", Some("abc")), matched(1));
    }

    #[test]
    fn test_walk_host_path_falls_back_to_host_id() {
        let mut trie = host_trie(&[("example.com", 7)]);
        let node = trie.insert_host("example.com").expect("insert");
        trie.push_path_entry(node, "ads", bug(8)).expect("push");

        assert_eq!(walk_host(&trie, "example.com", Some("ads")), matched(8));
        assert_eq!(walk_host(&trie, "example.com", Some("news")), matched(7));
    }

    fn path_table(entries: &[(&str, u32)]) -> Vec<PathPattern> {
        entries
            .iter()
            .map(|&(pattern, id)| PathPattern {
                pattern: pattern.into(),
                bug_id: bug(id),
            })
            .collect()
    }

    #[test]
    fn test_path_table_exact_substring_semantics() {
        let table = path_table(&[("/track", 1)]);
        assert_eq!(match_path_table(&table, "retrack/extra"), MatchResult::NoMatch);
        assert_eq!(match_path_table(&table, "some/track/x"), matched(1));
        assert_eq!(match_path_table(&table, "track"), matched(1));
        assert_eq!(match_path_table(&table, "tracking.js"), matched(1));
        assert_eq!(match_path_table(&table, ""), MatchResult::NoMatch);
    }

    #[test]
    fn test_path_table_first_in_order() {
        let table = path_table(&[("/b", 2), ("/a", 1)]);
        assert_eq!(match_path_table(&table, "a/b"), matched(2));
        assert_eq!(match_path_table(&table, "a/c"), matched(1));
    }

    #[test]
    fn test_path_table_pattern_without_slash() {
        let table = path_table(&[("pixel", 4)]);
        assert_eq!(match_path_table(&table, "img/pixel.gif"), matched(4));
    }

    #[test]
    fn test_contains_with_leading_slash() {
        assert!(contains_with_leading_slash("abc", "/"));
        assert!(contains_with_leading_slash("abc", "/ab"));
        assert!(contains_with_leading_slash("x/abc", "/ab"));
        assert!(!contains_with_leading_slash("xabc", "/ab"));
        assert!(contains_with_leading_slash("", ""));
    }

    #[test]
    fn test_regex_first_in_order() {
        let mut builder = PatternStoreBuilder::new();
        builder.add_regex(9, r"tracker\d+\.net/").expect("regex");
        builder.add_regex(3, r"\.net/p\.gif").expect("regex");
        let store = builder.build();

        assert_eq!(match_regex(store.regex_patterns(), "tracker12.net/p.gif"), matched(9));
        assert_eq!(match_regex(store.regex_patterns(), "cdn.net/p.gif"), matched(3));
        assert_eq!(match_regex(store.regex_patterns(), "cdn.net/q.gif"), MatchResult::NoMatch);
    }

    fn sample_store() -> PatternStore {
        let mut builder = PatternStoreBuilder::new();
        builder.add_host("example.com", 1).expect("host");
        builder.add_host("sub.example.com", 2).expect("host");
        builder.add_host("tracker.net", 10).expect("host");
        builder.add_host_path("tracker.net", "pixel", 11).expect("host path");
        builder.add_path("/beacon.js", 20).expect("path");
        builder.add_regex(30, r"^stats\d+\.[a-z]+\.org(:\d+)?/collect").expect("regex");
        builder
            .add_first_party_exception(10, FuzzyEntry::new("*.tracker-owner.com", ""))
            .expect("exception");
        builder.build()
    }

    #[test]
    fn test_is_bug_specificity() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "http://sub.example.com/x"), matched(2));
        assert_eq!(is_bug(&store, "http://other.example.com/x"), matched(1));
    }

    #[test]
    fn test_is_bug_priority_host_path_over_host() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "https://tracker.net/pixel.gif"), matched(11));
        assert_eq!(is_bug(&store, "https://tracker.net/script.js"), matched(10));
    }

    #[test]
    fn test_is_bug_host_over_path_table() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "https://example.com/beacon.js"), matched(1));
        assert_eq!(is_bug(&store, "https://cdn.site.org/js/beacon.js"), matched(20));
    }

    #[test]
    fn test_is_bug_regex_last_resort() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "https://stats7.site.org/collect?x=1"), matched(30));
        assert_eq!(is_bug(&store, "https://stats7.site.org:8080/collect"), matched(30));
        assert_eq!(is_bug(&store, "https://www.stats7.site.org/collect"), MatchResult::NoMatch);
    }

    #[test]
    fn test_is_bug_does_not_strip_www() {
        let mut builder = PatternStoreBuilder::new();
        builder.add_host("www.example.org", 4).expect("host");
        let store = builder.build();
        assert_eq!(is_bug(&store, "http://www.example.org/"), matched(4));
        assert_eq!(is_bug(&store, "http://example.org/"), MatchResult::NoMatch);
    }

    #[test]
    fn test_is_bug_case_insensitive() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "HTTPS://TRACKER.NET/PIXEL"), matched(11));
    }

    #[test]
    fn test_is_bug_no_match_baseline() {
        let store = sample_store();
        assert_eq!(
            is_bug(&store, "http://my-private-nonexistent-domain.invalidtld/"),
            MatchResult::NoMatch
        );
        assert_eq!(is_bug(&PatternStore::empty(), "http://example.com/"), MatchResult::NoMatch);
    }

    #[test]
    fn test_is_bug_long_labels_do_not_collide() {
        let prefix = "a".repeat(63);
        let mut builder = PatternStoreBuilder::new();
        builder.add_host(&format!("{prefix}x.tracker.com"), 7).expect("host");
        let store = builder.build();

        assert_eq!(is_bug(&store, &format!("http://{prefix}x.tracker.com/")), matched(7));
        assert_eq!(
            is_bug(&store, &format!("http://{prefix}y.tracker.com/")),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn test_is_bug_invalid_url() {
        let store = sample_store();
        assert_eq!(is_bug(&store, "example.com/beacon.js"), MatchResult::NoMatch);
        assert_eq!(is_bug(&store, ""), MatchResult::NoMatch);
    }

    #[test]
    fn test_is_bug_deterministic() {
        let store = sample_store();
        let classifier = Classifier::new(&store);
        for url in [
            "https://tracker.net/pixel.gif",
            "http://other.example.com/x",
            "https://cdn.site.org/js/beacon.js",
            "http://nothing.test/",
        ] {
            let first = classifier.is_bug(url);
            for _ in 0..10 {
                assert_eq!(classifier.is_bug(url), first);
            }
        }
    }

    #[test]
    fn test_first_party_exception() {
        let store = sample_store();
        let classifier = Classifier::new(&store);
        assert!(classifier.is_first_party_exception(bug(10), "https://www.tracker-owner.com/home"));
        assert!(classifier.is_first_party_exception(bug(10), "https://shop.tracker-owner.com/"));
        assert!(!classifier.is_first_party_exception(bug(10), "https://news.site/"));
        assert!(!classifier.is_first_party_exception(bug(1), "https://www.tracker-owner.com/"));
        assert!(!classifier.is_first_party_exception(bug(10), "garbage"));
    }
}
