//! Pattern store
//!
//! The immutable set of patterns a [`Classifier`](crate::Classifier) queries.
//! A store is assembled once per database version through
//! [`PatternStoreBuilder`] and never mutated afterwards; updates build a fresh
//! store and swap it in whole (see [`SharedStore`](crate::SharedStore)).

mod builder;
mod trie;

pub use builder::PatternStoreBuilder;
pub use trie::{LabelTrie, NodeId, PathEntry, TrieNode};

use std::collections::HashMap;

use regex::Regex;

use crate::fuzzy::FuzzyEntry;
use crate::types::BugId;

/// Error type for store construction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid bug id: {0}")]
    InvalidBugId(u32),
    #[error("Empty domain label")]
    EmptyLabel,
    #[error("Unknown trie node: {0}")]
    UnknownNode(NodeId),
    #[error("Invalid regex for bug {bug_id}: {source}")]
    InvalidRegex {
        bug_id: BugId,
        #[source]
        source: regex::Error,
    },
}

/// Path substring pattern. `pattern` includes its leading `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    pub pattern: Box<str>,
    pub bug_id: BugId,
}

/// Regular expression tested against `host + path`.
#[derive(Debug, Clone)]
pub struct RegexPattern {
    pub bug_id: BugId,
    pub regex: Regex,
}

/// Immutable snapshot of the pattern database.
#[derive(Debug, Clone, Default)]
pub struct PatternStore {
    version: u32,
    host_trie: LabelTrie,
    host_path_trie: LabelTrie,
    path_table: Vec<PathPattern>,
    regex_patterns: Vec<RegexPattern>,
    first_party_exceptions: HashMap<BugId, Vec<FuzzyEntry>>,
}

// Matching is shared across request handlers.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PatternStore>();
};

impl PatternStore {
    /// A store that matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> PatternStoreBuilder {
        PatternStoreBuilder::new()
    }

    /// Database version this store was built from, `0` if unknown.
    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Host-only class.
    #[inline]
    pub fn host_trie(&self) -> &LabelTrie {
        &self.host_trie
    }

    /// Host+path class.
    #[inline]
    pub fn host_path_trie(&self) -> &LabelTrie {
        &self.host_path_trie
    }

    #[inline]
    pub fn path_table(&self) -> &[PathPattern] {
        &self.path_table
    }

    #[inline]
    pub fn regex_patterns(&self) -> &[RegexPattern] {
        &self.regex_patterns
    }

    /// Exception entries for a bug, empty if it has none.
    pub fn first_party_exceptions(&self, bug_id: BugId) -> &[FuzzyEntry] {
        self.first_party_exceptions
            .get(&bug_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of bugs with at least one first-party exception.
    pub fn exception_count(&self) -> usize {
        self.first_party_exceptions.len()
    }
}
