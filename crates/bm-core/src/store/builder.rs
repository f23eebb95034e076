//! Store builder
//!
//! Validates every bug id and compiles every regex up front so that matching
//! never has to deal with malformed patterns.

use std::collections::HashMap;

use regex::RegexBuilder;

use crate::fuzzy::FuzzyEntry;
use crate::types::BugId;

use super::{LabelTrie, NodeId, PathPattern, PatternStore, RegexPattern, StoreError};

fn bug_id(id: u32) -> Result<BugId, StoreError> {
    BugId::new(id).ok_or(StoreError::InvalidBugId(id))
}

/// Incremental builder for [`PatternStore`].
#[derive(Debug, Default)]
pub struct PatternStoreBuilder {
    version: u32,
    host_trie: LabelTrie,
    host_path_trie: LabelTrie,
    path_table: Vec<PathPattern>,
    regex_patterns: Vec<RegexPattern>,
    first_party_exceptions: HashMap<BugId, Vec<FuzzyEntry>>,
}

impl PatternStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&mut self, version: u32) -> &mut Self {
        self.version = version;
        self
    }

    /// Direct access to the host-only trie for callers that walk a nested
    /// source structure node by node.
    pub fn host_trie_mut(&mut self) -> &mut LabelTrie {
        &mut self.host_trie
    }

    pub fn host_path_trie_mut(&mut self) -> &mut LabelTrie {
        &mut self.host_path_trie
    }

    /// Register `host` (and its subdomains) as bug `id`.
    pub fn add_host(&mut self, host: &str, id: u32) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        let node = self.host_trie.insert_host(host)?;
        self.host_trie.set_bug_id(node, id)?;
        Ok(self)
    }

    /// Register `host` plus a path prefix (without leading `/`) as bug `id`.
    pub fn add_host_path(&mut self, host: &str, prefix: &str, id: u32) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        let node = self.host_path_trie.insert_host(host)?;
        self.host_path_trie.push_path_entry(node, prefix, id)?;
        Ok(self)
    }

    /// Attach a bug id to an existing host-trie node.
    pub fn set_host_bug(&mut self, node: NodeId, id: u32) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        self.host_trie.set_bug_id(node, id)?;
        Ok(self)
    }

    /// Append a path entry to an existing host+path-trie node.
    pub fn push_host_path_entry(&mut self, node: NodeId, prefix: &str, id: u32) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        self.host_path_trie.push_path_entry(node, prefix, id)?;
        Ok(self)
    }

    /// Register a path substring pattern. Re-adding a pattern replaces its id
    /// in place.
    pub fn add_path(&mut self, pattern: &str, id: u32) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        match self.path_table.iter_mut().find(|p| &*p.pattern == pattern) {
            Some(existing) => existing.bug_id = id,
            None => self.path_table.push(PathPattern {
                pattern: pattern.into(),
                bug_id: id,
            }),
        }
        Ok(self)
    }

    /// Compile and register a regex for bug `id`. A bug has at most one
    /// regex; re-adding replaces it in place.
    pub fn add_regex(&mut self, id: u32, pattern: &str) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| StoreError::InvalidRegex { bug_id: id, source })?;

        match self.regex_patterns.iter_mut().find(|p| p.bug_id == id) {
            Some(existing) => existing.regex = regex,
            None => self.regex_patterns.push(RegexPattern { bug_id: id, regex }),
        }
        Ok(self)
    }

    pub fn add_first_party_exception(&mut self, id: u32, entry: FuzzyEntry) -> Result<&mut Self, StoreError> {
        let id = bug_id(id)?;
        self.first_party_exceptions.entry(id).or_default().push(entry);
        Ok(self)
    }

    pub fn build(self) -> PatternStore {
        PatternStore {
            version: self.version,
            host_trie: self.host_trie,
            host_path_trie: self.host_path_trie,
            path_table: self.path_table,
            regex_patterns: self.regex_patterns,
            first_party_exceptions: self.first_party_exceptions,
        }
    }
}
