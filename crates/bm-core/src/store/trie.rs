//! Arena-backed label trie
//!
//! Domains are stored with their labels reversed: `ads.example.com` lives at
//! `com -> example -> ads`. Nodes sit in a flat `Vec` and refer to each other
//! by [`NodeId`], so a built trie is a plain value that can be shared across
//! threads without any interior mutability.
//!
//! Edges are keyed by the full lower-cased label.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::types::BugId;

use super::StoreError;

/// Index of a node inside its trie's arena.
pub type NodeId = u32;

/// A `(prefix, bug)` pair attached to a trie node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub prefix: Box<str>,
    pub bug_id: BugId,
}

#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    children: HashMap<Box<str>, NodeId>,
    bug_id: Option<BugId>,
    path_entries: Vec<PathEntry>,
}

impl TrieNode {
    /// Bug identified by the host segment ending at this node.
    #[inline]
    pub fn bug_id(&self) -> Option<BugId> {
        self.bug_id
    }

    /// Path prefixes refining this host, in stored order.
    #[inline]
    pub fn path_entries(&self) -> &[PathEntry] {
        &self.path_entries
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[inline]
fn label_key(label: &str) -> Cow<'_, str> {
    if label.chars().any(char::is_uppercase) {
        Cow::Owned(label.to_lowercase())
    } else {
        Cow::Borrowed(label)
    }
}

/// Trie of reversed domain labels.
#[derive(Debug, Clone)]
pub struct LabelTrie {
    nodes: Vec<TrieNode>,
}

impl Default for LabelTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTrie {
    pub const ROOT: NodeId = 0;

    /// Create a trie holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TrieNode> {
        self.nodes.get(id as usize)
    }

    /// Follow the edge labelled `label` out of `parent`.
    #[inline]
    pub fn child(&self, parent: NodeId, label: &str) -> Option<NodeId> {
        self.node(parent)?.children.get(&*label_key(label)).copied()
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes carrying a plain bug id.
    pub fn bug_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.bug_id.is_some()).count()
    }

    /// Total number of path entries across all nodes.
    pub fn path_entry_count(&self) -> usize {
        self.nodes.iter().map(|n| n.path_entries.len()).sum()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    /// Return the child of `parent` for `label`, creating it if missing.
    pub fn child_or_insert(&mut self, parent: NodeId, label: &str) -> Result<NodeId, StoreError> {
        if label.is_empty() {
            return Err(StoreError::EmptyLabel);
        }
        if parent as usize >= self.nodes.len() {
            return Err(StoreError::UnknownNode(parent));
        }

        let key = label_key(label);
        if let Some(&existing) = self.nodes[parent as usize].children.get(&*key) {
            return Ok(existing);
        }

        let id = self.nodes.len() as NodeId;
        self.nodes.push(TrieNode::default());
        self.nodes[parent as usize].children.insert(key.into(), id);
        Ok(id)
    }

    /// Insert a hostname given in normal (`sub.example.com`) order.
    pub fn insert_host(&mut self, host: &str) -> Result<NodeId, StoreError> {
        let mut node = Self::ROOT;
        for label in host.rsplit('.') {
            node = self.child_or_insert(node, label)?;
        }
        Ok(node)
    }

    /// Attach a bug id to a node. A later call for the same node wins.
    pub fn set_bug_id(&mut self, node: NodeId, bug_id: BugId) -> Result<(), StoreError> {
        let entry = self.nodes.get_mut(node as usize).ok_or(StoreError::UnknownNode(node))?;
        entry.bug_id = Some(bug_id);
        Ok(())
    }

    /// Append a path prefix entry to a node.
    pub fn push_path_entry(&mut self, node: NodeId, prefix: &str, bug_id: BugId) -> Result<(), StoreError> {
        let entry = self.nodes.get_mut(node as usize).ok_or(StoreError::UnknownNode(node))?;
        entry.path_entries.push(PathEntry {
            prefix: prefix.into(),
            bug_id,
        });
        Ok(())
    }
}
