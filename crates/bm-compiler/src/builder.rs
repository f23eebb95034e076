use serde_json::{Map, Value};

use bm_core::store::{LabelTrie, NodeId};
use bm_core::{FuzzyEntry, PatternStore, PatternStoreBuilder};

use crate::parser::{bug_id_from_key, bug_id_from_value, parse_bugs_db, BugsDb};
use crate::CompileError;

/// Key marking the value attached to a trie node.
const NODE_VALUE_KEY: &str = "$";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub version: u32,
    pub host_nodes: usize,
    pub host_bugs: usize,
    pub host_path_nodes: usize,
    pub host_path_entries: usize,
    pub path_patterns: usize,
    pub regex_patterns: usize,
    pub exceptions: usize,
    /// Values with an unexpected shape that were ignored.
    pub skipped: usize,
}

/// Parse and build in one step.
pub fn compile_bugs_db(json: &str) -> Result<(PatternStore, CompileStats), CompileError> {
    let db = parse_bugs_db(json)?;
    build_store(&db)
}

pub fn build_store(db: &BugsDb) -> Result<(PatternStore, CompileStats), CompileError> {
    let mut builder = PatternStoreBuilder::new();
    let mut stats = CompileStats {
        version: db.version.unwrap_or(0),
        ..CompileStats::default()
    };
    builder.version(stats.version);

    let root = builder.host_trie_mut().root();
    build_trie_node(&mut builder, TrieKind::Host, root, &db.patterns.host, &mut stats)?;
    let root = builder.host_path_trie_mut().root();
    build_trie_node(&mut builder, TrieKind::HostPath, root, &db.patterns.host_path, &mut stats)?;

    for (pattern, value) in &db.patterns.path {
        builder.add_path(pattern, bug_id_from_value(value)?)?;
    }

    for (key, value) in &db.patterns.regex {
        let id = bug_id_from_key(key)?;
        match value.as_str() {
            Some(pattern) => {
                builder.add_regex(id, pattern)?;
            }
            None => {
                log::warn!("Skipping non-string regex for bug {}", key);
                stats.skipped += 1;
            }
        }
    }

    // Sorted so exception order does not depend on map iteration order.
    let mut exception_ids: Vec<&String> = db.first_party_exceptions.keys().collect();
    exception_ids.sort();
    for key in exception_ids {
        let id = bug_id_from_key(key)?;
        for url in &db.first_party_exceptions[key] {
            builder.add_first_party_exception(id, FuzzyEntry::parse(url))?;
        }
    }

    let store = builder.build();

    stats.host_nodes = store.host_trie().node_count();
    stats.host_bugs = store.host_trie().bug_count();
    stats.host_path_nodes = store.host_path_trie().node_count();
    stats.host_path_entries = store.host_path_trie().path_entry_count();
    stats.path_patterns = store.path_table().len();
    stats.regex_patterns = store.regex_patterns().len();
    stats.exceptions = store.exception_count();

    log::debug!(
        "Compiled bugs db v{}: {} host bugs, {} host+path entries, {} paths, {} regexes",
        stats.version,
        stats.host_bugs,
        stats.host_path_entries,
        stats.path_patterns,
        stats.regex_patterns
    );

    Ok((store, stats))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrieKind {
    Host,
    HostPath,
}

impl TrieKind {
    fn trie_mut(self, builder: &mut PatternStoreBuilder) -> &mut LabelTrie {
        match self {
            Self::Host => builder.host_trie_mut(),
            Self::HostPath => builder.host_path_trie_mut(),
        }
    }
}

/// Copy one JSON trie level under `node`, recursing into child labels.
///
/// Shapes that don't fit (a label mapping to a number, a `$` that is neither
/// an id nor a list of path entries) are skipped: at match time that node
/// simply doesn't match.
fn build_trie_node(
    builder: &mut PatternStoreBuilder,
    kind: TrieKind,
    node: NodeId,
    object: &Map<String, Value>,
    stats: &mut CompileStats,
) -> Result<(), CompileError> {
    for (key, value) in object {
        if key == NODE_VALUE_KEY {
            apply_node_value(builder, kind, node, value, stats)?;
            continue;
        }

        let Value::Object(children) = value else {
            log::warn!("Skipping malformed trie entry '{}'", key);
            stats.skipped += 1;
            continue;
        };

        let label = key.to_ascii_lowercase();
        let child = kind.trie_mut(builder).child_or_insert(node, &label)?;
        build_trie_node(builder, kind, child, children, stats)?;
    }

    Ok(())
}

fn apply_node_value(
    builder: &mut PatternStoreBuilder,
    kind: TrieKind,
    node: NodeId,
    value: &Value,
    stats: &mut CompileStats,
) -> Result<(), CompileError> {
    match (kind, value) {
        (TrieKind::Host, Value::Number(_)) => {
            builder.set_host_bug(node, bug_id_from_value(value)?)?;
        }
        (TrieKind::HostPath, Value::Array(entries)) => {
            for entry in entries {
                let path = entry.get("path").and_then(Value::as_str);
                let id = entry.get("id");
                match (path, id) {
                    (Some(path), Some(id)) => {
                        builder.push_host_path_entry(node, path, bug_id_from_value(id)?)?;
                    }
                    _ => {
                        log::warn!("Skipping malformed host_path entry {}", entry);
                        stats.skipped += 1;
                    }
                }
            }
        }
        _ => {
            log::warn!("Skipping unexpected {:?} node value {}", kind, value);
            stats.skipped += 1;
        }
    }
    Ok(())
}
