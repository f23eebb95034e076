use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::CompileError;

/// Raw bugs database as shipped.
///
/// Trie sections stay as JSON objects: their shape (nested labels with a `$`
/// marker) is validated while building, node by node. Object key order is
/// preserved, which is what gives the path table and regex list their order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BugsDb {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub patterns: Patterns,
    #[serde(default, rename = "firstPartyExceptions")]
    pub first_party_exceptions: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Patterns {
    /// `{"com": {"example": {"$": 1}}}`
    #[serde(default)]
    pub host: Map<String, Value>,
    /// `{"com": {"example": {"$": [{"path": "ads", "id": 2}]}}}`
    #[serde(default)]
    pub host_path: Map<String, Value>,
    /// `{"/track.js": 3}`
    #[serde(default)]
    pub path: Map<String, Value>,
    /// `{"4": "tracker\\d+\\.com/p"}`
    #[serde(default)]
    pub regex: Map<String, Value>,
}

pub fn parse_bugs_db(json: &str) -> Result<BugsDb, CompileError> {
    Ok(serde_json::from_str(json)?)
}

/// Read a bug id from a JSON value. Zero is rejected later by the store.
pub(crate) fn bug_id_from_value(value: &Value) -> Result<u32, CompileError> {
    value
        .as_u64()
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| CompileError::InvalidBugId(value.to_string()))
}

/// Read a bug id from an object key (regex and exception sections).
pub(crate) fn bug_id_from_key(key: &str) -> Result<u32, CompileError> {
    key.parse::<u32>()
        .map_err(|_| CompileError::InvalidBugId(key.to_string()))
}
