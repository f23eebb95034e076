//! bugmatch Core Library
//!
//! This crate provides the tracker classification engine: given a request URL,
//! decide whether it belongs to a catalogued tracker ("bug") and which one.
//!
//! # Architecture
//!
//! Matching runs against an immutable [`PatternStore`] built once per database
//! version. The store holds two label tries (host-only and host+path), a path
//! substring table and an ordered regex list. A [`Classifier`] tries them in a
//! fixed priority order; the first hit wins. The hot path does not allocate
//! beyond splitting the host into labels.
//!
//! # Modules
//!
//! - `url`: Fast URL decomposition without allocations
//! - `store`: Arena tries, path table, regex list and the store builder
//! - `matcher`: Host walk, path/regex matchers and the classifier
//! - `fuzzy`: Permissive matcher for exception/allow lists
//! - `shared`: Atomically swappable store handle
//! - `types`: Shared type definitions

pub mod fuzzy;
pub mod matcher;
pub mod shared;
pub mod store;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use fuzzy::{fuzzy_url_matcher, FuzzyEntry};
pub use matcher::{is_bug, Classifier};
pub use shared::SharedStore;
pub use store::{PatternStore, PatternStoreBuilder, StoreError};
pub use types::{BugId, MatchError, MatchResult};
