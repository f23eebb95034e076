//! bugmatch Database Compiler
//!
//! This crate compiles a bugs database (JSON) into a validated
//! [`PatternStore`](bm_core::PatternStore).

pub mod builder;
pub mod parser;

pub use builder::{build_store, compile_bugs_db, CompileStats};
pub use parser::{parse_bugs_db, BugsDb, Patterns};

/// Error type for database compilation.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] bm_core::StoreError),
    #[error("Invalid bug id: {0}")]
    InvalidBugId(String),
}
