//! Core type definitions for bugmatch

use std::fmt;
use std::num::NonZeroU32;

// =============================================================================
// Bug Id
// =============================================================================

/// Identifier of a catalogued tracker entry.
///
/// Ids are always positive; zero is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BugId(NonZeroU32);

impl BugId {
    /// Create a bug id, returning `None` for zero.
    #[inline]
    pub const fn new(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for BugId {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(())
    }
}

impl From<BugId> for u32 {
    fn from(id: BugId) -> Self {
        id.get()
    }
}

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// Outcome of classifying a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchResult {
    #[default]
    NoMatch,
    Matched(BugId),
}

impl MatchResult {
    #[inline]
    pub const fn is_match(self) -> bool {
        matches!(self, Self::Matched(_))
    }

    #[inline]
    pub const fn bug_id(self) -> Option<BugId> {
        match self {
            Self::Matched(id) => Some(id),
            Self::NoMatch => None,
        }
    }

    /// Return `self` if matched, otherwise evaluate `f`.
    #[inline]
    pub fn or_else(self, f: impl FnOnce() -> MatchResult) -> MatchResult {
        match self {
            Self::Matched(_) => self,
            Self::NoMatch => f(),
        }
    }
}

impl From<Option<BugId>> for MatchResult {
    fn from(id: Option<BugId>) -> Self {
        match id {
            Some(id) => Self::Matched(id),
            None => Self::NoMatch,
        }
    }
}

impl From<MatchResult> for Option<BugId> {
    fn from(result: MatchResult) -> Self {
        result.bug_id()
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error raised while preparing a URL for matching.
///
/// Never surfaces from the public classification entry points: those map it
/// to [`MatchResult::NoMatch`] (or `false` for the fuzzy matcher).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
