//! Permissive URL matcher for exception and allow lists
//!
//! Unlike the classifier this accepts broader matches: a wildcard host covers
//! every subdomain and a trailing `*` turns a path into a prefix. Over-matching
//! here means "don't block", which is the safer way to be wrong.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::url::{normalize, strip_www, NormalizedUrl};

/// One `{host, path}` entry of an exception list.
///
/// `host` may start with `*.` to cover the host and all its subdomains.
/// An empty `path` matches any path; a path ending in `*` is a prefix.
/// Both parts are lower-cased by [`FuzzyEntry::new`] and [`FuzzyEntry::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FuzzyEntry {
    pub host: String,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostMatch {
    Strict,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathMatch {
    Any,
    Strict,
    Fuzzy,
}

impl FuzzyEntry {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into().to_lowercase(),
            path: path.into().to_lowercase(),
        }
    }

    /// Split a `host/path` list string on its first `/`.
    pub fn parse(src: &str) -> Self {
        match src.split_once('/') {
            Some((host, path)) => Self::new(host, path),
            None => Self::new(src, ""),
        }
    }

    /// Check a probe host (already stripped of `www.`) and path (without
    /// leading `/`) against this entry.
    pub fn matches(&self, host: &str, path: &str) -> bool {
        self.match_kind(host, path).is_some()
    }

    fn match_kind(&self, host: &str, path: &str) -> Option<(HostMatch, PathMatch)> {
        let host_match = if self.host == host {
            HostMatch::Strict
        } else if is_wildcard_host_match(&self.host, host) {
            HostMatch::Fuzzy
        } else {
            return None;
        };

        let path_match = if self.path.is_empty() {
            PathMatch::Any
        } else if let Some(prefix) = self.path.strip_suffix('*') {
            if !path.starts_with(prefix) {
                return None;
            }
            PathMatch::Fuzzy
        } else if self.path == path {
            PathMatch::Strict
        } else {
            return None;
        };

        Some((host_match, path_match))
    }
}

impl FromStr for FuzzyEntry {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for FuzzyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.host)
        } else {
            write!(f, "{}/{}", self.host, self.path)
        }
    }
}

/// `*.suffix` covers `suffix` itself and anything ending in `.suffix`.
#[inline]
fn is_wildcard_host_match(pattern: &str, host: &str) -> bool {
    let suffix = match pattern.strip_prefix("*.") {
        Some(suffix) if !suffix.is_empty() => suffix,
        _ => return false,
    };

    if host == suffix {
        return true;
    }

    host.len() > suffix.len()
        && host.ends_with(suffix)
        && host.as_bytes()[host.len() - suffix.len() - 1] == b'.'
}

/// Test `url` against `entries` in order; the first matching entry wins.
///
/// Unparseable URLs never match.
pub fn fuzzy_url_matcher(url: &str, entries: &[FuzzyEntry]) -> bool {
    if entries.is_empty() {
        return false;
    }

    match normalize(url) {
        Ok(url) => fuzzy_match_normalized(&url, entries),
        Err(e) => {
            log::trace!("[fuzzy_url_matcher] {}", e);
            false
        }
    }
}

/// Same as [`fuzzy_url_matcher`] for an already normalized URL.
pub fn fuzzy_match_normalized(url: &NormalizedUrl, entries: &[FuzzyEntry]) -> bool {
    let host = strip_www(url.host());
    let path = url.path();

    for entry in entries {
        if let Some((host_match, path_match)) = entry.match_kind(host, path) {
            log_match(entry, host_match, path_match);
            return true;
        }
    }

    false
}

fn log_match(entry: &FuzzyEntry, host_match: HostMatch, path_match: PathMatch) {
    let host_kind = match host_match {
        HostMatch::Strict => "strict",
        HostMatch::Fuzzy => "fuzzy",
    };
    match path_match {
        PathMatch::Any => log::debug!("[fuzzy_url_matcher] host ({}) {} match", entry.host, host_kind),
        PathMatch::Strict => log::debug!(
            "[fuzzy_url_matcher] host ({}) {} match and path ({}) strict match",
            entry.host,
            host_kind,
            entry.path
        ),
        PathMatch::Fuzzy => log::debug!(
            "[fuzzy_url_matcher] host ({}) {} match and path ({}) fuzzy match",
            entry.host,
            host_kind,
            entry.path
        ),
    }
}
