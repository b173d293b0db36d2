//! Parsing of caller-supplied list and pagination parameters.
//!
//! Nothing here returns an error: malformed values fall back to defaults.

use serde::Serialize;

use crate::config::{DEFAULT_LIST_LIMIT, DEFAULT_SEARCH_LIMIT, MAX_LIST_LIMIT, MAX_SEARCH_LIMIT};

/// Splits a comma-separated list, trimming tokens and dropping empty ones.
pub fn parse_string_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// A bounded page of results.
///
/// The limit is always in `1..=ceiling`, so a caller can never request an
/// unbounded listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    limit: u32,
    offset: u32,
}

impl Pagination {
    /// Pagination for general listings: default 50, at most 1000.
    pub fn general(limit: Option<&str>, offset: Option<&str>) -> Self {
        Pagination {
            limit: parse_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT),
            offset: parse_offset(offset),
        }
    }

    /// Pagination for name searches: default 20, at most 100, always from the start.
    pub fn search(limit: Option<&str>) -> Self {
        Pagination {
            limit: parse_limit(limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT),
            offset: 0,
        }
    }

    /// A fixed first page of `limit` rows.
    pub(crate) fn first(limit: u32) -> Self {
        Pagination {
            limit: limit.max(1),
            offset: 0,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

fn parse_limit(raw: Option<&str>, default: u32, ceiling: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|limit| (1..=ceiling).contains(limit))
        .unwrap_or(default)
}

fn parse_offset(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).unwrap_or(0)
}
