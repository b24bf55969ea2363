//! Route key normalization.

use crate::cache::RouteKey;

/// Turns a raw location into a route key.
///
/// Drops the query string and fragment, collapses repeated slashes, adds a
/// leading slash and removes a trailing one. The root stays `/`.
pub fn normalize_route(raw: &str) -> RouteKey {
    let path = raw
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    format!("/{}", segments.join("/"))
}
