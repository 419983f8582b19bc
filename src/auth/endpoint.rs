//! Canonical permission keys for request paths

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder that stands in for an identifier segment
pub const ID_PLACEHOLDER: &str = "{id}";

static ID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("identifier pattern is valid")
});

/// Replace every identifier-shaped path segment with `{id}`.
///
/// `/books/3f2c…-…/ratings` becomes `/books/{id}/ratings`. Only whole
/// segments are considered, so the result is stable under repeated calls.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if ID_SEGMENT.is_match(segment) {
                ID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
