//! Request and cache-key routing
//!
//! Maps absolute URLs back onto manifest paths. Cache keys get the literal
//! mapping; incoming requests additionally lose a `?v=` cache-busting
//! suffix and collapse root-ish shapes onto the document entry point.

use crate::manifest::ROOT_PATH;

/// Strip the origin and the path separator after it. `None` means the URL
/// belongs to a different origin.
fn strip_origin<'a>(origin: &str, url: &'a str) -> Option<&'a str> {
    let rest = url.strip_prefix(origin)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix('/')
    }
}

/// Manifest path a stored cache key resolves to
pub fn resource_path(origin: &str, url: &str) -> Option<String> {
    let path = strip_origin(origin, url)?;
    if path.is_empty() {
        Some(ROOT_PATH.to_string())
    } else {
        Some(path.to_string())
    }
}

/// Manifest path an incoming request resolves to.
///
/// A `?v=` query suffix is dropped before lookup. The bare origin, a
/// fragment-only path, and the empty path all resolve to [`ROOT_PATH`].
pub fn request_path(origin: &str, url: &str) -> Option<String> {
    let path = strip_origin(origin, url)?;
    let path = match path.split_once("?v=") {
        Some((before, _)) => before,
        None => path,
    };
    if path.is_empty() || path.starts_with('#') {
        Some(ROOT_PATH.to_string())
    } else {
        Some(path.to_string())
    }
}
