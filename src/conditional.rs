//! Pure codec for HTTP conditional-GET validators
//!
//! Produces the `ETag` and `Last-Modified` representations of an artifact
//! and matches them against incoming `If-None-Match` / `If-Modified-Since`
//! headers. Everything here is stateless and recomputed per response so
//! validators always reflect the current artifact, never a copy that was
//! since evicted and regenerated.

use chrono::{DateTime, Utc};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between 1601-01-01 (file-time epoch) and 1970-01-01
const FILE_TIME_EPOCH_OFFSET_SECS: u64 = 11_644_473_600;

/// File-time ticks (100ns intervals) per second
const FILE_TIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Convert a timestamp to file-time ticks since 1601-01-01 UTC
///
/// Timestamps before the Unix epoch clamp to the epoch; cached artifacts
/// cannot predate it.
pub fn file_time(t: SystemTime) -> u64 {
    let since_epoch = t.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
    (since_epoch.as_secs() + FILE_TIME_EPOCH_OFFSET_SECS) * FILE_TIME_TICKS_PER_SEC
        + u64::from(since_epoch.subsec_nanos()) / 100
}

/// Compute the quoted ETag for an artifact
///
/// The tag is `hex(file_time(last_modified) XOR length)`: cheap, stable
/// for an unchanged artifact, and different whenever the cached copy is
/// rewritten or its length changes.
pub fn compute_etag(last_modified: SystemTime, length: u64) -> String {
    format!("\"{:x}\"", file_time(last_modified) ^ length)
}

/// Format a timestamp as an RFC 1123 HTTP date in UTC
pub fn format_http_date(t: SystemTime) -> String {
    let utc: DateTime<Utc> = t.into();
    utc.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP date header value
///
/// RFC 1123 dates are a profile of RFC 2822, which is what clients send in
/// `If-Modified-Since`. Unparseable values yield `None` and the caller
/// treats the header as absent.
pub fn parse_http_date(s: &str) -> Option<SystemTime> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|dt| SystemTime::from(dt.with_timezone(&Utc)))
}

/// Match an `If-None-Match` header value against the current ETag
///
/// Exact string comparison only; weak-comparison (`W/`) semantics are
/// deliberately not implemented. Every tag the pipeline issues is strong,
/// so only tags it issued can ever match.
pub fn matches_if_none_match(request_etag: &str, current_etag: &str) -> bool {
    request_etag.trim() == current_etag
}

/// Match an `If-Modified-Since` timestamp against the current Last-Modified
///
/// True when the artifact has not been modified after the client's
/// timestamp. HTTP dates carry second resolution, so both sides are
/// truncated to whole seconds before comparing.
pub fn matches_if_modified_since(request_time: SystemTime, last_modified: SystemTime) -> bool {
    unix_secs(last_modified) <= unix_secs(request_time)
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
