//! Deterministic cache key derivation
//!
//! A cache key is derived from every parameter of a [`TransformRequest`]
//! that affects the output bytes, so that two requests differing in any
//! parameter never share an artifact. The key doubles as the on-disk
//! filename stem, and its first two characters name the shard directory.

use crate::models::TransformRequest;
use xxhash_rust::xxh3::xxh3_128;

/// Number of leading key characters used as the shard directory name
pub const SHARD_PREFIX_LEN: usize = 2;

/// Derive the cache key for a transformation request
///
/// Pure and total: no IO, never fails for a well-formed request, and the
/// same request always yields the same key across process restarts. The
/// canonical parameter string is digested with xxh3-128 and hex encoded,
/// giving a fixed-width, filesystem-safe, shard-friendly key. Changing the
/// canonical layout silently invalidates the whole cache, which is
/// acceptable: every artifact is regenerable.
pub fn derive(request: &TransformRequest) -> String {
    let canonical = canonical_form(request);
    format!("{:032x}", xxh3_128(canonical.as_bytes()))
}

/// Shard directory name for a key (its first two characters)
pub fn shard_of(key: &str) -> &str {
    &key[..SHARD_PREFIX_LEN]
}

/// Canonical parameter string embedding every output-affecting parameter
fn canonical_form(request: &TransformRequest) -> String {
    match &request.transform {
        Some(t) => format!(
            "{}|{}x{}|{}|{}",
            request.source_path,
            t.width,
            t.height,
            t.mode.as_str(),
            t.format.extension(),
        ),
        None => format!("{}|raw", request.source_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImageTransform, OutputFormat, ResizeMode};

    fn image_request(width: u32, height: u32) -> TransformRequest {
        TransformRequest::image(
            "photos/cat.jpg",
            ImageTransform {
                width,
                height,
                mode: ResizeMode::Crop,
                format: OutputFormat::Webp,
            },
        )
    }

    #[test]
    fn test_key_is_deterministic() {
        let request = image_request(100, 80);
        assert_eq!(derive(&request), derive(&request.clone()));
    }

    #[test]
    fn test_key_is_hex_and_fixed_width() {
        let key = derive(&TransformRequest::file("a.txt"));
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_dimensions_separate_keys() {
        assert_ne!(derive(&image_request(100, 80)), derive(&image_request(100, 81)));
        assert_ne!(derive(&image_request(100, 80)), derive(&image_request(101, 80)));
    }

    #[test]
    fn test_mode_and_format_separate_keys() {
        let base = image_request(100, 80);
        let mut pad = base.clone();
        pad.transform.as_mut().unwrap().mode = ResizeMode::Pad;
        assert_ne!(derive(&base), derive(&pad));

        let mut png = base.clone();
        png.transform.as_mut().unwrap().format = OutputFormat::Png;
        assert_ne!(derive(&base), derive(&png));
    }

    #[test]
    fn test_plain_vs_transformed_separate_keys() {
        let plain = TransformRequest::file("photos/cat.jpg");
        assert_ne!(derive(&plain), derive(&image_request(100, 80)));
    }

    #[test]
    fn test_source_path_separates_keys() {
        assert_ne!(
            derive(&TransformRequest::file("a/b.txt")),
            derive(&TransformRequest::file("a/c.txt"))
        );
    }

    #[test]
    fn test_shard_prefix() {
        let key = derive(&TransformRequest::file("a.txt"));
        let shard = shard_of(&key);
        assert_eq!(shard.len(), SHARD_PREFIX_LEN);
        assert!(key.starts_with(shard));
    }

    #[test]
    fn test_dimension_concatenation_is_unambiguous() {
        // 1x11 and 11x1 must not collapse into the same canonical form
        assert_ne!(derive(&image_request(1, 11)), derive(&image_request(11, 1)));
    }
}
