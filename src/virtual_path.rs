//! Codec for the slash-delimited virtual path scheme
//!
//! Image-style requests travel as a human-decodable URL path of the form
//! `{width}/{height}/{mode}/{originalExtension}/{format-qualified path}`
//! (the route prefix in front of it is stripped by routing). The same
//! scheme is used to build outgoing URLs and to reconstruct the
//! transformation request from an incoming one, so encode and decode must
//! stay exact inverses.
//!
//! Example: resizing `photos/cat.jpg` to 100x80 crop as webp is addressed
//! as `100/80/crop/jpg/photos/cat.webp`.

use crate::error::{DeliveryError, Result};
use crate::models::{ImageTransform, OutputFormat, ResizeMode, TransformRequest};

/// Encode a transformation request as a virtual path
///
/// Returns `None` for plain file requests and for source paths without an
/// extension; those are addressed by their literal path instead.
pub fn encode(request: &TransformRequest) -> Option<String> {
    let t = request.transform.as_ref()?;
    let (stem, original_ext) = split_extension(&request.source_path)?;
    Some(format!(
        "{}/{}/{}/{}/{}.{}",
        t.width,
        t.height,
        t.mode.as_str(),
        original_ext,
        stem,
        t.format.extension(),
    ))
}

/// Decode a virtual path back into a transformation request
///
/// Malformed paths are indistinguishable from absent resources by design,
/// so every parse failure comes back as `NotFound`.
pub fn decode(path: &str) -> Result<TransformRequest> {
    let malformed = || DeliveryError::NotFound(path.to_string());
    let mut segments = path.trim_start_matches('/').splitn(5, '/');

    let width: u32 = segments
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)?;
    let height: u32 = segments
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)?;
    let mode = ResizeMode::parse(segments.next().ok_or_else(malformed)?)?;
    let original_ext = segments.next().ok_or_else(malformed)?;
    let qualified = segments.next().filter(|s| !s.is_empty()).ok_or_else(malformed)?;

    let (stem, format_ext) = split_extension(qualified).ok_or_else(malformed)?;
    let format = OutputFormat::parse(format_ext)?;
    if original_ext.is_empty() {
        return Err(malformed());
    }

    Ok(TransformRequest::image(
        format!("{}.{}", stem, original_ext),
        ImageTransform {
            width,
            height,
            mode,
            format,
        },
    ))
}

/// Split a path into (stem, extension) at the final dot of its last segment
fn split_extension(path: &str) -> Option<(&str, &str)> {
    let dot = path.rfind('.')?;
    // A dot inside a directory segment is not an extension
    if path[dot..].contains('/') || dot == 0 {
        return None;
    }
    Some((&path[..dot], &path[dot + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransformRequest {
        TransformRequest::image(
            "photos/cat.jpg",
            ImageTransform {
                width: 100,
                height: 80,
                mode: ResizeMode::Crop,
                format: OutputFormat::Webp,
            },
        )
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            encode(&request()).unwrap(),
            "100/80/crop/jpg/photos/cat.webp"
        );
    }

    #[test]
    fn test_encode_plain_request_is_none() {
        assert!(encode(&TransformRequest::file("photos/cat.jpg")).is_none());
    }

    #[test]
    fn test_decode() {
        let decoded = decode("100/80/crop/jpg/photos/cat.webp").unwrap();
        assert_eq!(decoded, request());
    }

    #[test]
    fn test_decode_with_leading_slash() {
        let decoded = decode("/100/80/crop/jpg/photos/cat.webp").unwrap();
        assert_eq!(decoded, request());
    }

    #[test]
    fn test_round_trip() {
        let original = request();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_nested_directories() {
        let decoded = decode("32/32/max/png/icons/ui/save.jpg").unwrap();
        assert_eq!(decoded.source_path, "icons/ui/save.png");
        let t = decoded.transform.unwrap();
        assert_eq!(t.format, OutputFormat::Jpg);
        assert_eq!(t.mode, ResizeMode::Max);
    }

    #[test]
    fn test_decode_malformed_is_not_found() {
        for bad in [
            "",
            "100",
            "100/80",
            "100/80/crop",
            "100/80/crop/jpg",
            "100/80/crop/jpg/",
            "abc/80/crop/jpg/photos/cat.webp",
            "100/xyz/crop/jpg/photos/cat.webp",
            "100/80/zoom/jpg/photos/cat.webp",
            "100/80/crop/jpg/photos/cat",
            "100/80/crop/jpg/photos/cat.tiff",
        ] {
            let err = decode(bad).unwrap_err();
            assert!(err.is_silent(), "expected silent error for {:?}", bad);
        }
    }

    #[test]
    fn test_split_extension_ignores_directory_dots() {
        assert_eq!(split_extension("a.d/b"), None);
        assert_eq!(split_extension("a.d/b.txt"), Some(("a.d/b", "txt")));
        assert_eq!(split_extension(".hidden"), None);
    }
}
