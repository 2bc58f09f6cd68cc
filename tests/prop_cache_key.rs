// Property: cache key derivation is deterministic, and any two requests
// differing in any output-affecting parameter derive different keys.

use artifact_delivery::{cache_key, ImageTransform, OutputFormat, ResizeMode, TransformRequest};
use proptest::prelude::*;

fn mode_strategy() -> impl Strategy<Value = ResizeMode> {
    prop_oneof![
        Just(ResizeMode::Crop),
        Just(ResizeMode::Pad),
        Just(ResizeMode::Max),
        Just(ResizeMode::Stretch),
    ]
}

fn format_strategy() -> impl Strategy<Value = OutputFormat> {
    prop_oneof![
        Just(OutputFormat::Jpg),
        Just(OutputFormat::Png),
        Just(OutputFormat::Gif),
        Just(OutputFormat::Webp),
    ]
}

fn request_strategy() -> impl Strategy<Value = TransformRequest> {
    (
        "[a-z]{1,8}/[a-z]{1,12}\\.[a-z]{2,4}",
        proptest::option::of((1u32..=4096, 1u32..=4096, mode_strategy(), format_strategy())),
    )
        .prop_map(|(source_path, transform)| match transform {
            Some((width, height, mode, format)) => TransformRequest::image(
                source_path,
                ImageTransform {
                    width,
                    height,
                    mode,
                    format,
                },
            ),
            None => TransformRequest::file(source_path),
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Structurally equal requests always derive the same key, repeatedly
    #[test]
    fn prop_derivation_is_deterministic(request in request_strategy()) {
        let key1 = cache_key::derive(&request);
        let key2 = cache_key::derive(&request.clone());
        let key3 = cache_key::derive(&request);
        prop_assert_eq!(&key1, &key2);
        prop_assert_eq!(&key2, &key3);
    }

    /// Distinct requests never share a key, over a fuzzed parameter grid
    #[test]
    fn prop_distinct_requests_distinct_keys(
        a in request_strategy(),
        b in request_strategy(),
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(cache_key::derive(&a), cache_key::derive(&b));
    }

    /// Keys are fixed-width lowercase hex, so the two-character shard
    /// prefix is always well formed
    #[test]
    fn prop_key_is_shardable_hex(request in request_strategy()) {
        let key = cache_key::derive(&request);
        prop_assert_eq!(key.len(), 32);
        prop_assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        prop_assert_eq!(cache_key::shard_of(&key).len(), cache_key::SHARD_PREFIX_LEN);
    }

    /// Changing a single transformation parameter changes the key
    #[test]
    fn prop_single_parameter_separates_keys(
        source in "[a-z]{1,8}/[a-z]{1,12}\\.[a-z]{2,4}",
        width in 1u32..=4096,
        height in 1u32..=4096,
        mode in mode_strategy(),
        format in format_strategy(),
        bump in 1u32..=16,
    ) {
        let base = TransformRequest::image(
            source.clone(),
            ImageTransform { width, height, mode, format },
        );
        let base_key = cache_key::derive(&base);

        let wider = TransformRequest::image(
            source.clone(),
            ImageTransform { width: width + bump, height, mode, format },
        );
        prop_assert_ne!(&cache_key::derive(&wider), &base_key);

        let taller = TransformRequest::image(
            source,
            ImageTransform { width, height: height + bump, mode, format },
        );
        prop_assert_ne!(&cache_key::derive(&taller), &base_key);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_plain_and_transformed_never_collide() {
        let plain = TransformRequest::file("photos/cat.jpg");
        let transformed = TransformRequest::image(
            "photos/cat.jpg",
            ImageTransform {
                width: 1,
                height: 1,
                mode: ResizeMode::Max,
                format: OutputFormat::Jpg,
            },
        );
        assert_ne!(cache_key::derive(&plain), cache_key::derive(&transformed));
    }

    #[test]
    fn test_key_stable_across_calls() {
        let request = TransformRequest::file("a/b.txt");
        let keys: Vec<String> = (0..10).map(|_| cache_key::derive(&request)).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));
    }
}
