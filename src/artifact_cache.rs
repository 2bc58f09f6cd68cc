//! Sharded on-disk artifact cache with source-staleness invalidation
//!
//! Artifacts are stored as plain files under `cacheRoot/{key[0..2]}/{key}.{ext}`,
//! so the cache key doubles as the filename stem and its two-character
//! prefix bounds per-directory entry counts. The cache exclusively owns
//! the root directory tree.
//!
//! There is deliberately no per-key lock around the stale-check / delete /
//! regenerate sequence: two concurrent regenerations of the same key read
//! the same source with the same parameters and produce byte-identical
//! output, so a last-writer-wins overwrite is self-healing wasted work,
//! not a correctness problem. A per-key mutex would serialize unrelated
//! transform sizes under load for no benefit.

use crate::cache_key;
use crate::error::Result;
use crate::models::{CachedArtifact, TransformRequest};
use crate::provider::ResourceProvider;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A resolved artifact: metadata always, body only when freshly generated
///
/// On a cache hit the body stays on disk; the delivery handler reads it
/// lazily so a 304 response never touches the payload.
#[derive(Debug)]
pub struct ResolvedArtifact {
    pub artifact: CachedArtifact,
    /// Payload bytes, present only when this call regenerated the artifact
    pub body: Option<Bytes>,
    pub content_type: String,
}

impl ResolvedArtifact {
    /// True when this resolution produced fresh bytes (a cache miss)
    pub fn was_regenerated(&self) -> bool {
        self.body.is_some()
    }
}

/// Sharded on-disk artifact store
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ArtifactCache { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Shard-qualified path for a key and artifact extension
    pub fn sharded_path(&self, key: &str, extension: &str) -> PathBuf {
        self.root
            .join(cache_key::shard_of(key))
            .join(format!("{}.{}", key, extension))
    }

    /// Resolve an artifact: serve the cached copy if still fresh, otherwise
    /// regenerate via the provider and persist
    ///
    /// A cached copy is stale when the source no longer exists or when the
    /// source's modification or creation timestamp is newer than the cached
    /// file's last write. Stale copies are deleted and regeneration runs as
    /// a normal miss; staleness itself is never an error. Provider failures
    /// during produce propagate to the caller; disk write failures are
    /// operational faults and propagate unmasked.
    pub async fn resolve(
        &self,
        request: &TransformRequest,
        provider: &dyn ResourceProvider,
        cancel: &CancellationToken,
    ) -> Result<ResolvedArtifact> {
        let key = cache_key::derive(request);
        let extension = request.artifact_extension();
        let path = self.sharded_path(&key, &extension);

        if let Ok(cached_meta) = fs::metadata(&path).await {
            let cached_at = cached_meta.modified()?;
            let source = provider.metadata(&request.source_path).await?;

            match source {
                Some(src) if !src.is_newer_than(cached_at) => {
                    debug!("Cache hit for key {}", key);
                    return Ok(ResolvedArtifact {
                        artifact: CachedArtifact {
                            key,
                            path: path.clone(),
                            last_modified: cached_at,
                            length: cached_meta.len(),
                        },
                        body: None,
                        content_type: content_type_for(&path),
                    });
                }
                Some(_) => {
                    debug!("Cache entry stale for key {}, regenerating", key);
                    self.evict(&path).await;
                }
                None => {
                    debug!("Source gone for key {}, evicting cached copy", key);
                    self.evict(&path).await;
                }
            }
        }

        self.regenerate(request, provider, cancel, key, path).await
    }

    /// Read the payload of a previously resolved artifact
    pub async fn read_body(
        &self,
        artifact: &CachedArtifact,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(crate::error::DeliveryError::Cancelled),
            read = fs::read(&artifact.path) => Ok(Bytes::from(read?)),
        }
    }

    async fn regenerate(
        &self,
        request: &TransformRequest,
        provider: &dyn ResourceProvider,
        cancel: &CancellationToken,
        key: String,
        path: PathBuf,
    ) -> Result<ResolvedArtifact> {
        let produced = provider.produce(request, cancel).await?;

        let shard_dir = self.root.join(cache_key::shard_of(&key));
        fs::create_dir_all(&shard_dir).await?;
        // Overwrites any partial or stale file left at this path
        fs::write(&path, &produced.body).await?;

        let written = fs::metadata(&path).await?;
        let last_modified = written.modified()?;
        debug!(
            "Regenerated artifact for key {} ({} bytes)",
            key,
            produced.body.len()
        );

        Ok(ResolvedArtifact {
            artifact: CachedArtifact {
                key,
                path,
                last_modified,
                length: produced.body.len() as u64,
            },
            content_type: produced.content_type,
            body: Some(produced.body),
        })
    }

    async fn evict(&self, path: &Path) {
        // The regenerate write overwrites the same path, so a failed delete
        // only matters long enough to log it
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove stale artifact {:?}: {}", path, e);
        }
    }
}

/// Content type of a cached artifact, inferred from its extension
fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}
