//! Conditional delivery handler
//!
//! Orchestrates a single request through the pipeline: resolve the route,
//! resolve or regenerate the artifact, compute validators, honor the
//! conditional headers, then stream the body or short-circuit with a
//! bodiless outcome.
//!
//! Within one request the ordering is strict: route-resolve →
//! cache-resolve → validator-compute → conditional-check → stream or
//! short-circuit. Across requests nothing is ordered; each request is a
//! pure function of the request path and the current disk state.

use crate::artifact_cache::ArtifactCache;
use crate::conditional;
use crate::error::{DeliveryError, Result};
use crate::metrics::DeliveryMetrics;
use crate::models::{CachePolicy, DeliveryOutcome, TransformRequest};
use crate::route_table::{RouteMatch, RouteTable};
use crate::virtual_path;
use http::header::{
    HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use std::sync::Arc;
use std::time::SystemTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Request orchestrator for the artifact delivery pipeline
pub struct DeliveryHandler {
    routes: RouteTable,
    cache: ArtifactCache,
    metrics: Arc<DeliveryMetrics>,
}

impl DeliveryHandler {
    pub fn new(routes: RouteTable, cache: ArtifactCache) -> Self {
        DeliveryHandler {
            routes,
            cache,
            metrics: Arc::new(DeliveryMetrics::new()),
        }
    }

    pub fn metrics(&self) -> &Arc<DeliveryMetrics> {
        &self.metrics
    }

    /// Handle one request
    ///
    /// `cancel` is the caller-supplied cancellation token, typically tied
    /// to the originating connection; a child scope is derived from it and
    /// cancelled early whenever the response needs no body, so no bytes
    /// are read from disk for a 304 or 404.
    ///
    /// Silent provider conditions (`NotFound`, `AccessDenied`) collapse
    /// into the `NotFound` outcome here; any other error propagates as a
    /// delivery-pipeline fault for the outer web layer to map.
    pub async fn handle(
        &self,
        path: &str,
        headers: &HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<DeliveryOutcome> {
        let Some(matched) = self.routes.resolve(path) else {
            debug!("No route for '{}', passing through", path);
            self.metrics.record_pass_through();
            return Ok(DeliveryOutcome::PassThrough);
        };

        let scope = cancel.child_token();

        let request = match build_request(&matched) {
            Ok(request) => request,
            Err(e) if e.is_silent() => {
                debug!("Unresolvable request path '{}': {}", path, e);
                return Ok(self.not_found(&scope));
            }
            Err(e) => return Err(e),
        };

        let provider = matched.mapping.provider.as_ref();
        let resolved = match self.cache.resolve(&request, provider, &scope).await {
            Ok(resolved) => resolved,
            Err(e) if e.is_silent() => {
                // Absence and denial are logged differently but must look
                // identical from the outside
                match &e {
                    DeliveryError::AccessDenied(_) => warn!("Denied for '{}': {}", path, e),
                    _ => debug!("No artifact for '{}': {}", path, e),
                }
                return Ok(self.not_found(&scope));
            }
            Err(e) => {
                error!("Artifact resolution failed for '{}': {}", path, e);
                return Err(e);
            }
        };

        if resolved.was_regenerated() {
            self.metrics.record_cache_miss();
        } else {
            self.metrics.record_cache_hit();
        }

        let policy = matched.mapping.policy;
        let etag = conditional::compute_etag(resolved.artifact.last_modified, resolved.artifact.length);

        if policy.sends_validators()
            && not_modified_by(headers, &etag, resolved.artifact.last_modified)
        {
            scope.cancel();
            self.metrics.record_not_modified();
            debug!("Validators match for '{}', responding 304", path);
            return Ok(DeliveryOutcome::NotModified {
                headers: cache_headers(policy, &etag, resolved.artifact.last_modified)?,
            });
        }

        let body = match resolved.body {
            Some(body) => body,
            None => self.cache.read_body(&resolved.artifact, &scope).await?,
        };

        let mut response_headers = cache_headers(policy, &etag, resolved.artifact.last_modified)?;
        response_headers.insert(CONTENT_TYPE, header_value(&resolved.content_type)?);

        self.metrics.record_delivered(body.len() as u64);
        Ok(DeliveryOutcome::Delivered {
            headers: response_headers,
            body,
        })
    }

    fn not_found(&self, scope: &CancellationToken) -> DeliveryOutcome {
        scope.cancel();
        self.metrics.record_not_found();
        DeliveryOutcome::NotFound
    }
}

/// Reconstruct the transformation request a route remainder encodes
fn build_request(matched: &RouteMatch<'_>) -> Result<TransformRequest> {
    if matched.remainder.is_empty() {
        return Err(DeliveryError::NotFound("empty resource path".to_string()));
    }
    if matched.mapping.decodes_transforms {
        virtual_path::decode(matched.remainder)
    } else {
        Ok(TransformRequest::file(matched.remainder))
    }
}

/// Evaluate the conditional request headers against current validators
fn not_modified_by(headers: &HeaderMap, etag: &str, last_modified: SystemTime) -> bool {
    if let Some(candidate) = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok()) {
        if conditional::matches_if_none_match(candidate, etag) {
            return true;
        }
    }

    if let Some(since) = headers
        .get(IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(conditional::parse_http_date)
    {
        if conditional::matches_if_modified_since(since, last_modified) {
            return true;
        }
    }

    false
}

/// Cache headers for a policy: always `Cache-Control`, validators only
/// when the policy emits them
fn cache_headers(
    policy: CachePolicy,
    etag: &str,
    last_modified: SystemTime,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static(policy.cache_control()),
    );
    if policy.sends_validators() {
        headers.insert(ETAG, header_value(etag)?);
        headers.insert(
            LAST_MODIFIED,
            header_value(&conditional::format_http_date(last_modified))?,
        );
    }
    Ok(headers)
}

fn header_value(s: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(s).map_err(|e| DeliveryError::Internal(e.to_string()))
}
