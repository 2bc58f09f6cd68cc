//! Artifact delivery demo server
//!
//! Loads configuration, sets up logging, and serves the delivery pipeline
//! over HTTP/1.1. Transform-enabled mappings are wired with a pass-through
//! transform; a deployment with a real image codec swaps that in when
//! building the route table programmatically.

use anyhow::Context;
use artifact_delivery::{ArtifactCache, DeliveryConfig, DeliveryHandler, DeliveryOutcome};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "artifact_delivery.yaml".to_string());
    info!("Loading configuration from: {}", config_path);

    let config = DeliveryConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path))?;
    info!("Configuration loaded successfully");
    info!("  - Global prefix: {}", config.global_prefix);
    info!("  - Cache root: {}", config.cache_root);
    info!("  - Mappings: {}", config.mappings.len());

    let handler = Arc::new(DeliveryHandler::new(
        config.build_route_table()?,
        ArtifactCache::new(&config.cache_root),
    ));

    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("binding {}", config.listen_address))?;
    info!("Listening on {}", config.listen_address);

    loop {
        let (stream, peer) = listener.accept().await?;
        let handler = handler.clone();
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(move |req| serve(handler.clone(), req));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {} ended: {}", peer, e);
            }
        });
    }
}

/// Map one HTTP request through the delivery handler
async fn serve(
    handler: Arc<DeliveryHandler>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    // Request-scoped cancellation; dropping the connection would cancel it
    // in a fuller integration
    let cancel = CancellationToken::new();
    let path = req.uri().path().to_string();

    let outcome = match handler.handle(&path, req.headers(), &cancel).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Delivery fault for '{}': {}", path, e);
            let status = StatusCode::from_u16(e.to_http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Ok(empty_response(status));
        }
    };

    let response = match outcome {
        DeliveryOutcome::Delivered { headers, body } => {
            let mut response = Response::new(Full::new(body));
            *response.headers_mut() = headers;
            response
        }
        DeliveryOutcome::NotModified { headers } => {
            let mut response = empty_response(StatusCode::NOT_MODIFIED);
            *response.headers_mut() = headers;
            response
        }
        // At the end of the chain a pass-through has nowhere left to go
        DeliveryOutcome::NotFound | DeliveryOutcome::PassThrough => {
            empty_response(StatusCode::NOT_FOUND)
        }
    };
    Ok(response)
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
