//! JSON-over-HTTP surface for the logo pipeline.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{MethodRouter, post};

use crate::config::ProcessingMode;
use crate::pipeline::LogoPipeline;

mod error;
pub mod handlers;

pub use handlers::ApiKeyReport;

pub const PROCESS_ROUTE: &str = "/api/process-logo";
pub const STATUS_ROUTE: &str = "/api/test-api";

/// Default cap on request bodies. Base64 inflates an image by a third, so this admits roughly 7 MiB of raster.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Older per-variant endpoints; each pins the mode used when the body names none.
pub const LEGACY_ROUTES: [(&str, ProcessingMode); 6] = [
    ("/api/process-logo-enhanced", ProcessingMode::Enhanced),
    ("/api/process-logo-hq", ProcessingMode::HighQuality),
    ("/api/process-logo-potrace", ProcessingMode::Simple),
    ("/api/process-logo-simple", ProcessingMode::RasterEmbed),
    ("/api/process-logo-color", ProcessingMode::ColorEmbed),
    ("/api/process-logo-vector", ProcessingMode::VectorService),
];

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LogoPipeline>,
    pub keys: Arc<ApiKeyReport>,
    pub body_limit: usize,
}

impl AppState {
    pub fn new(pipeline: LogoPipeline, keys: ApiKeyReport) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            keys: Arc::new(keys),
            body_limit: MAX_BODY_BYTES,
        }
    }

    pub fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }
}

/// Build the router with every endpoint.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route(PROCESS_ROUTE, process_route(None))
        .route(
            STATUS_ROUTE,
            post(handlers::test_api)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        );
    for (path, mode) in LEGACY_ROUTES {
        router = router.route(path, process_route(Some(mode)));
    }
    // Oversized bodies surface as extractor rejections, which the handler turns into the JSON error shape.
    router
        .layer(DefaultBodyLimit::max(state.body_limit))
        .with_state(state)
}

fn process_route(pinned: Option<ProcessingMode>) -> MethodRouter<AppState> {
    post(move |State(state): State<AppState>, body: Result<Bytes, BytesRejection>| {
        handlers::process_logo(state, pinned, body)
    })
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
}
