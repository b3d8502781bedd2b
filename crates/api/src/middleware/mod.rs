pub mod cors;
pub mod request_tracing;

use tower_http::limit::RequestBodyLimitLayer;

/// Cap request bodies. Post payloads are text; 2 MiB is generous.
pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(2 * 1024 * 1024)
}
