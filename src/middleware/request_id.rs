//! Request ID middleware
//!
//! Inbound `x-request-id` values are kept; only missing ones are generated.
//! The id is echoed on every response so callers can reference it later.

use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Build the set/propagate layer pair for `x-request-id`.
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header = HeaderName::from_static("x-request-id");

    (
        SetRequestIdLayer::new(header.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header),
    )
}
