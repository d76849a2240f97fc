pub mod health;
pub mod itineraries;
pub mod me;
pub mod quotes;
pub mod rfqs;
pub mod segments;

use axum::{routing::delete, routing::get, routing::post, routing::put, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Protected routes
        .route("/me", get(me::get_me))
        // Itineraries
        .route("/itineraries", post(itineraries::create_itinerary))
        .route("/itineraries", get(itineraries::list_itineraries))
        .route("/itineraries/:itinerary_id", get(itineraries::get_itinerary))
        .route(
            "/itineraries/:itinerary_id",
            delete(itineraries::delete_itinerary),
        )
        .route(
            "/itineraries/:itinerary_id/dates",
            put(itineraries::update_dates),
        )
        // Events (nested under itineraries)
        .route(
            "/itineraries/:itinerary_id/events",
            post(itineraries::add_event),
        )
        .route(
            "/itineraries/:itinerary_id/events/:event_id",
            put(itineraries::update_event),
        )
        .route(
            "/itineraries/:itinerary_id/events/:event_id",
            delete(itineraries::delete_event),
        )
        // RFQs
        .route("/itineraries/:itinerary_id/rfq", post(rfqs::request_quote))
        .route("/rfqs", get(rfqs::list_rfqs))
        .route("/rfqs/assigned", get(rfqs::list_assigned_rfqs))
        .route("/rfqs/:rfq_id", get(rfqs::get_rfq))
        // Segments
        .route(
            "/segments/:segment_id/proposal",
            post(segments::propose_segment_quote),
        )
        .route(
            "/segments/:segment_id/decision",
            post(segments::decide_segment),
        )
        // Quotes (nested under RFQs)
        .route("/rfqs/:rfq_id/quote", post(quotes::compile_quote))
        .route("/rfqs/:rfq_id/quote", get(quotes::get_quote))
}
