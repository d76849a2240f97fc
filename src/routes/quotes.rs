//! Quote routes
//!
//! Compilation of a final client quote from an RFQ's accepted segments, and
//! the cached read path for the compiled document.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::itineraries::ItineraryStatus;
use crate::domain::quotes::{
    tax_total, valid_currency, verify_totals, CompileQuoteRequest, QuoteResponse,
    QUOTE_VALIDITY_DAYS,
};
use crate::domain::rfqs::RfqStatus;
use crate::error::ApiError;
use crate::routes::rfqs::fetch_rfq;
use crate::services::{cache, notifications};

const QUOTE_COLUMNS: &str =
    "id, rfq_id, agency_id, prepared_by, currency, line_items, subtotal, taxes, tax_total, \
     total, valid_until, terms, created_at";

/// Database row for quote
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    rfq_id: Uuid,
    agency_id: Uuid,
    prepared_by: Option<Uuid>,
    currency: String,
    line_items: serde_json::Value,
    subtotal: Decimal,
    taxes: Option<serde_json::Value>,
    tax_total: Option<Decimal>,
    total: Decimal,
    valid_until: Option<DateTime<Utc>>,
    terms: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<QuoteRow> for QuoteResponse {
    fn from(row: QuoteRow) -> Self {
        Self {
            id: row.id,
            rfq_id: row.rfq_id,
            agency_id: row.agency_id,
            currency: row.currency,
            line_items: serde_json::from_value(row.line_items).unwrap_or_default(),
            subtotal: row.subtotal,
            taxes: row
                .taxes
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            tax_total: row.tax_total.unwrap_or(Decimal::ZERO),
            total: row.total,
            valid_until: row.valid_until,
            terms: row.terms,
            prepared_by: row.prepared_by,
            created_at: row.created_at,
        }
    }
}

/// POST /rfqs/:id/quote
///
/// Compile the final quote for an RFQ. Every line item must mirror an
/// accepted segment of this RFQ and the arithmetic must add up exactly.
/// One quote per RFQ; compiling flips both the RFQ and its itinerary to
/// `quoted` in the same transaction.
pub async fn compile_quote(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<CompileQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        rfq_id = %rfq_id,
        "Compiling quote"
    );

    let rfq = fetch_rfq(&state.db, rfq_id).await?;

    if auth.agency_id != Some(rfq.agency_id) {
        return Err(ApiError::access_denied(
            "Only the requesting agency can compile quotes",
        ));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM quotes WHERE rfq_id = $1")
        .bind(rfq_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if existing.is_some() {
        return Err(ApiError::DuplicateQuote(
            "A quote already exists for this RFQ".into(),
        ));
    }

    if rfq.status.is_terminal() {
        return Err(ApiError::invalid_state(format!(
            "RFQ in status '{}' cannot be quoted",
            rfq.status.as_str()
        )));
    }

    if !valid_currency(&req.currency) {
        return Err(ApiError::validation(
            "Currency must be a 3-letter alphabetic code",
        ));
    }
    let currency = req.currency.to_uppercase();

    verify_totals(&req.line_items, &req.taxes, req.subtotal, req.total)
        .map_err(ApiError::validation)?;

    let accepted: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM rfq_segments WHERE rfq_id = $1 AND status = 'accepted'",
    )
    .bind(rfq_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    let accepted: HashSet<Uuid> = accepted.into_iter().collect();

    for item in &req.line_items {
        if !accepted.contains(&item.segment_id) {
            return Err(ApiError::validation(format!(
                "Line item references segment {} which is not an accepted segment of this RFQ",
                item.segment_id
            )));
        }
    }

    let line_items = serde_json::to_value(&req.line_items)
        .map_err(|e| ApiError::internal(format!("Failed to serialize line items: {}", e)))?;
    let (taxes, tax_total_value) = if req.taxes.is_empty() {
        (None, None)
    } else {
        let taxes = serde_json::to_value(&req.taxes)
            .map_err(|e| ApiError::internal(format!("Failed to serialize taxes: {}", e)))?;
        // In Decimal range whenever verify_totals passed above.
        (Some(taxes), tax_total(&req.taxes))
    };

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let row = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        INSERT INTO quotes
            (rfq_id, agency_id, prepared_by, currency, line_items, subtotal, taxes,
             tax_total, total, terms, valid_until)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                NOW() + INTERVAL '{QUOTE_VALIDITY_DAYS} days')
        RETURNING {QUOTE_COLUMNS}
        "#
    ))
    .bind(rfq_id)
    .bind(rfq.agency_id)
    .bind(auth.user_id)
    .bind(&currency)
    .bind(line_items)
    .bind(req.subtotal)
    .bind(taxes)
    .bind(tax_total_value)
    .bind(req.total)
    .bind(&req.terms)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::DuplicateQuote("A quote already exists for this RFQ".into())
        }
        e => ApiError::internal(format!("Database error: {}", e)),
    })?;

    sqlx::query("UPDATE rfqs SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(rfq_id)
        .bind(RfqStatus::Quoted.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    sqlx::query("UPDATE itineraries SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(rfq.itinerary_id)
        .bind(ItineraryStatus::Quoted.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let response: QuoteResponse = row.into();

    tracing::info!(
        quote_id = %response.id,
        rfq_id = %rfq_id,
        total = %response.total,
        "Quote compiled"
    );

    let key = cache::keys::quote(rfq_id);
    if let Err(e) = state.cache.set(&key, &response).await {
        tracing::warn!(error = %e, rfq_id = %rfq_id, "Failed to cache compiled quote");
    }

    if let Some(contact) = rfq.requested_by {
        if let Err(e) = notifications::notify_quote_compiled(
            &state.db,
            contact,
            rfq_id,
            response.id,
            &response.currency,
            response.total,
        )
        .await
        {
            tracing::warn!(error = %e, rfq_id = %rfq_id, "Failed to create quote notification");
        }
    }

    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /rfqs/:id/quote
///
/// Fetch the compiled quote. Quotes are immutable once written, so this is
/// served read-through from the cache.
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rfq = fetch_rfq(&state.db, rfq_id).await?;

    if auth.agency_id != Some(rfq.agency_id) {
        return Err(ApiError::access_denied(
            "Only the requesting agency can view the quote",
        ));
    }

    let key = cache::keys::quote(rfq_id);
    if let Some(cached) = state.cache.get::<QuoteResponse>(&key).await {
        return Ok(Json(DataResponse::new(cached)));
    }

    let row = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE rfq_id = $1"
    ))
    .bind(rfq_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| ApiError::not_found("No quote has been compiled for this RFQ"))?;

    let response: QuoteResponse = row.into();

    if let Err(e) = state.cache.set(&key, &response).await {
        tracing::warn!(error = %e, rfq_id = %rfq_id, "Failed to cache quote");
    }

    Ok(Json(DataResponse::new(response)))
}
