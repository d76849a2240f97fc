//! RFQ segment routes
//!
//! The supplier/agency halves of the segment lifecycle: suppliers propose a
//! price for their segment, the agency accepts or rejects the proposal.
//! Writes are status-guarded so concurrent calls cannot double-apply.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::rfqs::is_expired;
use crate::domain::segments::{
    DecideSegmentRequest, ProposeQuoteRequest, RfqSegment, SegmentDecision, SegmentResponse,
    SegmentStatus,
};
use crate::domain::suppliers::SupplierType;
use crate::error::ApiError;
use crate::routes::rfqs::fetch_rfq;
use crate::services::{catalog, notifications};

const SEGMENT_COLUMNS: &str =
    "id, rfq_id, tenant_id, supplier_type, supplier_id, payload, status, supplier_notes, \
     proposed_price, proposed_at, decided_at, created_at, updated_at";

/// Database row for RFQ segment
#[derive(Debug, sqlx::FromRow)]
struct SegmentRow {
    id: Uuid,
    rfq_id: Uuid,
    tenant_id: Uuid,
    supplier_type: String,
    supplier_id: Uuid,
    payload: serde_json::Value,
    status: String,
    supplier_notes: Option<String>,
    proposed_price: Option<Decimal>,
    proposed_at: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SegmentRow> for RfqSegment {
    fn from(row: SegmentRow) -> Self {
        Self {
            id: row.id,
            rfq_id: row.rfq_id,
            tenant_id: row.tenant_id,
            supplier_type: SupplierType::parse(&row.supplier_type)
                .unwrap_or(SupplierType::Transport),
            supplier_id: row.supplier_id,
            payload: row.payload,
            status: SegmentStatus::parse(&row.status).unwrap_or(SegmentStatus::Pending),
            supplier_notes: row.supplier_notes,
            proposed_price: row.proposed_price,
            proposed_at: row.proposed_at,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

async fn fetch_segment(db: &PgPool, segment_id: Uuid) -> Result<RfqSegment, ApiError> {
    let row = sqlx::query_as::<_, SegmentRow>(&format!(
        "SELECT {SEGMENT_COLUMNS} FROM rfq_segments WHERE id = $1"
    ))
    .bind(segment_id)
    .fetch_optional(db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    row.map(RfqSegment::from)
        .ok_or_else(|| ApiError::not_found("Segment not found"))
}

/// POST /segments/:id/proposal
///
/// Supplier submits a price for their segment. Legal from `pending` or
/// `supplier_review`; the guarded update re-reads on conflict so a raced
/// double submit reports the transition, not a phantom success.
pub async fn propose_segment_quote(
    State(state): State<Arc<AppState>>,
    Path(segment_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<ProposeQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        segment_id = %segment_id,
        "Submitting segment proposal"
    );

    let segment = fetch_segment(&state.db, segment_id).await?;

    let supplier = catalog::supplier_by_id(&state.db, segment.supplier_id)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
        .ok_or_else(|| ApiError::internal("Segment references a missing supplier"))?;

    let permitted = supplier.ownership().permits(
        supplier.tenant_id,
        supplier.supplier_type,
        auth.user_id,
        auth.tenant_scope(),
    );
    if !permitted {
        return Err(ApiError::access_denied(
            "You do not control the supplier for this segment",
        ));
    }

    let rfq = fetch_rfq(&state.db, segment.rfq_id).await?;
    if is_expired(rfq.expires_at, Utc::now()) {
        return Err(ApiError::RfqExpired(
            "The quote deadline for this RFQ has passed".into(),
        ));
    }

    if req.proposed_price <= Decimal::ZERO {
        return Err(ApiError::validation("Proposed price must be positive"));
    }

    if !segment.status.can_propose() {
        return Err(ApiError::invalid_transition(format!(
            "Segment in status '{}' cannot receive a proposal",
            segment.status.as_str()
        )));
    }

    let updated_row = sqlx::query_as::<_, SegmentRow>(&format!(
        r#"
        UPDATE rfq_segments
        SET status = $2, proposed_price = $3, supplier_notes = $4,
            proposed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status IN ('pending', 'supplier_review')
        RETURNING {SEGMENT_COLUMNS}
        "#
    ))
    .bind(segment_id)
    .bind(SegmentStatus::SupplierProposed.as_str())
    .bind(req.proposed_price)
    .bind(&req.notes)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let updated = match updated_row {
        Some(row) => RfqSegment::from(row),
        None => {
            // Raced with another writer; re-read to report what it became.
            let current = fetch_segment(&state.db, segment_id).await?;
            return Err(ApiError::invalid_transition(format!(
                "Segment in status '{}' cannot receive a proposal",
                current.status.as_str()
            )));
        }
    };

    if let Some(contact) = rfq.requested_by {
        if let Err(e) = notifications::notify_proposal_received(
            &state.db,
            contact,
            updated.id,
            rfq.id,
            &supplier.name,
            req.proposed_price,
        )
        .await
        {
            tracing::warn!(error = %e, segment_id = %segment_id, "Failed to create proposal notification");
        }
    }

    let response: SegmentResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}

/// POST /segments/:id/decision
///
/// Agency accepts or rejects a proposed segment. Legal only from
/// `supplier_proposed`; the decision is terminal for the segment.
pub async fn decide_segment(
    State(state): State<Arc<AppState>>,
    Path(segment_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<DecideSegmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        segment_id = %segment_id,
        decision = req.decision.target_status().as_str(),
        "Deciding segment proposal"
    );

    let segment = fetch_segment(&state.db, segment_id).await?;
    let rfq = fetch_rfq(&state.db, segment.rfq_id).await?;

    if auth.agency_id != Some(rfq.agency_id) {
        return Err(ApiError::access_denied(
            "Only the requesting agency can decide segments",
        ));
    }

    if is_expired(rfq.expires_at, Utc::now()) {
        return Err(ApiError::RfqExpired(
            "The quote deadline for this RFQ has passed".into(),
        ));
    }

    if !segment.status.can_decide() {
        return Err(ApiError::invalid_transition(format!(
            "Segment in status '{}' cannot be decided",
            segment.status.as_str()
        )));
    }

    let updated_row = sqlx::query_as::<_, SegmentRow>(&format!(
        r#"
        UPDATE rfq_segments
        SET status = $2, decided_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND status = 'supplier_proposed'
        RETURNING {SEGMENT_COLUMNS}
        "#
    ))
    .bind(segment_id)
    .bind(req.decision.target_status().as_str())
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let updated = match updated_row {
        Some(row) => RfqSegment::from(row),
        None => {
            let current = fetch_segment(&state.db, segment_id).await?;
            return Err(ApiError::invalid_transition(format!(
                "Segment in status '{}' cannot be decided",
                current.status.as_str()
            )));
        }
    };

    let supplier = catalog::supplier_by_id(&state.db, updated.supplier_id)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if let Some(owner) = supplier.as_ref().and_then(|s| s.owner_profile_id) {
        let accepted = matches!(req.decision, SegmentDecision::Accepted);
        let supplier_name = supplier
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or("A supplier");
        if let Err(e) = notifications::notify_segment_decided(
            &state.db,
            owner,
            updated.id,
            rfq.id,
            supplier_name,
            accepted,
        )
        .await
        {
            tracing::warn!(error = %e, segment_id = %segment_id, "Failed to create decision notification");
        }
    }

    let response: SegmentResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}
