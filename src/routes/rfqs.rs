//! RFQ routes
//!
//! Quote-request generation from itineraries (the segmentation fan-out) and
//! the agency / supplier read surface over RFQs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::events::EventCategory;
use crate::domain::itineraries::{Itinerary, ItineraryStatus};
use crate::domain::rfqs::{
    RequestQuoteRequest, Rfq, RfqDetailResponse, RfqItinerarySummary, RfqResponse, RfqStatus,
};
use crate::domain::segmentation::{bucket_events, plan_segments, EventSnapshot};
use crate::domain::segments::{RfqSegment, SegmentResponse, SegmentStatus};
use crate::domain::suppliers::{pool_visibility, Supplier, SupplierType};
use crate::error::ApiError;
use crate::services::{catalog, notifications};

const RFQ_COLUMNS: &str =
    "id, tenant_id, itinerary_id, agency_id, requested_by, status, expires_at, created_at, \
     updated_at";

const SEGMENT_COLUMNS: &str =
    "id, rfq_id, tenant_id, supplier_type, supplier_id, payload, status, supplier_notes, \
     proposed_price, proposed_at, decided_at, created_at, updated_at";

const ITINERARY_COLUMNS: &str =
    "id, tenant_id, agency_id, owner_profile_id, title, adults, children, start_date, end_date, \
     notes, status, created_at, updated_at";

/// Database row for RFQ
#[derive(Debug, sqlx::FromRow)]
struct RfqRow {
    id: Uuid,
    tenant_id: Uuid,
    itinerary_id: Uuid,
    agency_id: Uuid,
    requested_by: Option<Uuid>,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RfqRow> for Rfq {
    fn from(row: RfqRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            itinerary_id: row.itinerary_id,
            agency_id: row.agency_id,
            requested_by: row.requested_by,
            status: RfqStatus::parse(&row.status).unwrap_or_default(),
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for RFQ list views, with the caller-visible segment count
#[derive(Debug, sqlx::FromRow)]
struct RfqListRow {
    id: Uuid,
    tenant_id: Uuid,
    itinerary_id: Uuid,
    agency_id: Uuid,
    requested_by: Option<Uuid>,
    status: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    segment_count: i64,
}

impl From<RfqListRow> for RfqResponse {
    fn from(row: RfqListRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            itinerary_id: row.itinerary_id,
            agency_id: row.agency_id,
            requested_by: row.requested_by,
            status: RfqStatus::parse(&row.status).unwrap_or_default(),
            expires_at: row.expires_at,
            segment_count: row.segment_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

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

/// Database row for the itinerary being quoted
#[derive(Debug, sqlx::FromRow)]
struct ItineraryFullRow {
    id: Uuid,
    tenant_id: Uuid,
    agency_id: Option<Uuid>,
    owner_profile_id: Option<Uuid>,
    title: String,
    adults: i32,
    children: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItineraryFullRow> for Itinerary {
    fn from(row: ItineraryFullRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            agency_id: row.agency_id,
            owner_profile_id: row.owner_profile_id,
            title: row.title,
            adults: row.adults,
            children: row.children,
            start_date: row.start_date,
            end_date: row.end_date,
            notes: row.notes,
            status: ItineraryStatus::parse(&row.status).unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for the itinerary projection embedded in RFQ detail
#[derive(Debug, sqlx::FromRow)]
struct ItinerarySummaryRow {
    id: Uuid,
    title: String,
    adults: i32,
    children: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
}

impl From<ItinerarySummaryRow> for RfqItinerarySummary {
    fn from(row: ItinerarySummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            adults: row.adults,
            children: row.children,
            start_date: row.start_date,
            end_date: row.end_date,
            status: ItineraryStatus::parse(&row.status).unwrap_or_default(),
        }
    }
}

/// Database row for the event snapshot feeding segmentation
#[derive(Debug, sqlx::FromRow)]
struct SnapshotRow {
    id: Uuid,
    day_number: i32,
    date: NaiveDate,
    category: String,
    event_type: String,
    summary: String,
    details: serde_json::Value,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    supplier_id: Option<Uuid>,
    quantity: i32,
    unit: Option<String>,
}

impl From<SnapshotRow> for EventSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            event_id: row.id,
            day_number: row.day_number,
            date: row.date,
            category: EventCategory::parse(&row.category).unwrap_or(EventCategory::Uncategorized),
            event_type: row.event_type,
            summary: row.summary,
            details: row.details,
            start_time: row.start_time,
            end_time: row.end_time,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            unit: row.unit,
        }
    }
}

/// Fetch an RFQ by id, 404 when absent.
pub(crate) async fn fetch_rfq(db: &PgPool, rfq_id: Uuid) -> Result<Rfq, ApiError> {
    let row =
        sqlx::query_as::<_, RfqRow>(&format!("SELECT {RFQ_COLUMNS} FROM rfqs WHERE id = $1"))
            .bind(rfq_id)
            .fetch_optional(db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    row.map(Rfq::from)
        .ok_or_else(|| ApiError::not_found("RFQ not found"))
}

/// POST /itineraries/:id/rfq
///
/// Turn an itinerary into an RFQ: bucket its events by supplier category,
/// fan each bucket out to every active supplier of that type, and flip the
/// itinerary to `requested`. The whole fan-out commits or rolls back as one.
pub async fn request_quote(
    State(state): State<Arc<AppState>>,
    Path(itinerary_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<RequestQuoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        "Requesting quote for itinerary"
    );

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let row = sqlx::query_as::<_, ItineraryFullRow>(&format!(
        r#"
        SELECT {ITINERARY_COLUMNS}
        FROM itineraries
        WHERE id = $1
        FOR UPDATE
        "#
    ))
    .bind(itinerary_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| ApiError::not_found("Itinerary not found"))?;

    let itinerary: Itinerary = row.into();

    // Quote requests are an agency operation on the agency's own itinerary.
    // Rows the caller cannot see at all stay a 404.
    let agency_id = match itinerary.agency_id {
        Some(agency_id) if auth.agency_id == Some(agency_id) => agency_id,
        _ if itinerary.owner_profile_id == Some(auth.user_id) => {
            return Err(ApiError::access_denied(
                "Quote requests are limited to agency-managed itineraries",
            ))
        }
        _ => return Err(ApiError::not_found("Itinerary not found")),
    };

    if itinerary.status.is_terminal() {
        return Err(ApiError::invalid_state(format!(
            "Itinerary in status '{}' cannot request quotes",
            itinerary.status.as_str()
        )));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM rfqs WHERE itinerary_id = $1")
        .bind(itinerary_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if existing.is_some() {
        return Err(ApiError::DuplicateRfq(
            "An RFQ already exists for this itinerary".into(),
        ));
    }

    let snapshot_rows = sqlx::query_as::<_, SnapshotRow>(
        r#"
        SELECT e.id, d.day_number, d.date, e.category, e.event_type, e.summary, e.details,
               e.start_time, e.end_time, e.supplier_id, e.quantity, e.unit
        FROM itinerary_events e
        JOIN itinerary_days d ON d.id = e.day_id
        WHERE e.itinerary_id = $1
        ORDER BY d.day_number, e.start_time, e.created_at
        "#,
    )
    .bind(itinerary_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if snapshot_rows.is_empty() {
        return Err(ApiError::EmptyItinerary(
            "Itinerary has no events to quote".into(),
        ));
    }

    let snapshots: Vec<EventSnapshot> = snapshot_rows.into_iter().map(EventSnapshot::from).collect();
    let buckets = bucket_events(snapshots);

    if buckets.uncategorized > 0 {
        tracing::warn!(
            itinerary_id = %itinerary_id,
            skipped = buckets.uncategorized,
            "Skipping uncategorized events during segmentation"
        );
    }

    let mut suppliers_by_type: BTreeMap<SupplierType, Vec<Supplier>> = BTreeMap::new();
    for supplier_type in buckets.supplier_types() {
        let suppliers =
            catalog::suppliers_of_type(&state.db, &state.cache, itinerary.tenant_id, supplier_type)
                .await
                .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

        if suppliers.is_empty() {
            tracing::info!(
                itinerary_id = %itinerary_id,
                supplier_type = supplier_type.as_str(),
                "No active suppliers for category"
            );
        }

        suppliers_by_type.insert(supplier_type, suppliers);
    }

    let plan = plan_segments(&buckets, &suppliers_by_type);

    let rfq_row = sqlx::query_as::<_, RfqRow>(&format!(
        r#"
        INSERT INTO rfqs (tenant_id, itinerary_id, agency_id, requested_by, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {RFQ_COLUMNS}
        "#
    ))
    .bind(itinerary.tenant_id)
    .bind(itinerary_id)
    .bind(agency_id)
    .bind(auth.user_id)
    .bind(req.expires_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ApiError::DuplicateRfq("An RFQ already exists for this itinerary".into())
        }
        e => ApiError::internal(format!("Database error: {}", e)),
    })?;

    let rfq: Rfq = rfq_row.into();

    let mut created: Vec<RfqSegment> = Vec::with_capacity(plan.len());
    for planned in &plan {
        let payload = serde_json::to_value(&planned.events)
            .map_err(|e| ApiError::internal(format!("Failed to serialize segment payload: {}", e)))?;

        let segment_row = sqlx::query_as::<_, SegmentRow>(&format!(
            r#"
            INSERT INTO rfq_segments (rfq_id, tenant_id, supplier_type, supplier_id, payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SEGMENT_COLUMNS}
            "#
        ))
        .bind(rfq.id)
        .bind(itinerary.tenant_id)
        .bind(planned.supplier_type.as_str())
        .bind(planned.supplier_id)
        .bind(payload)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

        created.push(segment_row.into());
    }

    sqlx::query("UPDATE itineraries SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(itinerary_id)
        .bind(ItineraryStatus::Requested.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    tracing::info!(
        rfq_id = %rfq.id,
        itinerary_id = %itinerary_id,
        segments = created.len(),
        "RFQ created"
    );

    // Notifications are best-effort; the RFQ is already committed.
    let supplier_index: HashMap<Uuid, &Supplier> = suppliers_by_type
        .values()
        .flatten()
        .map(|s| (s.id, s))
        .collect();
    for segment in &created {
        let Some(supplier) = supplier_index.get(&segment.supplier_id) else {
            continue;
        };
        if let Some(owner) = supplier.owner_profile_id {
            if let Err(e) = notifications::notify_quote_requested(
                &state.db,
                owner,
                segment.id,
                rfq.id,
                &supplier.name,
                &itinerary.title,
            )
            .await
            {
                tracing::warn!(
                    error = %e,
                    segment_id = %segment.id,
                    "Failed to create quote request notification"
                );
            }
        }
    }

    let itinerary_summary = RfqItinerarySummary {
        id: itinerary.id,
        title: itinerary.title.clone(),
        adults: itinerary.adults,
        children: itinerary.children,
        start_date: itinerary.start_date,
        end_date: itinerary.end_date,
        status: ItineraryStatus::Requested,
    };

    let response = RfqDetailResponse {
        id: rfq.id,
        tenant_id: rfq.tenant_id,
        itinerary_id: rfq.itinerary_id,
        agency_id: rfq.agency_id,
        requested_by: rfq.requested_by,
        status: rfq.status,
        expires_at: rfq.expires_at,
        created_at: rfq.created_at,
        updated_at: rfq.updated_at,
        itinerary: itinerary_summary,
        segments: created.into_iter().map(SegmentResponse::from).collect(),
    };

    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /rfqs
///
/// The caller's agency RFQs, newest first.
pub async fn list_rfqs(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(agency_id) = auth.agency_id else {
        return Err(ApiError::access_denied("Agency membership required"));
    };

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rfqs WHERE agency_id = $1")
        .bind(agency_id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let rows = sqlx::query_as::<_, RfqListRow>(
        r#"
        SELECT r.id, r.tenant_id, r.itinerary_id, r.agency_id, r.requested_by, r.status,
               r.expires_at, r.created_at, r.updated_at,
               (SELECT COUNT(*) FROM rfq_segments s WHERE s.rfq_id = r.id) AS segment_count
        FROM rfqs r
        WHERE r.agency_id = $1
        ORDER BY r.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(agency_id)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let data: Vec<RfqResponse> = rows.into_iter().map(RfqResponse::from).collect();

    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

/// GET /rfqs/assigned
///
/// Supplier view: RFQs with at least one segment the caller may act on,
/// either as the exclusive owner of the supplier or through the tenant pool.
/// Exclusive ownership requires no tenant role. `segment_count` counts only
/// the caller's actionable segments.
pub async fn list_assigned_rfqs(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (pool_tenant, covered) = pool_visibility(auth.tenant_scope());
    let covered: Vec<String> = covered.iter().map(|t| t.as_str().to_string()).collect();

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT r.id)
        FROM rfqs r
        JOIN rfq_segments s ON s.rfq_id = r.id
        JOIN suppliers sup ON sup.id = s.supplier_id
        WHERE sup.owner_profile_id = $1
           OR (sup.owner_profile_id IS NULL
               AND sup.tenant_id = $2
               AND sup.supplier_type = ANY($3))
        "#,
    )
    .bind(auth.user_id)
    .bind(pool_tenant)
    .bind(&covered)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let rows = sqlx::query_as::<_, RfqListRow>(
        r#"
        SELECT r.id, r.tenant_id, r.itinerary_id, r.agency_id, r.requested_by, r.status,
               r.expires_at, r.created_at, r.updated_at,
               COUNT(s.id) AS segment_count
        FROM rfqs r
        JOIN rfq_segments s ON s.rfq_id = r.id
        JOIN suppliers sup ON sup.id = s.supplier_id
        WHERE sup.owner_profile_id = $1
           OR (sup.owner_profile_id IS NULL
               AND sup.tenant_id = $2
               AND sup.supplier_type = ANY($3))
        GROUP BY r.id
        ORDER BY r.created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(auth.user_id)
    .bind(pool_tenant)
    .bind(&covered)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let data: Vec<RfqResponse> = rows.into_iter().map(RfqResponse::from).collect();

    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

/// GET /rfqs/:id
///
/// RFQ detail with its itinerary summary and segments. The owning agency
/// sees every segment; supplier-side callers see only segments they may act
/// on, and an RFQ with none of those stays a 404 for them.
pub async fn get_rfq(
    State(state): State<Arc<AppState>>,
    Path(rfq_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let rfq = fetch_rfq(&state.db, rfq_id).await?;

    let summary_row = sqlx::query_as::<_, ItinerarySummaryRow>(
        r#"
        SELECT id, title, adults, children, start_date, end_date, status
        FROM itineraries
        WHERE id = $1
        "#,
    )
    .bind(rfq.itinerary_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let segment_rows = sqlx::query_as::<_, SegmentRow>(&format!(
        r#"
        SELECT {SEGMENT_COLUMNS}
        FROM rfq_segments
        WHERE rfq_id = $1
        ORDER BY created_at
        "#
    ))
    .bind(rfq_id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let segments: Vec<RfqSegment> = segment_rows.into_iter().map(RfqSegment::from).collect();

    let visible: Vec<RfqSegment> = if auth.agency_id == Some(rfq.agency_id) {
        segments
    } else {
        let scope = auth.tenant_scope();
        let supplier_ids: Vec<Uuid> = segments.iter().map(|s| s.supplier_id).collect();
        let suppliers = catalog::suppliers_by_ids(&state.db, &supplier_ids)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
        let by_id: HashMap<Uuid, Supplier> =
            suppliers.into_iter().map(|s| (s.id, s)).collect();

        let filtered: Vec<RfqSegment> = segments
            .into_iter()
            .filter(|segment| {
                by_id
                    .get(&segment.supplier_id)
                    .map(|supplier| {
                        supplier.ownership().permits(
                            supplier.tenant_id,
                            supplier.supplier_type,
                            auth.user_id,
                            scope,
                        )
                    })
                    .unwrap_or(false)
            })
            .collect();

        if filtered.is_empty() {
            return Err(ApiError::not_found("RFQ not found"));
        }
        filtered
    };

    let response = RfqDetailResponse {
        id: rfq.id,
        tenant_id: rfq.tenant_id,
        itinerary_id: rfq.itinerary_id,
        agency_id: rfq.agency_id,
        requested_by: rfq.requested_by,
        status: rfq.status,
        expires_at: rfq.expires_at,
        created_at: rfq.created_at,
        updated_at: rfq.updated_at,
        itinerary: summary_row.into(),
        segments: visible.into_iter().map(SegmentResponse::from).collect(),
    };

    Ok(Json(DataResponse::new(response)))
}
