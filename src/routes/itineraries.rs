//! Itinerary routes
//!
//! Trip itinerary CRUD: the day skeleton is generated from the date range
//! at creation and regenerated on date changes, and events hang off days.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::{DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::{AuthContext, RequireAuth};
use crate::domain::events::{
    CreateEventRequest, EventCategory, EventResponse, ItineraryEvent, UpdateEventRequest,
};
use crate::domain::itineraries::{
    generate_day_dates, span_within_limit, CreateItineraryRequest, DayWithEvents, Itinerary,
    ItineraryDetailResponse, ItineraryResponse, ItineraryStatus, UpdateDatesRequest,
    MAX_ITINERARY_DAYS,
};
use crate::error::ApiError;
use crate::services::catalog;

/// Database row for itinerary
#[derive(Debug, sqlx::FromRow)]
struct ItineraryRow {
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

impl From<ItineraryRow> for Itinerary {
    fn from(row: ItineraryRow) -> Self {
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

/// Database row for itinerary day
#[derive(Debug, sqlx::FromRow)]
struct DayRow {
    id: Uuid,
    day_number: i32,
    date: NaiveDate,
}

/// Database row for itinerary event
#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    tenant_id: Uuid,
    itinerary_id: Uuid,
    day_id: Uuid,
    category: String,
    event_type: String,
    summary: String,
    details: serde_json::Value,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    supplier_id: Option<Uuid>,
    quantity: i32,
    unit: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for ItineraryEvent {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            itinerary_id: row.itinerary_id,
            day_id: row.day_id,
            category: EventCategory::parse(&row.category).unwrap_or(EventCategory::Uncategorized),
            event_type: row.event_type,
            summary: row.summary,
            details: row.details,
            start_time: row.start_time,
            end_time: row.end_time,
            supplier_id: row.supplier_id,
            quantity: row.quantity,
            unit: row.unit,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ITINERARY_COLUMNS: &str = "id, tenant_id, agency_id, owner_profile_id, title, adults, \
     children, start_date, end_date, notes, status, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, tenant_id, itinerary_id, day_id, category, event_type, summary, \
     details, start_time, end_time, supplier_id, quantity, unit, created_at, updated_at";

/// Fetch an itinerary the caller may see. Agency staff see their agency's
/// itineraries, individual owners see their own rows. Anything else is a 404.
async fn fetch_visible_itinerary(
    db: &PgPool,
    itinerary_id: Uuid,
    auth: &AuthContext,
) -> Result<Itinerary, ApiError> {
    let row = sqlx::query_as::<_, ItineraryRow>(&format!(
        r#"
        SELECT {ITINERARY_COLUMNS}
        FROM itineraries
        WHERE id = $1
          AND (($2::uuid IS NOT NULL AND agency_id = $2) OR owner_profile_id = $3)
        "#
    ))
    .bind(itinerary_id)
    .bind(auth.agency_id)
    .bind(auth.user_id)
    .fetch_optional(db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    row.map(Itinerary::from)
        .ok_or_else(|| ApiError::not_found("Itinerary not found"))
}

fn ensure_events_mutable(itinerary: &Itinerary) -> Result<(), ApiError> {
    if !itinerary.status.allows_event_mutation() {
        return Err(ApiError::invalid_state(format!(
            "Itinerary in status '{}' cannot be modified",
            itinerary.status.as_str()
        )));
    }
    Ok(())
}

/// Load the day skeleton with its events grouped per day, in day order.
async fn load_days_with_events(
    db: &PgPool,
    itinerary_id: Uuid,
) -> Result<Vec<DayWithEvents>, ApiError> {
    let days = sqlx::query_as::<_, DayRow>(
        "SELECT id, day_number, date FROM itinerary_days WHERE itinerary_id = $1 ORDER BY day_number",
    )
    .bind(itinerary_id)
    .fetch_all(db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let events = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        SELECT {EVENT_COLUMNS}
        FROM itinerary_events
        WHERE itinerary_id = $1
        ORDER BY start_time, created_at
        "#
    ))
    .bind(itinerary_id)
    .fetch_all(db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let mut by_day: HashMap<Uuid, Vec<EventResponse>> = HashMap::new();
    for row in events {
        let event = ItineraryEvent::from(row);
        by_day.entry(event.day_id).or_default().push(event.into());
    }

    Ok(days
        .into_iter()
        .map(|day| DayWithEvents {
            id: day.id,
            day_number: day.day_number,
            date: day.date,
            events: by_day.remove(&day.id).unwrap_or_default(),
        })
        .collect())
}

async fn insert_days(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    itinerary_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), ApiError> {
    for (offset, date) in generate_day_dates(start_date, end_date).into_iter().enumerate() {
        sqlx::query("INSERT INTO itinerary_days (itinerary_id, day_number, date) VALUES ($1, $2, $3)")
            .bind(itinerary_id)
            .bind((offset + 1) as i32)
            .bind(date)
            .execute(&mut **tx)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    }
    Ok(())
}

/// POST /itineraries
///
/// Create an itinerary and generate its day skeleton in one transaction.
pub async fn create_itinerary(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CreateItineraryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        tenant_id = %req.tenant_id,
        "Creating itinerary"
    );

    if req.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if req.adults < 0 || req.children < 0 {
        return Err(ApiError::validation("Traveler counts cannot be negative"));
    }
    if req.start_date > req.end_date {
        return Err(ApiError::validation("start_date must be on or before end_date"));
    }
    if !span_within_limit(req.start_date, req.end_date) {
        return Err(ApiError::validation(format!(
            "Itineraries are limited to {MAX_ITINERARY_DAYS} days"
        )));
    }

    let tenant: Option<Uuid> = sqlx::query_scalar("SELECT id FROM tenants WHERE id = $1")
        .bind(req.tenant_id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if tenant.is_none() {
        return Err(ApiError::validation("Unknown destination marketplace"));
    }

    // Exactly one owner column, matching the caller's context.
    let (agency_id, owner_profile_id) = match auth.agency_id {
        Some(agency_id) => (Some(agency_id), None),
        None => (None, Some(auth.user_id)),
    };

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let row = sqlx::query_as::<_, ItineraryRow>(&format!(
        r#"
        INSERT INTO itineraries
            (tenant_id, agency_id, owner_profile_id, title, adults, children,
             start_date, end_date, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {ITINERARY_COLUMNS}
        "#
    ))
    .bind(req.tenant_id)
    .bind(agency_id)
    .bind(owner_profile_id)
    .bind(req.title.trim())
    .bind(req.adults)
    .bind(req.children)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(&req.notes)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    insert_days(&mut tx, row.id, req.start_date, req.end_date).await?;

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let itinerary: Itinerary = row.into();
    let days = load_days_with_events(&state.db, itinerary.id).await?;
    let response = ItineraryDetailResponse::new(itinerary, days);

    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /itineraries
///
/// List itineraries visible to the caller, newest first.
pub async fn list_itineraries(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM itineraries
        WHERE ($1::uuid IS NOT NULL AND agency_id = $1) OR owner_profile_id = $2
        "#,
    )
    .bind(auth.agency_id)
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let rows = sqlx::query_as::<_, ItineraryRow>(&format!(
        r#"
        SELECT {ITINERARY_COLUMNS}
        FROM itineraries
        WHERE ($1::uuid IS NOT NULL AND agency_id = $1) OR owner_profile_id = $2
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(auth.agency_id)
    .bind(auth.user_id)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let data: Vec<ItineraryResponse> = rows
        .into_iter()
        .map(|row| ItineraryResponse::from(Itinerary::from(row)))
        .collect();

    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

/// GET /itineraries/:id
///
/// Itinerary detail with the full day/event breakdown.
pub async fn get_itinerary(
    State(state): State<Arc<AppState>>,
    Path(itinerary_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let itinerary = fetch_visible_itinerary(&state.db, itinerary_id, &auth).await?;
    let days = load_days_with_events(&state.db, itinerary_id).await?;

    Ok(Json(DataResponse::new(ItineraryDetailResponse::new(
        itinerary, days,
    ))))
}

/// PUT /itineraries/:id/dates
///
/// Change the date range and regenerate the day skeleton. Only legal while
/// the itinerary has no events, since regeneration would orphan them.
pub async fn update_dates(
    State(state): State<Arc<AppState>>,
    Path(itinerary_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<UpdateDatesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        "Updating itinerary dates"
    );

    if req.start_date > req.end_date {
        return Err(ApiError::validation("start_date must be on or before end_date"));
    }
    if !span_within_limit(req.start_date, req.end_date) {
        return Err(ApiError::validation(format!(
            "Itineraries are limited to {MAX_ITINERARY_DAYS} days"
        )));
    }

    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let row = sqlx::query_as::<_, ItineraryRow>(&format!(
        r#"
        SELECT {ITINERARY_COLUMNS}
        FROM itineraries
        WHERE id = $1
          AND (($2::uuid IS NOT NULL AND agency_id = $2) OR owner_profile_id = $3)
        FOR UPDATE
        "#
    ))
    .bind(itinerary_id)
    .bind(auth.agency_id)
    .bind(auth.user_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| ApiError::not_found("Itinerary not found"))?;

    let itinerary: Itinerary = row.into();

    let event_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM itinerary_events WHERE itinerary_id = $1")
            .bind(itinerary_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    // Locked check comes first: it applies in every status.
    if event_count > 0 {
        return Err(ApiError::ItineraryLocked(
            "Itinerary has events; remove them before changing dates".into(),
        ));
    }

    if itinerary.status.is_terminal() {
        return Err(ApiError::invalid_state(format!(
            "Itinerary in status '{}' cannot be modified",
            itinerary.status.as_str()
        )));
    }

    let updated = sqlx::query_as::<_, ItineraryRow>(&format!(
        r#"
        UPDATE itineraries
        SET start_date = $2, end_date = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING {ITINERARY_COLUMNS}
        "#
    ))
    .bind(itinerary_id)
    .bind(req.start_date)
    .bind(req.end_date)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    sqlx::query("DELETE FROM itinerary_days WHERE itinerary_id = $1")
        .bind(itinerary_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    insert_days(&mut tx, itinerary_id, req.start_date, req.end_date).await?;

    tx.commit()
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let itinerary: Itinerary = updated.into();
    let days = load_days_with_events(&state.db, itinerary_id).await?;

    Ok(Json(DataResponse::new(ItineraryDetailResponse::new(
        itinerary, days,
    ))))
}

/// DELETE /itineraries/:id
///
/// Delete an itinerary. Days, events, any RFQ and its segments and quote go
/// with it via cascade.
pub async fn delete_itinerary(
    State(state): State<Arc<AppState>>,
    Path(itinerary_id): Path<Uuid>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        "Deleting itinerary"
    );

    let result = sqlx::query(
        r#"
        DELETE FROM itineraries
        WHERE id = $1
          AND (($2::uuid IS NOT NULL AND agency_id = $2) OR owner_profile_id = $3)
        "#,
    )
    .bind(itinerary_id)
    .bind(auth.agency_id)
    .bind(auth.user_id)
    .execute(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Itinerary not found"));
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Itinerary deleted successfully")),
    ))
}

/// POST /itineraries/:id/events
///
/// Add an event to one of the itinerary's days. The stored category is the
/// explicit one from the request, or is derived once from the event type tag.
pub async fn add_event(
    State(state): State<Arc<AppState>>,
    Path(itinerary_id): Path<Uuid>,
    auth: RequireAuth,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        "Adding itinerary event"
    );

    let itinerary = fetch_visible_itinerary(&state.db, itinerary_id, &auth).await?;
    ensure_events_mutable(&itinerary)?;

    if req.summary.trim().is_empty() {
        return Err(ApiError::validation("Summary is required"));
    }
    if req.event_type.trim().is_empty() {
        return Err(ApiError::validation("Event type is required"));
    }
    if req.quantity < 1 {
        return Err(ApiError::validation("Quantity must be at least 1"));
    }

    // The day must belong to this itinerary.
    let day: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM itinerary_days WHERE id = $1 AND itinerary_id = $2")
            .bind(req.day_id)
            .bind(itinerary_id)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;
    if day.is_none() {
        return Err(ApiError::not_found("Day not found on this itinerary"));
    }

    if let Some(supplier_id) = req.supplier_id {
        verify_supplier_hint(&state.db, supplier_id, itinerary.tenant_id).await?;
    }

    let category = req.resolved_category();

    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        INSERT INTO itinerary_events
            (tenant_id, itinerary_id, day_id, category, event_type, summary, details,
             start_time, end_time, supplier_id, quantity, unit)
        VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '{{}}'::jsonb), $8, $9, $10, $11, $12)
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(itinerary.tenant_id)
    .bind(itinerary_id)
    .bind(req.day_id)
    .bind(category.as_str())
    .bind(req.event_type.trim())
    .bind(req.summary.trim())
    .bind(&req.details)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(req.supplier_id)
    .bind(req.quantity)
    .bind(&req.unit)
    .fetch_one(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    let response: EventResponse = ItineraryEvent::from(row).into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// PUT /itineraries/:id/events/:event_id
///
/// Partial update of an event. The stored category only changes when the
/// request names one; editing the event type tag never re-derives it.
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path((itinerary_id, event_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
    Json(req): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        event_id = %event_id,
        "Updating itinerary event"
    );

    let itinerary = fetch_visible_itinerary(&state.db, itinerary_id, &auth).await?;
    ensure_events_mutable(&itinerary)?;

    if let Some(quantity) = req.quantity {
        if quantity < 1 {
            return Err(ApiError::validation("Quantity must be at least 1"));
        }
    }
    if let Some(ref summary) = req.summary {
        if summary.trim().is_empty() {
            return Err(ApiError::validation("Summary cannot be empty"));
        }
    }
    if let Some(ref event_type) = req.event_type {
        if event_type.trim().is_empty() {
            return Err(ApiError::validation("Event type cannot be empty"));
        }
    }
    if let Some(supplier_id) = req.supplier_id {
        verify_supplier_hint(&state.db, supplier_id, itinerary.tenant_id).await?;
    }

    let category = req.category.map(|c| c.as_str());

    let row = sqlx::query_as::<_, EventRow>(&format!(
        r#"
        UPDATE itinerary_events SET
            category = COALESCE($3, category),
            event_type = COALESCE($4, event_type),
            summary = COALESCE($5, summary),
            details = COALESCE($6, details),
            start_time = COALESCE($7, start_time),
            end_time = COALESCE($8, end_time),
            supplier_id = COALESCE($9, supplier_id),
            quantity = COALESCE($10, quantity),
            unit = COALESCE($11, unit),
            updated_at = NOW()
        WHERE id = $1 AND itinerary_id = $2
        RETURNING {EVENT_COLUMNS}
        "#
    ))
    .bind(event_id)
    .bind(itinerary_id)
    .bind(category)
    .bind(&req.event_type)
    .bind(&req.summary)
    .bind(&req.details)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(req.supplier_id)
    .bind(req.quantity)
    .bind(&req.unit)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?
    .ok_or_else(|| ApiError::not_found("Event not found on this itinerary"))?;

    let response: EventResponse = ItineraryEvent::from(row).into();
    Ok(Json(DataResponse::new(response)))
}

/// DELETE /itineraries/:id/events/:event_id
///
/// Delete an event.
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path((itinerary_id, event_id)): Path<(Uuid, Uuid)>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        itinerary_id = %itinerary_id,
        event_id = %event_id,
        "Deleting itinerary event"
    );

    let itinerary = fetch_visible_itinerary(&state.db, itinerary_id, &auth).await?;
    ensure_events_mutable(&itinerary)?;

    let result = sqlx::query("DELETE FROM itinerary_events WHERE id = $1 AND itinerary_id = $2")
        .bind(event_id)
        .bind(itinerary_id)
        .execute(&state.db)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Event not found on this itinerary"));
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Event deleted successfully")),
    ))
}

/// Supplier hints must point at a catalog row in the itinerary's marketplace.
async fn verify_supplier_hint(
    db: &PgPool,
    supplier_id: Uuid,
    tenant_id: Uuid,
) -> Result<(), ApiError> {
    let supplier = catalog::supplier_by_id(db, supplier_id)
        .await
        .map_err(|e| ApiError::internal(format!("Database error: {}", e)))?;

    match supplier {
        Some(s) if s.tenant_id == tenant_id => Ok(()),
        _ => Err(ApiError::validation(
            "Unknown supplier for this marketplace",
        )),
    }
}
