//! Notification service
//!
//! Provides functions to create notifications from other parts of the application.
//! This service is called by routes when workflow events occur. Callers treat
//! failures as non-fatal: a lost notification never rolls back a committed
//! workflow step.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::notifications::NotificationType;

/// Create a notification for a profile
pub async fn create_notification(
    db: &PgPool,
    profile_id: Uuid,
    notification_type: NotificationType,
    title: &str,
    message: Option<&str>,
    data: Option<serde_json::Value>,
) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    let type_str = notification_type.to_string();
    let data = data.unwrap_or(serde_json::json!({}));

    sqlx::query(
        r#"
        INSERT INTO notifications (id, profile_id, type, title, message, data)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(&type_str)
    .bind(title)
    .bind(message)
    .bind(&data)
    .execute(db)
    .await?;

    tracing::info!(
        profile_id = %profile_id,
        notification_type = %type_str,
        notification_id = %id,
        "Notification created"
    );

    Ok(id)
}

/// Notify a supplier owner that a new segment awaits their quote
pub async fn notify_quote_requested(
    db: &PgPool,
    owner_profile_id: Uuid,
    segment_id: Uuid,
    rfq_id: Uuid,
    supplier_name: &str,
    itinerary_title: &str,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        owner_profile_id,
        NotificationType::QuoteRequested,
        &format!("New quote request for {}", supplier_name),
        Some(&format!(
            "A travel agency requests a quote from {} for the itinerary '{}'.",
            supplier_name, itinerary_title
        )),
        Some(serde_json::json!({
            "segment_id": segment_id,
            "rfq_id": rfq_id,
            "supplier_name": supplier_name,
            "itinerary_title": itinerary_title,
        })),
    )
    .await
}

/// Notify the requesting contact that a supplier submitted a proposal
pub async fn notify_proposal_received(
    db: &PgPool,
    contact_profile_id: Uuid,
    segment_id: Uuid,
    rfq_id: Uuid,
    supplier_name: &str,
    proposed_price: Decimal,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        contact_profile_id,
        NotificationType::ProposalReceived,
        &format!("New proposal from {}", supplier_name),
        Some(&format!(
            "{} proposed a price of {} for their segment.",
            supplier_name, proposed_price
        )),
        Some(serde_json::json!({
            "segment_id": segment_id,
            "rfq_id": rfq_id,
            "supplier_name": supplier_name,
            "proposed_price": proposed_price,
        })),
    )
    .await
}

/// Notify a supplier owner of the agency's decision on their segment
pub async fn notify_segment_decided(
    db: &PgPool,
    owner_profile_id: Uuid,
    segment_id: Uuid,
    rfq_id: Uuid,
    supplier_name: &str,
    accepted: bool,
) -> Result<Uuid, sqlx::Error> {
    let (notification_type, title, message) = if accepted {
        (
            NotificationType::SegmentAccepted,
            format!("Proposal accepted for {}", supplier_name),
            format!(
                "The agency accepted the proposal from {}. It will be part of the final quote.",
                supplier_name
            ),
        )
    } else {
        (
            NotificationType::SegmentRejected,
            format!("Proposal not selected for {}", supplier_name),
            format!(
                "The agency did not select the proposal from {} this time.",
                supplier_name
            ),
        )
    };

    create_notification(
        db,
        owner_profile_id,
        notification_type,
        &title,
        Some(&message),
        Some(serde_json::json!({
            "segment_id": segment_id,
            "rfq_id": rfq_id,
            "supplier_name": supplier_name,
            "accepted": accepted,
        })),
    )
    .await
}

/// Notify the requesting contact that their quote document is ready
pub async fn notify_quote_compiled(
    db: &PgPool,
    contact_profile_id: Uuid,
    rfq_id: Uuid,
    quote_id: Uuid,
    currency: &str,
    total: Decimal,
) -> Result<Uuid, sqlx::Error> {
    create_notification(
        db,
        contact_profile_id,
        NotificationType::QuoteCompiled,
        "Your quote is ready",
        Some(&format!("The compiled quote totals {} {}.", total, currency)),
        Some(serde_json::json!({
            "rfq_id": rfq_id,
            "quote_id": quote_id,
            "currency": currency,
            "total": total,
        })),
    )
    .await
}
