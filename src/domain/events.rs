use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::suppliers::SupplierType;

/// Event category stored on every itinerary event.
///
/// Set explicitly by the client, or derived once at creation time from the
/// free-text event type tag (legacy keyword mapping). Stored rows are never
/// re-classified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Transport,
    Accommodation,
    GuidedActivity,
    SightEntry,
    Uncategorized,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::Accommodation => "accommodation",
            Self::GuidedActivity => "guided_activity",
            Self::SightEntry => "sight_entry",
            Self::Uncategorized => "uncategorized",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transport" => Some(Self::Transport),
            "accommodation" => Some(Self::Accommodation),
            "guided_activity" => Some(Self::GuidedActivity),
            "sight_entry" => Some(Self::SightEntry),
            "uncategorized" => Some(Self::Uncategorized),
            _ => None,
        }
    }

    /// Legacy keyword mapping over the free-text event type tag.
    /// Case-insensitive substring match; unmatched tags are `Uncategorized`.
    pub fn from_legacy_tag(tag: &str) -> Self {
        let tag = tag.to_lowercase();
        if tag.contains("transfer") || tag.contains("transport") {
            Self::Transport
        } else if tag.contains("accommodation") || tag.contains("hotel") {
            Self::Accommodation
        } else if tag.contains("tour") || tag.contains("guide") {
            Self::GuidedActivity
        } else if tag.contains("sight") || tag.contains("attraction") {
            Self::SightEntry
        } else {
            Self::Uncategorized
        }
    }

    /// The supplier category that quotes events of this category.
    /// `Uncategorized` events are not quoted by anyone.
    pub fn supplier_type(&self) -> Option<SupplierType> {
        match self {
            Self::Transport => Some(SupplierType::Transport),
            Self::Accommodation => Some(SupplierType::Hotel),
            Self::GuidedActivity => Some(SupplierType::Guide),
            Self::SightEntry => Some(SupplierType::Sight),
            Self::Uncategorized => None,
        }
    }
}

/// Itinerary event entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub itinerary_id: Uuid,
    pub day_id: Uuid,
    pub category: EventCategory,
    pub event_type: String,
    pub summary: String,
    pub details: serde_json::Value,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_quantity() -> i32 {
    1
}

/// Request DTO for adding an event to an itinerary day
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub day_id: Uuid,
    #[serde(default)]
    pub category: Option<EventCategory>,
    pub event_type: String,
    pub summary: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(default)]
    pub unit: Option<String>,
}

impl CreateEventRequest {
    /// Category to persist: the explicit one, else the legacy tag mapping.
    pub fn resolved_category(&self) -> EventCategory {
        self.category
            .unwrap_or_else(|| EventCategory::from_legacy_tag(&self.event_type))
    }
}

/// Request DTO for updating an event
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub category: Option<EventCategory>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Response DTO for an event
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub itinerary_id: Uuid,
    pub day_id: Uuid,
    pub category: EventCategory,
    pub event_type: String,
    pub summary: String,
    pub details: serde_json::Value,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItineraryEvent> for EventResponse {
    fn from(e: ItineraryEvent) -> Self {
        Self {
            id: e.id,
            itinerary_id: e.itinerary_id,
            day_id: e.day_id,
            category: e.category,
            event_type: e.event_type,
            summary: e.summary,
            details: e.details,
            start_time: e.start_time,
            end_time: e.end_time,
            supplier_id: e.supplier_id,
            quantity: e.quantity,
            unit: e.unit,
            created_at: e.created_at,
            updated_at: e.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_tag_mapping_covers_each_token_family() {
        assert_eq!(
            EventCategory::from_legacy_tag("transport_transfer"),
            EventCategory::Transport
        );
        assert_eq!(
            EventCategory::from_legacy_tag("airport transfer"),
            EventCategory::Transport
        );
        assert_eq!(
            EventCategory::from_legacy_tag("accommodation"),
            EventCategory::Accommodation
        );
        assert_eq!(
            EventCategory::from_legacy_tag("Hotel check-in"),
            EventCategory::Accommodation
        );
        assert_eq!(
            EventCategory::from_legacy_tag("guided_tour"),
            EventCategory::GuidedActivity
        );
        assert_eq!(
            EventCategory::from_legacy_tag("city guide walk"),
            EventCategory::GuidedActivity
        );
        assert_eq!(
            EventCategory::from_legacy_tag("sight_entry"),
            EventCategory::SightEntry
        );
        assert_eq!(
            EventCategory::from_legacy_tag("ATTRACTION ticket"),
            EventCategory::SightEntry
        );
    }

    #[test]
    fn legacy_tag_mapping_defaults_to_uncategorized() {
        assert_eq!(
            EventCategory::from_legacy_tag("lunch_break"),
            EventCategory::Uncategorized
        );
        assert_eq!(
            EventCategory::from_legacy_tag(""),
            EventCategory::Uncategorized
        );
    }

    #[test]
    fn explicit_category_wins_over_tag_inference() {
        let req = CreateEventRequest {
            day_id: Uuid::new_v4(),
            category: Some(EventCategory::SightEntry),
            event_type: "transport_transfer".into(),
            summary: "Museum entry".into(),
            details: None,
            start_time: None,
            end_time: None,
            supplier_id: None,
            quantity: 1,
            unit: None,
        };
        assert_eq!(req.resolved_category(), EventCategory::SightEntry);
    }

    #[test]
    fn category_round_trips_column_encoding() {
        for category in [
            EventCategory::Transport,
            EventCategory::Accommodation,
            EventCategory::GuidedActivity,
            EventCategory::SightEntry,
            EventCategory::Uncategorized,
        ] {
            assert_eq!(EventCategory::parse(category.as_str()), Some(category));
        }
        assert_eq!(EventCategory::parse("dining"), None);
    }

    #[test]
    fn uncategorized_has_no_supplier_type() {
        assert_eq!(EventCategory::Uncategorized.supplier_type(), None);
        assert_eq!(
            EventCategory::Accommodation.supplier_type(),
            Some(SupplierType::Hotel)
        );
    }
}
