use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::itineraries::ItineraryStatus;
use super::segments::SegmentResponse;

/// RFQ status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    Open,
    InProgress,
    SupplierPending,
    Quoted,
    Declined,
}

impl Default for RfqStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl RfqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::SupplierPending => "supplier_pending",
            Self::Quoted => "quoted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "supplier_pending" => Some(Self::SupplierPending),
            "quoted" => Some(Self::Quoted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Quoted | Self::Declined)
    }
}

/// Whether an optional deadline has passed. Absent deadlines never expire.
pub fn is_expired(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    matches!(expires_at, Some(deadline) if deadline < now)
}

/// RFQ entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rfq {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub itinerary_id: Uuid,
    pub agency_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub status: RfqStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for generating an RFQ from an itinerary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestQuoteRequest {
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response DTO for an RFQ
#[derive(Debug, Clone, Serialize)]
pub struct RfqResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub itinerary_id: Uuid,
    pub agency_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub status: RfqStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub segment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short itinerary projection embedded in RFQ detail responses
#[derive(Debug, Clone, Serialize)]
pub struct RfqItinerarySummary {
    pub id: Uuid,
    pub title: String,
    pub adults: i32,
    pub children: i32,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub status: ItineraryStatus,
}

/// Response DTO for an RFQ with its segments
#[derive(Debug, Clone, Serialize)]
pub struct RfqDetailResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub itinerary_id: Uuid,
    pub agency_id: Uuid,
    pub requested_by: Option<Uuid>,
    pub status: RfqStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub itinerary: RfqItinerarySummary,
    pub segments: Vec<SegmentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn past_deadline_expires() {
        let now = Utc::now();
        assert!(is_expired(Some(now - Duration::hours(1)), now));
    }

    #[test]
    fn future_deadline_does_not_expire() {
        let now = Utc::now();
        assert!(!is_expired(Some(now + Duration::hours(1)), now));
    }

    #[test]
    fn absent_deadline_never_expires() {
        assert!(!is_expired(None, Utc::now()));
    }

    #[test]
    fn status_round_trips_column_encoding() {
        for status in [
            RfqStatus::Open,
            RfqStatus::InProgress,
            RfqStatus::SupplierPending,
            RfqStatus::Quoted,
            RfqStatus::Declined,
        ] {
            assert_eq!(RfqStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RfqStatus::parse("closed"), None);
    }

    #[test]
    fn quoted_and_declined_are_terminal() {
        assert!(RfqStatus::Quoted.is_terminal());
        assert!(RfqStatus::Declined.is_terminal());
        assert!(!RfqStatus::Open.is_terminal());
        assert!(!RfqStatus::InProgress.is_terminal());
        assert!(!RfqStatus::SupplierPending.is_terminal());
    }
}
