use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::EventResponse;

/// Itinerary status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItineraryStatus {
    Draft,
    Requested,
    Quoted,
    Expired,
    Canceled,
}

impl Default for ItineraryStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl ItineraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Requested => "requested",
            Self::Quoted => "quoted",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "requested" => Some(Self::Requested),
            "quoted" => Some(Self::Quoted),
            "expired" => Some(Self::Expired),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Terminal statuses are set externally and reject all mutation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Canceled)
    }

    /// Event mutation is allowed before a quote exists.
    pub fn allows_event_mutation(&self) -> bool {
        matches!(self, Self::Draft | Self::Requested)
    }
}

/// Itinerary entity. Owned by exactly one of agency / individual profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub agency_id: Option<Uuid>,
    pub owner_profile_id: Option<Uuid>,
    pub title: String,
    pub adults: i32,
    pub children: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: ItineraryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Itinerary day entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub id: Uuid,
    pub itinerary_id: Uuid,
    pub day_number: i32,
    pub date: NaiveDate,
}

/// Longest date range an itinerary may span. Bounds the generated day
/// skeleton.
pub const MAX_ITINERARY_DAYS: i64 = 365;

/// Number of days covered by [start, end] inclusive. Non-positive when the
/// range is inverted.
pub fn day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Whether [start, end] fits inside the day cap.
pub fn span_within_limit(start: NaiveDate, end: NaiveDate) -> bool {
    day_count(start, end) <= MAX_ITINERARY_DAYS
}

/// Dates for the 1-based day sequence covering [start, end] inclusive;
/// day n is dated start + (n - 1). Empty for an inverted range.
pub fn generate_day_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let count = day_count(start, end).max(0);
    (0..count).map(|n| start + Duration::days(n)).collect()
}

/// Request DTO for creating an itinerary
#[derive(Debug, Clone, Deserialize)]
pub struct CreateItineraryRequest {
    pub tenant_id: Uuid,
    pub title: String,
    pub adults: i32,
    #[serde(default)]
    pub children: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for changing an itinerary's date range
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDatesRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Response DTO for an itinerary
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub agency_id: Option<Uuid>,
    pub owner_profile_id: Option<Uuid>,
    pub title: String,
    pub adults: i32,
    pub children: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: ItineraryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Itinerary> for ItineraryResponse {
    fn from(i: Itinerary) -> Self {
        Self {
            id: i.id,
            tenant_id: i.tenant_id,
            agency_id: i.agency_id,
            owner_profile_id: i.owner_profile_id,
            title: i.title,
            adults: i.adults,
            children: i.children,
            start_date: i.start_date,
            end_date: i.end_date,
            notes: i.notes,
            status: i.status,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

/// One day with its events, for the detail view
#[derive(Debug, Clone, Serialize)]
pub struct DayWithEvents {
    pub id: Uuid,
    pub day_number: i32,
    pub date: NaiveDate,
    pub events: Vec<EventResponse>,
}

/// Response DTO for an itinerary with its full day/event breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryDetailResponse {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub agency_id: Option<Uuid>,
    pub owner_profile_id: Option<Uuid>,
    pub title: String,
    pub adults: i32,
    pub children: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
    pub status: ItineraryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub days: Vec<DayWithEvents>,
}

impl ItineraryDetailResponse {
    pub fn new(itinerary: Itinerary, days: Vec<DayWithEvents>) -> Self {
        Self {
            id: itinerary.id,
            tenant_id: itinerary.tenant_id,
            agency_id: itinerary.agency_id,
            owner_profile_id: itinerary.owner_profile_id,
            title: itinerary.title,
            adults: itinerary.adults,
            children: itinerary.children,
            start_date: itinerary.start_date,
            end_date: itinerary.end_date,
            notes: itinerary.notes,
            status: itinerary.status,
            created_at: itinerary.created_at,
            updated_at: itinerary.updated_at,
            days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_range_yields_one_day() {
        let d = date(2026, 6, 1);
        assert_eq!(day_count(d, d), 1);
        assert_eq!(generate_day_dates(d, d), vec![d]);
    }

    #[test]
    fn multi_day_range_is_sequential_from_start() {
        let start = date(2026, 6, 1);
        let end = date(2026, 6, 4);
        let dates = generate_day_dates(start, end);

        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], start);
        assert_eq!(dates[3], end);
        for (n, d) in dates.iter().enumerate() {
            assert_eq!(*d, start + Duration::days(n as i64));
        }
    }

    #[test]
    fn range_crossing_month_boundary() {
        let dates = generate_day_dates(date(2026, 1, 30), date(2026, 2, 2));
        assert_eq!(
            dates,
            vec![
                date(2026, 1, 30),
                date(2026, 1, 31),
                date(2026, 2, 1),
                date(2026, 2, 2),
            ]
        );
    }

    #[test]
    fn inverted_range_yields_nothing() {
        assert!(day_count(date(2026, 6, 2), date(2026, 6, 1)) <= 0);
        assert!(generate_day_dates(date(2026, 6, 2), date(2026, 6, 1)).is_empty());
    }

    #[test]
    fn span_cap_admits_a_full_year() {
        let start = date(2026, 1, 1);
        let end = start + Duration::days(MAX_ITINERARY_DAYS - 1);
        assert!(span_within_limit(start, end));
        assert!(!span_within_limit(start, end + Duration::days(1)));
    }

    #[test]
    fn span_cap_rejects_extreme_date_ranges() {
        assert!(!span_within_limit(date(1, 1, 1), date(9999, 12, 31)));
    }

    #[test]
    fn terminal_statuses_reject_mutation() {
        assert!(ItineraryStatus::Expired.is_terminal());
        assert!(ItineraryStatus::Canceled.is_terminal());
        assert!(!ItineraryStatus::Draft.is_terminal());
        assert!(!ItineraryStatus::Requested.is_terminal());
        assert!(!ItineraryStatus::Quoted.is_terminal());
    }

    #[test]
    fn event_mutation_allowed_until_quoted() {
        assert!(ItineraryStatus::Draft.allows_event_mutation());
        assert!(ItineraryStatus::Requested.allows_event_mutation());
        assert!(!ItineraryStatus::Quoted.allows_event_mutation());
        assert!(!ItineraryStatus::Expired.allows_event_mutation());
        assert!(!ItineraryStatus::Canceled.allows_event_mutation());
    }

    #[test]
    fn status_round_trips_column_encoding() {
        for status in [
            ItineraryStatus::Draft,
            ItineraryStatus::Requested,
            ItineraryStatus::Quoted,
            ItineraryStatus::Expired,
            ItineraryStatus::Canceled,
        ] {
            assert_eq!(ItineraryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItineraryStatus::parse("archived"), None);
    }
}
