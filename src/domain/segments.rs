use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::suppliers::SupplierType;

/// Per-segment lifecycle status.
///
/// `supplier_review` is a legacy intermediate state; nothing here transitions
/// into it, but rows carrying it (from data migration) may still be proposed
/// from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    Pending,
    SupplierReview,
    SupplierProposed,
    Accepted,
    Rejected,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::SupplierReview => "supplier_review",
            Self::SupplierProposed => "supplier_proposed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "supplier_review" => Some(Self::SupplierReview),
            "supplier_proposed" => Some(Self::SupplierProposed),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// States a supplier may submit a proposal from.
    pub fn can_propose(&self) -> bool {
        matches!(self, Self::Pending | Self::SupplierReview)
    }

    /// States the agency may decide from.
    pub fn can_decide(&self) -> bool {
        matches!(self, Self::SupplierProposed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

/// Agency decision on a proposed segment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentDecision {
    Accepted,
    Rejected,
}

impl SegmentDecision {
    pub fn target_status(&self) -> SegmentStatus {
        match self {
            Self::Accepted => SegmentStatus::Accepted,
            Self::Rejected => SegmentStatus::Rejected,
        }
    }
}

/// RFQ segment entity: one supplier's view of one category of an itinerary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfqSegment {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub tenant_id: Uuid,
    pub supplier_type: SupplierType,
    pub supplier_id: Uuid,
    pub payload: serde_json::Value,
    pub status: SegmentStatus,
    pub supplier_notes: Option<String>,
    pub proposed_price: Option<Decimal>,
    pub proposed_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for a supplier price proposal
#[derive(Debug, Clone, Deserialize)]
pub struct ProposeQuoteRequest {
    pub proposed_price: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for the agency decision on a proposed segment
#[derive(Debug, Clone, Deserialize)]
pub struct DecideSegmentRequest {
    pub decision: SegmentDecision,
}

/// Response DTO for a segment
#[derive(Debug, Clone, Serialize)]
pub struct SegmentResponse {
    pub id: Uuid,
    pub rfq_id: Uuid,
    pub supplier_type: SupplierType,
    pub supplier_id: Uuid,
    pub payload: serde_json::Value,
    pub status: SegmentStatus,
    pub supplier_notes: Option<String>,
    pub proposed_price: Option<Decimal>,
    pub proposed_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RfqSegment> for SegmentResponse {
    fn from(s: RfqSegment) -> Self {
        Self {
            id: s.id,
            rfq_id: s.rfq_id,
            supplier_type: s.supplier_type,
            supplier_id: s.supplier_id,
            payload: s.payload,
            status: s.status,
            supplier_notes: s.supplier_notes,
            proposed_price: s.proposed_price,
            proposed_at: s.proposed_at,
            decided_at: s.decided_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SegmentStatus; 5] = [
        SegmentStatus::Pending,
        SegmentStatus::SupplierReview,
        SegmentStatus::SupplierProposed,
        SegmentStatus::Accepted,
        SegmentStatus::Rejected,
    ];

    #[test]
    fn propose_is_legal_exactly_from_pending_and_review() {
        for status in ALL {
            let expected = matches!(
                status,
                SegmentStatus::Pending | SegmentStatus::SupplierReview
            );
            assert_eq!(status.can_propose(), expected, "{:?}", status);
        }
    }

    #[test]
    fn decide_is_legal_exactly_from_proposed() {
        for status in ALL {
            assert_eq!(
                status.can_decide(),
                status == SegmentStatus::SupplierProposed,
                "{:?}",
                status
            );
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for status in [SegmentStatus::Accepted, SegmentStatus::Rejected] {
            assert!(status.is_terminal());
            assert!(!status.can_propose());
            assert!(!status.can_decide());
        }
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(
            SegmentDecision::Accepted.target_status(),
            SegmentStatus::Accepted
        );
        assert_eq!(
            SegmentDecision::Rejected.target_status(),
            SegmentStatus::Rejected
        );
        assert!(SegmentDecision::Accepted.target_status().is_terminal());
    }

    #[test]
    fn status_round_trips_column_encoding() {
        for status in ALL {
            assert_eq!(SegmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SegmentStatus::parse("withdrawn"), None);
    }
}
