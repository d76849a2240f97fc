//! Notification domain types
//!
//! In-app notification system for workflow alerts.

use serde::{Deserialize, Serialize};

/// Notification type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    // Supplier side
    QuoteRequested,
    SegmentAccepted,
    SegmentRejected,

    // Agency side
    ProposalReceived,
    QuoteCompiled,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).unwrap_or_default();
        write!(f, "{}", s.trim_matches('"'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_column_encoding() {
        assert_eq!(
            NotificationType::QuoteRequested.to_string(),
            "quote_requested"
        );
        assert_eq!(
            NotificationType::ProposalReceived.to_string(),
            "proposal_received"
        );
        assert_eq!(
            NotificationType::SegmentAccepted.to_string(),
            "segment_accepted"
        );
        assert_eq!(
            NotificationType::SegmentRejected.to_string(),
            "segment_rejected"
        );
        assert_eq!(NotificationType::QuoteCompiled.to_string(), "quote_compiled");
    }
}
