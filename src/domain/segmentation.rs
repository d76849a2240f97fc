//! Segmentation engine: buckets itinerary events by supplier category and
//! fans each non-empty bucket out to every matching supplier in the tenant.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::events::EventCategory;
use super::suppliers::{Supplier, SupplierType};

/// Immutable event snapshot carried inside segment payloads. Suppliers quote
/// against this copy; later event edits do not rewrite issued segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event_id: Uuid,
    pub day_number: i32,
    pub date: NaiveDate,
    pub category: EventCategory,
    pub event_type: String,
    pub summary: String,
    pub details: serde_json::Value,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub supplier_id: Option<Uuid>,
    pub quantity: i32,
    pub unit: Option<String>,
}

/// Events grouped by the supplier category that quotes them.
#[derive(Debug, Default)]
pub struct EventBuckets {
    pub buckets: BTreeMap<SupplierType, Vec<EventSnapshot>>,
    /// Events whose stored category maps to no supplier type. They are
    /// skipped by segmentation and end up in no segment.
    pub uncategorized: usize,
}

impl EventBuckets {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Supplier types with at least one matched event, in stable order.
    pub fn supplier_types(&self) -> Vec<SupplierType> {
        self.buckets.keys().copied().collect()
    }
}

/// Group events by their stored category's supplier type. Reads only the
/// persisted category; tags are never re-inferred here.
pub fn bucket_events(events: Vec<EventSnapshot>) -> EventBuckets {
    let mut out = EventBuckets::default();

    for event in events {
        match event.category.supplier_type() {
            Some(supplier_type) => out.buckets.entry(supplier_type).or_default().push(event),
            None => out.uncategorized += 1,
        }
    }

    out
}

/// One segment to be created: a supplier and the full event snapshot of its
/// category's bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedSegment {
    pub supplier_type: SupplierType,
    pub supplier_id: Uuid,
    pub events: Vec<EventSnapshot>,
}

/// Cross every non-empty bucket with every supplier of its type. Every
/// supplier of a type receives the same complete sub-itinerary; a bucket with
/// no registered suppliers produces no segments.
pub fn plan_segments(
    buckets: &EventBuckets,
    suppliers_by_type: &BTreeMap<SupplierType, Vec<Supplier>>,
) -> Vec<PlannedSegment> {
    let mut planned = Vec::new();

    for (supplier_type, events) in &buckets.buckets {
        let Some(suppliers) = suppliers_by_type.get(supplier_type) else {
            continue;
        };

        for supplier in suppliers {
            planned.push(PlannedSegment {
                supplier_type: *supplier_type,
                supplier_id: supplier.id,
                events: events.clone(),
            });
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(category: EventCategory, summary: &str) -> EventSnapshot {
        EventSnapshot {
            event_id: Uuid::new_v4(),
            day_number: 1,
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            category,
            event_type: String::new(),
            summary: summary.into(),
            details: serde_json::json!({}),
            start_time: None,
            end_time: None,
            supplier_id: None,
            quantity: 1,
            unit: None,
        }
    }

    fn supplier(tenant_id: Uuid, supplier_type: SupplierType) -> Supplier {
        Supplier {
            id: Uuid::new_v4(),
            tenant_id,
            supplier_type,
            name: "s".into(),
            contact_email: None,
            owner_profile_id: None,
            active: true,
        }
    }

    #[test]
    fn events_bucket_by_stored_category() {
        let buckets = bucket_events(vec![
            snapshot(EventCategory::Transport, "airport pickup"),
            snapshot(EventCategory::Accommodation, "hotel night"),
            snapshot(EventCategory::Transport, "city transfer"),
            snapshot(EventCategory::SightEntry, "museum"),
        ]);

        assert_eq!(buckets.buckets[&SupplierType::Transport].len(), 2);
        assert_eq!(buckets.buckets[&SupplierType::Hotel].len(), 1);
        assert_eq!(buckets.buckets[&SupplierType::Sight].len(), 1);
        assert!(!buckets.buckets.contains_key(&SupplierType::Guide));
        assert_eq!(buckets.uncategorized, 0);
    }

    #[test]
    fn uncategorized_events_are_counted_not_bucketed() {
        let buckets = bucket_events(vec![
            snapshot(EventCategory::Uncategorized, "lunch"),
            snapshot(EventCategory::Uncategorized, "free time"),
            snapshot(EventCategory::Transport, "transfer"),
        ]);

        assert_eq!(buckets.uncategorized, 2);
        assert_eq!(buckets.supplier_types(), vec![SupplierType::Transport]);
    }

    #[test]
    fn no_events_means_empty_buckets() {
        let buckets = bucket_events(vec![]);
        assert!(buckets.is_empty());
        assert_eq!(buckets.uncategorized, 0);
    }

    #[test]
    fn fan_out_creates_one_segment_per_supplier_with_identical_payload() {
        let tenant = Uuid::new_v4();
        let buckets = bucket_events(vec![
            snapshot(EventCategory::Transport, "transfer a"),
            snapshot(EventCategory::Transport, "transfer b"),
        ]);

        let mut suppliers_by_type = BTreeMap::new();
        suppliers_by_type.insert(
            SupplierType::Transport,
            vec![
                supplier(tenant, SupplierType::Transport),
                supplier(tenant, SupplierType::Transport),
                supplier(tenant, SupplierType::Transport),
            ],
        );

        let planned = plan_segments(&buckets, &suppliers_by_type);

        assert_eq!(planned.len(), 3);
        for segment in &planned {
            assert_eq!(segment.supplier_type, SupplierType::Transport);
            // Every supplier sees the same complete sub-itinerary.
            assert_eq!(segment.events, planned[0].events);
            assert_eq!(segment.events.len(), 2);
        }

        let mut ids: Vec<Uuid> = planned.iter().map(|p| p.supplier_id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn bucket_without_suppliers_produces_no_segments() {
        let buckets = bucket_events(vec![snapshot(EventCategory::GuidedActivity, "tour")]);
        let suppliers_by_type = BTreeMap::new();

        assert!(plan_segments(&buckets, &suppliers_by_type).is_empty());
    }

    #[test]
    fn suppliers_without_matching_events_produce_no_segments() {
        let tenant = Uuid::new_v4();
        let buckets = bucket_events(vec![snapshot(EventCategory::Transport, "transfer")]);

        let mut suppliers_by_type = BTreeMap::new();
        suppliers_by_type.insert(
            SupplierType::Hotel,
            vec![supplier(tenant, SupplierType::Hotel)],
        );

        assert!(plan_segments(&buckets, &suppliers_by_type).is_empty());
    }

    #[test]
    fn mixed_buckets_fan_out_independently() {
        let tenant = Uuid::new_v4();
        let buckets = bucket_events(vec![
            snapshot(EventCategory::Transport, "transfer"),
            snapshot(EventCategory::Accommodation, "hotel"),
        ]);

        let mut suppliers_by_type = BTreeMap::new();
        suppliers_by_type.insert(
            SupplierType::Transport,
            vec![
                supplier(tenant, SupplierType::Transport),
                supplier(tenant, SupplierType::Transport),
            ],
        );
        suppliers_by_type.insert(
            SupplierType::Hotel,
            vec![supplier(tenant, SupplierType::Hotel)],
        );

        let planned = plan_segments(&buckets, &suppliers_by_type);

        let transport = planned
            .iter()
            .filter(|p| p.supplier_type == SupplierType::Transport)
            .count();
        let hotel = planned
            .iter()
            .filter(|p| p.supplier_type == SupplierType::Hotel)
            .count();
        assert_eq!((transport, hotel), (2, 1));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let original = snapshot(EventCategory::SightEntry, "temple entry");
        let value = serde_json::to_value(vec![original.clone()]).unwrap();
        let back: Vec<EventSnapshot> = serde_json::from_value(value).unwrap();
        assert_eq!(back, vec![original]);
    }
}
