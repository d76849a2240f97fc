//! Domain types and DTOs
//!
//! These types define the data structures for TripForge entities plus the
//! pure workflow logic (segmentation, transition tables, quote arithmetic).

#![allow(dead_code)]

pub mod events;
pub mod itineraries;
pub mod notifications;
pub mod quotes;
pub mod rfqs;
pub mod segmentation;
pub mod segments;
pub mod suppliers;

// Re-export commonly used types
pub use events::*;
pub use itineraries::*;
pub use quotes::*;
pub use rfqs::*;
pub use segmentation::*;
pub use segments::*;
pub use suppliers::*;

// Notification types are accessed via crate::domain::notifications:: to avoid
// namespace pollution
