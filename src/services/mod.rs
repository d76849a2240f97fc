//! Service layer modules for external integrations.
//!
//! Contains the Redis cache client, the supplier catalog read side, and the
//! notification service.

pub mod cache;
pub mod catalog;
pub mod notifications;

pub use cache::RedisCache;
#[allow(unused_imports)]
pub use notifications::*;
