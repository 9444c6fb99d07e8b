//! Port traits. API boundaries for the hexagon.
//!
//! - Outbound: Called by application into infrastructure (storage, time)

pub mod outbound;

pub use outbound::{Clock, KvStore};
