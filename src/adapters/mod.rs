//! Infrastructure adapters. Implement outbound ports.
//!
//! Storage backends and clocks. Map errors to DomainError.

pub mod clock;
pub mod persistence;

pub use clock::{FixedClock, SystemClock};
