//! intern-match: storage layer matching startups offering internships with students.
//!
//! Hexagonal layout: domain rules, ports, storage adapters, repository use cases.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
