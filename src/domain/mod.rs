//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod ids;
pub mod validation;

pub use entities::{
    Answer, Application, ApplicationStatus, ApplicationUpdate, Entity, Internship,
    InternshipDetails, InternshipStatus, InternshipType, InternshipUpdate, NewApplication,
    NewInternship, NewUser, Skills, StartupData, StudentData, User, UserType, UserUpdate,
};
pub use errors::DomainError;
