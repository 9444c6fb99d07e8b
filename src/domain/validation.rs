//! Input rules checked before anything reaches storage.
//!
//! Each validator stops at the first failing rule. Cross-record checks
//! (does the startup exist?) belong to the repository, not here.

use crate::domain::entities::{
    ApplicationStatus, InternshipStatus, InternshipType, NewApplication, NewInternship, NewUser,
    UserType,
};
use crate::domain::DomainError;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_user(user: &NewUser) -> Result<(), DomainError> {
    if !is_valid_email(&user.email) {
        return Err(DomainError::validation("Invalid email format"));
    }
    if user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(
            "Password must be at least 8 characters long",
        ));
    }
    let user_type: UserType = user.user_type.parse()?;
    match user_type {
        UserType::Student if user.startup_data.is_some() => Err(DomainError::validation(
            "Startup profile is only allowed for startup accounts",
        )),
        UserType::Startup if user.student_data.is_some() => Err(DomainError::validation(
            "Student profile is only allowed for student accounts",
        )),
        _ => Ok(()),
    }
}

pub fn validate_internship(internship: &NewInternship) -> Result<(), DomainError> {
    if internship.title.trim().is_empty() {
        return Err(DomainError::validation("Internship title is required"));
    }
    if internship.description.trim().is_empty() {
        return Err(DomainError::validation("Internship description is required"));
    }
    if internship.startup_id.trim().is_empty() {
        return Err(DomainError::validation("Startup ID is required"));
    }
    internship.internship_type.parse::<InternshipType>()?;
    internship.status.parse::<InternshipStatus>()?;
    Ok(())
}

pub fn validate_application(application: &NewApplication) -> Result<(), DomainError> {
    if application.student_id.trim().is_empty() {
        return Err(DomainError::validation("Student ID is required"));
    }
    if application.internship_id.trim().is_empty() {
        return Err(DomainError::validation("Internship ID is required"));
    }
    application.status.parse::<ApplicationStatus>()?;
    Ok(())
}
