//! Domain entities. Pure data structures for the core business.
//!
//! Stored records use the camelCase JSON layout of the persisted collections.
//! `New*` drafts are what callers submit: enum fields arrive as raw strings and
//! are only turned into typed values after validation.

use crate::domain::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Anything stored in a collection and addressed by id.
pub trait Entity {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Startup,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Startup => "startup",
        }
    }
}

impl FromStr for UserType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "startup" => Ok(Self::Startup),
            _ => Err(DomainError::validation("Invalid user type")),
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InternshipType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
}

impl InternshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "Full-time",
            Self::PartTime => "Part-time",
        }
    }
}

impl FromStr for InternshipType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Full-time" => Ok(Self::FullTime),
            "Part-time" => Ok(Self::PartTime),
            _ => Err(DomainError::validation("Invalid internship type")),
        }
    }
}

/// Canonical internship status. Dashboard records spell `Active` as "open";
/// that spelling is accepted on input and on read, and stored as "active".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternshipStatus {
    #[serde(alias = "open")]
    Active,
    Closed,
}

impl InternshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for InternshipStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" | "open" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            _ => Err(DomainError::validation("Invalid internship status")),
        }
    }
}

/// Canonical application status, including the `Waitlisted` state the startup
/// dashboard moves applications into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Waitlisted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Waitlisted => "waitlisted",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "waitlisted" => Ok(Self::Waitlisted),
            _ => Err(DomainError::validation("Invalid application status")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudentData {
    pub college: String,
    pub degree: String,
    pub year: String,
    pub skills: Vec<String>,
    pub bio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
}

/// Startup profile. Keys are stored in snake_case, as the onboarding form writes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupData {
    pub official_name: String,
    pub website_link: String,
    pub year_of_incorporation: String,
    pub location_city: String,
    pub founders_name: String,
    pub summary: String,
    pub domain: String,
    pub contact_mail: String,
    pub contact_number: String,
    pub logo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    /// Stored as submitted. Hashing is an unresolved requirement.
    pub password: String,
    pub user_type: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub onboarding_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_data: Option<StudentData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_data: Option<StartupData>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub user_type: String,
    pub name: Option<String>,
    pub onboarding_complete: bool,
    pub student_data: Option<StudentData>,
    pub startup_data: Option<StartupData>,
}

impl From<&User> for NewUser {
    fn from(u: &User) -> Self {
        Self {
            email: u.email.clone(),
            password: u.password.clone(),
            user_type: u.user_type.as_str().to_string(),
            name: u.name.clone(),
            onboarding_complete: u.onboarding_complete,
            student_data: u.student_data.clone(),
            startup_data: u.startup_data.clone(),
        }
    }
}

/// Partial user change. `None` keeps the stored value; the account type is fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub onboarding_complete: Option<bool>,
    pub student_data: Option<StudentData>,
    pub startup_data: Option<StartupData>,
}

impl UserUpdate {
    pub fn apply_to(self, user: &User) -> User {
        let mut out = user.clone();
        if let Some(v) = self.email {
            out.email = v;
        }
        if let Some(v) = self.password {
            out.password = v;
        }
        if self.name.is_some() {
            out.name = self.name;
        }
        if let Some(v) = self.onboarding_complete {
            out.onboarding_complete = v;
        }
        if self.student_data.is_some() {
            out.student_data = self.student_data;
        }
        if self.startup_data.is_some() {
            out.startup_data = self.startup_data;
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internships
// ─────────────────────────────────────────────────────────────────────────────

/// Required skills. Dashboard edits write them as one comma-separated string,
/// the posting form as a list; either shape is stored back as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Skills {
    List(Vec<String>),
    Text(String),
}

impl Skills {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for Skills {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl From<Vec<String>> for Skills {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// Descriptive internship fields. Carried as-is; nothing here is validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipDetails {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub stipend: String,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default)]
    pub industry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joining_date: Option<String>,
    /// A number from the posting form, a string from the edit form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_openings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_provision: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_task1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_task2: Option<String>,
    /// Keys not named above (`durationUnit`, ...), written back unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: String,
    pub startup_id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub internship_type: InternshipType,
    pub status: InternshipStatus,
    #[serde(flatten)]
    pub details: InternshipDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Internship {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInternship {
    #[serde(default)]
    pub startup_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub internship_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub details: InternshipDetails,
}

impl From<&Internship> for NewInternship {
    fn from(i: &Internship) -> Self {
        Self {
            startup_id: i.startup_id.clone(),
            title: i.title.clone(),
            description: i.description.clone(),
            internship_type: i.internship_type.as_str().to_string(),
            status: i.status.as_str().to_string(),
            details: i.details.clone(),
        }
    }
}

/// Partial internship change. The owning startup cannot be reassigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InternshipUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub internship_type: Option<String>,
    pub status: Option<String>,
    pub details: Option<InternshipDetails>,
}

impl InternshipUpdate {
    /// Merges into a draft so the result can be re-validated before it is typed.
    pub fn apply_to(self, internship: &Internship) -> NewInternship {
        let mut out = NewInternship::from(internship);
        if let Some(v) = self.title {
            out.title = v;
        }
        if let Some(v) = self.description {
            out.description = v;
        }
        if let Some(v) = self.internship_type {
            out.internship_type = v;
        }
        if let Some(v) = self.status {
            out.status = v;
        }
        if let Some(v) = self.details {
            out.details = v;
        }
        out
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Applications
// ─────────────────────────────────────────────────────────────────────────────

/// One answered question from the application form, in form order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredApplication")]
pub struct Application {
    pub id: String,
    pub student_id: String,
    pub internship_id: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<Answer>,
    /// Submission time written by the apply form. Kept when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application as found in storage. Records from the apply form carry only
/// `appliedAt`; `createdAt` falls back to it, `updatedAt` to `createdAt`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredApplication {
    id: String,
    student_id: String,
    internship_id: String,
    status: ApplicationStatus,
    #[serde(default)]
    cover_letter: Option<String>,
    #[serde(default)]
    resume: Option<String>,
    #[serde(default)]
    answers: Vec<Answer>,
    #[serde(default)]
    applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<StoredApplication> for Application {
    fn from(s: StoredApplication) -> Self {
        let created_at = s.created_at.or(s.applied_at).unwrap_or_default();
        Self {
            id: s.id,
            student_id: s.student_id,
            internship_id: s.internship_id,
            status: s.status,
            cover_letter: s.cover_letter,
            resume: s.resume,
            answers: s.answers,
            applied_at: s.applied_at,
            created_at,
            updated_at: s.updated_at.unwrap_or(created_at),
        }
    }
}

impl Entity for Application {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewApplication {
    pub student_id: String,
    pub internship_id: String,
    pub status: String,
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    pub answers: Vec<Answer>,
}

impl From<&Application> for NewApplication {
    fn from(a: &Application) -> Self {
        Self {
            student_id: a.student_id.clone(),
            internship_id: a.internship_id.clone(),
            status: a.status.as_str().to_string(),
            cover_letter: a.cover_letter.clone(),
            resume: a.resume.clone(),
            answers: a.answers.clone(),
        }
    }
}

/// Partial application change. Student and internship are fixed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicationUpdate {
    pub status: Option<String>,
    pub cover_letter: Option<String>,
    pub resume: Option<String>,
    pub answers: Option<Vec<Answer>>,
}

impl ApplicationUpdate {
    pub fn apply_to(self, application: &Application) -> NewApplication {
        let mut out = NewApplication::from(application);
        if let Some(v) = self.status {
            out.status = v;
        }
        if self.cover_letter.is_some() {
            out.cover_letter = self.cover_letter;
        }
        if self.resume.is_some() {
            out.resume = self.resume;
        }
        if let Some(v) = self.answers {
            out.answers = v;
        }
        out
    }
}
