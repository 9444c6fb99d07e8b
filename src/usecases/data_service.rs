//! Entity repository: create, query and update users, internships and applications.
//!
//! - Validates drafts before anything is written
//! - Stamps ids and timestamps from the injected Clock
//! - Every read-modify-write runs under one async mutex, so writes from tasks
//!   sharing this handle never interleave. Other processes sharing the same
//!   backing store are not coordinated with.
//! - Reads are fail-open: a broken collection reads as empty, and records that
//!   do not fit the schema are skipped by queries but written back by updates

use crate::adapters::persistence::{Collection, CollectionStore, StorageKey};
use crate::domain::ids::{Timestamps, generate_id};
use crate::domain::validation::{validate_application, validate_internship, validate_user};
use crate::domain::{
    Application, ApplicationStatus, ApplicationUpdate, DomainError, Entity, Internship,
    InternshipStatus, InternshipType, InternshipUpdate, NewApplication, NewInternship, NewUser,
    User, UserType, UserUpdate,
};
use crate::ports::{Clock, KvStore};
use crate::usecases::retention::{RetentionPolicy, RetentionSweeper, SweepReport};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const INTERNSHIP_PREFIX: &str = "internship";
const APPLICATION_PREFIX: &str = "application";
const MAX_ID_ATTEMPTS: usize = 8;

/// Repository handle. Construct once with [`DataService::open`] and share by reference.
pub struct DataService {
    store: CollectionStore,
    clock: Arc<dyn Clock>,
    sweeper: RetentionSweeper,
    write_lock: Mutex<()>,
}

impl DataService {
    /// Initialize missing collections, then run the retention sweep if it is due.
    /// A failed sweep is logged and does not prevent opening.
    pub async fn open(
        kv: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        policy: RetentionPolicy,
    ) -> Result<Self, DomainError> {
        let store = CollectionStore::new(kv);
        store.initialize().await?;
        let sweeper = RetentionSweeper::new(store.clone(), Arc::clone(&clock), policy);
        let service = Self {
            store,
            clock,
            sweeper,
            write_lock: Mutex::new(()),
        };
        service.run_retention_if_due().await;
        Ok(service)
    }

    pub(crate) fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Hold while doing a read-modify-write outside the methods below.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a user. Rejects invalid drafts and already-registered emails.
    pub async fn create_user(&self, draft: NewUser) -> Result<User, DomainError> {
        validate_user(&draft)?;

        let _guard = self.lock_writes().await;
        let mut users: Collection<User> = self.store.load(StorageKey::Users).await;
        ensure_email_free(&users, &draft.email)?;
        let user = build_user(&users, draft, self.clock.now())?;
        users.push(user.clone());
        self.store.write(StorageKey::Users, &users).await?;
        info!(id = %user.id, user_type = %user.user_type, "created user");
        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Option<User> {
        let users: Vec<User> = self.store.read(StorageKey::Users).await;
        users.into_iter().find(|u| u.email == email)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Option<User> {
        let users: Vec<User> = self.store.read(StorageKey::Users).await;
        users.into_iter().find(|u| u.id == id)
    }

    pub async fn get_all_users(&self) -> Vec<User> {
        self.store.read(StorageKey::Users).await
    }

    pub async fn get_all_startups(&self) -> Vec<User> {
        self.users_of_type(UserType::Startup).await
    }

    pub async fn get_all_students(&self) -> Vec<User> {
        self.users_of_type(UserType::Student).await
    }

    async fn users_of_type(&self, user_type: UserType) -> Vec<User> {
        let users: Vec<User> = self.store.read(StorageKey::Users).await;
        users
            .into_iter()
            .filter(|u| u.user_type == user_type)
            .collect()
    }

    /// Merge `update` into the stored user. `Ok(None)` if no user has this id.
    pub async fn update_user(
        &self,
        id: &str,
        update: UserUpdate,
    ) -> Result<Option<User>, DomainError> {
        let _guard = self.lock_writes().await;
        let mut users: Collection<User> = self.store.load(StorageKey::Users).await;
        let Some(existing) = users.iter().find(|u| u.id == id) else {
            debug!(id, "update_user: no such user, nothing written");
            return Ok(None);
        };

        let mut merged = update.apply_to(existing);
        validate_user(&NewUser::from(&merged))?;
        if merged.email != existing.email {
            ensure_email_free(&users, &merged.email)?;
        }
        merged.updated_at = self.clock.now();
        if let Some(slot) = users.find_mut(|u| u.id == id) {
            *slot = merged.clone();
        }
        self.store.write(StorageKey::Users, &users).await?;
        debug!(id, "updated user");
        Ok(Some(merged))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internships
    // ─────────────────────────────────────────────────────────────────────────

    /// Post an internship. `startup_id` must name an existing startup account.
    pub async fn create_internship(&self, draft: NewInternship) -> Result<Internship, DomainError> {
        validate_internship(&draft)?;

        let _guard = self.lock_writes().await;
        let users: Collection<User> = self.store.load(StorageKey::Users).await;
        ensure_startup(&users, &draft.startup_id)?;

        let mut internships: Collection<Internship> =
            self.store.load(StorageKey::Internships).await;
        let internship = build_internship(&internships, draft, self.clock.now())?;
        internships.push(internship.clone());
        self.store
            .write(StorageKey::Internships, &internships)
            .await?;
        info!(id = %internship.id, startup_id = %internship.startup_id, "created internship");
        Ok(internship)
    }

    pub async fn get_internship_by_id(&self, id: &str) -> Option<Internship> {
        let internships: Vec<Internship> = self.store.read(StorageKey::Internships).await;
        internships.into_iter().find(|i| i.id == id)
    }

    /// All internships posted by `startup_id`, in insertion order.
    pub async fn get_internships_by_startup_id(&self, startup_id: &str) -> Vec<Internship> {
        let internships: Vec<Internship> = self.store.read(StorageKey::Internships).await;
        internships
            .into_iter()
            .filter(|i| i.startup_id == startup_id)
            .collect()
    }

    pub async fn get_all_internships(&self) -> Vec<Internship> {
        self.store.read(StorageKey::Internships).await
    }

    /// Merge `update` into the stored internship. `Ok(None)` if no internship has this id.
    pub async fn update_internship(
        &self,
        id: &str,
        update: InternshipUpdate,
    ) -> Result<Option<Internship>, DomainError> {
        let _guard = self.lock_writes().await;
        let mut internships: Collection<Internship> =
            self.store.load(StorageKey::Internships).await;
        let Some(existing) = internships.find_mut(|i| i.id == id) else {
            debug!(id, "update_internship: no such internship, nothing written");
            return Ok(None);
        };

        let draft = update.apply_to(existing);
        validate_internship(&draft)?;
        let updated = Internship {
            id: existing.id.clone(),
            startup_id: draft.startup_id,
            title: draft.title,
            description: draft.description,
            internship_type: draft.internship_type.parse()?,
            status: draft.status.parse()?,
            details: draft.details,
            created_at: existing.created_at,
            updated_at: self.clock.now(),
        };
        *existing = updated.clone();
        self.store
            .write(StorageKey::Internships, &internships)
            .await?;
        debug!(id, status = updated.status.as_str(), "updated internship");
        Ok(Some(updated))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Applications
    // ─────────────────────────────────────────────────────────────────────────

    /// Submit an application. The student and internship must exist, and a
    /// student may apply to a given internship only once.
    pub async fn create_application(
        &self,
        draft: NewApplication,
    ) -> Result<Application, DomainError> {
        validate_application(&draft)?;

        let _guard = self.lock_writes().await;
        let users: Collection<User> = self.store.load(StorageKey::Users).await;
        let internships: Collection<Internship> = self.store.load(StorageKey::Internships).await;
        let mut applications: Collection<Application> =
            self.store.load(StorageKey::Applications).await;
        ensure_application_refs(&users, &internships, &applications, &draft)?;

        let application = build_application(&applications, draft, self.clock.now())?;
        applications.push(application.clone());
        self.store
            .write(StorageKey::Applications, &applications)
            .await?;
        info!(
            id = %application.id,
            student_id = %application.student_id,
            internship_id = %application.internship_id,
            "created application"
        );
        Ok(application)
    }

    pub async fn get_application_by_id(&self, id: &str) -> Option<Application> {
        let applications: Vec<Application> = self.store.read(StorageKey::Applications).await;
        applications.into_iter().find(|a| a.id == id)
    }

    pub async fn get_applications_by_student_id(&self, student_id: &str) -> Vec<Application> {
        let applications: Vec<Application> = self.store.read(StorageKey::Applications).await;
        applications
            .into_iter()
            .filter(|a| a.student_id == student_id)
            .collect()
    }

    pub async fn get_applications_by_internship_id(&self, internship_id: &str) -> Vec<Application> {
        let applications: Vec<Application> = self.store.read(StorageKey::Applications).await;
        applications
            .into_iter()
            .filter(|a| a.internship_id == internship_id)
            .collect()
    }

    /// Applications to any internship posted by `startup_id`.
    pub async fn get_applications_by_startup_id(&self, startup_id: &str) -> Vec<Application> {
        let internships: Vec<Internship> = self.store.read(StorageKey::Internships).await;
        let owned: HashSet<String> = internships
            .into_iter()
            .filter(|i| i.startup_id == startup_id)
            .map(|i| i.id)
            .collect();
        let applications: Vec<Application> = self.store.read(StorageKey::Applications).await;
        applications
            .into_iter()
            .filter(|a| owned.contains(&a.internship_id))
            .collect()
    }

    pub async fn get_all_applications(&self) -> Vec<Application> {
        self.store.read(StorageKey::Applications).await
    }

    /// Merge `update` into the stored application. `Ok(None)` if no application has this id.
    pub async fn update_application(
        &self,
        id: &str,
        update: ApplicationUpdate,
    ) -> Result<Option<Application>, DomainError> {
        let _guard = self.lock_writes().await;
        let mut applications: Collection<Application> =
            self.store.load(StorageKey::Applications).await;
        let Some(existing) = applications.find_mut(|a| a.id == id) else {
            debug!(id, "update_application: no such application, nothing written");
            return Ok(None);
        };

        let draft = update.apply_to(existing);
        validate_application(&draft)?;
        let updated = Application {
            id: existing.id.clone(),
            student_id: draft.student_id,
            internship_id: draft.internship_id,
            status: draft.status.parse()?,
            cover_letter: draft.cover_letter,
            resume: draft.resume,
            answers: draft.answers,
            applied_at: existing.applied_at,
            created_at: existing.created_at,
            updated_at: self.clock.now(),
        };
        *existing = updated.clone();
        self.store
            .write(StorageKey::Applications, &applications)
            .await?;
        debug!(id, status = updated.status.as_str(), "updated application");
        Ok(Some(updated))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Retention
    // ─────────────────────────────────────────────────────────────────────────

    /// Sweep if the cleanup interval has elapsed. Failures are logged, not returned.
    pub async fn run_retention_if_due(&self) -> Option<SweepReport> {
        let _guard = self.lock_writes().await;
        self.sweeper.run_if_due().await
    }

    /// Sweep now, regardless of when the last sweep ran.
    pub async fn sweep_now(&self) -> Result<SweepReport, DomainError> {
        let _guard = self.lock_writes().await;
        self.sweeper.sweep().await
    }

    pub async fn last_cleanup(&self) -> Option<DateTime<Utc>> {
        self.sweeper.last_cleanup().await
    }
}

pub(crate) fn ensure_email_free(users: &Collection<User>, email: &str) -> Result<(), DomainError> {
    if users.iter().any(|u| u.email == email) {
        return Err(DomainError::Conflict(format!(
            "email {} is already registered",
            email
        )));
    }
    Ok(())
}

pub(crate) fn ensure_startup(users: &Collection<User>, startup_id: &str) -> Result<(), DomainError> {
    match users.iter().find(|u| u.id == startup_id) {
        None => Err(DomainError::Reference(format!(
            "startup {} does not exist",
            startup_id
        ))),
        Some(u) if u.user_type != UserType::Startup => Err(DomainError::Reference(format!(
            "user {} is not a startup",
            startup_id
        ))),
        Some(_) => Ok(()),
    }
}

pub(crate) fn ensure_application_refs(
    users: &Collection<User>,
    internships: &Collection<Internship>,
    applications: &Collection<Application>,
    draft: &NewApplication,
) -> Result<(), DomainError> {
    match users.iter().find(|u| u.id == draft.student_id) {
        None => {
            return Err(DomainError::Reference(format!(
                "student {} does not exist",
                draft.student_id
            )));
        }
        Some(u) if u.user_type != UserType::Student => {
            return Err(DomainError::Reference(format!(
                "user {} is not a student",
                draft.student_id
            )));
        }
        Some(_) => {}
    }
    if !internships.iter().any(|i| i.id == draft.internship_id) {
        return Err(DomainError::Reference(format!(
            "internship {} does not exist",
            draft.internship_id
        )));
    }
    if applications
        .iter()
        .any(|a| a.student_id == draft.student_id && a.internship_id == draft.internship_id)
    {
        return Err(DomainError::Conflict(format!(
            "student {} already applied to internship {}",
            draft.student_id, draft.internship_id
        )));
    }
    Ok(())
}

/// Typed user for a validated draft, with an id not yet used in `users`.
pub(crate) fn build_user(
    users: &Collection<User>,
    draft: NewUser,
    now: DateTime<Utc>,
) -> Result<User, DomainError> {
    let user_type: UserType = draft.user_type.parse()?;
    let stamp = Timestamps::at(now);
    Ok(User {
        id: unique_id(users, user_type.as_str(), stamp.created_at)?,
        email: draft.email,
        password: draft.password,
        user_type,
        name: draft.name,
        onboarding_complete: draft.onboarding_complete,
        student_data: draft.student_data,
        startup_data: draft.startup_data,
        created_at: stamp.created_at,
        updated_at: stamp.updated_at,
    })
}

pub(crate) fn build_internship(
    internships: &Collection<Internship>,
    draft: NewInternship,
    now: DateTime<Utc>,
) -> Result<Internship, DomainError> {
    let internship_type: InternshipType = draft.internship_type.parse()?;
    let status: InternshipStatus = draft.status.parse()?;
    let stamp = Timestamps::at(now);
    Ok(Internship {
        id: unique_id(internships, INTERNSHIP_PREFIX, stamp.created_at)?,
        startup_id: draft.startup_id,
        title: draft.title,
        description: draft.description,
        internship_type,
        status,
        details: draft.details,
        created_at: stamp.created_at,
        updated_at: stamp.updated_at,
    })
}

pub(crate) fn build_application(
    applications: &Collection<Application>,
    draft: NewApplication,
    now: DateTime<Utc>,
) -> Result<Application, DomainError> {
    let status: ApplicationStatus = draft.status.parse()?;
    let stamp = Timestamps::at(now);
    Ok(Application {
        id: unique_id(applications, APPLICATION_PREFIX, stamp.created_at)?,
        student_id: draft.student_id,
        internship_id: draft.internship_id,
        status,
        cover_letter: draft.cover_letter,
        resume: draft.resume,
        answers: draft.answers,
        applied_at: None,
        created_at: stamp.created_at,
        updated_at: stamp.updated_at,
    })
}

/// Fresh id not already used in `existing`.
fn unique_id<T: Entity>(
    existing: &Collection<T>,
    prefix: &str,
    at: DateTime<Utc>,
) -> Result<String, DomainError> {
    unique_id_with(existing, || generate_id(prefix, at))
}

fn unique_id_with<T: Entity>(
    existing: &Collection<T>,
    mut generate: impl FnMut() -> String,
) -> Result<String, DomainError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate();
        if !existing.contains_id(&id) {
            return Ok(id);
        }
    }
    Err(DomainError::Conflict(format!(
        "no unused id after {} attempts",
        MAX_ID_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FixedClock;
    use crate::adapters::persistence::MemoryStore;
    use crate::domain::{Answer, StartupData, StudentData};
    use chrono::TimeDelta;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_735_689_600_000).unwrap() // 2025-01-01
    }

    async fn service() -> (DataService, Arc<FixedClock>, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(t0()));
        let svc = DataService::open(kv.clone(), clock.clone(), RetentionPolicy::default())
            .await
            .unwrap();
        (svc, clock, kv)
    }

    fn student_draft(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: "password123".into(),
            user_type: "student".into(),
            onboarding_complete: true,
            student_data: Some(StudentData {
                college: "BITS Pilani".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn startup_draft(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: "password123".into(),
            user_type: "startup".into(),
            startup_data: Some(StartupData {
                official_name: "TechGenius Solutions".into(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn internship_draft(startup_id: &str, title: &str) -> NewInternship {
        NewInternship {
            startup_id: startup_id.into(),
            title: title.into(),
            description: "Work on real products".into(),
            internship_type: "Full-time".into(),
            status: "active".into(),
            ..Default::default()
        }
    }

    fn application_draft(student_id: &str, internship_id: &str) -> NewApplication {
        NewApplication {
            student_id: student_id.into(),
            internship_id: internship_id.into(),
            status: "pending".into(),
            answers: vec![Answer {
                question: "Cover Letter".into(),
                answer: "Hello".into(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_user_stamps_and_persists() {
        let (svc, _, _) = service().await;
        let user = svc.create_user(student_draft("rahul@example.com")).await.unwrap();

        assert!(user.id.starts_with("student-"));
        assert_eq!(user.created_at, user.updated_at);
        let json = serde_json::to_value(&user).unwrap();
        let created = json["createdAt"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created).is_ok());

        assert_eq!(svc.get_user_by_id(&user.id).await, Some(user.clone()));
        assert_eq!(svc.get_user_by_email("rahul@example.com").await, Some(user));
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_without_writing() {
        let (svc, _, _) = service().await;
        let err = svc
            .create_user(NewUser {
                user_type: "admin".into(),
                ..student_draft("x@example.com")
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(svc.get_all_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let (svc, _, _) = service().await;
        svc.create_user(student_draft("dup@example.com")).await.unwrap();
        let err = svc
            .create_user(startup_draft("dup@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(svc.get_all_users().await.len(), 1);
    }

    #[tokio::test]
    async fn test_thousand_creates_yield_distinct_ids() {
        let (svc, _, _) = service().await;
        let mut ids = HashSet::new();
        for n in 0..1000 {
            let user = svc
                .create_user(student_draft(&format!("s{}@example.com", n)))
                .await
                .unwrap();
            assert!(!user.id.is_empty());
            ids.insert(user.id);
        }
        assert_eq!(ids.len(), 1000);
    }

    #[tokio::test]
    async fn test_get_user_by_id_on_empty_collection() {
        let (svc, _, _) = service().await;
        assert_eq!(svc.get_user_by_id("student-1-abc").await, None);
        assert_eq!(svc.get_user_by_email("nobody@example.com").await, None);
    }

    #[tokio::test]
    async fn test_internships_by_startup_keep_insertion_order() {
        let (svc, _, _) = service().await;
        let s1 = svc.create_user(startup_draft("s1@example.com")).await.unwrap();
        let s2 = svc.create_user(startup_draft("s2@example.com")).await.unwrap();

        let a = svc.create_internship(internship_draft(&s1.id, "A")).await.unwrap();
        svc.create_internship(internship_draft(&s2.id, "B")).await.unwrap();
        let c = svc.create_internship(internship_draft(&s1.id, "C")).await.unwrap();

        let got = svc.get_internships_by_startup_id(&s1.id).await;
        assert_eq!(got, vec![a.clone(), c]);
        assert!(a.id.starts_with("internship-"));
        assert_eq!(svc.get_all_startups().await.len(), 2);
        assert!(svc.get_all_students().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_internship_requires_existing_startup() {
        let (svc, _, _) = service().await;
        let err = svc
            .create_internship(internship_draft("startup-0-missing", "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Reference(_)));

        let student = svc.create_user(student_draft("st@example.com")).await.unwrap();
        let err = svc
            .create_internship(internship_draft(&student.id, "A"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Reference(_)));
    }

    #[tokio::test]
    async fn test_create_internship_stores_open_as_active() {
        let (svc, _, _) = service().await;
        let s = svc.create_user(startup_draft("s@example.com")).await.unwrap();
        let i = svc
            .create_internship(NewInternship {
                status: "open".into(),
                ..internship_draft(&s.id, "A")
            })
            .await
            .unwrap();
        assert_eq!(i.status, InternshipStatus::Active);
    }

    #[tokio::test]
    async fn test_application_lifecycle_and_queries() {
        let (svc, clock, _) = service().await;
        let s1 = svc.create_user(startup_draft("s1@example.com")).await.unwrap();
        let s2 = svc.create_user(startup_draft("s2@example.com")).await.unwrap();
        let st = svc.create_user(student_draft("st@example.com")).await.unwrap();
        let i1 = svc.create_internship(internship_draft(&s1.id, "A")).await.unwrap();
        let i2 = svc.create_internship(internship_draft(&s2.id, "B")).await.unwrap();

        let a1 = svc.create_application(application_draft(&st.id, &i1.id)).await.unwrap();
        let a2 = svc.create_application(application_draft(&st.id, &i2.id)).await.unwrap();
        assert!(a1.id.starts_with("application-"));
        assert_eq!(svc.get_application_by_id(&a1.id).await, Some(a1.clone()));

        assert_eq!(svc.get_applications_by_student_id(&st.id).await.len(), 2);
        assert_eq!(svc.get_applications_by_internship_id(&i2.id).await, vec![a2]);
        assert_eq!(svc.get_applications_by_startup_id(&s1.id).await, vec![a1.clone()]);

        clock.advance(TimeDelta::minutes(5));
        let updated = svc
            .update_application(
                &a1.id,
                ApplicationUpdate {
                    status: Some("waitlisted".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Waitlisted);
        assert_eq!(updated.created_at, a1.created_at);
        assert!(updated.updated_at > a1.updated_at);
        assert_eq!(updated.answers, a1.answers);
    }

    #[tokio::test]
    async fn test_create_application_integrity() {
        let (svc, _, _) = service().await;
        let s = svc.create_user(startup_draft("s@example.com")).await.unwrap();
        let st = svc.create_user(student_draft("st@example.com")).await.unwrap();
        let i = svc.create_internship(internship_draft(&s.id, "A")).await.unwrap();

        let err = svc
            .create_application(application_draft(&st.id, "internship-0-missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Reference(_)));

        let err = svc
            .create_application(application_draft(&s.id, &i.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Reference(_)));

        svc.create_application(application_draft(&st.id, &i.id)).await.unwrap();
        let err = svc
            .create_application(application_draft(&st.id, &i.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(svc.get_all_applications().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_noop() {
        let (svc, _, kv) = service().await;
        let before = kv.get("users").await.unwrap();
        let res = svc
            .update_user("student-0-none", UserUpdate::default())
            .await
            .unwrap();
        assert!(res.is_none());
        assert_eq!(kv.get("users").await.unwrap(), before);

        assert!(
            svc.update_internship("nope", InternshipUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            svc.update_application("nope", ApplicationUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_user_revalidates_and_keeps_created_at() {
        let (svc, clock, _) = service().await;
        let u = svc.create_user(student_draft("st@example.com")).await.unwrap();
        svc.create_user(student_draft("other@example.com")).await.unwrap();

        let err = svc
            .update_user(
                &u.id,
                UserUpdate {
                    password: Some("short".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = svc
            .update_user(
                &u.id,
                UserUpdate {
                    email: Some("other@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        clock.advance(TimeDelta::seconds(30));
        let updated = svc
            .update_user(
                &u.id,
                UserUpdate {
                    onboarding_complete: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.created_at, u.created_at);
        assert_eq!(updated.updated_at, u.created_at + TimeDelta::seconds(30));
        assert_eq!(svc.get_user_by_id(&u.id).await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_internship_toggles_status() {
        let (svc, _, _) = service().await;
        let s = svc.create_user(startup_draft("s@example.com")).await.unwrap();
        let i = svc.create_internship(internship_draft(&s.id, "A")).await.unwrap();

        let closed = svc
            .update_internship(
                &i.id,
                InternshipUpdate {
                    status: Some("closed".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(closed.status, InternshipStatus::Closed);
        assert_eq!(closed.title, "A");

        let err = svc
            .update_internship(
                &i.id,
                InternshipUpdate {
                    title: Some(" ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_storage_error() {
        let kv = Arc::new(MemoryStore::with_quota(400));
        let clock = Arc::new(FixedClock::new(t0()));
        let svc = DataService::open(kv, clock, RetentionPolicy::default())
            .await
            .unwrap();

        let mut last = Ok(());
        for n in 0..10 {
            if let Err(e) = svc.create_user(student_draft(&format!("s{}@example.com", n))).await {
                last = Err(e);
                break;
            }
        }
        assert!(matches!(last, Err(DomainError::StorageWrite { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_not_lost() {
        let (svc, _, _) = service().await;
        let svc = Arc::new(svc);
        let mut handles = Vec::new();
        for n in 0..20 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.create_user(student_draft(&format!("c{}@example.com", n)))
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(svc.get_all_users().await.len(), 20);
    }

    #[tokio::test]
    async fn test_dashboard_records_survive_repository_writes() {
        let (svc, _, kv) = service().await;
        let s = svc.create_user(startup_draft("s@example.com")).await.unwrap();
        let st = svc.create_user(student_draft("st@example.com")).await.unwrap();

        let edited = serde_json::json!({
            "id": "i-edited",
            "startupId": s.id,
            "title": "Backend Developer Intern",
            "description": "APIs",
            "type": "Full-time",
            "status": "open",
            "duration": "6",
            "durationUnit": "Months",
            "numberOfOpenings": 2,
            "skills": "Node.js, Express",
            "createdAt": "2024-12-20T00:00:00.000Z",
            "updatedAt": "2024-12-21T00:00:00.000Z"
        });
        let untyped = serde_json::json!({
            "id": "i-mock",
            "startupId": s.id,
            "title": "Posted without a type",
            "status": "open"
        });
        kv.set(
            "internships",
            &serde_json::json!([edited, untyped]).to_string(),
        )
        .await
        .unwrap();
        kv.set(
            "applications",
            &serde_json::json!([{
                "id": "1735000000000",
                "studentId": st.id,
                "internshipId": "i-edited",
                "status": "pending",
                "appliedAt": "2024-12-22T09:30:00.000Z",
                "answers": [{"question": "Cover Letter", "answer": "Hi"}],
                "resume": null
            }])
            .to_string(),
        )
        .await
        .unwrap();

        let i = svc.get_internship_by_id("i-edited").await.unwrap();
        assert_eq!(i.status, InternshipStatus::Active);
        assert_eq!(i.details.skills.to_vec(), ["Node.js", "Express"]);
        assert_eq!(svc.get_internship_by_id("i-mock").await, None);

        let apps = svc.get_applications_by_student_id(&st.id).await;
        assert_eq!(apps.len(), 1);
        assert_eq!(Some(apps[0].created_at), apps[0].applied_at);
        assert_eq!(svc.get_applications_by_startup_id(&s.id).await, apps);

        svc.create_internship(internship_draft(&s.id, "New")).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&kv.get("internships").await.unwrap().unwrap()).unwrap();
        let raw = raw.as_array().unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0]["skills"], "Node.js, Express");
        assert_eq!(raw[0]["durationUnit"], "Months");
        assert_eq!(raw[0]["numberOfOpenings"], 2);
        assert_eq!(raw[1], untyped);

        let err = svc
            .create_application(application_draft(&st.id, "i-edited"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn test_unique_id_gives_up_after_repeated_collisions() {
        let taken: Collection<User> = Collection::from(vec![User {
            id: "dup".into(),
            email: "a@b.co".into(),
            password: "password123".into(),
            user_type: UserType::Student,
            name: None,
            onboarding_complete: false,
            student_data: None,
            startup_data: None,
            created_at: t0(),
            updated_at: t0(),
        }]);

        let mut calls = 0;
        let err = unique_id_with(&taken, || {
            calls += 1;
            "dup".to_string()
        })
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(calls, MAX_ID_ATTEMPTS);

        let mut calls = 0;
        let id = unique_id_with(&taken, || {
            calls += 1;
            if calls < 3 { "dup".into() } else { "fresh".into() }
        })
        .unwrap();
        assert_eq!(id, "fresh");
    }
}
