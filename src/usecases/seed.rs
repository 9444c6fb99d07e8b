//! Demo data: two startups, two students, three internships, two applications.
//!
//! Uses the repository's validation and integrity rules. Guarded by the
//! `dataInitialized` flag so it runs once per store.

use crate::adapters::persistence::{Collection, CollectionStore, StorageKey};
use crate::domain::validation::{validate_application, validate_internship, validate_user};
use crate::domain::{
    Application, DomainError, Internship, InternshipDetails, NewApplication, NewInternship,
    NewUser, StartupData, StudentData, User,
};
use crate::usecases::DataService;
use crate::usecases::data_service::{
    build_application, build_internship, build_user, ensure_application_refs, ensure_startup,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

const DEMO_PASSWORD: &str = "password123";

/// Seed demo records unless the store was already seeded. Returns whether anything was written.
///
/// All records and the `dataInitialized` flag land in one commit, so a failed
/// run leaves the store as it was and the next start tries again. A demo
/// account whose email is already registered is reused.
pub async fn seed_demo_data(service: &DataService) -> Result<bool, DomainError> {
    let _guard = service.lock_writes().await;
    let store = service.store();
    if store
        .read_scalar(StorageKey::DataInitialized)
        .await
        .is_some()
    {
        return Ok(false);
    }

    let mut demo = DemoSet {
        users: store.load(StorageKey::Users).await,
        internships: store.load(StorageKey::Internships).await,
        applications: store.load(StorageKey::Applications).await,
        now: service.now(),
    };

    let tech = demo.user(startup(
        "techgenius@example.com",
        "TechGenius Solutions",
        StartupData {
            official_name: "TechGenius Solutions".into(),
            website_link: "https://techgenius.com".into(),
            year_of_incorporation: "2020".into(),
            location_city: "Bangalore".into(),
            founders_name: "Rahul Sharma, Priya Patel".into(),
            summary: "AI and machine learning solutions for businesses.".into(),
            domain: "Artificial Intelligence".into(),
            contact_mail: "contact@techgenius.com".into(),
            contact_number: "+91 9876543210".into(),
            logo: "/mock-logos/techgenius.png".into(),
        },
    ))?;
    let green = demo.user(startup(
        "greenenergy@example.com",
        "GreenEnergy Innovations",
        StartupData {
            official_name: "GreenEnergy Innovations".into(),
            website_link: "https://greenenergy.com".into(),
            year_of_incorporation: "2019".into(),
            location_city: "Mumbai".into(),
            founders_name: "Amit Kumar, Neha Singh".into(),
            summary: "Advanced solar panel technology for renewable energy.".into(),
            domain: "Renewable Energy".into(),
            contact_mail: "info@greenenergy.com".into(),
            contact_number: "+91 8765432109".into(),
            logo: "/mock-logos/greenenergy.png".into(),
        },
    ))?;

    let rahul = demo.user(student(
        "rahul@example.com",
        "Rahul Sharma",
        StudentData {
            college: "BITS Pilani".into(),
            degree: "B.Tech".into(),
            year: "3".into(),
            skills: strings(&["React", "Node.js", "Python"]),
            bio: "Passionate about web development and AI.".into(),
            campus: None,
        },
    ))?;
    let priya = demo.user(student(
        "priya@example.com",
        "Priya Patel",
        StudentData {
            college: "BITS Pilani".into(),
            degree: "M.Tech".into(),
            year: "1".into(),
            skills: strings(&["Data Science", "Machine Learning", "Python"]),
            bio: "Aspiring data scientist.".into(),
            campus: None,
        },
    ))?;

    let frontend = demo.internship(
        tech.as_deref(),
        internship(
            "Frontend Developer Intern",
            "Build user interfaces with our product team.",
            "Full-time",
            InternshipDetails {
                location: "Remote".into(),
                duration: "3 months".into(),
                stipend: "₹20,000/month".into(),
                skills: strings(&["React", "JavaScript", "HTML", "CSS"]).into(),
                industry: "Technology".into(),
                ..Default::default()
            },
        ),
    )?;
    demo.internship(
        tech.as_deref(),
        internship(
            "Backend Developer Intern",
            "Develop robust APIs and services.",
            "Full-time",
            InternshipDetails {
                location: "Bangalore".into(),
                duration: "6 months".into(),
                stipend: "₹25,000/month".into(),
                skills: strings(&["Node.js", "Express", "MongoDB"]).into(),
                industry: "Technology".into(),
                ..Default::default()
            },
        ),
    )?;
    let analyst = demo.internship(
        green.as_deref(),
        internship(
            "Data Analyst Intern",
            "Analyze energy usage data to derive insights.",
            "Part-time",
            InternshipDetails {
                location: "Remote".into(),
                duration: "3 months".into(),
                stipend: "₹15,000/month".into(),
                skills: strings(&["Python", "SQL", "Data Visualization"]).into(),
                industry: "Energy".into(),
                ..Default::default()
            },
        ),
    )?;

    demo.application(
        rahul.as_deref(),
        frontend.as_deref(),
        "I am excited to apply for the Frontend Developer position.",
    )?;
    demo.application(
        priya.as_deref(),
        analyst.as_deref(),
        "I am interested in the Data Analyst position.",
    )?;

    store
        .commit(vec![
            CollectionStore::stage(StorageKey::Users, &demo.users)?,
            CollectionStore::stage(StorageKey::Internships, &demo.internships)?,
            CollectionStore::stage(StorageKey::Applications, &demo.applications)?,
            CollectionStore::stage_scalar(StorageKey::DataInitialized, "true"),
        ])
        .await?;
    info!("seeded demo data");
    Ok(true)
}

/// Collections being seeded, held in memory until the single commit.
struct DemoSet {
    users: Collection<User>,
    internships: Collection<Internship>,
    applications: Collection<Application>,
    now: DateTime<Utc>,
}

impl DemoSet {
    /// Id of the demo account. `None` if its email belongs to the other account type.
    fn user(&mut self, draft: NewUser) -> Result<Option<String>, DomainError> {
        validate_user(&draft)?;
        if let Some(existing) = self.users.iter().find(|u| u.email == draft.email) {
            if existing.user_type.as_str() != draft.user_type {
                warn!(email = %draft.email, "demo email belongs to another account type, skipping");
                return Ok(None);
            }
            info!(email = %draft.email, id = %existing.id, "demo account already registered, reusing it");
            return Ok(Some(existing.id.clone()));
        }
        let user = build_user(&self.users, draft, self.now)?;
        let id = user.id.clone();
        self.users.push(user);
        Ok(Some(id))
    }

    fn internship(
        &mut self,
        startup_id: Option<&str>,
        mut draft: NewInternship,
    ) -> Result<Option<String>, DomainError> {
        let Some(startup_id) = startup_id else {
            return Ok(None);
        };
        draft.startup_id = startup_id.to_string();
        validate_internship(&draft)?;
        ensure_startup(&self.users, &draft.startup_id)?;
        let internship = build_internship(&self.internships, draft, self.now)?;
        let id = internship.id.clone();
        self.internships.push(internship);
        Ok(Some(id))
    }

    fn application(
        &mut self,
        student_id: Option<&str>,
        internship_id: Option<&str>,
        cover_letter: &str,
    ) -> Result<(), DomainError> {
        let (Some(student_id), Some(internship_id)) = (student_id, internship_id) else {
            return Ok(());
        };
        let draft = NewApplication {
            student_id: student_id.to_string(),
            internship_id: internship_id.to_string(),
            status: "pending".into(),
            cover_letter: Some(cover_letter.to_string()),
            ..Default::default()
        };
        validate_application(&draft)?;
        ensure_application_refs(&self.users, &self.internships, &self.applications, &draft)?;
        let application = build_application(&self.applications, draft, self.now)?;
        self.applications.push(application);
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn startup(email: &str, name: &str, profile: StartupData) -> NewUser {
    NewUser {
        email: email.into(),
        password: DEMO_PASSWORD.into(),
        user_type: "startup".into(),
        name: Some(name.into()),
        onboarding_complete: true,
        student_data: None,
        startup_data: Some(profile),
    }
}

fn student(email: &str, name: &str, profile: StudentData) -> NewUser {
    NewUser {
        email: email.into(),
        password: DEMO_PASSWORD.into(),
        user_type: "student".into(),
        name: Some(name.into()),
        onboarding_complete: true,
        student_data: Some(profile),
        startup_data: None,
    }
}

fn internship(
    title: &str,
    description: &str,
    internship_type: &str,
    details: InternshipDetails,
) -> NewInternship {
    NewInternship {
        startup_id: String::new(),
        title: title.into(),
        description: description.into(),
        internship_type: internship_type.into(),
        status: "active".into(),
        details,
    }
}
