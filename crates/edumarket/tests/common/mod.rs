#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::Duration;

use edumarket::accounts::{StudentRegistration, UserRecord};
use edumarket::directory::Institution;
use edumarket::ids::UserId;
use edumarket::mail::{MailError, Mailer, OutboundEmail};
use edumarket::moderation::InstitutionApplication;
use edumarket::store::DocumentStore;
use edumarket::{Marketplace, SecuritySettings};

/// Captures every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub fn last_to(&self, to: &str) -> Option<OutboundEmail> {
        self.sent().into_iter().rev().find(|email| email.to == to)
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent.lock().expect("mailer mutex poisoned").push(email);
        Ok(())
    }
}

/// Refuses every message, like an unreachable relay.
pub struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _email: OutboundEmail) -> Result<(), MailError> {
        Err(MailError::Transport("relay unreachable".to_string()))
    }
}

pub fn settings() -> SecuritySettings {
    SecuritySettings {
        jwt_secret: "integration-secret".to_string(),
        token_ttl: Duration::hours(1),
        bcrypt_cost: 4,
    }
}

pub struct Harness {
    pub market: Marketplace<DocumentStore>,
    pub mailer: Arc<RecordingMailer>,
    pub admin: UserRecord,
}

impl Harness {
    pub fn new() -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        Self::with_mailer(mailer.clone(), mailer)
    }

    pub fn with_failing_mailer() -> Self {
        Self::with_mailer(Arc::new(FailingMailer), Arc::new(RecordingMailer::default()))
    }

    fn with_mailer(transport: Arc<dyn Mailer>, recorder: Arc<RecordingMailer>) -> Self {
        let market = Marketplace::new(Arc::new(DocumentStore::new()), transport, &settings());
        let admin = market
            .accounts
            .seed_admin("Admin", "admin@edumarket.test", "admin-pass")
            .expect("admin seeds")
            .expect("admin is new");
        Self {
            market,
            mailer: recorder,
            admin,
        }
    }

    pub fn student(&self, name: &str, email: &str) -> UserId {
        let session = self
            .market
            .accounts
            .register_student(StudentRegistration {
                name: name.to_string(),
                email: email.to_string(),
                phone: Some("9000000000".to_string()),
                password: "student-pass".to_string(),
            })
            .expect("student registers");
        UserId(session.account.id)
    }

    /// Applies and approves an institution, returning the live record.
    pub fn institution(&self, name: &str, email: &str) -> Institution {
        let request = self
            .market
            .accounts
            .apply_as_institution(application(name, email))
            .expect("application accepted");
        self.market
            .moderation
            .approve_request(&request.id, &self.admin.id)
            .expect("approval succeeds")
    }

    pub fn reload(&self, institution: &Institution) -> Institution {
        self.market
            .directory
            .get(&institution.id)
            .expect("institution exists")
    }
}

pub fn application(name: &str, email: &str) -> InstitutionApplication {
    InstitutionApplication {
        institution_name: name.to_string(),
        email: email.to_string(),
        phone: "+91 20 4000 1000".to_string(),
        category: "Engineering".to_string(),
        location: "Kothrud".to_string(),
        city: "Pune".to_string(),
        established: 1999,
        specialization: "Mechanical".to_string(),
        description: String::new(),
        total_students: 500,
        thumbnail_url: String::new(),
        gallery_urls: Vec::new(),
        fee_structure: None,
    }
}
