use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::{normalize_email, Credentials};
use crate::directory::{ContactDetails, FeeStructure, Institution};
use crate::ids::{InstitutionId, RequestId, UserId};

const PLACEHOLDER_THUMBNAIL: &str = "/placeholder.svg";

/// Onboarding form submitted by a prospective institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionApplication {
    #[serde(alias = "name")]
    pub institution_name: String,
    pub email: String,
    pub phone: String,
    pub category: String,
    pub location: String,
    pub city: String,
    pub established: i32,
    pub specialization: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_students: u32,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub gallery_urls: Vec<String>,
    #[serde(default)]
    pub fee_structure: Option<FeeStructure>,
}

impl InstitutionApplication {
    /// Trims and normalizes the form, rejecting missing required fields.
    pub fn normalized(mut self) -> Result<Self, String> {
        for (label, value) in [
            ("name", &mut self.institution_name),
            ("email", &mut self.email),
            ("phone", &mut self.phone),
            ("category", &mut self.category),
            ("location", &mut self.location),
            ("city", &mut self.city),
            ("specialization", &mut self.specialization),
        ] {
            *value = value.trim().to_string();
            if value.is_empty() {
                return Err(format!("Institution {label} is required."));
            }
        }

        self.email = normalize_email(&self.email);
        if self.thumbnail_url.trim().is_empty() {
            self.thumbnail_url = PLACEHOLDER_THUMBNAIL.to_string();
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Both approval workflows only move forward out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Already processed")]
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionRequest {
    pub id: RequestId,
    #[serde(flatten)]
    pub application: InstitutionApplication,
    pub status: RequestStatus,
    pub rejection_reason: String,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InstitutionRequest {
    pub fn new(application: InstitutionApplication, now: DateTime<Utc>) -> Self {
        Self {
            id: RequestId::generate(),
            application,
            status: RequestStatus::Pending,
            rejection_reason: String::new(),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending and approved applications block a new application for the same email.
    pub fn is_open(&self) -> bool {
        self.status != RequestStatus::Rejected
    }

    fn ensure_pending(&self) -> Result<(), TransitionError> {
        match self.status {
            RequestStatus::Pending => Ok(()),
            RequestStatus::Approved | RequestStatus::Rejected => {
                Err(TransitionError::AlreadyProcessed)
            }
        }
    }

    pub fn approve(&mut self, admin: &UserId, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = RequestStatus::Approved;
        self.approved_by = Some(admin.clone());
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = RequestStatus::Rejected;
        self.rejection_reason = reason.to_string();
        self.updated_at = now;
        Ok(())
    }

    /// Live institution built from the application snapshot: active, verified, first login.
    pub fn to_institution(&self, password_hash: String, now: DateTime<Utc>) -> Institution {
        let application = &self.application;
        Institution {
            id: InstitutionId::generate(),
            name: application.institution_name.clone(),
            category: application.category.clone(),
            location: application.location.clone(),
            city: application.city.clone(),
            specialization: application.specialization.clone(),
            established: application.established,
            description: application.description.clone(),
            total_students: application.total_students,
            thumbnail_url: application.thumbnail_url.clone(),
            gallery_urls: application.gallery_urls.clone(),
            contact: ContactDetails {
                phone: application.phone.clone(),
                email: application.email.clone(),
            },
            fee_structure: application.fee_structure.clone(),
            rating: 0.0,
            total_reviews: 0,
            is_active: true,
            is_verified: true,
            is_first_login: true,
            credentials: Credentials::new(password_hash),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn application(email: &str) -> InstitutionApplication {
        InstitutionApplication {
            institution_name: "Lakeside Institute".to_string(),
            email: email.to_string(),
            phone: "+91 22 5555 0101".to_string(),
            category: "Engineering".to_string(),
            location: "Andheri".to_string(),
            city: "Mumbai".to_string(),
            established: 2004,
            specialization: "Robotics".to_string(),
            description: "Hands-on robotics programmes.".to_string(),
            total_students: 850,
            thumbnail_url: String::new(),
            gallery_urls: Vec::new(),
            fee_structure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::application;
    use super::*;

    #[test]
    fn application_accepts_name_alias_and_normalizes() {
        let payload = serde_json::json!({
            "name": " Lakeside Institute ",
            "email": " Admissions@Lakeside.EDU ",
            "phone": "123",
            "category": "Engineering",
            "location": "Andheri",
            "city": "Mumbai",
            "established": 2004,
            "specialization": "Robotics"
        });
        let parsed: InstitutionApplication =
            serde_json::from_value(payload).expect("application parses");
        let normalized = parsed.normalized().expect("valid application");
        assert_eq!(normalized.institution_name, "Lakeside Institute");
        assert_eq!(normalized.email, "admissions@lakeside.edu");
        assert_eq!(normalized.thumbnail_url, "/placeholder.svg");
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut form = application("a@b.c");
        form.city = "  ".to_string();
        assert_eq!(
            form.normalized().expect_err("city missing"),
            "Institution city is required."
        );
    }

    #[test]
    fn transitions_are_terminal() {
        let now = Utc::now();
        let admin = UserId::from("admin-1");
        let mut request = InstitutionRequest::new(application("a@b.c"), now);

        request.approve(&admin, now).expect("pending request approves");
        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.approved_by, Some(admin.clone()));
        assert_eq!(
            request.approve(&admin, now),
            Err(TransitionError::AlreadyProcessed)
        );
        assert_eq!(
            request.reject("late", now),
            Err(TransitionError::AlreadyProcessed)
        );
    }

    #[test]
    fn approved_snapshot_becomes_live_institution() {
        let now = Utc::now();
        let request = InstitutionRequest::new(application("a@b.c"), now);
        let institution = request.to_institution("$2b$04$hash".to_string(), now);
        assert!(institution.is_active && institution.is_verified && institution.is_first_login);
        assert_eq!(institution.contact.email, "a@b.c");
        assert_eq!(institution.name, "Lakeside Institute");
        assert_eq!(institution.total_reviews, 0);
    }

    #[test]
    fn serialized_request_is_flat() {
        let request = InstitutionRequest::new(application("a@b.c"), Utc::now());
        let json = serde_json::to_value(&request).expect("serializes");
        assert_eq!(json["institutionName"], "Lakeside Institute");
        assert_eq!(json["status"], "pending");
    }
}
