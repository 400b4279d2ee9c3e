use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{InquiryId, InstitutionId, UserId};

pub const DEFAULT_COURSE: &str = "General Inquiry";
pub const DEFAULT_MESSAGE: &str = "I am interested.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: InquiryId,
    pub institution_id: InstitutionId,
    /// Absent for anonymous visitors; those never replace earlier inquiries.
    #[serde(rename = "userId")]
    pub author_id: Option<UserId>,
    pub student_name: String,
    pub student_email: String,
    pub student_phone: String,
    pub course_interest: String,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public inquiry form posted against an institution. Authorship never comes from the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Inquiry sent from the student dashboard; contact details come from the profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInquiry {
    pub institution_id: InstitutionId,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Inquiry {
    pub fn from_form(
        institution_id: InstitutionId,
        author_id: Option<UserId>,
        form: InquiryForm,
        now: DateTime<Utc>,
    ) -> Result<Self, &'static str> {
        let student_name = form.name.trim().to_string();
        let student_email = form.email.trim().to_string();
        if student_name.is_empty() || student_email.is_empty() {
            return Err("Name and email are required.");
        }

        Ok(Self {
            id: InquiryId::generate(),
            institution_id,
            author_id,
            student_name,
            student_email,
            student_phone: form.phone.trim().to_string(),
            course_interest: or_default(form.course, DEFAULT_COURSE),
            message: or_default(form.message, DEFAULT_MESSAGE),
            status: InquiryStatus::New,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_course_and_message_use_defaults() {
        let form = InquiryForm {
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            message: Some("   ".to_string()),
            ..Default::default()
        };
        let inquiry = Inquiry::from_form(InstitutionId::from("inst-1"), None, form, Utc::now())
            .expect("valid");
        assert_eq!(inquiry.course_interest, "General Inquiry");
        assert_eq!(inquiry.message, "I am interested.");
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert!(inquiry.author_id.is_none());
    }

    #[test]
    fn contact_name_is_required() {
        let form = InquiryForm {
            email: "ravi@example.com".to_string(),
            ..Default::default()
        };
        assert!(Inquiry::from_form(InstitutionId::from("inst-1"), None, form, Utc::now()).is_err());
    }

    #[test]
    fn user_id_in_the_body_is_ignored() {
        let form: InquiryForm = serde_json::from_value(serde_json::json!({
            "userId": "someone-else",
            "name": "Ravi",
            "email": "ravi@example.com"
        }))
        .expect("parses");
        let inquiry = Inquiry::from_form(InstitutionId::from("inst-1"), None, form, Utc::now())
            .expect("valid");
        assert!(inquiry.author_id.is_none());
    }
}
