use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::Credentials;
use crate::ids::InstitutionId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    #[serde(default)]
    pub selected_plan_id: Option<String>,
    #[serde(default)]
    pub initial_fee: Option<f64>,
    #[serde(default)]
    pub recurring_fee: Option<f64>,
    #[serde(default)]
    pub frequency: Option<String>,
}

/// A live, onboarded institution. Doubles as the institution's login identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    pub id: InstitutionId,
    pub name: String,
    pub category: String,
    pub location: String,
    pub city: String,
    pub specialization: String,
    pub established: i32,
    pub description: String,
    pub total_students: u32,
    pub thumbnail_url: String,
    pub gallery_urls: Vec<String>,
    pub contact: ContactDetails,
    pub fee_structure: Option<FeeStructure>,
    /// Mean approved rating, one decimal. Owned by the review aggregate.
    pub rating: f64,
    pub total_reviews: u32,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_first_login: bool,
    #[serde(skip)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Institution {
    pub fn login_email(&self) -> &str {
        &self.contact.email
    }

    /// Visible in the public directory.
    pub fn is_listed(&self) -> bool {
        self.is_active && self.is_verified
    }
}

/// Descriptive fields an institution may edit on its own profile. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionProfileUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub specialization: Option<String>,
    pub established: Option<i32>,
    pub description: Option<String>,
    pub total_students: Option<u32>,
    pub thumbnail_url: Option<String>,
    pub gallery_urls: Option<Vec<String>>,
    pub phone: Option<String>,
    pub fee_structure: Option<FeeStructure>,
}

impl InstitutionProfileUpdate {
    pub fn apply(self, institution: &mut Institution, now: DateTime<Utc>) {
        fn set_text(target: &mut String, value: Option<String>) {
            if let Some(value) = value.map(|value| value.trim().to_string()) {
                if !value.is_empty() {
                    *target = value;
                }
            }
        }

        set_text(&mut institution.name, self.name);
        set_text(&mut institution.category, self.category);
        set_text(&mut institution.location, self.location);
        set_text(&mut institution.city, self.city);
        set_text(&mut institution.specialization, self.specialization);
        set_text(&mut institution.contact.phone, self.phone);

        if let Some(description) = self.description {
            institution.description = description;
        }
        if let Some(established) = self.established {
            institution.established = established;
        }
        if let Some(total_students) = self.total_students {
            institution.total_students = total_students;
        }
        if let Some(thumbnail_url) = self.thumbnail_url {
            institution.thumbnail_url = thumbnail_url;
        }
        if let Some(gallery_urls) = self.gallery_urls {
            institution.gallery_urls = gallery_urls;
        }
        if let Some(fee_structure) = self.fee_structure {
            institution.fee_structure = Some(fee_structure);
        }
        institution.updated_at = now;
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::institution;
    use super::*;

    #[test]
    fn serialization_hides_credentials_and_uses_camel_case() {
        let json = serde_json::to_value(institution("North Ridge", "Pune")).expect("serializes");
        assert!(json.get("credentials").is_none());
        assert_eq!(json["totalReviews"], 0);
        assert_eq!(json["isFirstLogin"], true);
        assert_eq!(json["contact"]["phone"], "0800 000 000");
    }

    #[test]
    fn profile_update_skips_blank_text_fields() {
        let mut target = institution("North Ridge", "Pune");
        InstitutionProfileUpdate {
            name: Some("  ".to_string()),
            city: Some("Mumbai".to_string()),
            total_students: Some(40),
            ..Default::default()
        }
        .apply(&mut target, Utc::now());
        assert_eq!(target.name, "North Ridge");
        assert_eq!(target.city, "Mumbai");
        assert_eq!(target.total_students, 40);
    }
}
