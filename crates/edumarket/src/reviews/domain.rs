use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{InstitutionId, ReviewId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub institution_id: InstitutionId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    pub rating: u8,
    pub comment: String,
    pub course: String,
    /// Institution response; empty until the institution replies.
    pub reply: String,
    /// Identities that marked the review helpful.
    pub likes: BTreeSet<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub fn new(author_id: UserId, draft: ValidReview, now: DateTime<Utc>) -> Self {
        Self {
            id: ReviewId::generate(),
            institution_id: draft.institution_id,
            author_id,
            rating: draft.rating,
            comment: draft.comment,
            course: draft.course,
            reply: String::new(),
            likes: BTreeSet::new(),
            is_approved: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_written_by(&self, identity: &str) -> bool {
        self.author_id.as_str() == identity
    }

    /// Adds or removes the identity, returning whether it now likes the review.
    pub fn toggle_like(&mut self, identity: &str) -> bool {
        if self.likes.remove(identity) {
            false
        } else {
            self.likes.insert(identity.to_string());
            true
        }
    }
}

/// Review form as posted by a student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub institution_id: InstitutionId,
    pub rating: i64,
    pub comment: String,
    #[serde(default)]
    pub course: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
    pub institution_id: InstitutionId,
    pub rating: u8,
    pub comment: String,
    pub course: String,
}

impl NewReview {
    pub fn validate(self) -> Result<ValidReview, &'static str> {
        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|rating| (1..=5).contains(rating))
            .ok_or("Rating must be between 1 and 5.")?;
        let comment = self.comment.trim().to_string();
        if comment.is_empty() {
            return Err("Comment is required.");
        }
        Ok(ValidReview {
            institution_id: self.institution_id,
            rating,
            comment,
            course: self
                .course
                .map(|course| course.trim().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Review joined with display names for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    #[serde(flatten)]
    pub review: Review,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_name: Option<String>,
}
