use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::aggregate::RatingSummary;
use super::domain::{NewReview, Review, ReviewEntry};
use super::repository::ReviewRepository;
use crate::accounts::{AccountRepository, UserRole};
use crate::directory::DirectoryRepository;
use crate::error::ServiceError;
use crate::ids::{InstitutionId, RecipientId, ReviewId, UserId};
use crate::notifications::{self, Notification, NotificationRepository, RelatedModel, ADMIN_MESSAGE};
use crate::store::RepositoryError;

/// Review lifecycle plus synchronous recomputation of the institution aggregate.
pub struct ReviewService<S> {
    store: Arc<S>,
}

impl<S> ReviewService<S>
where
    S: ReviewRepository
        + DirectoryRepository
        + AccountRepository
        + NotificationRepository
        + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a student review, refresh the aggregate and notify the institution.
    pub fn submit(&self, author_id: &UserId, form: NewReview) -> Result<Review, ServiceError> {
        let draft = form.validate().map_err(ServiceError::invalid)?;

        let author = self
            .store
            .fetch_user(author_id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        if author.role != UserRole::Student {
            return Err(ServiceError::forbidden(
                "Only students are allowed to write reviews.",
            ));
        }

        if self
            .store
            .fetch_institution(&draft.institution_id)?
            .is_none()
        {
            return Err(ServiceError::not_found("Institution not found"));
        }

        if self
            .store
            .find_review(&draft.institution_id, author_id)?
            .is_some()
        {
            return Err(already_reviewed());
        }

        let review = self
            .store
            .insert_review(Review::new(author_id.clone(), draft, Utc::now()))
            .map_err(|err| match err {
                RepositoryError::Conflict => already_reviewed(),
                other => other.into(),
            })?;
        let summary = self.recompute(&review.institution_id)?;
        tracing::info!(
            review_id = %review.id,
            institution_id = %review.institution_id,
            rating = summary.rating,
            total_reviews = summary.total_reviews,
            "review submitted"
        );

        notifications::enqueue(
            self.store.as_ref(),
            Notification::new(
                RecipientId::from(&review.institution_id),
                ADMIN_MESSAGE,
                "New Review Received",
                format!(
                    "{} has posted a new review ({}/5).",
                    author.name, review.rating
                ),
            )
            .about(RelatedModel::Review, review.id.as_str()),
        );

        Ok(review)
    }

    /// Author-only deletion. The aggregate is untouched when the caller is not the author.
    pub fn delete_own(&self, id: &ReviewId, caller: &str) -> Result<RatingSummary, ServiceError> {
        let review = self
            .store
            .fetch_review(id)?
            .ok_or_else(review_not_found)?;
        if !review.is_written_by(caller) {
            return Err(ServiceError::forbidden("Unauthorized"));
        }
        self.remove(id)
    }

    /// Moderator deletion without an ownership check.
    pub fn admin_delete(&self, id: &ReviewId) -> Result<RatingSummary, ServiceError> {
        self.remove(id)
    }

    fn remove(&self, id: &ReviewId) -> Result<RatingSummary, ServiceError> {
        let removed = self
            .store
            .delete_review(id)?
            .ok_or_else(review_not_found)?;
        let summary = self.recompute(&removed.institution_id)?;
        tracing::info!(
            review_id = %id,
            institution_id = %removed.institution_id,
            rating = summary.rating,
            total_reviews = summary.total_reviews,
            "review deleted"
        );
        Ok(summary)
    }

    /// Recalculate `rating` / `totalReviews` from every approved review of the institution.
    pub fn recompute(&self, institution: &InstitutionId) -> Result<RatingSummary, ServiceError> {
        let summary = RatingSummary::from_ratings(self.store.approved_ratings(institution)?);
        self.store
            .set_rating(institution, summary.rating, summary.total_reviews)?;
        Ok(summary)
    }

    /// Institution reply; overwrites any previous reply.
    pub fn reply(
        &self,
        institution: &InstitutionId,
        id: &ReviewId,
        reply: &str,
    ) -> Result<Review, ServiceError> {
        self.store
            .edit_review(id, |review| {
                if &review.institution_id != institution {
                    return Err(ServiceError::forbidden(
                        "You can only reply to reviews of your own institution.",
                    ));
                }
                review.reply = reply.to_string();
                review.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or_else(review_not_found)
    }

    pub fn toggle_like(&self, id: &ReviewId, identity: &str) -> Result<Review, ServiceError> {
        self.store
            .edit_review(id, |review| {
                review.toggle_like(identity);
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(review_not_found)
    }

    /// Hides or restores a review. Hidden reviews leave the public listing and the aggregate
    /// but stay on the institution's dashboard.
    pub fn set_approval(&self, id: &ReviewId, approved: bool) -> Result<Review, ServiceError> {
        let review = self
            .store
            .edit_review(id, |review| {
                review.is_approved = approved;
                review.updated_at = Utc::now();
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(review_not_found)?;
        let summary = self.recompute(&review.institution_id)?;
        tracing::info!(
            review_id = %id,
            institution_id = %review.institution_id,
            approved,
            rating = summary.rating,
            total_reviews = summary.total_reviews,
            "review approval changed"
        );
        Ok(review)
    }

    /// Public listing: approved reviews with author names, newest first.
    pub fn published_for(&self, institution: &InstitutionId) -> Result<Vec<ReviewEntry>, ServiceError> {
        let reviews = self
            .store
            .reviews_for_institution(institution)?
            .into_iter()
            .filter(|review| review.is_approved)
            .collect();
        self.with_names(reviews, true, false)
    }

    /// Institution dashboard listing, including unapproved reviews.
    pub fn received_by(&self, institution: &InstitutionId) -> Result<Vec<ReviewEntry>, ServiceError> {
        let reviews = self.store.reviews_for_institution(institution)?;
        self.with_names(reviews, true, false)
    }

    pub fn written_by(&self, author: &UserId) -> Result<Vec<ReviewEntry>, ServiceError> {
        let reviews = self.store.reviews_by_author(author)?;
        self.with_names(reviews, false, true)
    }

    pub fn all_entries(&self) -> Result<Vec<ReviewEntry>, ServiceError> {
        let reviews = self.store.all_reviews()?;
        self.with_names(reviews, true, true)
    }

    fn with_names(
        &self,
        reviews: Vec<Review>,
        authors: bool,
        institutions: bool,
    ) -> Result<Vec<ReviewEntry>, ServiceError> {
        let mut author_names: HashMap<UserId, Option<String>> = HashMap::new();
        let mut institution_names: HashMap<InstitutionId, Option<String>> = HashMap::new();
        let mut entries = Vec::with_capacity(reviews.len());

        for review in reviews {
            let author_name = if authors {
                match author_names.get(&review.author_id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self.store.fetch_user(&review.author_id)?.map(|user| user.name);
                        author_names.insert(review.author_id.clone(), name.clone());
                        name
                    }
                }
            } else {
                None
            };

            let institution_name = if institutions {
                match institution_names.get(&review.institution_id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self
                            .store
                            .fetch_institution(&review.institution_id)?
                            .map(|institution| institution.name);
                        institution_names.insert(review.institution_id.clone(), name.clone());
                        name
                    }
                }
            } else {
                None
            };

            entries.push(ReviewEntry {
                review,
                author_name,
                institution_name,
            });
        }

        Ok(entries)
    }
}

fn review_not_found() -> ServiceError {
    ServiceError::not_found("Review not found")
}

fn already_reviewed() -> ServiceError {
    ServiceError::Conflict("You have already reviewed this institution.".to_string())
}
