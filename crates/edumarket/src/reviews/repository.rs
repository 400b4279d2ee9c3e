use super::domain::Review;
use crate::ids::{InstitutionId, ReviewId, UserId};
use crate::store::RepositoryError;

/// Review storage.
pub trait ReviewRepository: Send + Sync {
    /// Fails with `Conflict` when the author already reviewed the institution.
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    /// Applies `change` to the stored review under the store lock.
    fn edit_review<E>(
        &self,
        id: &ReviewId,
        change: impl FnOnce(&mut Review) -> Result<(), E>,
    ) -> Result<Option<Review>, E>
    where
        E: From<RepositoryError>;
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn find_review(
        &self,
        institution: &InstitutionId,
        author: &UserId,
    ) -> Result<Option<Review>, RepositoryError>;
    /// Returns the removed review.
    fn delete_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    /// Newest first.
    fn reviews_for_institution(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Review>, RepositoryError>;
    /// Newest first.
    fn reviews_by_author(&self, author: &UserId) -> Result<Vec<Review>, RepositoryError>;
    /// Newest first.
    fn all_reviews(&self) -> Result<Vec<Review>, RepositoryError>;
    /// Ratings of the approved reviews for one institution.
    fn approved_ratings(&self, institution: &InstitutionId) -> Result<Vec<u8>, RepositoryError>;
}
