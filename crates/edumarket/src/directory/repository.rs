use super::domain::Institution;
use crate::ids::InstitutionId;
use crate::store::RepositoryError;

pub trait DirectoryRepository: Send + Sync {
    /// Fails with `Conflict` when another institution uses the same login email.
    fn insert_institution(&self, institution: Institution)
        -> Result<Institution, RepositoryError>;
    /// Applies `change` to the stored record under the store lock, so the aggregate written by
    /// [`set_rating`](Self::set_rating) is never overwritten with a stale copy.
    fn edit_institution<E>(
        &self,
        id: &InstitutionId,
        change: impl FnOnce(&mut Institution) -> Result<(), E>,
    ) -> Result<Option<Institution>, E>
    where
        E: From<RepositoryError>;
    fn fetch_institution(&self, id: &InstitutionId)
        -> Result<Option<Institution>, RepositoryError>;
    fn find_institution_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Institution>, RepositoryError>;
    /// Newest first.
    fn list_institutions(&self) -> Result<Vec<Institution>, RepositoryError>;
    fn delete_institution(&self, id: &InstitutionId) -> Result<bool, RepositoryError>;
    /// Writes only the aggregate fields. Missing institutions are ignored.
    fn set_rating(
        &self,
        id: &InstitutionId,
        rating: f64,
        total_reviews: u32,
    ) -> Result<(), RepositoryError>;
}
