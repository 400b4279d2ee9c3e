use super::domain::Inquiry;
use crate::ids::{InquiryId, InstitutionId, UserId};
use crate::store::RepositoryError;

pub trait InquiryRepository: Send + Sync {
    fn insert_inquiry(&self, inquiry: Inquiry) -> Result<Inquiry, RepositoryError>;
    /// Applies `change` to the stored inquiry under the store lock.
    fn edit_inquiry<E>(
        &self,
        id: &InquiryId,
        change: impl FnOnce(&mut Inquiry) -> Result<(), E>,
    ) -> Result<Option<Inquiry>, E>
    where
        E: From<RepositoryError>;
    fn fetch_inquiry(&self, id: &InquiryId) -> Result<Option<Inquiry>, RepositoryError>;
    /// Removes every inquiry the author sent to the institution, returning how many went.
    fn delete_inquiries_from(
        &self,
        author: &UserId,
        institution: &InstitutionId,
    ) -> Result<usize, RepositoryError>;
    /// Newest first.
    fn inquiries_for_institution(
        &self,
        institution: &InstitutionId,
    ) -> Result<Vec<Inquiry>, RepositoryError>;
}
