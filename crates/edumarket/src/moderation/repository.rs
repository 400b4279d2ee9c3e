use super::consultations::Consultation;
use super::requests::InstitutionRequest;
use crate::ids::{ConsultationId, RequestId, UserId};
use crate::store::RepositoryError;

/// Onboarding requests and consultation bookings.
pub trait ModerationRepository: Send + Sync {
    fn insert_request(&self, request: InstitutionRequest)
        -> Result<InstitutionRequest, RepositoryError>;
    /// Runs a transition against the stored request. Of two racing transitions only the first
    /// sees `pending`.
    fn edit_request<E>(
        &self,
        id: &RequestId,
        change: impl FnOnce(&mut InstitutionRequest) -> Result<(), E>,
    ) -> Result<Option<InstitutionRequest>, E>
    where
        E: From<RepositoryError>;
    fn fetch_request(&self, id: &RequestId) -> Result<Option<InstitutionRequest>, RepositoryError>;
    /// Newest first.
    fn list_requests(&self) -> Result<Vec<InstitutionRequest>, RepositoryError>;
    fn requests_for_email(&self, email: &str)
        -> Result<Vec<InstitutionRequest>, RepositoryError>;

    fn insert_consultation(&self, consultation: Consultation)
        -> Result<Consultation, RepositoryError>;
    /// Runs a transition against the stored consultation.
    fn edit_consultation<E>(
        &self,
        id: &ConsultationId,
        change: impl FnOnce(&mut Consultation) -> Result<(), E>,
    ) -> Result<Option<Consultation>, E>
    where
        E: From<RepositoryError>;
    fn fetch_consultation(
        &self,
        id: &ConsultationId,
    ) -> Result<Option<Consultation>, RepositoryError>;
    /// Newest first.
    fn list_consultations(&self) -> Result<Vec<Consultation>, RepositoryError>;
    fn consultations_for_user(&self, user: &UserId) -> Result<Vec<Consultation>, RepositoryError>;
}
