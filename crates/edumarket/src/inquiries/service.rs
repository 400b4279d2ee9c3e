use std::sync::Arc;

use chrono::Utc;

use super::domain::{Inquiry, InquiryForm, InquiryStatus, StudentInquiry};
use super::repository::InquiryRepository;
use crate::accounts::AccountRepository;
use crate::directory::DirectoryRepository;
use crate::error::ServiceError;
use crate::ids::{InquiryId, InstitutionId, RecipientId, UserId};
use crate::notifications::{self, Notification, NotificationRepository, RelatedModel, ADMIN_MESSAGE};

pub struct InquiryService<S> {
    store: Arc<S>,
}

impl<S> InquiryService<S>
where
    S: InquiryRepository
        + DirectoryRepository
        + AccountRepository
        + NotificationRepository
        + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Public form. `author` is the signed-in caller, if any; it must be an existing user.
    pub fn submit(
        &self,
        institution_id: &InstitutionId,
        author: Option<&UserId>,
        form: InquiryForm,
    ) -> Result<Inquiry, ServiceError> {
        let author = match author {
            Some(id) => Some(
                self.store
                    .fetch_user(id)?
                    .ok_or_else(|| ServiceError::not_found("User not found"))?
                    .id,
            ),
            None => None,
        };
        self.record(institution_id, author, form)
    }

    /// Dashboard variant: contact fields are taken from the student's profile.
    pub fn submit_as_student(
        &self,
        student_id: &UserId,
        request: StudentInquiry,
    ) -> Result<Inquiry, ServiceError> {
        let student = self
            .store
            .fetch_user(student_id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let form = InquiryForm {
            name: student.name,
            email: student.email,
            phone: student.phone.unwrap_or_default(),
            course: request.subject,
            message: request.message,
        };
        self.record(&request.institution_id, Some(student.id), form)
    }

    /// Replace any earlier inquiry from the same author, store the new one and notify the
    /// institution.
    fn record(
        &self,
        institution_id: &InstitutionId,
        author: Option<UserId>,
        form: InquiryForm,
    ) -> Result<Inquiry, ServiceError> {
        if self.store.fetch_institution(institution_id)?.is_none() {
            return Err(ServiceError::not_found("Institution not found"));
        }

        let inquiry = Inquiry::from_form(institution_id.clone(), author, form, Utc::now())
            .map_err(ServiceError::invalid)?;

        if let Some(author) = &inquiry.author_id {
            let replaced = self.store.delete_inquiries_from(author, institution_id)?;
            if replaced > 0 {
                tracing::debug!(%author, %institution_id, replaced, "earlier inquiries replaced");
            }
        }

        let inquiry = self.store.insert_inquiry(inquiry)?;
        tracing::info!(inquiry_id = %inquiry.id, %institution_id, "inquiry submitted");

        notifications::enqueue(
            self.store.as_ref(),
            Notification::new(
                RecipientId::from(institution_id),
                ADMIN_MESSAGE,
                "New Inquiry Received",
                format!(
                    "You have received a new inquiry from {}.",
                    inquiry.student_name
                ),
            )
            .about(RelatedModel::Inquiry, inquiry.id.as_str()),
        );

        Ok(inquiry)
    }

    pub fn list_for_institution(
        &self,
        institution_id: &InstitutionId,
    ) -> Result<Vec<Inquiry>, ServiceError> {
        Ok(self.store.inquiries_for_institution(institution_id)?)
    }

    /// Only the institution the inquiry was sent to may move it along.
    pub fn update_status(
        &self,
        institution_id: &InstitutionId,
        id: &InquiryId,
        status: InquiryStatus,
    ) -> Result<Inquiry, ServiceError> {
        self.store
            .edit_inquiry(id, |inquiry| {
                if &inquiry.institution_id != institution_id {
                    return Err(ServiceError::forbidden("Unauthorized"));
                }
                inquiry.status = status;
                inquiry.updated_at = Utc::now();
                Ok(())
            })?
            .ok_or_else(|| ServiceError::not_found("Inquiry not found"))
    }
}
