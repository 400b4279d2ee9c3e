use std::sync::Arc;

use chrono::Utc;

use super::consultations::{
    Consultation, ConsultationBooking, ConsultationSchedule, ConsultationStatus,
};
use super::dashboard::{DashboardStats, RECENT_ACTIVITY_LIMIT};
use super::repository::ModerationRepository;
use super::requests::{InstitutionRequest, RequestStatus, TransitionError};
use crate::accounts::{
    generate_initial_password, AccountRepository, PasswordHasher, UserRecord, UserRole,
};
use crate::directory::{DirectoryRepository, Institution};
use crate::error::ServiceError;
use crate::ids::{ConsultationId, RecipientId, RequestId, UserId};
use crate::mail::{deliver_best_effort, Mailer, OutboundEmail};
use crate::notifications::{
    self, Notification, NotificationRepository, RelatedModel, ADMIN_MESSAGE,
};
use crate::reviews::ReviewRepository;
use crate::store::{contains_ignore_case, Page, PageRequest, RepositoryError};

/// Admin-side workflows that span several collections.
pub struct ModerationService<S> {
    store: Arc<S>,
    hasher: PasswordHasher,
    mailer: Arc<dyn Mailer>,
}

impl<S> ModerationService<S>
where
    S: ModerationRepository
        + DirectoryRepository
        + AccountRepository
        + ReviewRepository
        + NotificationRepository
        + 'static,
{
    pub fn new(store: Arc<S>, hasher: PasswordHasher, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            hasher,
            mailer,
        }
    }

    pub fn list_requests(&self) -> Result<Vec<InstitutionRequest>, ServiceError> {
        Ok(self.store.list_requests()?)
    }

    /// Create the live institution with a generated password, mark the request approved, then
    /// mail the credentials. Mail failure is logged only. If the request was processed by
    /// someone else in the meantime the new institution is removed again.
    pub fn approve_request(
        &self,
        id: &RequestId,
        admin: &UserId,
    ) -> Result<Institution, ServiceError> {
        let request = self.fetch_request(id)?;
        if request.status != RequestStatus::Pending {
            return Err(TransitionError::AlreadyProcessed.into());
        }

        let password = generate_initial_password();
        let password_hash = self.hasher.hash(&password)?;
        let now = Utc::now();

        let institution = self
            .store
            .insert_institution(request.to_institution(password_hash, now))
            .map_err(|err| match err {
                RepositoryError::Conflict => {
                    ServiceError::Conflict("Institution already registered.".to_string())
                }
                other => other.into(),
            })?;

        let approved = self.store.edit_request(id, |request| {
            request.approve(admin, now).map_err(ServiceError::from)
        });
        let request = match approved {
            Ok(Some(request)) => request,
            Ok(None) => {
                self.store.delete_institution(&institution.id)?;
                return Err(ServiceError::not_found("Request not found"));
            }
            Err(err) => {
                self.store.delete_institution(&institution.id)?;
                return Err(err);
            }
        };
        tracing::info!(
            request_id = %id,
            institution_id = %institution.id,
            approved_by = %admin,
            "institution request approved"
        );

        deliver_best_effort(
            self.mailer.as_ref(),
            OutboundEmail::institution_credentials(
                &request.application.email,
                &request.application.institution_name,
                institution.login_email(),
                &password,
            ),
        );

        Ok(institution)
    }

    pub fn reject_request(
        &self,
        id: &RequestId,
        reason: &str,
    ) -> Result<InstitutionRequest, ServiceError> {
        let request = self
            .store
            .edit_request(id, |request| {
                request.reject(reason, Utc::now()).map_err(ServiceError::from)
            })?
            .ok_or_else(|| ServiceError::not_found("Request not found"))?;
        tracing::info!(request_id = %id, "institution request rejected");
        Ok(request)
    }

    fn fetch_request(&self, id: &RequestId) -> Result<InstitutionRequest, ServiceError> {
        self.store
            .fetch_request(id)?
            .ok_or_else(|| ServiceError::not_found("Request not found"))
    }

    pub fn book_consultation(
        &self,
        student_id: &UserId,
        booking: ConsultationBooking,
    ) -> Result<Consultation, ServiceError> {
        let student = self
            .store
            .fetch_user(student_id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        let consultation =
            Consultation::book(&student, booking, Utc::now()).map_err(ServiceError::invalid)?;
        let consultation = self.store.insert_consultation(consultation)?;
        tracing::info!(consultation_id = %consultation.id, student_id = %student_id, "consultation booked");
        Ok(consultation)
    }

    pub fn consultations_for(&self, student_id: &UserId) -> Result<Vec<Consultation>, ServiceError> {
        Ok(self.store.consultations_for_user(student_id)?)
    }

    /// One of the student's own bookings; other students' bookings read as missing.
    pub fn consultation_for(
        &self,
        student_id: &UserId,
        id: &ConsultationId,
    ) -> Result<Consultation, ServiceError> {
        self.store
            .consultations_for_user(student_id)?
            .into_iter()
            .find(|consultation| &consultation.id == id)
            .ok_or_else(consultation_not_found)
    }

    pub fn list_consultations(
        &self,
        status: Option<ConsultationStatus>,
    ) -> Result<Vec<Consultation>, ServiceError> {
        Ok(self
            .store
            .list_consultations()?
            .into_iter()
            .filter(|consultation| status.map_or(true, |status| consultation.status == status))
            .collect())
    }

    pub fn approve_consultation(
        &self,
        id: &ConsultationId,
        admin: &UserId,
        schedule: ConsultationSchedule,
    ) -> Result<Consultation, ServiceError> {
        schedule.validate().map_err(ServiceError::invalid)?;
        let consultation = self
            .store
            .edit_consultation(id, |consultation| {
                consultation
                    .approve(schedule.clone(), admin, Utc::now())
                    .map_err(ServiceError::from)
            })?
            .ok_or_else(consultation_not_found)?;
        tracing::info!(consultation_id = %id, approved_by = %admin, "consultation approved");

        notifications::enqueue(
            self.store.as_ref(),
            Notification::new(
                RecipientId::from(&consultation.user_id),
                ADMIN_MESSAGE,
                "Consultation Approved",
                format!(
                    "Your {} consultation is scheduled for {} at {}.",
                    consultation.consultation_type,
                    schedule.scheduled_date,
                    schedule.scheduled_time
                ),
            )
            .about(RelatedModel::Consultation, consultation.id.as_str()),
        );
        deliver_best_effort(
            self.mailer.as_ref(),
            OutboundEmail::consultation_confirmation(
                &consultation.email,
                &consultation.name,
                &consultation.consultation_type,
                &schedule,
            ),
        );

        Ok(consultation)
    }

    pub fn reject_consultation(
        &self,
        id: &ConsultationId,
        reason: &str,
    ) -> Result<Consultation, ServiceError> {
        let consultation = self
            .store
            .edit_consultation(id, |consultation| {
                consultation
                    .reject(reason, Utc::now())
                    .map_err(ServiceError::from)
            })?
            .ok_or_else(consultation_not_found)?;
        tracing::info!(consultation_id = %id, "consultation rejected");

        notifications::enqueue(
            self.store.as_ref(),
            Notification::new(
                RecipientId::from(&consultation.user_id),
                ADMIN_MESSAGE,
                "Consultation Rejected",
                format!(
                    "Your {} consultation request was declined.",
                    consultation.consultation_type
                ),
            )
            .about(RelatedModel::Consultation, consultation.id.as_str()),
        );

        Ok(consultation)
    }

    pub fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let pending_requests = self
            .store
            .list_requests()?
            .iter()
            .filter(|request| request.status == RequestStatus::Pending)
            .count();
        let pending_consultations = self
            .store
            .list_consultations()?
            .iter()
            .filter(|consultation| consultation.status == ConsultationStatus::Pending)
            .count();

        Ok(DashboardStats {
            total_students: self.store.users_with_role(UserRole::Student)?.len(),
            total_institutions: self.store.list_institutions()?.len(),
            pending_requests,
            pending_consultations,
            total_reviews: self.store.all_reviews()?.len(),
            recent_activities: self.store.recent_notifications(RECENT_ACTIVITY_LIMIT)?,
        })
    }

    /// Students matching `search` on name or email, newest first.
    pub fn list_students(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<UserRecord>, ServiceError> {
        let term = search.map(str::trim).filter(|term| !term.is_empty());
        let students = self
            .store
            .users_with_role(UserRole::Student)?
            .into_iter()
            .filter(|user| match term {
                Some(term) => {
                    contains_ignore_case(&user.name, term) || contains_ignore_case(&user.email, term)
                }
                None => true,
            })
            .collect();
        Ok(page.apply(students))
    }

    /// Suspends or reactivates a user, returning the new `isActive`.
    pub fn toggle_user_active(&self, id: &UserId) -> Result<bool, ServiceError> {
        let is_active = self
            .store
            .edit_user(id, |user| {
                user.is_active = !user.is_active;
                user.updated_at = Utc::now();
                Ok::<_, ServiceError>(())
            })?
            .map(|user| user.is_active)
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        tracing::info!(user_id = %id, is_active, "user status toggled");
        Ok(is_active)
    }

    pub fn delete_user(&self, id: &UserId) -> Result<(), ServiceError> {
        if !self.store.delete_user(id)? {
            return Err(ServiceError::not_found("User not found"));
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

fn consultation_not_found() -> ServiceError {
    ServiceError::not_found("Consultation not found")
}
