//! Admin moderation: institution onboarding, consultation scheduling, account suspension and the
//! dashboard counters.

pub mod consultations;
pub mod dashboard;
pub mod repository;
pub mod requests;
pub mod service;

pub use consultations::{
    Consultation, ConsultationBooking, ConsultationSchedule, ConsultationStatus, MeetingMode,
};
pub use dashboard::DashboardStats;
pub use repository::ModerationRepository;
pub use requests::{InstitutionApplication, InstitutionRequest, RequestStatus, TransitionError};
pub use service::ModerationService;
