//! Per-recipient inbox: direct admin messages, audience broadcasts and system notices raised by
//! reviews, inquiries and consultations.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{
    Audience, DirectMessage, Inbox, Notification, RelatedEntity, RelatedModel, ADMIN_BROADCAST,
    ADMIN_MESSAGE, INBOX_LIMIT,
};
pub use repository::NotificationRepository;
pub use service::NotificationService;

pub(crate) use service::enqueue;
