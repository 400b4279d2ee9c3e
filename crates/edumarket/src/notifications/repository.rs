use super::domain::Notification;
use crate::ids::{NotificationId, RecipientId};
use crate::store::RepositoryError;

pub trait NotificationRepository: Send + Sync {
    fn insert_notification(&self, notification: Notification)
        -> Result<Notification, RepositoryError>;
    /// Writes every notification or none of them.
    fn insert_notifications(
        &self,
        notifications: Vec<Notification>,
    ) -> Result<usize, RepositoryError>;
    /// Newest first.
    fn notifications_for(
        &self,
        recipient: &RecipientId,
    ) -> Result<Vec<Notification>, RepositoryError>;
    /// Scoped to the recipient; returns the updated notification when it belongs to them.
    fn mark_notification_read(
        &self,
        recipient: &RecipientId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, RepositoryError>;
    fn mark_all_notifications_read(&self, recipient: &RecipientId)
        -> Result<usize, RepositoryError>;
    /// Newest first across every recipient.
    fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>, RepositoryError>;
}
