use std::sync::Arc;

use super::domain::{
    Audience, DirectMessage, Inbox, Notification, ADMIN_BROADCAST, ADMIN_MESSAGE, INBOX_LIMIT,
};
use super::repository::NotificationRepository;
use crate::accounts::{AccountRepository, UserRole};
use crate::directory::DirectoryRepository;
use crate::error::ServiceError;
use crate::ids::{NotificationId, RecipientId};

/// Records a side-effect notification. Failures are logged and never reach the caller.
pub(crate) fn enqueue<S>(store: &S, notification: Notification)
where
    S: NotificationRepository + ?Sized,
{
    let recipient = notification.recipient.clone();
    let title = notification.title.clone();
    if let Err(err) = store.insert_notification(notification) {
        tracing::warn!(%recipient, %title, error = %err, "notification enqueue failed");
    }
}

pub struct NotificationService<S> {
    store: Arc<S>,
}

impl<S> NotificationService<S>
where
    S: NotificationRepository + AccountRepository + DirectoryRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn send_direct(&self, message: DirectMessage) -> Result<Notification, ServiceError> {
        let (title, body) = require_content(&message.title, &message.message)?;
        let kind = message
            .kind
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .unwrap_or(ADMIN_MESSAGE);
        let notification = Notification::new(message.user_id, kind, title, body);
        let stored = self.store.insert_notification(notification)?;
        tracing::info!(recipient = %stored.recipient, "direct notification sent");
        Ok(stored)
    }

    /// One `admin_broadcast` notification per resolved recipient, written as a single batch.
    /// Returns the recipient count.
    pub fn broadcast(
        &self,
        audience: Audience,
        title: &str,
        message: &str,
    ) -> Result<usize, ServiceError> {
        let (title, message) = require_content(title, message)?;
        let recipients = self.resolve(audience)?;
        if recipients.is_empty() {
            return Err(ServiceError::not_found("No users found"));
        }

        let batch = recipients
            .into_iter()
            .map(|recipient| Notification::new(recipient, ADMIN_BROADCAST, title, message))
            .collect();
        let written = self.store.insert_notifications(batch)?;
        tracing::info!(?audience, recipients = written, "broadcast delivered");
        Ok(written)
    }

    pub fn inbox(&self, recipient: &RecipientId) -> Result<Inbox, ServiceError> {
        let all = self.store.notifications_for(recipient)?;
        let unread_count = all.iter().filter(|notification| !notification.is_read).count();
        let data = all.into_iter().take(INBOX_LIMIT).collect();
        Ok(Inbox { data, unread_count })
    }

    pub fn mark_read(
        &self,
        recipient: &RecipientId,
        id: &NotificationId,
    ) -> Result<Notification, ServiceError> {
        self.store
            .mark_notification_read(recipient, id)?
            .ok_or_else(|| ServiceError::not_found("Notification not found"))
    }

    pub fn mark_all_read(&self, recipient: &RecipientId) -> Result<usize, ServiceError> {
        Ok(self.store.mark_all_notifications_read(recipient)?)
    }

    pub fn recent(&self, limit: usize) -> Result<Vec<Notification>, ServiceError> {
        Ok(self.store.recent_notifications(limit)?)
    }

    fn resolve(&self, audience: Audience) -> Result<Vec<RecipientId>, ServiceError> {
        let mut recipients = Vec::new();
        if audience.includes_students() {
            recipients.extend(
                self.store
                    .users_with_role(UserRole::Student)?
                    .iter()
                    .map(|user| RecipientId::from(&user.id)),
            );
        }
        if audience.includes_institutions() {
            recipients.extend(
                self.store
                    .list_institutions()?
                    .iter()
                    .map(|institution| RecipientId::from(&institution.id)),
            );
        }
        Ok(recipients)
    }
}

fn require_content<'a>(title: &'a str, message: &'a str) -> Result<(&'a str, &'a str), ServiceError> {
    let (title, message) = (title.trim(), message.trim());
    if title.is_empty() || message.is_empty() {
        return Err(ServiceError::invalid("Title and message are required"));
    }
    Ok((title, message))
}
