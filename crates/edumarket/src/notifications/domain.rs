use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{NotificationId, RecipientId};

pub const ADMIN_MESSAGE: &str = "admin_message";
pub const ADMIN_BROADCAST: &str = "admin_broadcast";

/// Most recent notifications returned by an inbox read.
pub const INBOX_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedModel {
    Review,
    Inquiry,
    Consultation,
    InstitutionRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub id: String,
    pub model: RelatedModel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "userId")]
    pub recipient: RecipientId,
    /// Free-form tag; the admin surface uses [`ADMIN_MESSAGE`] and [`ADMIN_BROADCAST`].
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedEntity>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: RecipientId,
        kind: &str,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            recipient,
            kind: kind.to_string(),
            title: title.into(),
            message: message.into(),
            related: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn about(mut self, model: RelatedModel, id: impl Into<String>) -> Self {
        self.related = Some(RelatedEntity {
            id: id.into(),
            model,
        });
        self
    }
}

/// Broadcast target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Student,
    Institution,
}

impl Audience {
    pub fn includes_students(self) -> bool {
        matches!(self, Audience::All | Audience::Student)
    }

    pub fn includes_institutions(self) -> bool {
        matches!(self, Audience::All | Audience::Institution)
    }
}

/// Admin message to a single recipient.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub user_id: RecipientId,
    pub title: String,
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub data: Vec<Notification>,
    pub unread_count: usize,
}
