use serde::Serialize;

use crate::notifications::Notification;

/// Recent activity entries shown on the admin dashboard.
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_institutions: usize,
    pub pending_requests: usize,
    pub pending_consultations: usize,
    pub total_reviews: usize,
    pub recent_activities: Vec<Notification>,
}
