use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::requests::TransitionError;
use crate::accounts::UserRecord;
use crate::ids::{ConsultationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ConsultationStatus {
    /// Query-string filter; `all` and unknown values mean no filter.
    pub fn parse_filter(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            Some("pending") => Some(Self::Pending),
            Some("approved") => Some(Self::Approved),
            Some("rejected") => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingMode {
    Online,
    Offline,
}

impl MeetingMode {
    pub const fn label(self) -> &'static str {
        match self {
            MeetingMode::Online => "online",
            MeetingMode::Offline => "offline",
        }
    }
}

/// Admin-chosen slot attached on approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationSchedule {
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub mode: MeetingMode,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ConsultationSchedule {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.scheduled_time.trim().is_empty() {
            return Err("Scheduled time is required.");
        }
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        };
        match self.mode {
            MeetingMode::Online if !present(&self.meeting_link) => {
                Err("Meeting link is required for online consultations.")
            }
            MeetingMode::Offline if !present(&self.location) => {
                Err("Location is required for offline consultations.")
            }
            _ => Ok(()),
        }
    }
}

/// Student booking form. Contact fields fall back to the student's profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationBooking {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub consultation_type: String,
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consultation {
    pub id: ConsultationId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub consultation_type: String,
    pub preferred_date: Option<String>,
    pub message: String,
    pub status: ConsultationStatus,
    pub schedule: Option<ConsultationSchedule>,
    pub rejection_reason: String,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Consultation {
    pub fn book(
        student: &UserRecord,
        booking: ConsultationBooking,
        now: DateTime<Utc>,
    ) -> Result<Self, &'static str> {
        let consultation_type = booking.consultation_type.trim().to_string();
        if consultation_type.is_empty() {
            return Err("Consultation type is required.");
        }

        let or_profile = |value: Option<String>, fallback: &str| {
            value
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Ok(Self {
            id: ConsultationId::generate(),
            user_id: student.id.clone(),
            name: or_profile(booking.name, &student.name),
            email: or_profile(booking.email, &student.email),
            phone: or_profile(booking.phone, student.phone.as_deref().unwrap_or_default()),
            consultation_type,
            preferred_date: booking
                .preferred_date
                .filter(|date| !date.trim().is_empty()),
            message: booking.message,
            status: ConsultationStatus::Pending,
            schedule: None,
            rejection_reason: String::new(),
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn ensure_pending(&self) -> Result<(), TransitionError> {
        match self.status {
            ConsultationStatus::Pending => Ok(()),
            ConsultationStatus::Approved | ConsultationStatus::Rejected => {
                Err(TransitionError::AlreadyProcessed)
            }
        }
    }

    pub fn approve(
        &mut self,
        schedule: ConsultationSchedule,
        admin: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = ConsultationStatus::Approved;
        self.schedule = Some(schedule);
        self.approved_by = Some(admin.clone());
        self.approved_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.ensure_pending()?;
        self.status = ConsultationStatus::Rejected;
        self.rejection_reason = reason.to_string();
        self.updated_at = now;
        Ok(())
    }
}
