//! Outbound email boundary.
//!
//! Services build an [`OutboundEmail`] from one of the templates below and hand it to a
//! [`Mailer`]. The SMTP adapter lives in the service crate; [`LogMailer`] stands in when no relay
//! is configured.

use serde::Serialize;

use crate::moderation::ConsultationSchedule;
use crate::moderation::MeetingMode;

/// Transport-agnostic mail hook injected into the services.
pub trait Mailer: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutboundEmail {
    pub fn password_reset(to: &str, otp: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Password Reset OTP - Edumarket".to_string(),
            body: format!("Your OTP for password reset is: {otp}. It is valid for 10 minutes."),
        }
    }

    pub fn institution_credentials(
        to: &str,
        institution_name: &str,
        login_email: &str,
        password: &str,
    ) -> Self {
        Self {
            to: to.to_string(),
            subject: "Your institution has been approved - Edumarket".to_string(),
            body: format!(
                "Congratulations {institution_name}!\n\n\
                 Your application has been approved. Use these credentials to sign in:\n\n\
                 Email: {login_email}\nPassword: {password}\n\n\
                 You will be asked to change this password after your first login."
            ),
        }
    }

    pub fn consultation_confirmation(
        to: &str,
        student_name: &str,
        consultation_type: &str,
        schedule: &ConsultationSchedule,
    ) -> Self {
        let venue = match schedule.mode {
            MeetingMode::Online => format!(
                "Meeting link: {}",
                schedule.meeting_link.as_deref().unwrap_or_default()
            ),
            MeetingMode::Offline => format!(
                "Location: {}",
                schedule.location.as_deref().unwrap_or_default()
            ),
        };
        let notes = schedule
            .notes
            .as_deref()
            .filter(|notes| !notes.trim().is_empty())
            .map(|notes| format!("\nNotes: {notes}"))
            .unwrap_or_default();

        Self {
            to: to.to_string(),
            subject: "Consultation Confirmed - Edumarket".to_string(),
            body: format!(
                "Hello {student_name},\n\n\
                 Your {consultation_type} consultation is scheduled for {} at {} ({}).\n{venue}{notes}",
                schedule.scheduled_date,
                schedule.scheduled_time,
                schedule.mode.label(),
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Sends and downgrades any failure to a warning. Used for notifications that must never fail
/// the surrounding operation.
pub fn deliver_best_effort(mailer: &dyn Mailer, email: OutboundEmail) {
    let to = email.to.clone();
    let subject = email.subject.clone();
    if let Err(err) = mailer.send(email) {
        tracing::warn!(%to, %subject, error = %err, "email delivery failed");
    }
}

/// Logs envelope metadata only; bodies may carry credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "email queued (no relay configured)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Refusing;

    impl Mailer for Refusing {
        fn send(&self, _email: OutboundEmail) -> Result<(), MailError> {
            Err(MailError::Transport("connection refused".to_string()))
        }
    }

    #[test]
    fn reset_template_carries_code() {
        let email = OutboundEmail::password_reset("a@example.com", "123456");
        assert!(email.body.contains("123456"));
        assert_eq!(email.to, "a@example.com");
    }

    #[test]
    fn consultation_template_mentions_venue_for_mode() {
        let schedule = ConsultationSchedule {
            scheduled_date: NaiveDate::from_ymd_opt(2026, 5, 2).expect("valid date"),
            scheduled_time: "10:30".to_string(),
            mode: MeetingMode::Online,
            meeting_link: Some("https://meet.example.com/abc".to_string()),
            location: None,
            notes: None,
        };
        let email =
            OutboundEmail::consultation_confirmation("s@example.com", "Asha", "Career", &schedule);
        assert!(email.body.contains("https://meet.example.com/abc"));
        assert!(email.body.contains("2026-05-02"));
        assert!(!email.body.contains("Notes:"));
    }

    #[test]
    fn best_effort_delivery_swallows_failures() {
        deliver_best_effort(&Refusing, OutboundEmail::password_reset("a@example.com", "1"));
        assert!(LogMailer
            .send(OutboundEmail::password_reset("a@example.com", "1"))
            .is_ok());
    }
}
