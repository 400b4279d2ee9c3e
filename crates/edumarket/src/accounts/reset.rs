use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const OTP_TTL_MINUTES: i64 = 10;

/// One-time code for the forgot-password flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl ResetOtp {
    pub fn issue(now: DateTime<Utc>) -> Self {
        let code = rand::thread_rng().gen_range(100_000..=999_999u32);
        Self {
            code: code.to_string(),
            expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whitespace around either side is ignored.
    pub fn accepts(&self, candidate: &str, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.code.trim() == candidate.trim()
    }
}
