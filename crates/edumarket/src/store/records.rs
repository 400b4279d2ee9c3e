//! How each record is laid out in the journal.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::table::Document;
use super::RepositoryError;
use crate::accounts::{Credentials, UserRecord};
use crate::catalog::{Blog, Career};
use crate::directory::Institution;
use crate::inquiries::Inquiry;
use crate::moderation::{Consultation, InstitutionRequest};
use crate::notifications::Notification;
use crate::reviews::Review;

const CREDENTIALS: &str = "credentials";

fn encode_plain<T: Serialize>(record: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(record).map_err(RepositoryError::unavailable)
}

fn decode_plain<T: DeserializeOwned>(body: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(body).map_err(RepositoryError::unavailable)
}

/// API views skip credentials, so the journal stores them under their own key.
fn encode_sealed<T: Serialize>(
    record: &T,
    credentials: &Credentials,
) -> Result<String, RepositoryError> {
    let mut body = serde_json::to_value(record).map_err(RepositoryError::unavailable)?;
    let secret = serde_json::to_value(credentials).map_err(RepositoryError::unavailable)?;
    match body.as_object_mut() {
        Some(fields) => {
            fields.insert(CREDENTIALS.to_string(), secret);
        }
        None => {
            return Err(RepositoryError::unavailable(
                "account record is not a JSON object",
            ))
        }
    }
    serde_json::to_string(&body).map_err(RepositoryError::unavailable)
}

fn decode_sealed<T: DeserializeOwned>(body: &str) -> Result<(T, Credentials), RepositoryError> {
    let mut body: Value = serde_json::from_str(body).map_err(RepositoryError::unavailable)?;
    let secret = body
        .as_object_mut()
        .and_then(|fields| fields.remove(CREDENTIALS))
        .ok_or_else(|| RepositoryError::unavailable("account record has no credentials"))?;
    let credentials = serde_json::from_value(secret).map_err(RepositoryError::unavailable)?;
    let record = serde_json::from_value(body).map_err(RepositoryError::unavailable)?;
    Ok((record, credentials))
}

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn encode(&self) -> Result<String, RepositoryError> {
        encode_sealed(self, &self.credentials)
    }

    fn decode(body: &str) -> Result<Self, RepositoryError> {
        let (mut user, credentials): (UserRecord, _) = decode_sealed(body)?;
        user.credentials = credentials;
        Ok(user)
    }
}

impl Document for Institution {
    const COLLECTION: &'static str = "institutions";

    fn key(&self) -> &str {
        self.id.as_str()
    }

    fn encode(&self) -> Result<String, RepositoryError> {
        encode_sealed(self, &self.credentials)
    }

    fn decode(body: &str) -> Result<Self, RepositoryError> {
        let (mut institution, credentials): (Institution, _) = decode_sealed(body)?;
        institution.credentials = credentials;
        Ok(institution)
    }
}

macro_rules! plain_document {
    ($($record:ty => $collection:literal),+ $(,)?) => {
        $(
            impl Document for $record {
                const COLLECTION: &'static str = $collection;

                fn key(&self) -> &str {
                    self.id.as_str()
                }

                fn encode(&self) -> Result<String, RepositoryError> {
                    encode_plain(self)
                }

                fn decode(body: &str) -> Result<Self, RepositoryError> {
                    decode_plain(body)
                }
            }
        )+
    };
}

plain_document!(
    Review => "reviews",
    Inquiry => "inquiries",
    Notification => "notifications",
    InstitutionRequest => "institution_requests",
    Consultation => "consultations",
    Career => "careers",
    Blog => "blogs",
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{ResetOtp, UserRole};
    use chrono::Utc;

    #[test]
    fn account_documents_keep_credentials() {
        let mut user = UserRecord::new(
            "Asha",
            "asha@example.com",
            None,
            UserRole::Student,
            "$2b$04$hash".to_string(),
            Utc::now(),
        );
        user.credentials.reset = Some(ResetOtp::issue(Utc::now()));

        let body = user.encode().expect("encodes");
        let restored = UserRecord::decode(&body).expect("decodes");
        assert_eq!(restored.credentials, user.credentials);
        assert_eq!(restored.email, user.email);

        let api_view = serde_json::to_value(&restored).expect("serializes");
        assert!(api_view.get("credentials").is_none());
    }

    #[test]
    fn account_documents_without_credentials_are_rejected() {
        let body = serde_json::json!({ "id": "u1", "name": "Asha" }).to_string();
        assert!(matches!(
            UserRecord::decode(&body),
            Err(RepositoryError::Unavailable(_))
        ));
    }
}
