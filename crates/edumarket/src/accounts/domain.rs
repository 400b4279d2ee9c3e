use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reset::ResetOtp;
use super::tokens::Principal;
use crate::directory::Institution;
use crate::ids::UserId;
use crate::moderation::{InstitutionApplication, InstitutionRequest};

/// Every kind of principal the marketplace authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Institution,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Institution => "institution",
            Role::Admin => "admin",
        }
    }
}

/// Roles that live in the user collection. Institutions log in through their directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

impl From<UserRole> for Role {
    fn from(value: UserRole) -> Self {
        match value {
            UserRole::Student => Role::Student,
            UserRole::Admin => Role::Admin,
        }
    }
}

/// Secret material attached to any account. Skipped by every API view; only the document
/// store persists it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub password_hash: String,
    pub reset: Option<ResetOtp>,
}

impl Credentials {
    pub fn new(password_hash: String) -> Self {
        Self {
            password_hash,
            reset: None,
        }
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: String,
    #[serde(rename = "userType")]
    pub role: UserRole,
    pub is_active: bool,
    #[serde(skip)]
    pub credentials: Credentials,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(
        name: &str,
        email: &str,
        phone: Option<String>,
        role: UserRole,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::generate(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            phone: phone.filter(|phone| !phone.trim().is_empty()),
            bio: String::new(),
            role,
            is_active: true,
            credentials: Credentials::new(password_hash),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An authenticated party, one variant per role.
#[derive(Debug, Clone)]
pub enum Account {
    Student(UserRecord),
    Admin(UserRecord),
    Institution(Institution),
}

impl Account {
    pub fn from_user(user: UserRecord) -> Self {
        match user.role {
            UserRole::Student => Account::Student(user),
            UserRole::Admin => Account::Admin(user),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Student(_) => Role::Student,
            Account::Admin(_) => Role::Admin,
            Account::Institution(_) => Role::Institution,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Account::Student(user) | Account::Admin(user) => user.id.as_str(),
            Account::Institution(institution) => institution.id.as_str(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Account::Student(user) | Account::Admin(user) => &user.name,
            Account::Institution(institution) => &institution.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Student(user) | Account::Admin(user) => &user.email,
            Account::Institution(institution) => institution.login_email(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Account::Student(user) | Account::Admin(user) => user.is_active,
            Account::Institution(institution) => institution.is_active,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        match self {
            Account::Student(user) | Account::Admin(user) => &user.credentials,
            Account::Institution(institution) => &institution.credentials,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            subject: self.subject().to_string(),
            role: self.role(),
            name: self.name().to_string(),
        }
    }

    pub fn view(&self) -> AccountView {
        let (phone, is_first_login) = match self {
            Account::Student(user) | Account::Admin(user) => (user.phone.clone(), None),
            Account::Institution(institution) => (
                Some(institution.contact.phone.clone()),
                Some(institution.is_first_login),
            ),
        };

        AccountView {
            id: self.subject().to_string(),
            name: self.name().to_string(),
            email: self.email().to_string(),
            user_type: self.role(),
            phone,
            is_first_login,
        }
    }
}

/// Public profile returned next to a freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: Role,
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_first_login: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(rename = "data")]
    pub account: AccountView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentRegistration {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

/// Sign-up payload, discriminated by `userType`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "userType", rename_all = "lowercase")]
pub enum Registration {
    Student(StudentRegistration),
    Institution(InstitutionApplication),
}

#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Session(AuthSession),
    PendingApproval(InstitutionRequest),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_type: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
    #[serde(default)]
    pub user_type: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    pub email: String,
    pub otp: String,
    pub new_password: String,
    #[serde(default)]
    pub user_type: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut UserRecord) {
        if let Some(name) = self.name.filter(|name| !name.trim().is_empty()) {
            user.name = name.trim().to_string();
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone).filter(|phone| !phone.trim().is_empty());
        }
        if let Some(bio) = self.bio {
            user.bio = bio;
        }
    }
}
