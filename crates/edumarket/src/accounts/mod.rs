//! Student/admin accounts, institution logins, token issuance and password recovery.

pub mod domain;
pub mod passwords;
pub mod repository;
pub mod reset;
pub mod service;
pub mod tokens;

pub use domain::{
    normalize_email, Account, AccountView, AuthSession, Credentials, LoginRequest,
    PasswordReset, PasswordResetRequest, ProfileUpdate, Registration, RegistrationOutcome, Role,
    StudentRegistration, UserRecord, UserRole,
};
pub use passwords::{generate_initial_password, PasswordCheck, PasswordError, PasswordHasher};
pub use repository::AccountRepository;
pub use reset::{ResetOtp, OTP_TTL_MINUTES};
pub use service::AccountService;
pub use tokens::{Principal, TokenError, TokenIssuer};
