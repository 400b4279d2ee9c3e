use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    normalize_email, Account, AuthSession, Credentials, LoginRequest, PasswordReset, PasswordResetRequest,
    ProfileUpdate, Registration, RegistrationOutcome, Role, StudentRegistration, UserRecord,
    UserRole,
};
use super::passwords::{PasswordCheck, PasswordHasher};
use super::repository::AccountRepository;
use super::reset::ResetOtp;
use super::tokens::{Principal, TokenIssuer};
use crate::directory::DirectoryRepository;
use crate::error::ServiceError;
use crate::ids::{InstitutionId, UserId};
use crate::mail::{Mailer, OutboundEmail};
use crate::moderation::{
    InstitutionApplication, InstitutionRequest, ModerationRepository, RequestStatus,
};
use crate::store::RepositoryError;

const INVALID_CREDENTIALS: &str = "Invalid Credentials";
const SUSPENDED: &str = "Your account has been suspended. Please contact support.";

/// Registration, login, password recovery and bearer-token resolution for every role.
pub struct AccountService<S> {
    store: Arc<S>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
}

impl<S> AccountService<S>
where
    S: AccountRepository + DirectoryRepository + ModerationRepository + 'static,
{
    pub fn new(
        store: Arc<S>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            mailer,
        }
    }

    pub fn register(&self, registration: Registration) -> Result<RegistrationOutcome, ServiceError> {
        match registration {
            Registration::Student(form) => {
                self.register_student(form).map(RegistrationOutcome::Session)
            }
            Registration::Institution(form) => self
                .apply_as_institution(form)
                .map(RegistrationOutcome::PendingApproval),
        }
    }

    pub fn register_student(&self, form: StudentRegistration) -> Result<AuthSession, ServiceError> {
        if form.name.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
            return Err(ServiceError::invalid("Name, email and password are required."));
        }

        let email = normalize_email(&form.email);
        if self.store.find_user_by_email(&email)?.is_some() {
            return Err(student_exists());
        }

        let hash = self.hasher.hash(&form.password)?;
        let user = UserRecord::new(
            &form.name,
            &email,
            form.phone,
            UserRole::Student,
            hash,
            Utc::now(),
        );
        let user = self.store.insert_user(user).map_err(|err| match err {
            RepositoryError::Conflict => student_exists(),
            other => other.into(),
        })?;
        tracing::info!(user_id = %user.id, "student registered");

        self.session(&Account::from_user(user))
    }

    /// Files a pending onboarding request. Rejected applicants may apply again.
    pub fn apply_as_institution(
        &self,
        form: InstitutionApplication,
    ) -> Result<InstitutionRequest, ServiceError> {
        let application = form.normalized().map_err(ServiceError::Invalid)?;

        if self
            .store
            .find_institution_by_email(&application.email)?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "Institution already registered.".to_string(),
            ));
        }
        if self
            .store
            .requests_for_email(&application.email)?
            .iter()
            .any(InstitutionRequest::is_open)
        {
            return Err(ServiceError::Conflict(
                "Application already pending approval.".to_string(),
            ));
        }

        let request = self
            .store
            .insert_request(InstitutionRequest::new(application, Utc::now()))?;
        tracing::info!(request_id = %request.id, "institution application received");
        Ok(request)
    }

    /// Student and institution login. Administrators are turned away to their own portal.
    pub fn login(&self, request: LoginRequest) -> Result<AuthSession, ServiceError> {
        let email = normalize_email(&request.email);
        let wants_institution = request.user_type == Some(Role::Institution);

        let account = match self.store.find_user_by_email(&email)? {
            Some(user) if user.role == UserRole::Admin => {
                return Err(ServiceError::forbidden(
                    "Administrator must use the dedicated admin login portal.",
                ));
            }
            Some(user) => Some(Account::from_user(user)),
            None if wants_institution => self
                .store
                .find_institution_by_email(&email)?
                .map(Account::Institution),
            None => None,
        };

        let Some(account) = account else {
            if wants_institution
                && self
                    .store
                    .requests_for_email(&email)?
                    .iter()
                    .any(|pending| pending.status == RequestStatus::Pending)
            {
                return Err(ServiceError::invalid(
                    "Your application is still pending approval.",
                ));
            }
            return Err(ServiceError::invalid(INVALID_CREDENTIALS));
        };

        self.complete_login(account, &request.password)
    }

    pub fn admin_login(&self, email: &str, password: &str) -> Result<AuthSession, ServiceError> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(email))?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;
        if user.role != UserRole::Admin {
            return Err(ServiceError::forbidden("Access Denied"));
        }
        self.complete_login(Account::from_user(user), password)
    }

    fn complete_login(&self, account: Account, password: &str) -> Result<AuthSession, ServiceError> {
        match self
            .hasher
            .verify(password, &account.credentials().password_hash)?
        {
            PasswordCheck::Mismatch => return Err(ServiceError::invalid(INVALID_CREDENTIALS)),
            PasswordCheck::Match => {}
            PasswordCheck::LegacyMatch => {
                let rehashed = self.hasher.hash(password)?;
                self.edit_credentials(&account, |credentials| {
                    credentials.password_hash = rehashed;
                    Ok(())
                })?;
                tracing::info!(subject = account.subject(), "legacy password rehashed");
            }
        }

        if !account.is_active() {
            return Err(ServiceError::Suspended(SUSPENDED.to_string()));
        }

        tracing::info!(subject = account.subject(), role = account.role().label(), "login succeeded");
        self.session(&account)
    }

    /// Stores a fresh OTP and mails it. A mail failure is returned so the caller can retry.
    pub fn request_password_reset(&self, request: PasswordResetRequest) -> Result<(), ServiceError> {
        let email = normalize_email(&request.email);
        let account = self
            .find_account(&email, request.user_type)?
            .ok_or_else(|| ServiceError::not_found("Email not found."))?;

        let otp = ResetOtp::issue(Utc::now());
        let code = otp.code.clone();
        self.edit_credentials(&account, |credentials| {
            credentials.reset = Some(otp);
            Ok(())
        })?;

        self.mailer
            .send(OutboundEmail::password_reset(account.email(), &code))?;
        tracing::info!(subject = account.subject(), "password reset code issued");
        Ok(())
    }

    pub fn reset_password(&self, request: PasswordReset) -> Result<(), ServiceError> {
        let email = normalize_email(&request.email);
        let account = self
            .find_account(&email, request.user_type)?
            .ok_or_else(|| ServiceError::not_found("User not found."))?;

        if !otp_accepted(account.credentials(), &request.otp) {
            return Err(invalid_otp());
        }
        if request.new_password.is_empty() {
            return Err(ServiceError::invalid("New password is required."));
        }

        let password_hash = self.hasher.hash(&request.new_password)?;
        // The code is single use: a racing reset that already consumed it loses here.
        self.edit_credentials(&account, |credentials| {
            if !otp_accepted(credentials, &request.otp) {
                return Err(invalid_otp());
            }
            credentials.password_hash = password_hash;
            credentials.reset = None;
            Ok(())
        })?;
        tracing::info!(subject = account.subject(), "password reset completed");
        Ok(())
    }

    /// Replaces the generated first-login password.
    pub fn change_institution_password(
        &self,
        id: &InstitutionId,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        if new_password.is_empty() {
            return Err(ServiceError::invalid("New password is required."));
        }
        let password_hash = self.hasher.hash(new_password)?;
        self.store
            .edit_institution(id, |institution| {
                institution.credentials.password_hash = password_hash;
                institution.is_first_login = false;
                institution.updated_at = Utc::now();
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(|| ServiceError::not_found("Institution not found"))?;
        tracing::info!(institution_id = %id, "institution password changed");
        Ok(())
    }

    pub fn authenticate(&self, token: &str) -> Result<Principal, ServiceError> {
        Ok(self.tokens.verify(token)?)
    }

    /// Loads the live account behind a token. Suspended accounts are refused.
    pub fn resolve(&self, principal: &Principal) -> Result<Account, ServiceError> {
        let account = match principal.role {
            Role::Student | Role::Admin => self
                .store
                .fetch_user(&principal.user_id())?
                .filter(|user| Role::from(user.role) == principal.role)
                .map(Account::from_user),
            Role::Institution => self
                .store
                .fetch_institution(&principal.institution_id())?
                .map(Account::Institution),
        };

        let account = account
            .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))?;
        if !account.is_active() {
            return Err(ServiceError::Suspended(SUSPENDED.to_string()));
        }
        Ok(account)
    }

    pub fn profile(&self, id: &UserId) -> Result<UserRecord, ServiceError> {
        self.store
            .fetch_user(id)?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    pub fn update_profile(
        &self,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserRecord, ServiceError> {
        self.store
            .edit_user(id, |user| {
                update.apply(user);
                user.updated_at = Utc::now();
                Ok::<_, ServiceError>(())
            })?
            .ok_or_else(|| ServiceError::not_found("User not found"))
    }

    /// Creates the bootstrap administrator unless the email is already taken.
    pub fn seed_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, ServiceError> {
        let email = normalize_email(email);
        if self.store.find_user_by_email(&email)?.is_some() {
            tracing::info!(%email, "admin already exists");
            return Ok(None);
        }
        let hash = self.hasher.hash(password)?;
        let admin = UserRecord::new(name, &email, None, UserRole::Admin, hash, Utc::now());
        let admin = self.store.insert_user(admin)?;
        tracing::info!(user_id = %admin.id, %email, "admin seeded");
        Ok(Some(admin))
    }

    fn find_account(&self, email: &str, hint: Option<Role>) -> Result<Option<Account>, ServiceError> {
        Ok(match hint {
            Some(Role::Institution) => self
                .store
                .find_institution_by_email(email)?
                .map(Account::Institution),
            Some(Role::Student) | Some(Role::Admin) | None => self
                .store
                .find_user_by_email(email)?
                .map(Account::from_user),
        })
    }

    /// Rewrites only the credential fields of the stored account.
    fn edit_credentials(
        &self,
        account: &Account,
        change: impl FnOnce(&mut Credentials) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let found = match account {
            Account::Student(user) | Account::Admin(user) => self
                .store
                .edit_user(&user.id, |user| change(&mut user.credentials))?
                .is_some(),
            Account::Institution(institution) => self
                .store
                .edit_institution(&institution.id, |institution| {
                    change(&mut institution.credentials)
                })?
                .is_some(),
        };
        if !found {
            return Err(ServiceError::not_found("User not found."));
        }
        Ok(())
    }

    fn session(&self, account: &Account) -> Result<AuthSession, ServiceError> {
        Ok(AuthSession {
            token: self.tokens.issue(&account.principal())?,
            account: account.view(),
        })
    }
}

fn otp_accepted(credentials: &Credentials, candidate: &str) -> bool {
    credentials
        .reset
        .as_ref()
        .is_some_and(|otp| otp.accepts(candidate, Utc::now()))
}

fn invalid_otp() -> ServiceError {
    ServiceError::invalid("Invalid or expired OTP.")
}

fn student_exists() -> ServiceError {
    ServiceError::Conflict("Student already exists.".to_string())
}
