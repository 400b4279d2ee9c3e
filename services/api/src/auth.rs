//! Bearer-token extractors. Each guard resolves the live account, so suspensions and deletions
//! take effect immediately rather than when the token expires.

use crate::infra::ApiState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use edumarket::accounts::{Account, UserRecord};
use edumarket::directory::Institution;
use edumarket::error::ServiceError;
use edumarket::ids::RecipientId;
use edumarket::store::Store;

/// Any signed-in account.
pub(crate) struct CurrentAccount(pub(crate) Account);

pub(crate) struct StudentOnly(pub(crate) UserRecord);

pub(crate) struct InstitutionOnly(pub(crate) Institution);

pub(crate) struct AdminOnly(pub(crate) UserRecord);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S: Store> FromRequestParts<ApiState<S>> for CurrentAccount {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ServiceError::Unauthorized("Not authorized, no token".to_string()))?;
        let principal = state.market.accounts.authenticate(token)?;
        let account = state.market.accounts.resolve(&principal)?;
        Ok(Self(account))
    }
}

#[async_trait]
impl<S: Store> FromRequestParts<ApiState<S>> for StudentOnly {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<S>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentAccount::from_request_parts(parts, state).await?.0 {
            Account::Student(user) => Ok(Self(user)),
            _ => Err(ServiceError::forbidden("Access denied. Students only.")),
        }
    }
}

#[async_trait]
impl<S: Store> FromRequestParts<ApiState<S>> for InstitutionOnly {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<S>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentAccount::from_request_parts(parts, state).await?.0 {
            Account::Institution(institution) => Ok(Self(institution)),
            _ => Err(ServiceError::forbidden("Access denied. Institutions only.")),
        }
    }
}

#[async_trait]
impl<S: Store> FromRequestParts<ApiState<S>> for AdminOnly {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<S>,
    ) -> Result<Self, Self::Rejection> {
        match CurrentAccount::from_request_parts(parts, state).await?.0 {
            Account::Admin(user) => Ok(Self(user)),
            _ => Err(ServiceError::forbidden("Access denied. Admins only.")),
        }
    }
}

/// The signed-in student, if any. No token means an anonymous caller and other roles are treated
/// the same way; a token that fails to verify is still rejected.
pub(crate) struct MaybeStudent(pub(crate) Option<UserRecord>);

#[async_trait]
impl<S: Store> FromRequestParts<ApiState<S>> for MaybeStudent {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState<S>,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(Self(None));
        }
        match CurrentAccount::from_request_parts(parts, state).await?.0 {
            Account::Student(user) => Ok(Self(Some(user))),
            Account::Institution(_) | Account::Admin(_) => Ok(Self(None)),
        }
    }
}

/// Guards whose account owns an inbox.
pub(crate) trait Recipient {
    fn recipient(&self) -> RecipientId;
}

impl Recipient for StudentOnly {
    fn recipient(&self) -> RecipientId {
        RecipientId::from(&self.0.id)
    }
}

impl Recipient for InstitutionOnly {
    fn recipient(&self) -> RecipientId {
        RecipientId::from(&self.0.id)
    }
}
