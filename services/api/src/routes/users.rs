use super::{created, data, data_with, done, flat, ApiResult, Data, Empty};
use crate::auth::CurrentAccount;
use crate::extract::JsonBody;
use crate::infra::ApiState;
use crate::uploads::{self, FormShape, UploadError};
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use edumarket::accounts::{
    Account, AuthSession, LoginRequest, PasswordReset, PasswordResetRequest, ProfileUpdate,
    Registration, RegistrationOutcome, UserRecord,
};
use edumarket::error::ServiceError;
use edumarket::ids::UserId;
use edumarket::store::Store;

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new()
        .route("/api/users/register", post(register::<S>))
        .route("/api/users/login", post(login::<S>))
        .route("/api/users/forgot-password", post(forgot_password::<S>))
        .route("/api/users/reset-password", post(reset_password::<S>))
        .route("/api/users/:id", get(profile::<S>).put(update_profile::<S>))
}

/// Institution sign-up arrives as multipart with its images; the files keep these keys.
const APPLICATION_FORM: FormShape<'static> = FormShape {
    files: &[("thumbnail", "thumbnailUrl", 1), ("galleryImages", "galleryUrls", 5)],
    typed: &["established", "totalStudents", "feeStructure"],
};

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn stored_images(registration: &Registration) -> Vec<String> {
    match registration {
        Registration::Institution(application) => std::iter::once(&application.thumbnail_url)
            .chain(&application.gallery_urls)
            .filter(|url| !url.is_empty())
            .cloned()
            .collect(),
        Registration::Student(_) => Vec::new(),
    }
}

async fn register<S: Store>(
    State(state): State<ApiState<S>>,
    request: Request,
) -> Result<Response, UploadError> {
    let (registration, images) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| ServiceError::invalid(rejection.body_text()))?;
        let registration: Registration =
            uploads::decode_form(&state.uploads, multipart, &APPLICATION_FORM).await?;
        let images = stored_images(&registration);
        (registration, images)
    } else {
        let JsonBody(registration) =
            JsonBody::<Registration>::from_request(request, &state).await?;
        (registration, Vec::new())
    };

    let outcome = match state.market.accounts.register(registration) {
        Ok(outcome) => outcome,
        Err(err) => {
            for url in &images {
                uploads::remove(&state.uploads, url).await;
            }
            return Err(err.into());
        }
    };
    match outcome {
        RegistrationOutcome::Session(session) => {
            let Json(envelope) = flat(session)?;
            Ok((StatusCode::CREATED, Json(envelope)).into_response())
        }
        RegistrationOutcome::PendingApproval(request) => Ok(created(
            "Application submitted. Login credentials will be emailed once approved.",
            request,
        )
        .into_response()),
    }
}

async fn login<S: Store>(
    State(state): State<ApiState<S>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<AuthSession> {
    flat(state.market.accounts.login(request)?)
}

async fn forgot_password<S: Store>(
    State(state): State<ApiState<S>>,
    JsonBody(request): JsonBody<PasswordResetRequest>,
) -> ApiResult<Empty> {
    state.market.accounts.request_password_reset(request)?;
    done("OTP sent to your email.")
}

async fn reset_password<S: Store>(
    State(state): State<ApiState<S>>,
    JsonBody(request): JsonBody<PasswordReset>,
) -> ApiResult<Empty> {
    state.market.accounts.reset_password(request)?;
    done("Password reset successful.")
}

/// Students reach their own profile; admins reach any user.
fn ensure_profile_access(account: &Account, id: &UserId) -> Result<(), ServiceError> {
    match account {
        Account::Admin(_) => Ok(()),
        Account::Student(user) if &user.id == id => Ok(()),
        _ => Err(ServiceError::forbidden("Not authorized to access this profile")),
    }
}

async fn profile<S: Store>(
    State(state): State<ApiState<S>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<UserId>,
) -> ApiResult<Data<UserRecord>> {
    ensure_profile_access(&account, &id)?;
    data(state.market.accounts.profile(&id)?)
}

async fn update_profile<S: Store>(
    State(state): State<ApiState<S>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<UserId>,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Data<UserRecord>> {
    ensure_profile_access(&account, &id)?;
    let user = state.market.accounts.update_profile(&id, update)?;
    data_with("Profile updated successfully", user)
}
