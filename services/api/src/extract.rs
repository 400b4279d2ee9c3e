//! Request body extraction that answers in the `{ success: false, message }` envelope.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use edumarket::error::ServiceError;
use serde::de::DeserializeOwned;

/// JSON body. Malformed or ill-typed bodies become a 400 [`ServiceError::Invalid`] instead of
/// axum's plain-text rejection.
pub(crate) struct JsonBody<T>(pub(crate) T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "rejected request body");
                Err(ServiceError::invalid(rejection.body_text()))
            }
        }
    }
}
