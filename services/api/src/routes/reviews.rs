use super::{data_with, ApiResult, Data};
use crate::auth::CurrentAccount;
use crate::infra::ApiState;
use axum::extract::{Path, State};
use axum::routing::delete;
use axum::Router;
use edumarket::ids::ReviewId;
use edumarket::reviews::RatingSummary;
use edumarket::store::Store;

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new().route("/api/reviews/:id", delete(delete_own::<S>))
}

/// Authors only; admins moderate through their own route.
async fn delete_own<S: Store>(
    State(state): State<ApiState<S>>,
    CurrentAccount(account): CurrentAccount,
    Path(id): Path<ReviewId>,
) -> ApiResult<Data<RatingSummary>> {
    let summary = state.market.reviews.delete_own(&id, account.subject())?;
    data_with("Review deleted successfully", summary)
}
