//! Notification inbox routes, mounted once per portal with that portal's guard.

use super::{data, data_with, flat, ApiResult, Data};
use crate::auth::Recipient;
use crate::infra::ApiState;
use axum::extract::{FromRequestParts, Path, State};
use axum::routing::{get, patch};
use axum::Router;
use edumarket::error::ServiceError;
use edumarket::ids::NotificationId;
use edumarket::notifications::{Inbox, Notification};
use edumarket::store::Store;

pub(super) fn routes<S, G>(prefix: &str) -> Router<ApiState<S>>
where
    S: Store,
    G: Recipient + FromRequestParts<ApiState<S>, Rejection = ServiceError> + Send + 'static,
{
    Router::new()
        .route(&format!("{prefix}/notifications"), get(inbox::<S, G>))
        .route(
            &format!("{prefix}/notifications/read-all"),
            patch(mark_all_read::<S, G>),
        )
        .route(
            &format!("{prefix}/notifications/:id/read"),
            patch(mark_read::<S, G>),
        )
}

async fn inbox<S: Store, G: Recipient>(
    State(state): State<ApiState<S>>,
    guard: G,
) -> ApiResult<Inbox> {
    flat(state.market.notifications.inbox(&guard.recipient())?)
}

async fn mark_read<S: Store, G: Recipient>(
    State(state): State<ApiState<S>>,
    guard: G,
    Path(id): Path<NotificationId>,
) -> ApiResult<Data<Notification>> {
    data(state.market.notifications.mark_read(&guard.recipient(), &id)?)
}

async fn mark_all_read<S: Store, G: Recipient>(
    State(state): State<ApiState<S>>,
    guard: G,
) -> ApiResult<Data<usize>> {
    let updated = state.market.notifications.mark_all_read(&guard.recipient())?;
    data_with("All notifications marked as read", updated)
}
