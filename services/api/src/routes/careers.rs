use super::{created, data, data_with, ApiResult, Created, Data};
use crate::auth::AdminOnly;
use crate::extract::JsonBody;
use crate::infra::ApiState;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::Router;
use edumarket::catalog::{Career, CareerQuery, NewCareer};
use edumarket::store::Store;
use serde_json::{json, Value};

pub(super) fn routes<S: Store>() -> Router<ApiState<S>> {
    Router::new()
        .route(
            "/api/careers",
            get(list_careers::<S>).post(create_career::<S>),
        )
        .route("/api/careers/seed", post(seed_careers::<S>))
}

async fn list_careers<S: Store>(
    State(state): State<ApiState<S>>,
    Query(query): Query<CareerQuery>,
) -> ApiResult<Data<Vec<Career>>> {
    data(state.market.catalog.careers(&query)?)
}

async fn create_career<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
    JsonBody(form): JsonBody<NewCareer>,
) -> Created<Career> {
    let career = state.market.catalog.create_career(form)?;
    created("Career created successfully", career)
}

async fn seed_careers<S: Store>(
    State(state): State<ApiState<S>>,
    AdminOnly(_): AdminOnly,
) -> ApiResult<Data<Value>> {
    let inserted = state.market.catalog.seed_careers()?;
    data_with("Career library seeded", json!({ "inserted": inserted }))
}
